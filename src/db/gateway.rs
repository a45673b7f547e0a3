// src/db/gateway.rs

use std::{future::IntoFuture, str::FromStr, time::Duration};

use futures::TryStreamExt;
use mongodb::{
    bson::Document,
    options::ClientOptions,
    Client, Collection, Cursor, Database,
};

use crate::common::{
    error::AppError,
    listing::{Page, Pagination},
};

/// Ambiente de implantação; cada um aponta para um banco lógico diferente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEnvironment {
    Production,
    Staging,
    Development,
}

impl GatewayEnvironment {
    pub fn database_name(&self) -> &'static str {
        match self {
            GatewayEnvironment::Production => "crm",
            GatewayEnvironment::Staging => "crm_staging",
            GatewayEnvironment::Development => "crm_dev",
        }
    }
}

impl FromStr for GatewayEnvironment {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "homolog" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            other => Err(anyhow::anyhow!("APP_ENV desconhecido: {}", other)),
        }
    }
}

// Acesso ao banco de documentos. Toda operação passa por `run`, que aplica
// o teto fixo de tempo; não há retentativa.
#[derive(Clone)]
pub struct MongoGateway {
    database: Database,
    timeout: Duration,
}

impl MongoGateway {
    pub async fn connect(uri: &str, database: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("crm-backend".to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        // O driver só abre conexões no primeiro uso.
        let client = Client::with_options(options)?;

        Ok(Self {
            database: client.database(database),
            timeout,
        })
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }

    pub async fn run<T, F>(&self, operation: F) -> Result<T, AppError>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Operação no MongoDB abandonada por timeout");
                Err(AppError::DatabaseTimeout)
            }
        }
    }

    /// Executa um pipeline de agregação e coleta todos os documentos.
    pub async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, AppError> {
        let coll = self.collection(collection);
        self.run(async move {
            let cursor = coll.aggregate(pipeline).await?;
            collect(cursor).await
        })
        .await
    }

    /// Contagem + página ordenada por `_id` decrescente.
    pub async fn find_page(
        &self,
        collection: &str,
        filter: Document,
        pagination: Pagination,
    ) -> Result<Page<Document>, AppError> {
        let coll = self.collection(collection);

        let total = self.run(coll.count_documents(filter.clone())).await?;
        let items = self
            .run(async {
                let cursor = coll
                    .find(filter)
                    .sort(Pagination::sort())
                    .skip(pagination.skip())
                    .limit(pagination.page_size as i64)
                    .await?;
                collect(cursor).await
            })
            .await?;

        Ok(Page {
            items,
            page: pagination.page,
            page_size: pagination.page_size,
            total,
        })
    }
}

pub async fn collect(cursor: Cursor<Document>) -> mongodb::error::Result<Vec<Document>> {
    cursor.try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiente_escolhe_o_banco() {
        assert_eq!("production".parse::<GatewayEnvironment>().unwrap().database_name(), "crm");
        assert_eq!("Staging".parse::<GatewayEnvironment>().unwrap().database_name(), "crm_staging");
        assert_eq!("dev".parse::<GatewayEnvironment>().unwrap().database_name(), "crm_dev");
        assert!("qa".parse::<GatewayEnvironment>().is_err());
    }

    #[tokio::test]
    async fn estoura_o_timeout() {
        let gateway = MongoGateway::connect(
            "mongodb://127.0.0.1:1",
            GatewayEnvironment::Development.database_name(),
            Duration::from_millis(20),
        )
        .await
        .expect("URI válida");

        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, mongodb::error::Error>(())
        };
        let err = gateway.run(slow).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseTimeout));
    }
}
