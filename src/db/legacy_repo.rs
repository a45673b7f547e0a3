// src/db/legacy_repo.rs
//
// Leitura do banco relacional antigo (MySQL). Só consultas; os documentos
// novos guardam `old_id` apontando para as linhas daqui.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{mysql::MySqlPoolOptions, FromRow, MySql, MySqlPool, QueryBuilder};
use tokio::sync::Mutex;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LegacyBudget {
    pub id: i64,
    pub client_name: Option<String>,
    pub seller_id: Option<i64>,
    pub total_value: Option<Decimal>,
    pub product_list: Option<String>,
    pub approved: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LegacyOrder {
    pub id: i64,
    pub budget_id: Option<i64>,
    pub status: Option<String>,
    pub products: Option<String>,
    pub total_value: Option<Decimal>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct LegacyUser {
    pub id: i64,
    pub name: String,
}

#[derive(Clone)]
pub struct LegacyRepository {
    pool: Option<MySqlPool>,
    // Entradas entram na primeira consulta e nunca saem: cresce sem limite
    // enquanto o processo vive.
    user_cache: Arc<Mutex<HashMap<i64, LegacyUser>>>,
}

const BUDGET_COLUMNS: &str =
    "SELECT id, client_name, seller_id, total_value, product_list, approved, created_at FROM budgets";
const ORDER_COLUMNS: &str = "SELECT id, budget_id, status, products, total_value, created_at FROM orders";

impl LegacyRepository {
    pub fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)?;
        tracing::info!("✅ Banco legado configurado (conexão sob demanda)");
        Ok(Self {
            pool: Some(pool),
            user_cache: Arc::default(),
        })
    }

    /// Sem `LEGACY_DATABASE_URL`: toda consulta devolve vazio.
    pub fn disabled() -> Self {
        Self {
            pool: None,
            user_cache: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn find_budget(&self, id: i64) -> Result<Option<LegacyBudget>, AppError> {
        let Some(pool) = &self.pool else { return Ok(None) };
        let sql = format!("{BUDGET_COLUMNS} WHERE id = ?");
        let budget = sqlx::query_as::<_, LegacyBudget>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(budget)
    }

    pub async fn find_budgets(&self, ids: &[i64]) -> Result<Vec<LegacyBudget>, AppError> {
        let Some(pool) = &self.pool else { return Ok(Vec::new()) };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<MySql>::new(format!("{BUDGET_COLUMNS} WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        Ok(query.build_query_as::<LegacyBudget>().fetch_all(pool).await?)
    }

    pub async fn find_order(&self, id: i64) -> Result<Option<LegacyOrder>, AppError> {
        let Some(pool) = &self.pool else { return Ok(None) };
        let sql = format!("{ORDER_COLUMNS} WHERE id = ?");
        let order = sqlx::query_as::<_, LegacyOrder>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(order)
    }

    pub async fn find_orders(&self, ids: &[i64]) -> Result<Vec<LegacyOrder>, AppError> {
        let Some(pool) = &self.pool else { return Ok(Vec::new()) };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<MySql>::new(format!("{ORDER_COLUMNS} WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        Ok(query.build_query_as::<LegacyOrder>().fetch_all(pool).await?)
    }

    /// Usuário do sistema antigo, com cache em memória por id.
    pub async fn find_user(&self, id: i64) -> Result<Option<LegacyUser>, AppError> {
        if let Some(user) = self.user_cache.lock().await.get(&id) {
            return Ok(Some(user.clone()));
        }
        let Some(pool) = &self.pool else { return Ok(None) };

        let user = sqlx::query_as::<_, LegacyUser>("SELECT id, name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        if let Some(user) = &user {
            self.user_cache.lock().await.insert(id, user.clone());
        }
        Ok(user)
    }

    #[cfg(test)]
    async fn cache_len(&self) -> usize {
        self.user_cache.lock().await.len()
    }

    #[cfg(test)]
    async fn seed_user(&self, user: LegacyUser) {
        self.user_cache.lock().await.insert(user.id, user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn desabilitado_devolve_vazio() {
        let repo = LegacyRepository::disabled();
        assert!(!repo.is_enabled());
        assert!(repo.find_budget(10).await.unwrap().is_none());
        assert!(repo.find_orders(&[1, 2]).await.unwrap().is_empty());
        assert!(repo.find_user(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usuario_em_cache_nao_consulta_o_banco() {
        let repo = LegacyRepository::disabled();
        repo.seed_user(LegacyUser { id: 4, name: "Marcos".into() }).await;

        let user = repo.find_user(4).await.unwrap();
        assert_eq!(user.map(|u| u.name), Some("Marcos".to_string()));
        assert_eq!(repo.cache_len().await, 1);
    }

    #[test]
    fn decimal_sai_como_numero() {
        let budget = LegacyBudget {
            id: 1,
            client_name: None,
            seller_id: Some(4),
            total_value: Some(Decimal::new(12_550, 2)),
            product_list: None,
            approved: true,
            created_at: None,
        };
        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(json["total_value"], serde_json::json!(125.5));
    }
}
