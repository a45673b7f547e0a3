// src/db/entity_repo.rs

use std::collections::HashMap;

use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};

use crate::{
    common::{
        error::AppError,
        listing::{build_filter, FilterSpec, Page, Pagination},
        update::PartialUpdate,
    },
    db::MongoGateway,
    models::{
        budget::BUDGET_FILTERS, client::CLIENT_FILTERS, funnel::FUNNEL_FILTERS, goal::GOAL_FILTERS,
        lead::LEAD_FILTERS, order::ORDER_FILTERS,
    },
};

/// Coleções com o mesmo ciclo de vida: listar, criar, buscar e atualizar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Lead,
    Client,
    Budget,
    Order,
    Funnel,
    Goal,
}

impl EntityKind {
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Lead => "leads",
            EntityKind::Client => "clients",
            EntityKind::Budget => "budgets",
            EntityKind::Order => "orders",
            EntityKind::Funnel => "funnels",
            EntityKind::Goal => "commercial_goals",
        }
    }

    /// Nome usado nas mensagens de "não encontrado" e na auditoria.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Lead => "Lead",
            EntityKind::Client => "Cliente",
            EntityKind::Budget => "Orçamento",
            EntityKind::Order => "Pedido",
            EntityKind::Funnel => "Funil",
            EntityKind::Goal => "Meta comercial",
        }
    }

    pub fn filters(&self) -> FilterSpec {
        match self {
            EntityKind::Lead => LEAD_FILTERS,
            EntityKind::Client => CLIENT_FILTERS,
            EntityKind::Budget => BUDGET_FILTERS,
            EntityKind::Order => ORDER_FILTERS,
            EntityKind::Funnel => FUNNEL_FILTERS,
            EntityKind::Goal => GOAL_FILTERS,
        }
    }
}

#[derive(Clone)]
pub struct EntityRepository {
    gateway: MongoGateway,
}

impl EntityRepository {
    pub fn new(gateway: MongoGateway) -> Self {
        Self { gateway }
    }

    /// Página ordenada por `_id` decrescente com os filtros da query-string.
    pub async fn list(
        &self,
        kind: EntityKind,
        params: &HashMap<String, String>,
    ) -> Result<Page<Document>, AppError> {
        let filter = build_filter(params, kind.filters())?;
        let pagination = Pagination::from_params(params);
        self.gateway.find_page(kind.collection(), filter, pagination).await
    }

    pub async fn find(&self, kind: EntityKind, id: ObjectId) -> Result<Option<Document>, AppError> {
        let coll = self.gateway.collection(kind.collection());
        self.gateway.run(coll.find_one(doc! { "_id": id })).await
    }

    pub async fn get(&self, kind: EntityKind, id: ObjectId) -> Result<Document, AppError> {
        self.find(kind, id).await?.ok_or(AppError::NotFound(kind.label()))
    }

    /// Insere com `created_at`/`updated_at` e devolve o documento gravado.
    pub async fn insert(&self, kind: EntityKind, mut document: Document) -> Result<Document, AppError> {
        let now = DateTime::now();
        let id = ObjectId::new();
        document.insert("_id", id);
        document.insert("created_at", now);
        document.insert("updated_at", now);

        let coll = self.gateway.collection(kind.collection());
        self.gateway.run(coll.insert_one(document.clone())).await?;

        tracing::info!(collection = kind.collection(), id = %id, "Documento criado");
        Ok(document)
    }

    /// Aplica o `$set` parcial e devolve o documento atualizado. Uma
    /// atualização sem campos só confirma que o documento existe.
    pub async fn update(
        &self,
        kind: EntityKind,
        id: ObjectId,
        update: PartialUpdate,
    ) -> Result<Document, AppError> {
        if update.is_empty() {
            return self.get(kind, id).await;
        }

        let coll = self.gateway.collection(kind.collection());
        let result = self
            .gateway
            .run(coll.update_one(doc! { "_id": id }, update.into_update()))
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(kind.label()));
        }
        self.get(kind, id).await
    }

    pub async fn delete(&self, kind: EntityKind, id: ObjectId) -> Result<(), AppError> {
        let coll = self.gateway.collection(kind.collection());
        let result = self.gateway.run(coll.delete_one(doc! { "_id": id })).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound(kind.label()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colecoes_distintas() {
        let kinds = [
            EntityKind::Lead,
            EntityKind::Client,
            EntityKind::Budget,
            EntityKind::Order,
            EntityKind::Funnel,
            EntityKind::Goal,
        ];
        let mut names: Vec<_> = kinds.iter().map(|k| k.collection()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }

    #[test]
    fn filtros_de_pedido_aceitam_status() {
        let params = HashMap::from([("status_in".to_string(), "pending,finished".to_string())]);
        let filter = build_filter(&params, EntityKind::Order.filters()).unwrap();
        assert!(filter.get_document("status").unwrap().contains_key("$in"));
    }
}
