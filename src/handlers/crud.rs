// src/handlers/crud.rs
//
// Passos comuns dos handlers de entidade. Cada handler valida o payload e
// monta o documento; daqui para frente o caminho é o mesmo.

use std::collections::HashMap;

use mongodb::bson::Document;
use serde::Serialize;
use serde_json::Value;

use crate::{
    common::{
        db_utils::{document_to_json, parse_object_id},
        error::AppError,
        listing::Page,
        numeric::bson_to_i64,
        update::PartialUpdate,
    },
    config::AppState,
    db::EntityKind,
    models::auth::AuthUser,
    services::audit::AuditEntry,
};

pub async fn list(
    app_state: &AppState,
    kind: EntityKind,
    params: &HashMap<String, String>,
) -> Result<Page<Value>, AppError> {
    let page = app_state.entity_repo.list(kind, params).await?;
    Ok(page.map(document_to_json))
}

pub async fn get(app_state: &AppState, kind: EntityKind, raw_id: &str) -> Result<Document, AppError> {
    let id = parse_object_id("id", raw_id)?;
    app_state.entity_repo.get(kind, id).await
}

pub async fn create(
    app_state: &AppState,
    kind: EntityKind,
    document: Document,
    user: &AuthUser,
) -> Result<Value, AppError> {
    let created = app_state.entity_repo.insert(kind, document).await?;
    if let Ok(id) = created.get_object_id("_id") {
        app_state
            .audit
            .record(AuditEntry::new("create", kind.collection(), id.to_hex(), Some(user.id)));
    }
    Ok(document_to_json(created))
}

pub async fn update(
    app_state: &AppState,
    kind: EntityKind,
    raw_id: &str,
    update: PartialUpdate,
    user: &AuthUser,
) -> Result<Value, AppError> {
    let id = parse_object_id("id", raw_id)?;
    let updated = app_state.entity_repo.update(kind, id, update).await?;
    app_state
        .audit
        .record(AuditEntry::new("update", kind.collection(), id.to_hex(), Some(user.id)));
    Ok(document_to_json(updated))
}

pub async fn delete(app_state: &AppState, kind: EntityKind, raw_id: &str, user: &AuthUser) -> Result<(), AppError> {
    let id = parse_object_id("id", raw_id)?;
    app_state.entity_repo.delete(kind, id).await?;
    app_state
        .audit
        .record(AuditEntry::new("delete", kind.collection(), id.to_hex(), Some(user.id)));
    Ok(())
}

/// `old_id` de cada item da página, para buscar o legado numa consulta só.
pub fn old_ids(page: &Page<Document>) -> Vec<i64> {
    page.items
        .iter()
        .filter_map(|doc| doc.get("old_id").and_then(bson_to_i64))
        .collect()
}

pub fn attach_old_data<T: Serialize>(page: Page<Document>, legacy: &HashMap<i64, T>) -> Page<Value> {
    page.map(|doc| {
        let old = doc
            .get("old_id")
            .and_then(bson_to_i64)
            .and_then(|id| legacy.get(&id))
            .and_then(|row| serde_json::to_value(row).ok());
        let mut body = document_to_json(doc);
        if let Some(old) = old {
            body["old_data"] = old;
        }
        body
    })
}
