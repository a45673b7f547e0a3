// src/handlers/orders.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mongodb::bson::Document;
use serde_json::Value;
use validator::Validate;

use crate::{
    common::{
        db_utils::document_to_json,
        error::{ApiError, AppError},
        numeric::bson_to_i64,
        response,
    },
    config::AppState,
    db::EntityKind,
    handlers::crud,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::order::{CreateOrderPayload, UpdateOrderPayload},
};

// GET /v1/orders
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "Pedidos",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("page_size" = Option<u64>, Query, description = "Itens por página (máx. 100)"),
        ("status_in" = Option<String>, Query, description = "Lista de status separada por vírgula")
    ),
    responses((status = 200, description = "Página de pedidos")),
    security(("bearer" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let page = app_state.entity_repo.list(EntityKind::Order, &params).await?;
        let legacy: HashMap<i64, _> = app_state
            .legacy_repo
            .find_orders(&crud::old_ids(&page))
            .await?
            .into_iter()
            .map(|row| (row.id, row))
            .collect();
        Ok::<_, AppError>(crud::attach_old_data(page, &legacy))
    }
    .await;

    let page = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(page))
}

// GET /v1/orders/{id}
#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    tag = "Pedidos",
    params(("id" = String, Path, description = "ObjectId do pedido")),
    responses(
        (status = 200, description = "Pedido com `old_data` do banco legado quando houver `old_id`"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let order = crud::get(&app_state, EntityKind::Order, &id).await?;
        with_legacy_order(&app_state, order).await
    }
    .await;

    let order = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(order))
}

// POST /v1/orders
#[utoipa::path(
    post,
    path = "/v1/orders",
    tag = "Pedidos",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("bearer" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let document = payload.into_document()?;
        crud::create(&app_state, EntityKind::Order, document, &user).await
    }
    .await;

    let order = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Pedido criado com sucesso", order)))
}

// PATCH /v1/orders/{id}
#[utoipa::path(
    patch,
    path = "/v1/orders/{id}",
    tag = "Pedidos",
    params(("id" = String, Path, description = "ObjectId do pedido")),
    request_body = UpdateOrderPayload,
    responses(
        (status = 200, description = "Pedido atualizado"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let update = payload.into_update()?;
        crud::update(&app_state, EntityKind::Order, &id, update, &user).await
    }
    .await;

    let order = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Pedido atualizado com sucesso", order))
}

/// Preenche `old_data` com a linha do pedido no banco legado.
async fn with_legacy_order(app_state: &AppState, order: Document) -> Result<Value, AppError> {
    let old_id = order.get("old_id").and_then(bson_to_i64);
    let mut body = document_to_json(order);

    let Some(old_id) = old_id.filter(|_| app_state.legacy_repo.is_enabled()) else {
        return Ok(body);
    };
    if let Some(legacy) = app_state.legacy_repo.find_order(old_id).await? {
        body["old_data"] = serde_json::to_value(&legacy).map_err(anyhow::Error::from)?;
    }
    Ok(body)
}
