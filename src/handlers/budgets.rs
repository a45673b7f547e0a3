// src/handlers/budgets.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mongodb::bson::Document;
use serde_json::{json, Value};
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
    models::budget::{CreateBudgetPayload, UpdateBudgetPayload},
};

// GET /v1/budgets
#[utoipa::path(
    get,
    path = "/v1/budgets",
    tag = "Orçamentos",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("page_size" = Option<u64>, Query, description = "Itens por página (máx. 100)"),
        ("approved" = Option<bool>, Query, description = "Somente aprovados (ou não)")
    ),
    responses((status = 200, description = "Página de orçamentos")),
    security(("bearer" = []))
)]
pub async fn list_budgets(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let page = app_state.entity_repo.list(EntityKind::Budget, &params).await?;
        let legacy: HashMap<i64, _> = app_state
            .legacy_repo
            .find_budgets(&crud::old_ids(&page))
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

// GET /v1/budgets/{id}
#[utoipa::path(
    get,
    path = "/v1/budgets/{id}",
    tag = "Orçamentos",
    params(("id" = String, Path, description = "ObjectId do orçamento")),
    responses(
        (status = 200, description = "Orçamento com `old_data` do banco legado quando houver `old_id`"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn get_budget(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let budget = crud::get(&app_state, EntityKind::Budget, &id).await?;
        with_legacy_budget(&app_state, budget).await
    }
    .await;

    let budget = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(budget))
}

// POST /v1/budgets
#[utoipa::path(
    post,
    path = "/v1/budgets",
    tag = "Orçamentos",
    request_body = CreateBudgetPayload,
    responses(
        (status = 201, description = "Orçamento criado"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("bearer" = []))
)]
pub async fn create_budget(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateBudgetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let document = payload.into_document()?;
        crud::create(&app_state, EntityKind::Budget, document, &user).await
    }
    .await;

    let budget = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Orçamento criado com sucesso", budget)))
}

// PATCH /v1/budgets/{id}
#[utoipa::path(
    patch,
    path = "/v1/budgets/{id}",
    tag = "Orçamentos",
    params(("id" = String, Path, description = "ObjectId do orçamento")),
    request_body = UpdateBudgetPayload,
    responses(
        (status = 200, description = "Orçamento atualizado"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn update_budget(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBudgetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let update = payload.into_update()?;
        crud::update(&app_state, EntityKind::Budget, &id, update, &user).await
    }
    .await;

    let budget = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Orçamento atualizado com sucesso", budget))
}

/// Preenche `old_data` com a linha do banco legado e o nome do vendedor
/// antigo. Sem `old_id` ou sem banco legado, devolve o documento como está.
async fn with_legacy_budget(app_state: &AppState, budget: Document) -> Result<Value, AppError> {
    let old_id = budget.get("old_id").and_then(bson_to_i64);
    let mut body = document_to_json(budget);

    let Some(old_id) = old_id.filter(|_| app_state.legacy_repo.is_enabled()) else {
        return Ok(body);
    };
    let Some(legacy) = app_state.legacy_repo.find_budget(old_id).await? else {
        tracing::debug!(old_id, "Orçamento legado não encontrado");
        return Ok(body);
    };

    let seller_name = match legacy.seller_id {
        Some(seller_id) => app_state.legacy_repo.find_user(seller_id).await?.map(|u| u.name),
        None => None,
    };

    let mut old_data = serde_json::to_value(&legacy).map_err(anyhow::Error::from)?;
    old_data["seller_name"] = json!(seller_name);
    body["old_data"] = old_data;
    Ok(body)
}
