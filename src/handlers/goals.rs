// src/handlers/goals.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::document_to_json,
        error::{ApiError, AppError},
        response,
    },
    config::AppState,
    db::EntityKind,
    handlers::crud,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::goal::{CreateGoalPayload, UpdateGoalPayload},
};

// GET /v1/commercial-goals
#[utoipa::path(
    get,
    path = "/v1/commercial-goals",
    tag = "Metas",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("page_size" = Option<u64>, Query, description = "Itens por página (máx. 100)"),
        ("goal_type" = Option<String>, Query, description = "daily, monthly ou yearly")
    ),
    responses((status = 200, description = "Página de metas comerciais")),
    security(("bearer" = []))
)]
pub async fn list_goals(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = crud::list(&app_state, EntityKind::Goal, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(page))
}

// GET /v1/commercial-goals/{id}
#[utoipa::path(
    get,
    path = "/v1/commercial-goals/{id}",
    tag = "Metas",
    params(("id" = String, Path, description = "ObjectId da meta")),
    responses(
        (status = 200, description = "Meta comercial"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("bearer" = []))
)]
pub async fn get_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let goal = crud::get(&app_state, EntityKind::Goal, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(document_to_json(goal)))
}

// POST /v1/commercial-goals
#[utoipa::path(
    post,
    path = "/v1/commercial-goals",
    tag = "Metas",
    request_body = CreateGoalPayload,
    responses(
        (status = 201, description = "Meta criada"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("bearer" = []))
)]
pub async fn create_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateGoalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let document = payload.into_document()?;
        crud::create(&app_state, EntityKind::Goal, document, &user).await
    }
    .await;

    let goal = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Meta criada com sucesso", goal)))
}

// PATCH /v1/commercial-goals/{id}
#[utoipa::path(
    patch,
    path = "/v1/commercial-goals/{id}",
    tag = "Metas",
    params(("id" = String, Path, description = "ObjectId da meta")),
    request_body = UpdateGoalPayload,
    responses(
        (status = 200, description = "Meta atualizada"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("bearer" = []))
)]
pub async fn update_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGoalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let update = payload.into_update()?;
        crud::update(&app_state, EntityKind::Goal, &id, update, &user).await
    }
    .await;

    let goal = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Meta atualizada com sucesso", goal))
}
