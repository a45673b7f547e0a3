// src/handlers/clients.rs

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
    models::client::{CreateClientPayload, UpdateClientPayload},
};

// GET /v1/clients
#[utoipa::path(
    get,
    path = "/v1/clients",
    tag = "Clientes",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("page_size" = Option<u64>, Query, description = "Itens por página (máx. 100)"),
        ("segment" = Option<String>, Query, description = "Segmento exato")
    ),
    responses((status = 200, description = "Página de clientes")),
    security(("bearer" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = crud::list(&app_state, EntityKind::Client, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(page))
}

// GET /v1/clients/{id}
#[utoipa::path(
    get,
    path = "/v1/clients/{id}",
    tag = "Clientes",
    params(("id" = String, Path, description = "ObjectId do cliente")),
    responses(
        (status = 200, description = "Cliente"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let client = crud::get(&app_state, EntityKind::Client, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(document_to_json(client)))
}

// POST /v1/clients
#[utoipa::path(
    post,
    path = "/v1/clients",
    tag = "Clientes",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Cliente criado"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("bearer" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let document = payload.into_document()?;
        crud::create(&app_state, EntityKind::Client, document, &user).await
    }
    .await;

    let client = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Cliente criado com sucesso", client)))
}

// PATCH /v1/clients/{id}
#[utoipa::path(
    patch,
    path = "/v1/clients/{id}",
    tag = "Clientes",
    params(("id" = String, Path, description = "ObjectId do cliente")),
    request_body = UpdateClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let update = payload.into_update()?;
        crud::update(&app_state, EntityKind::Client, &id, update, &user).await
    }
    .await;

    let client = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Cliente atualizado com sucesso", client))
}
