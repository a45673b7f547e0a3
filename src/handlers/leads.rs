// src/handlers/leads.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::{
        db_utils::{document_to_json, parse_object_id},
        error::{ApiError, AppError},
        response,
    },
    config::AppState,
    db::EntityKind,
    handlers::crud,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::lead::{CreateLeadPayload, UpdateLeadPayload},
};

// GET /v1/leads
#[utoipa::path(
    get,
    path = "/v1/leads",
    tag = "Leads",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("page_size" = Option<u64>, Query, description = "Itens por página (máx. 100)"),
        ("name_regex" = Option<String>, Query, description = "Busca parcial pelo nome")
    ),
    responses((status = 200, description = "Página de leads")),
    security(("bearer" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = crud::list(&app_state, EntityKind::Lead, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(page))
}

// GET /v1/leads/{id}
#[utoipa::path(
    get,
    path = "/v1/leads/{id}",
    tag = "Leads",
    params(("id" = String, Path, description = "ObjectId do lead")),
    responses(
        (status = 200, description = "Lead com a faixa calculada em `tier`"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<Value, AppError> = async {
        let id = parse_object_id("id", &id)?;
        let (lead, tier) = app_state.lead_service.get_with_tier(id).await?;

        let mut lead = document_to_json(lead);
        lead["tier"] = serde_json::to_value(tier).map_err(anyhow::Error::from)?;
        Ok(lead)
    }
    .await;

    let lead = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(lead))
}

// POST /v1/leads
#[utoipa::path(
    post,
    path = "/v1/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("bearer" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let document = payload.into_document()?;
        crud::create(&app_state, EntityKind::Lead, document, &user).await
    }
    .await;

    let lead = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Lead criado com sucesso", lead)))
}

// PATCH /v1/leads/{id}
#[utoipa::path(
    patch,
    path = "/v1/leads/{id}",
    tag = "Leads",
    params(("id" = String, Path, description = "ObjectId do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("bearer" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let update = payload.into_update()?;
        crud::update(&app_state, EntityKind::Lead, &id, update, &user).await
    }
    .await;

    let lead = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Lead atualizado com sucesso", lead))
}
