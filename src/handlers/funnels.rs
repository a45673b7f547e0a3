// src/handlers/funnels.rs

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
        db_utils::{document_to_json, parse_object_id},
        error::{ApiError, AppError},
        response,
    },
    config::AppState,
    db::EntityKind,
    handlers::crud,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::funnel::{
        CreateFunnelPayload, CreatePlacementPayload, StagePayload, UpdateFunnelPayload, UpdateStagePayload,
    },
    services::audit::AuditEntry,
};

// =============================================================================
//  FUNIS
// =============================================================================

// GET /v1/funnels
#[utoipa::path(
    get,
    path = "/v1/funnels",
    tag = "Funis",
    responses((status = 200, description = "Página de funis")),
    security(("bearer" = []))
)]
pub async fn list_funnels(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = crud::list(&app_state, EntityKind::Funnel, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(page))
}

// GET /v1/funnels/{id}
#[utoipa::path(
    get,
    path = "/v1/funnels/{id}",
    tag = "Funis",
    params(("id" = String, Path, description = "ObjectId do funil")),
    responses((status = 200, description = "Funil"), (status = 404, description = "Funil não encontrado")),
    security(("bearer" = []))
)]
pub async fn get_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let funnel = crud::get(&app_state, EntityKind::Funnel, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(document_to_json(funnel)))
}

// POST /v1/funnels
#[utoipa::path(
    post,
    path = "/v1/funnels",
    tag = "Funis",
    request_body = CreateFunnelPayload,
    responses((status = 201, description = "Funil criado"), (status = 400, description = "Dados inválidos")),
    security(("bearer" = []))
)]
pub async fn create_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateFunnelPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let funnel = crud::create(&app_state, EntityKind::Funnel, payload.into_document(), &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, response::message_with("Funil criado com sucesso", funnel)))
}

// PATCH /v1/funnels/{id}
#[utoipa::path(
    patch,
    path = "/v1/funnels/{id}",
    tag = "Funis",
    params(("id" = String, Path, description = "ObjectId do funil")),
    request_body = UpdateFunnelPayload,
    responses((status = 200, description = "Funil atualizado")),
    security(("bearer" = []))
)]
pub async fn update_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateFunnelPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let funnel = crud::update(&app_state, EntityKind::Funnel, &id, payload.into_update(), &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::message_with("Funil atualizado com sucesso", funnel))
}

// DELETE /v1/funnels/{id}
#[utoipa::path(
    delete,
    path = "/v1/funnels/{id}",
    tag = "Funis",
    params(("id" = String, Path, description = "ObjectId do funil")),
    responses((status = 200, description = "Funil removido"), (status = 404, description = "Funil não encontrado")),
    security(("bearer" = []))
)]
pub async fn delete_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    crud::delete(&app_state, EntityKind::Funnel, &id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::message("Funil removido com sucesso"))
}

// =============================================================================
//  ETAPAS E POSICIONAMENTOS
// =============================================================================

// POST /v1/funnels/{id}/stages
#[utoipa::path(
    post,
    path = "/v1/funnels/{id}/stages",
    tag = "Funis",
    params(("id" = String, Path, description = "ObjectId do funil")),
    request_body = StagePayload,
    responses((status = 201, description = "Etapa adicionada ao final do funil")),
    security(("bearer" = []))
)]
pub async fn add_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<StagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state.funnel_repo.push_stage(id, payload.to_document()).await?;
        app_state
            .audit
            .record(AuditEntry::new("add_stage", "funnels", id.to_hex(), Some(user.id)));
        app_state.entity_repo.get(EntityKind::Funnel, id).await
    }
    .await;

    let funnel = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((
        StatusCode::CREATED,
        response::message_with("Etapa adicionada com sucesso", document_to_json(funnel)),
    ))
}

// PATCH /v1/funnels/{id}/stages/{index}
#[utoipa::path(
    patch,
    path = "/v1/funnels/{id}/stages/{index}",
    tag = "Funis",
    params(
        ("id" = String, Path, description = "ObjectId do funil"),
        ("index" = usize, Path, description = "Posição da etapa (a partir de 0)")
    ),
    request_body = UpdateStagePayload,
    responses((status = 200, description = "Etapa atualizada"), (status = 400, description = "Índice inválido")),
    security(("bearer" = []))
)]
pub async fn update_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, index)): Path<(String, usize)>,
    Json(payload): Json<UpdateStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state
            .funnel_repo
            .update_stage(id, index, payload.into_update(index))
            .await?;
        app_state
            .audit
            .record(AuditEntry::new("update_stage", "funnels", id.to_hex(), Some(user.id)));
        app_state.entity_repo.get(EntityKind::Funnel, id).await
    }
    .await;

    let funnel = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Etapa atualizada com sucesso", document_to_json(funnel)))
}

// POST /v1/funnels/{id}/placements
#[utoipa::path(
    post,
    path = "/v1/funnels/{id}/placements",
    tag = "Funis",
    params(("id" = String, Path, description = "ObjectId do funil")),
    request_body = CreatePlacementPayload,
    responses((status = 201, description = "Lead ou orçamento posicionado")),
    security(("bearer" = []))
)]
pub async fn add_placement(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<CreatePlacementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        let placement = payload.into_document()?;
        app_state.funnel_repo.add_placement(id, placement.clone()).await?;
        app_state
            .audit
            .record(AuditEntry::new("add_placement", "funnels", id.to_hex(), Some(user.id)));
        Ok::<_, AppError>(placement)
    }
    .await;

    let placement = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((
        StatusCode::CREATED,
        response::message_with("Posicionamento criado com sucesso", document_to_json(placement)),
    ))
}

// DELETE /v1/funnels/{id}/placements/{placement_id}
#[utoipa::path(
    delete,
    path = "/v1/funnels/{id}/placements/{placement_id}",
    tag = "Funis",
    params(
        ("id" = String, Path, description = "ObjectId do funil"),
        ("placement_id" = String, Path, description = "ObjectId do posicionamento")
    ),
    responses((status = 200, description = "Posicionamento removido")),
    security(("bearer" = []))
)]
pub async fn delete_placement(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, placement_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        let placement_id = parse_object_id("placement_id", &placement_id)?;
        app_state.funnel_repo.remove_placement(id, placement_id).await?;
        app_state
            .audit
            .record(AuditEntry::new("delete_placement", "funnels", id.to_hex(), Some(user.id)));
        Ok::<_, AppError>(())
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message("Posicionamento removido com sucesso"))
}
