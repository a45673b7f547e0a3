// src/handlers/space_desk.rs

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
        db_utils::{document_to_json, parse_object_id, parse_object_ids},
        error::{ApiError, AppError},
        listing::{build_filter, Pagination},
        response,
    },
    config::AppState,
    db::GroupChanges,
    middleware::{
        auth::{AdminUser, AuthenticatedUser},
        i18n::Locale,
    },
    models::space_desk::{CreateGroupPayload, SendTextPayload, UpdateGroupPayload, CHAT_FILTERS},
    services::audit::AuditEntry,
};

// =============================================================================
//  CHATS
// =============================================================================

// GET /v1/space-desk/chats
#[utoipa::path(
    get,
    path = "/v1/space-desk/chats",
    tag = "Space Desk",
    params(
        ("page" = Option<u64>, Query, description = "Página (a partir de 1)"),
        ("groups" = Option<String>, Query, description = "ObjectId de um grupo")
    ),
    responses((status = 200, description = "Página de chats")),
    security(("bearer" = []))
)]
pub async fn list_chats(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let filter = build_filter(&params, CHAT_FILTERS)?;
        app_state
            .space_desk_service
            .repo()
            .list_chats(filter, Pagination::from_params(&params))
            .await
    }
    .await;

    let page = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(page.map(document_to_json)))
}

// DELETE /v1/space-desk/chats/{id}
#[utoipa::path(
    delete,
    path = "/v1/space-desk/chats/{id}",
    tag = "Space Desk",
    params(("id" = String, Path, description = "ObjectId do chat")),
    responses((status = 200, description = "Chat e mensagens removidos"), (status = 404, description = "Chat não encontrado")),
    security(("bearer" = []))
)]
pub async fn delete_chat(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state.space_desk_service.delete_chat(id).await?;
        app_state
            .audit
            .record(AuditEntry::new("delete", "space_desk_chats", id.to_hex(), Some(user.id)));
        Ok::<_, AppError>(())
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message("Chat removido com sucesso"))
}

// GET /v1/space-desk/chats/{id}/messages
#[utoipa::path(
    get,
    path = "/v1/space-desk/chats/{id}/messages",
    tag = "Space Desk",
    params(("id" = String, Path, description = "ObjectId do chat")),
    responses((status = 200, description = "Mensagens do chat, mais recentes primeiro")),
    security(("bearer" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state
            .space_desk_service
            .repo()
            .list_messages(id, Pagination::from_params(&params))
            .await
    }
    .await;

    let page = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::data(page.map(document_to_json)))
}

// POST /v1/space-desk/chats/{id}/messages
#[utoipa::path(
    post,
    path = "/v1/space-desk/chats/{id}/messages",
    tag = "Space Desk",
    params(("id" = String, Path, description = "ObjectId do chat")),
    request_body = SendTextPayload,
    responses(
        (status = 201, description = "Mensagem enviada e registrada"),
        (status = 502, description = "Provedor de WhatsApp recusou ou está fora do ar")
    ),
    security(("bearer" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<SendTextPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state.space_desk_service.send_text(id, &payload.text, &user).await
    }
    .await;

    let message = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, response::message_with("Mensagem enviada", message)))
}

// =============================================================================
//  GRUPOS
// =============================================================================

// GET /v1/space-desk/groups
#[utoipa::path(
    get,
    path = "/v1/space-desk/groups",
    tag = "Space Desk",
    responses((status = 200, description = "Página de grupos")),
    security(("bearer" = []))
)]
pub async fn list_groups(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .space_desk_service
        .repo()
        .list_groups(Pagination::from_params(&params))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(page.map(document_to_json)))
}

// POST /v1/space-desk/groups
#[utoipa::path(
    post,
    path = "/v1/space-desk/groups",
    tag = "Space Desk",
    request_body = CreateGroupPayload,
    responses((status = 201, description = "Grupo criado")),
    security(("bearer" = []))
)]
pub async fn create_group(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateGroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let chats = parse_object_ids("chats", &payload.chats)?;
        let group = app_state
            .space_desk_service
            .repo()
            .create_group(&payload.name, payload.users, chats)
            .await?;
        if let Ok(id) = group.get_object_id("_id") {
            app_state
                .audit
                .record(AuditEntry::new("create", "space_desk_groups", id.to_hex(), Some(user.id)));
        }
        Ok::<_, AppError>(group)
    }
    .await;

    let group = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((
        StatusCode::CREATED,
        response::message_with("Grupo criado com sucesso", document_to_json(group)),
    ))
}

// PATCH /v1/space-desk/groups/{id}
#[utoipa::path(
    patch,
    path = "/v1/space-desk/groups/{id}",
    tag = "Space Desk",
    params(("id" = String, Path, description = "ObjectId do grupo")),
    request_body = UpdateGroupPayload,
    responses((status = 200, description = "Grupo atualizado")),
    security(("bearer" = []))
)]
pub async fn update_group(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        let changes = GroupChanges {
            name: payload.name,
            add_users: payload.add_users,
            add_chats: parse_object_ids("add_chats", &payload.add_chats)?,
        };
        let group = app_state.space_desk_service.repo().update_group(id, &changes).await?;
        app_state
            .audit
            .record(AuditEntry::new("update", "space_desk_groups", id.to_hex(), Some(user.id)));
        Ok::<_, AppError>(group)
    }
    .await;

    let group = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message_with("Grupo atualizado com sucesso", document_to_json(group)))
}

// DELETE /v1/space-desk/groups/{id}
#[utoipa::path(
    delete,
    path = "/v1/space-desk/groups/{id}",
    tag = "Space Desk",
    params(("id" = String, Path, description = "ObjectId do grupo")),
    responses(
        (status = 200, description = "Grupo removido e desvinculado dos chats"),
        (status = 403, description = "Somente administradores")
    ),
    security(("bearer" = []))
)]
pub async fn delete_group(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let id = parse_object_id("id", &id)?;
        app_state.space_desk_service.repo().delete_group(id).await?;
        app_state
            .audit
            .record(AuditEntry::new("delete", "space_desk_groups", id.to_hex(), Some(admin.id)));
        Ok::<_, AppError>(())
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(response::message("Grupo removido com sucesso"))
}
