// src/handlers/webhooks.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    common::{
        error::{ApiError, AppError},
        response,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::space_desk::WebhookVerifyQuery,
};

// GET /v1/webhooks/whatsapp
#[utoipa::path(
    get,
    path = "/v1/webhooks/whatsapp",
    tag = "Webhooks",
    params(
        ("hub.mode" = String, Query, description = "Sempre `subscribe`"),
        ("hub.verify_token" = String, Query, description = "Token combinado com o provedor"),
        ("hub.challenge" = String, Query, description = "Valor devolvido em caso de sucesso")
    ),
    responses((status = 200, description = "Desafio ecoado"), (status = 403, description = "Token incorreto"))
)]
pub async fn verify_whatsapp(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<WebhookVerifyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let expected = app_state.config.whatsapp_verify_token.as_str();
    match (query.mode.as_deref(), query.verify_token.as_deref(), query.challenge) {
        (Some("subscribe"), Some(token), Some(challenge)) if token == expected => {
            tracing::info!("Webhook do WhatsApp verificado");
            Ok((StatusCode::OK, challenge))
        }
        _ => {
            tracing::warn!("Verificação de webhook recusada");
            Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store))
        }
    }
}

// POST /v1/webhooks/whatsapp
#[utoipa::path(
    post,
    path = "/v1/webhooks/whatsapp",
    tag = "Webhooks",
    request_body = Object,
    responses(
        (status = 200, description = "Evento gravado e repassado aos painéis"),
        (status = 502, description = "Falha ao gravar o evento")
    )
)]
pub async fn receive_whatsapp(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(event): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    if !event.is_object() {
        return Err(AppError::InvalidPayload("o evento deve ser um objeto JSON".into())
            .to_api_error(&locale, &app_state.i18n_store));
    }

    let outcome = app_state
        .ingestion_service
        .ingest(event)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(
        contacts = outcome.contacts_updated,
        messages = outcome.messages_recorded,
        statuses = outcome.statuses_updated,
        delivered = outcome.delivered,
        "Evento do WhatsApp processado"
    );

    Ok(response::message_with(
        "Evento recebido",
        json!({ "delivered": outcome.delivered }),
    ))
}
