// src/models/space_desk.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::listing::{FieldKind, FilterSpec};

pub const CHAT_FILTERS: FilterSpec = &[
    ("name", FieldKind::Text),
    ("phone", FieldKind::Text),
    ("sender_phone", FieldKind::Text),
    ("groups", FieldKind::ObjectId),
];

/// Mensagem trocada com o painel pelo WebSocket: `{ action, payload, detail }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceDeskEvent {
    pub action: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SpaceDeskEvent {
    pub fn new(action: &str, payload: Value) -> Self {
        Self {
            action: action.to_string(),
            payload,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Resumo extraído de um evento do provedor: telefone e horário da última mensagem.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMetadata {
    pub phone: String,
    pub last_message_at: DateTime<Utc>,
}

/// Mensagem recebida de um contato, já separada do payload do provedor.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub wa_message_id: String,
    pub phone: String,
    pub contact_name: Option<String>,
    /// Número da empresa que recebeu a mensagem (`metadata.display_phone_number`).
    pub business_phone: Option<String>,
    pub kind: String,
    pub text: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Texto usado no resumo do chat; mídia sem legenda vira `[tipo]`.
    pub fn preview(&self) -> String {
        match &self.text {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => format!("[{}]", self.kind),
        }
    }
}

/// Atualização de status de entrega (`sent`, `delivered`, `read`, `failed`).
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub wa_message_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendTextPayload {
    #[validate(length(min = 1, max = 4096, message = "A mensagem não pode ser vazia"))]
    #[schema(example = "Olá! Seu pedido já está em produção.")]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupPayload {
    #[validate(length(min = 1, message = "O nome do grupo é obrigatório"))]
    #[schema(example = "Atendimento Escolas")]
    pub name: String,
    /// Ids numéricos dos usuários no serviço de autenticação.
    #[serde(default)]
    pub users: Vec<i64>,
    #[serde(default)]
    pub chats: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGroupPayload {
    pub name: Option<String>,
    #[serde(default)]
    pub add_users: Vec<i64>,
    #[serde(default)]
    pub add_chats: Vec<String>,
}
