// src/services/ingestion.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::space_desk::{ContactMetadata, InboundMessage, SpaceDeskEvent, StatusUpdate},
    services::fanout::FanoutRegistry,
};

/// Onde os eventos do provedor são gravados.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn save_raw_event(&self, event: &Value) -> Result<(), AppError>;
    async fn upsert_contact(&self, contact: &ContactMetadata) -> Result<(), AppError>;
    async fn update_message_status(&self, update: &StatusUpdate) -> Result<(), AppError>;
    /// Cria o chat do telefone se preciso, grava a mensagem e renova o resumo do chat.
    async fn record_inbound_message(&self, message: &InboundMessage) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub contacts_updated: usize,
    pub messages_recorded: usize,
    pub statuses_updated: usize,
    pub delivered: usize,
}

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn EventStore>,
    fanout: Arc<FanoutRegistry>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn EventStore>, fanout: Arc<FanoutRegistry>) -> Self {
        Self { store, fanout }
    }

    /// Grava o evento bruto e só então faz os efeitos colaterais. As
    /// atualizações de metadados são best-effort; o broadcast acontece sempre
    /// que a gravação der certo.
    pub async fn ingest(&self, event: Value) -> Result<IngestOutcome, AppError> {
        self.store.save_raw_event(&event).await?;

        let mut contacts_updated = 0;
        let contacts = extract_contacts(&event);
        if contacts.is_empty() {
            tracing::debug!("Evento sem contato/timestamp; metadados não atualizados");
        }
        for contact in &contacts {
            match self.store.upsert_contact(contact).await {
                Ok(()) => contacts_updated += 1,
                Err(e) => tracing::warn!(phone = %contact.phone, "Falha ao atualizar contato: {}", e),
            }
        }

        let mut messages_recorded = 0;
        for message in extract_inbound_messages(&event) {
            match self.store.record_inbound_message(&message).await {
                Ok(()) => messages_recorded += 1,
                Err(e) => tracing::warn!(
                    wa_message_id = %message.wa_message_id,
                    "Falha ao registrar mensagem recebida: {}", e
                ),
            }
        }

        let mut statuses_updated = 0;
        for update in extract_statuses(&event) {
            match self.store.update_message_status(&update).await {
                Ok(()) => statuses_updated += 1,
                Err(e) => tracing::warn!(
                    wa_message_id = %update.wa_message_id,
                    "Falha ao atualizar status da mensagem: {}", e
                ),
            }
        }

        let delivered = self
            .fanout
            .broadcast(&SpaceDeskEvent::new("whatsapp_event", event))
            .await;

        Ok(IngestOutcome {
            contacts_updated,
            messages_recorded,
            statuses_updated,
            delivered,
        })
    }
}

/// Os `value` de `entry[].changes[]`. Qualquer nível ausente simplesmente
/// não produz nada.
fn change_values(event: &Value) -> impl Iterator<Item = &Value> {
    event
        .get("entry")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get("changes").and_then(Value::as_array))
        .flatten()
        .filter_map(|change| change.get("value"))
}

fn parse_unix_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
}

/// Telefone do contato e timestamp mais recente de cada `value` do evento.
pub fn extract_contacts(event: &Value) -> Vec<ContactMetadata> {
    change_values(event)
        .filter_map(|value| {
            let phone = value.pointer("/contacts/0/wa_id")?.as_str()?;
            let last_message_at = value
                .get("messages")?
                .as_array()?
                .iter()
                .filter_map(|m| m.get("timestamp").and_then(parse_unix_timestamp))
                .max()?;
            Some(ContactMetadata {
                phone: phone.to_string(),
                last_message_at,
            })
        })
        .collect()
}

/// Mensagens de `value.messages[]`. O remetente vem de `from`, ou do
/// primeiro contato quando `from` falta; sem id ou remetente a mensagem é pulada.
pub fn extract_inbound_messages(event: &Value) -> Vec<InboundMessage> {
    let mut found = Vec::new();
    for value in change_values(event) {
        let Some(messages) = value.get("messages").and_then(Value::as_array) else {
            continue;
        };
        let business_phone = value
            .pointer("/metadata/display_phone_number")
            .and_then(Value::as_str)
            .map(str::to_string);
        let contacts = value.get("contacts").and_then(Value::as_array);

        for message in messages {
            let Some(wa_message_id) = message.get("id").and_then(Value::as_str) else {
                continue;
            };
            let phone = message
                .get("from")
                .and_then(Value::as_str)
                .or_else(|| value.pointer("/contacts/0/wa_id").and_then(Value::as_str));
            let Some(phone) = phone else {
                continue;
            };

            let contact_name = contacts
                .into_iter()
                .flatten()
                .find(|c| c.get("wa_id").and_then(Value::as_str) == Some(phone))
                .and_then(|c| c.pointer("/profile/name"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let kind = message.get("type").and_then(Value::as_str).unwrap_or("text");
            let text = message
                .pointer("/text/body")
                .or_else(|| message.get(kind).and_then(|media| media.get("caption")))
                .and_then(Value::as_str)
                .map(str::to_string);

            found.push(InboundMessage {
                wa_message_id: wa_message_id.to_string(),
                phone: phone.to_string(),
                contact_name,
                business_phone: business_phone.clone(),
                kind: kind.to_string(),
                text,
                sent_at: message
                    .get("timestamp")
                    .and_then(parse_unix_timestamp)
                    .unwrap_or_else(Utc::now),
            });
        }
    }
    found
}

pub fn extract_statuses(event: &Value) -> Vec<StatusUpdate> {
    change_values(event)
        .filter_map(|value| value.get("statuses").and_then(Value::as_array))
        .flatten()
        .filter_map(|status| {
            Some(StatusUpdate {
                wa_message_id: status.get("id")?.as_str()?.to_string(),
                status: status.get("status")?.as_str()?.to_string(),
            })
        })
        .collect()
}
