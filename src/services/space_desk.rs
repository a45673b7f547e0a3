// src/services/space_desk.rs

use std::sync::Arc;

use mongodb::bson::{doc, oid::ObjectId, Document};
use serde_json::{json, Value};

use crate::{
    common::{dates::to_bson_datetime, db_utils::document_to_json, error::AppError},
    db::{LastMessage, SpaceDeskRepository},
    models::{
        auth::AuthUser,
        space_desk::{InboundMessage, SpaceDeskEvent},
    },
    services::{fanout::FanoutRegistry, whatsapp::WhatsAppClient},
};

pub fn outbound_message(chat_id: ObjectId, wa_message_id: &str, sender: &AuthUser, text: &str) -> Document {
    doc! {
        "chat_id": chat_id,
        "wa_message_id": wa_message_id,
        "direction": "outbound",
        "type": "text",
        "text": text,
        "sender": { "id": sender.id, "name": &sender.name },
        "status": "sent",
    }
}

pub fn inbound_message(chat_id: ObjectId, message: &InboundMessage) -> Document {
    let mut sender = doc! { "phone": &message.phone };
    if let Some(name) = &message.contact_name {
        sender.insert("name", name.clone());
    }

    let mut document = doc! {
        "chat_id": chat_id,
        "wa_message_id": &message.wa_message_id,
        "direction": "inbound",
        "type": &message.kind,
        "sender": sender,
        "status": "received",
        "sent_at": to_bson_datetime(message.sent_at),
    };
    if let Some(text) = &message.text {
        document.insert("text", text.clone());
    }
    document
}

#[derive(Clone)]
pub struct SpaceDeskService {
    repo: SpaceDeskRepository,
    whatsapp: WhatsAppClient,
    fanout: Arc<FanoutRegistry>,
}

impl SpaceDeskService {
    pub fn new(repo: SpaceDeskRepository, whatsapp: WhatsAppClient, fanout: Arc<FanoutRegistry>) -> Self {
        Self { repo, whatsapp, fanout }
    }

    pub fn repo(&self) -> &SpaceDeskRepository {
        &self.repo
    }

    /// Envia pelo provedor, grava a mensagem, atualiza o resumo do chat e
    /// avisa os painéis conectados.
    pub async fn send_text(&self, chat_id: ObjectId, text: &str, sender: &AuthUser) -> Result<Value, AppError> {
        let chat = self.repo.find_chat(chat_id).await?;
        let to = chat.get_str("phone").map_err(|_| AppError::MissingField("phone"))?;
        let sender_phone = chat.get_str("sender_phone").ok();

        let wa_message_id = self.whatsapp.send_text(sender_phone, to, text).await?;
        tracing::info!(chat_id = %chat_id, %wa_message_id, "Mensagem enviada");

        let message = self
            .repo
            .insert_message(outbound_message(chat_id, &wa_message_id, sender, text))
            .await?;
        self.repo
            .set_last_message(chat_id, &LastMessage::new(sender.name.clone(), text))
            .await?;

        let message = document_to_json(message);
        self.fanout
            .broadcast(&SpaceDeskEvent::new("new_message", message.clone()))
            .await;
        Ok(message)
    }

    pub async fn delete_chat(&self, chat_id: ObjectId) -> Result<u64, AppError> {
        let removed = self.repo.delete_chat(chat_id).await?;
        tracing::info!(chat_id = %chat_id, messages = removed, "Chat removido");

        self.fanout
            .broadcast(
                &SpaceDeskEvent::new("chat_deleted", json!({ "chat_id": chat_id.to_hex() }))
                    .with_detail(format!("{removed} mensagens removidas")),
            )
            .await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensagem_de_saida_guarda_correlacao() {
        let chat = ObjectId::new();
        let user = AuthUser { id: 3, name: "Lia".into(), email: "lia@ex.com".into(), role: None };
        let message = outbound_message(chat, "wamid.1", &user, "Olá");

        assert_eq!(message.get_object_id("chat_id").unwrap(), chat);
        assert_eq!(message.get_str("wa_message_id").unwrap(), "wamid.1");
        assert_eq!(message.get_str("status").unwrap(), "sent");
        assert_eq!(message.get_document("sender").unwrap().get_str("name").unwrap(), "Lia");
    }

    #[test]
    fn mensagem_de_entrada_aponta_para_o_chat() {
        let chat = ObjectId::new();
        let inbound = InboundMessage {
            wa_message_id: "wamid.7".into(),
            phone: "5511999990000".into(),
            contact_name: Some("Ana".into()),
            business_phone: None,
            kind: "text".into(),
            text: Some("Bom dia".into()),
            sent_at: chrono::Utc::now(),
        };
        let message = inbound_message(chat, &inbound);

        assert_eq!(message.get_object_id("chat_id").unwrap(), chat);
        assert_eq!(message.get_str("wa_message_id").unwrap(), "wamid.7");
        assert_eq!(message.get_str("direction").unwrap(), "inbound");
        assert_eq!(message.get_str("text").unwrap(), "Bom dia");
        assert_eq!(message.get_document("sender").unwrap().get_str("name").unwrap(), "Ana");
    }
}
