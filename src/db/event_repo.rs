// src/db/event_repo.rs

use async_trait::async_trait;
use mongodb::bson::{doc, to_bson, DateTime};
use serde_json::Value;

use crate::{
    common::{dates::to_bson_datetime, error::AppError},
    db::{LastMessage, MongoGateway, SpaceDeskRepository},
    models::space_desk::{ContactMetadata, InboundMessage, StatusUpdate},
    services::{ingestion::EventStore, space_desk::inbound_message},
};

const EVENTS: &str = "whatsapp_events";
const CONTACTS: &str = "whatsapp_contacts";
const MESSAGES: &str = "space_desk_messages";

#[derive(Clone)]
pub struct EventRepository {
    gateway: MongoGateway,
    space_desk: SpaceDeskRepository,
}

impl EventRepository {
    pub fn new(gateway: MongoGateway) -> Self {
        Self {
            space_desk: SpaceDeskRepository::new(gateway.clone()),
            gateway,
        }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Guarda o payload como veio, só acrescentando a hora de recebimento.
    async fn save_raw_event(&self, event: &Value) -> Result<(), AppError> {
        let payload = to_bson(event)?;
        let coll = self.gateway.collection(EVENTS);
        self.gateway
            .run(coll.insert_one(doc! { "payload": payload, "received_at": DateTime::now() }))
            .await?;
        Ok(())
    }

    async fn upsert_contact(&self, contact: &ContactMetadata) -> Result<(), AppError> {
        let coll = self.gateway.collection(CONTACTS);
        let update = doc! {
            "$setOnInsert": {
                "name": "",
                "status": "",
                "group": "",
                "created_at": DateTime::now(),
            },
            "$set": { "last_message_at": to_bson_datetime(contact.last_message_at) },
        };
        self.gateway
            .run(coll.update_one(doc! { "phone": &contact.phone }, update).upsert(true))
            .await?;
        Ok(())
    }

    async fn update_message_status(&self, update: &StatusUpdate) -> Result<(), AppError> {
        let coll = self.gateway.collection(MESSAGES);
        let result = self
            .gateway
            .run(coll.update_one(
                doc! { "wa_message_id": &update.wa_message_id },
                doc! { "$set": { "status": &update.status, "updated_at": DateTime::now() } },
            ))
            .await?;

        if result.matched_count == 0 {
            tracing::debug!(wa_message_id = %update.wa_message_id, "Status para mensagem desconhecida");
        }
        Ok(())
    }

    async fn record_inbound_message(&self, message: &InboundMessage) -> Result<(), AppError> {
        let chat_id = self
            .space_desk
            .upsert_chat(
                &message.phone,
                message.contact_name.as_deref(),
                message.business_phone.as_deref(),
            )
            .await?;

        self.space_desk
            .insert_message(inbound_message(chat_id, message))
            .await?;

        let sender = message.contact_name.clone().unwrap_or_else(|| message.phone.clone());
        let last = LastMessage::new(sender, &message.preview()).at(to_bson_datetime(message.sent_at));
        self.space_desk.set_last_message(chat_id, &last).await
    }
}
