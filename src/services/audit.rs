// src/services/audit.rs

use mongodb::bson::{doc, DateTime, Document};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::db::MongoGateway;

const QUEUE_CAPACITY: usize = 256;
const AUDIT_LOGS: &str = "audit_logs";

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: String,
    pub user_id: Option<i64>,
}

impl AuditEntry {
    pub fn new(action: &'static str, entity: &'static str, entity_id: impl Into<String>, user_id: Option<i64>) -> Self {
        Self {
            action,
            entity,
            entity_id: entity_id.into(),
            user_id,
        }
    }

    fn to_document(&self) -> Document {
        doc! {
            "action": self.action,
            "entity": self.entity,
            "entity_id": &self.entity_id,
            "user_id": self.user_id,
            "at": DateTime::now(),
        }
    }
}

/// Fila limitada de auditoria. Um único worker grava em `audit_logs`; quem
/// registra nunca espera nem falha por causa da auditoria.
#[derive(Clone)]
pub struct AuditQueue {
    sender: mpsc::Sender<AuditEntry>,
}

impl AuditQueue {
    pub fn spawn(gateway: MongoGateway) -> Self {
        let (sender, mut receiver) = mpsc::channel::<AuditEntry>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            let coll = gateway.collection(AUDIT_LOGS);
            while let Some(entry) = receiver.recv().await {
                if let Err(e) = gateway.run(coll.insert_one(entry.to_document())).await {
                    tracing::error!(
                        action = entry.action,
                        entity = entry.entity,
                        entity_id = %entry.entity_id,
                        "Falha ao gravar auditoria: {}", e
                    );
                }
            }
            tracing::debug!("Fila de auditoria encerrada");
        });

        Self { sender }
    }

    #[cfg(test)]
    fn with_sender(sender: mpsc::Sender<AuditEntry>) -> Self {
        Self { sender }
    }

    pub fn record(&self, entry: AuditEntry) {
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(action = entry.action, entity = entry.entity, "Fila de auditoria cheia; registro descartado");
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(action = entry.action, entity = entry.entity, "Fila de auditoria fechada; registro descartado");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fila_cheia_descarta_sem_bloquear() {
        let (sender, mut receiver) = mpsc::channel(1);
        let queue = AuditQueue::with_sender(sender);

        queue.record(AuditEntry::new("create", "lead", "a", Some(1)));
        queue.record(AuditEntry::new("update", "lead", "a", Some(1)));

        assert_eq!(receiver.recv().await.unwrap().action, "create");
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn fila_fechada_nao_entra_em_panico() {
        let (sender, receiver) = mpsc::channel(4);
        drop(receiver);
        AuditQueue::with_sender(sender).record(AuditEntry::new("delete", "funnel", "b", None));
    }

    #[test]
    fn documento_de_auditoria() {
        let document = AuditEntry::new("create", "order", "abc", Some(9)).to_document();
        assert_eq!(document.get_str("entity").unwrap(), "order");
        assert_eq!(document.get_i64("user_id").unwrap(), 9);
        assert!(document.get_datetime("at").is_ok());
    }
}
