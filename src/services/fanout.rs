// src/services/fanout.rs

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Mutex,
};
use uuid::Uuid;

/// Eventos que podem esperar na fila de uma conexão antes de ela ser
/// considerada travada e removida.
pub const OUTBOX_CAPACITY: usize = 256;

/// Registro das conexões abertas do painel (uma por sessão de WebSocket).
/// Cada conexão é representada pelo canal que alimenta sua task de escrita.
pub struct FanoutRegistry {
    connections: Mutex<HashMap<Uuid, mpsc::Sender<String>>>,
    outbox_capacity: usize,
}

impl Default for FanoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FanoutRegistry {
    pub fn new() -> Self {
        Self::with_outbox_capacity(OUTBOX_CAPACITY)
    }

    pub fn with_outbox_capacity(outbox_capacity: usize) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Registra uma conexão logo após o handshake.
    pub async fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let id = Uuid::new_v4();
        self.connections.lock().await.insert(id, tx);
        tracing::debug!(conn_id = %id, "Conexão do painel registrada");
        (id, rx)
    }

    pub async fn unregister(&self, id: Uuid) {
        if self.connections.lock().await.remove(&id).is_some() {
            tracing::debug!(conn_id = %id, "Conexão do painel removida");
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Serializa o evento uma vez e entrega a todas as conexões.
    pub async fn broadcast<T: Serialize>(&self, event: &T) -> usize {
        match serde_json::to_string(event) {
            Ok(text) => self.broadcast_text(text).await,
            Err(e) => {
                tracing::error!("Falha ao serializar evento para o painel: {}", e);
                0
            }
        }
    }

    /// Entrega sob um único lock, sem esperar por nenhum socket. Conexão
    /// fechada ou com a fila cheia sai do registro; a task de escrita dela
    /// termina quando o canal fecha. Retorna quantas conexões receberam o evento.
    pub async fn broadcast_text(&self, text: String) -> usize {
        let mut connections = self.connections.lock().await;
        let before = connections.len();

        connections.retain(|id, tx| match tx.try_send(text.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %id, "Conexão travada com a fila cheia; removida");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(conn_id = %id, "Conexão fechada removida durante o broadcast");
                false
            }
        });

        let delivered = connections.len();
        if delivered < before {
            tracing::info!(removed = before - delivered, "Conexões quebradas removidas");
        }
        delivered
    }
}
