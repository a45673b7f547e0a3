// src/handlers/ws.rs

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::{config::AppState, middleware::auth::AuthenticatedUser, services::fanout::FanoutRegistry};

// GET /v1/space-desk/ws
pub async fn space_desk_socket(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    tracing::info!(user_id = user.id, "Pedido de conexão do painel");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user.id))
}

async fn handle_socket(socket: WebSocket, app_state: AppState, user_id: i64) {
    let (sender, receiver) = socket.split();
    run_session(sender, receiver, app_state.fanout.clone(), user_id).await;
}

/// Uma task escreve o que chega pelo canal do registro; a leitura repassa
/// para todos qualquer JSON válido enviado pelo cliente. Quando uma das
/// duas termina, a conexão sai do registro.
async fn run_session<S, R, E>(mut sender: S, mut receiver: R, fanout: Arc<FanoutRegistry>, user_id: i64)
where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let (conn_id, mut outbox) = fanout.register().await;
    tracing::info!(%conn_id, user_id, "Painel conectado");

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let echo = fanout.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let text = text.as_str().to_string();
                    if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
                        echo.broadcast_text(text).await;
                    } else {
                        tracing::debug!(%conn_id, "Mensagem do painel ignorada: não é JSON");
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    fanout.unregister(conn_id).await;
    tracing::info!(%conn_id, "Painel desconectado");
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc;

    use super::*;

    #[tokio::test]
    async fn json_do_painel_volta_para_todos_e_conexao_sai_ao_fechar() {
        let fanout = Arc::new(FanoutRegistry::new());
        let (_other_id, mut other) = fanout.register().await;

        let (client_tx, server_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (server_tx, mut client_rx) = mpsc::unbounded::<Message>();
        let session = tokio::spawn(run_session(server_tx, server_rx, fanout.clone(), 7));

        client_tx
            .unbounded_send(Ok(Message::Text(r#"{"chat":"abc"}"#.into())))
            .unwrap();

        assert_eq!(other.recv().await.unwrap(), r#"{"chat":"abc"}"#);
        match client_rx.next().await {
            Some(Message::Text(text)) => assert_eq!(text.as_str(), r#"{"chat":"abc"}"#),
            unexpected => panic!("esperava texto, veio {unexpected:?}"),
        }

        client_tx.unbounded_send(Ok(Message::Text("oi".into()))).unwrap();
        drop(client_tx);
        session.await.unwrap();

        assert!(other.try_recv().is_err(), "texto que não é JSON não é repassado");
        assert_eq!(fanout.len().await, 1);
    }
}
