// src/services/whatsapp.rs

use serde_json::{json, Value};

use crate::common::error::AppError;

/// Número remetente e a chave de API que o autentica no provedor.
#[derive(Debug, Clone)]
pub struct SenderAccount {
    pub phone: String,
    pub api_key: String,
}

/// Cliente do provedor de WhatsApp (API no formato 360dialog).
#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    base_url: String,
    primary: SenderAccount,
    secondary: Option<SenderAccount>,
}

impl WhatsAppClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        primary: SenderAccount,
        secondary: Option<SenderAccount>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            primary,
            secondary,
        }
    }

    /// A chave é a do número dono da conversa; sem correspondência, usa o principal.
    pub fn account_for(&self, sender_phone: Option<&str>) -> &SenderAccount {
        match (sender_phone, &self.secondary) {
            (Some(phone), Some(secondary)) if same_phone(phone, &secondary.phone) => secondary,
            _ => &self.primary,
        }
    }

    /// Envia um texto e devolve o id da mensagem no provedor.
    pub async fn send_text(&self, sender_phone: Option<&str>, to: &str, body: &str) -> Result<String, AppError> {
        let account = self.account_for(sender_phone);
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("D360-API-KEY", &account.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Provedor recusou o envio: {}", detail);
            return Err(AppError::ProviderError(format!("status {}", status.as_u16())));
        }

        let body: Value = response.json().await?;
        body.pointer("/messages/0/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::ProviderError("resposta sem id de mensagem".into()))
    }
}

fn digits(raw: &str) -> impl Iterator<Item = char> + '_ {
    raw.chars().filter(char::is_ascii_digit)
}

fn same_phone(a: &str, b: &str) -> bool {
    digits(a).eq(digits(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};

    fn accounts() -> (SenderAccount, SenderAccount) {
        (
            SenderAccount { phone: "5511900000001".into(), api_key: "chave-principal".into() },
            SenderAccount { phone: "+55 11 90000-0002".into(), api_key: "chave-secundaria".into() },
        )
    }

    #[test]
    fn escolhe_a_chave_pelo_numero_da_conversa() {
        let (primary, secondary) = accounts();
        let client = WhatsAppClient::new(reqwest::Client::new(), "http://x/".into(), primary, Some(secondary));

        assert_eq!(client.account_for(Some("5511900000002")).api_key, "chave-secundaria");
        assert_eq!(client.account_for(Some("5511900000001")).api_key, "chave-principal");
        assert_eq!(client.account_for(None).api_key, "chave-principal");
    }

    async fn fake_provider(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, axum::http::StatusCode> {
        match headers.get("D360-API-KEY").and_then(|v| v.to_str().ok()) {
            Some("chave-principal") if body["text"]["body"] == "oi" => {
                Ok(Json(json!({ "messages": [{ "id": "wamid.XYZ" }] })))
            }
            _ => Err(axum::http::StatusCode::UNAUTHORIZED),
        }
    }

    #[tokio::test]
    async fn envio_devolve_id_ou_erro_de_provedor() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/messages", post(fake_provider)))
                .await
                .unwrap();
        });

        let (primary, secondary) = accounts();
        let client = WhatsAppClient::new(reqwest::Client::new(), format!("http://{addr}"), primary, Some(secondary));

        assert_eq!(client.send_text(None, "5511988887777", "oi").await.unwrap(), "wamid.XYZ");

        let err = client
            .send_text(Some("5511900000002"), "5511988887777", "oi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderError(_)));
    }
}
