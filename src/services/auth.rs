// src/services/auth.rs

use reqwest::StatusCode;

use crate::{
    common::error::AppError,
    models::auth::{AuthUser, UserInfoResponse},
};

/// Autenticação delegada: o token do chamador é repassado ao endpoint de
/// user-info do serviço externo. Sem cache e sem sessão local.
#[derive(Clone)]
pub struct AuthService {
    http: reqwest::Client,
    user_info_url: String,
}

impl AuthService {
    pub fn new(http: reqwest::Client, user_info_url: String) -> Self {
        Self { http, user_info_url }
    }

    pub async fn fetch_user(&self, token: &str) -> Result<AuthUser, AppError> {
        let response = self
            .http
            .get(&self.user_info_url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Serviço de autenticação indisponível: {}", e);
                AppError::ProviderError("serviço de autenticação indisponível".into())
            })?;

        if response.status() != StatusCode::OK {
            tracing::debug!(status = %response.status(), "Token recusado pelo serviço de autenticação");
            return Err(AppError::InvalidToken);
        }

        let user = response
            .json::<UserInfoResponse>()
            .await
            .map_err(|_| AppError::InvalidToken)?
            .into_user();

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn user_info(headers: HeaderMap) -> Result<Json<Value>, axum::http::StatusCode> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        match auth {
            "Bearer valido" => Ok(Json(json!({ "id": 1, "name": "Ana", "email": "ana@ex.com", "role": "admin" }))),
            "Bearer quebrado" => Ok(Json(json!({ "ok": true }))),
            _ => Err(axum::http::StatusCode::UNAUTHORIZED),
        }
    }

    async fn spawn_auth_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/user", get(user_info));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/user")
    }

    #[tokio::test]
    async fn resposta_200_com_usuario_autoriza() {
        let service = AuthService::new(reqwest::Client::new(), spawn_auth_server().await);
        let user = service.fetch_user("valido").await.unwrap();
        assert_eq!(user.name, "Ana");
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn qualquer_outra_resposta_recusa() {
        let service = AuthService::new(reqwest::Client::new(), spawn_auth_server().await);
        assert!(matches!(service.fetch_user("expirado").await, Err(AppError::InvalidToken)));
        assert!(matches!(service.fetch_user("quebrado").await, Err(AppError::InvalidToken)));
    }
}
