// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro interno. Cada variante tem um código numérico estável
// que vai embutido na mensagem devolvida ao cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("ID inválido no campo '{0}'")]
    InvalidId(String),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Valor '{value}' inválido para o campo '{field}'")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("Intervalo de datas inválido ou ausente")]
    InvalidDateRange,

    #[error("Tipo de relatório desconhecido: {0}")]
    UnknownReportType(String),

    #[error("Nenhuma métrica reconhecida foi solicitada")]
    NoMetricsRequested,

    #[error("Índice de etapa inválido: {0}")]
    InvalidStageIndex(usize),

    #[error("Payload inválido: {0}")]
    InvalidPayload(String),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    #[error("Tempo limite do banco de dados excedido")]
    DatabaseTimeout,

    #[error("Erro no banco legado: {0}")]
    LegacyDatabaseError(#[from] sqlx::Error),

    #[error("Erro no provedor externo: {0}")]
    ProviderError(String),

    #[error("Erro de serialização BSON: {0}")]
    BsonError(#[from] mongodb::bson::ser::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl AppError {
    /// Código interno estável, usado pelo frontend para identificar a falha.
    pub fn code(&self) -> u16 {
        match self {
            AppError::ValidationError(_) => 1001,
            AppError::InvalidId(_) => 1002,
            AppError::MissingField(_) => 1003,
            AppError::InvalidEnumValue { .. } => 1004,
            AppError::InvalidDateRange => 1005,
            AppError::UnknownReportType(_) => 1006,
            AppError::NoMetricsRequested => 1007,
            AppError::InvalidStageIndex(_) => 1008,
            AppError::InvalidPayload(_) => 1009,
            AppError::NotFound(_) => 2001,
            AppError::InvalidToken => 3001,
            AppError::Forbidden => 3002,
            AppError::DatabaseError(_) => 4001,
            AppError::DatabaseTimeout => 4002,
            AppError::LegacyDatabaseError(_) => 4003,
            AppError::ProviderError(_) => 4004,
            AppError::BsonError(_) => 5001,
            AppError::InternalServerError(_) => 5000,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidId(_)
            | AppError::MissingField(_)
            | AppError::InvalidEnumValue { .. }
            | AppError::InvalidDateRange
            | AppError::UnknownReportType(_)
            | AppError::NoMetricsRequested
            | AppError::InvalidStageIndex(_)
            | AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::DatabaseTimeout
            | AppError::LegacyDatabaseError(_)
            | AppError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            AppError::BsonError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte para o erro de resposta, traduzindo a mensagem para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            // O detalhe fica só no log; o cliente recebe a mensagem genérica.
            tracing::error!(code, "Erro Interno do Servidor: {}", self);
        }

        let text = match self {
            AppError::InvalidId(field) | AppError::InvalidPayload(field) => {
                i18n.format(&locale.0, code, field)
            }
            AppError::MissingField(field) => i18n.format(&locale.0, code, field),
            AppError::InvalidEnumValue { field, .. } => i18n.format(&locale.0, code, field),
            AppError::UnknownReportType(kind) => i18n.format(&locale.0, code, kind),
            AppError::InvalidStageIndex(index) => i18n.format(&locale.0, code, &index.to_string()),
            AppError::NotFound(entity) => i18n.format(&locale.0, code, entity),
            _ => i18n.message(&locale.0, code).to_string(),
        };

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            message: format!("[{}] {}", code, text),
            details,
        }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> HashMap<String, Vec<String>> {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    details
}

// O erro que realmente sai pela API: status + envelope `{ message }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "message": self.message, "details": details }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado fora dos handlers (middlewares), onde não temos o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensagem_leva_o_codigo_interno() {
        let err = AppError::NotFound("Lead").to_api_error(&Locale::default(), &I18nStore::default());
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.starts_with("[2001] "));
        assert!(err.message.contains("Lead"));
    }

    #[test]
    fn falhas_de_upstream_viram_bad_gateway() {
        assert_eq!(AppError::DatabaseTimeout.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::ProviderError("500".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn traduz_para_ingles() {
        let err = AppError::NoMetricsRequested
            .to_api_error(&Locale("en".to_string()), &I18nStore::default());
        assert_eq!(err.message, "[1007] No recognized metric was requested");
    }
}
