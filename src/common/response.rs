// src/common/response.rs

use axum::Json;
use serde::Serialize;

/// Envelope padrão das respostas: `{ message?, data? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn data<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        message: None,
        data: Some(data),
    })
}

pub fn message(text: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        message: Some(text.into()),
        data: None,
    })
}

pub fn message_with<T: Serialize>(text: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        message: Some(text.into()),
        data: Some(data),
    })
}
