// src/handlers/users.rs

use axum::response::IntoResponse;

use crate::{common::response, middleware::auth::AuthenticatedUser, models::auth::AuthUser};

// GET /v1/users/me
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Usuários",
    responses(
        (status = 200, description = "Usuário dono do token", body = AuthUser),
        (status = 401, description = "Token ausente ou recusado")
    ),
    security(("bearer" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    response::data(user)
}
