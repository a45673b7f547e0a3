// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Usuário devolvido pelo serviço externo de autenticação.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.as_deref(), Some("admin") | Some("super_admin"))
    }
}

// O serviço às vezes devolve o usuário puro, às vezes dentro de `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserInfoResponse {
    Wrapped { data: AuthUser },
    Plain(AuthUser),
}

impl UserInfoResponse {
    pub fn into_user(self) -> AuthUser {
        match self {
            UserInfoResponse::Wrapped { data } => data,
            UserInfoResponse::Plain(user) => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aceita_usuario_puro_ou_envelopado() {
        let plain: UserInfoResponse =
            serde_json::from_str(r#"{"id":7,"name":"Bia","email":"bia@ex.com","role":"admin"}"#).unwrap();
        assert!(plain.into_user().is_admin());

        let wrapped: UserInfoResponse =
            serde_json::from_str(r#"{"data":{"id":8,"name":"Caio","email":"caio@ex.com"}}"#).unwrap();
        let user = wrapped.into_user();
        assert_eq!(user.id, 8);
        assert!(!user.is_admin());
    }

    #[test]
    fn registro_malformado_nao_e_usuario() {
        assert!(serde_json::from_str::<UserInfoResponse>(r#"{"message":"Unauthenticated."}"#).is_err());
    }
}
