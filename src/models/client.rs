// src/models/client.rs

use mongodb::bson::{doc, Document};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    db_utils::parse_optional_object_id,
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const CLIENT_FILTERS: FilterSpec = &[
    ("name", FieldKind::Text),
    ("segment", FieldKind::Text),
    ("contact.phone", FieldKind::Text),
    ("contact.email", FieldKind::Text),
    ("contact.document", FieldKind::Text),
    ("related_lead", FieldKind::ObjectId),
    ("created_at", FieldKind::Date),
];

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ClientContact {
    pub phone: Option<String>,
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    /// CPF ou CNPJ
    pub document: Option<String>,
    pub address: Option<String>,
}

impl ClientContact {
    fn to_document(&self) -> Document {
        let mut contact = Document::new();
        for (key, value) in [
            ("phone", &self.phone),
            ("email", &self.email),
            ("document", &self.document),
            ("address", &self.address),
        ] {
            if let Some(v) = value.as_ref().filter(|v| !v.trim().is_empty()) {
                contact.insert(key, v.clone());
            }
        }
        contact
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClientPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Colégio Santa Luzia")]
    pub name: String,
    #[schema(example = "escolas")]
    pub segment: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub contact: ClientContact,
    pub related_lead: Option<String>,
}

impl CreateClientPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let mut document = doc! {
            "name": self.name.trim(),
            "contact": self.contact.to_document(),
        };
        if let Some(segment) = self.segment.filter(|s| !s.trim().is_empty()) {
            document.insert("segment", segment);
        }
        if let Some(id) = parse_optional_object_id("related_lead", self.related_lead.as_deref())? {
            document.insert("related_lead", id);
        }
        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClientPayload {
    pub name: Option<String>,
    pub segment: Option<String>,
    #[validate(nested)]
    pub contact: Option<ClientContact>,
    pub related_lead: Option<String>,
}

impl UpdateClientPayload {
    /// Campos do contato são aplicados um a um (`contact.phone`, ...), para
    /// não sobrescrever o sub-documento inteiro.
    pub fn into_update(self) -> Result<PartialUpdate, AppError> {
        let mut update = PartialUpdate::new()
            .text("name", self.name)
            .text("segment", self.segment)
            .object_id("related_lead", self.related_lead.as_deref())?;

        if let Some(contact) = self.contact {
            update = update
                .text("contact.phone", contact.phone)
                .text("contact.email", contact.email)
                .text("contact.document", contact.document)
                .text("contact.address", contact.address);
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contato_parcial_vira_caminhos_pontuados() {
        let update = UpdateClientPayload {
            contact: Some(ClientContact {
                phone: Some("5511988887777".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
        .into_update()
        .unwrap();

        assert_eq!(update.fields().get_str("contact.phone").unwrap(), "5511988887777");
        assert!(!update.fields().contains_key("contact.email"));
        assert!(!update.fields().contains_key("contact"));
    }
}
