// src/models/lead.rs

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    db_utils::{parse_object_ids, parse_optional_object_id},
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const LEAD_FILTERS: FilterSpec = &[
    ("name", FieldKind::Text),
    ("phone", FieldKind::Text),
    ("email", FieldKind::Text),
    ("origin", FieldKind::Text),
    ("segment", FieldKind::Text),
    ("responsible", FieldKind::ObjectId),
    ("related_client", FieldKind::ObjectId),
    ("created_at", FieldKind::Date),
];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Colégio Santa Luzia")]
    pub name: String,
    #[schema(example = "5511999990000")]
    pub phone: Option<String>,
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    #[schema(example = "instagram")]
    pub origin: Option<String>,
    #[schema(example = "escolas")]
    pub segment: Option<String>,
    pub responsible: Option<String>,
    pub related_client: Option<String>,
    #[serde(default)]
    pub related_budgets: Vec<String>,
    #[serde(default)]
    pub related_orders: Vec<String>,
    pub notes: Option<String>,
}

impl CreateLeadPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let mut document = doc! {
            "name": self.name.trim(),
            "related_budgets": parse_object_ids("related_budgets", &self.related_budgets)?,
            "related_orders": parse_object_ids("related_orders", &self.related_orders)?,
        };
        for (key, value) in [
            ("phone", self.phone),
            ("email", self.email),
            ("origin", self.origin),
            ("segment", self.segment),
            ("notes", self.notes),
        ] {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                document.insert(key, v);
            }
        }
        if let Some(id) = parse_optional_object_id("responsible", self.responsible.as_deref())? {
            document.insert("responsible", id);
        }
        if let Some(id) = parse_optional_object_id("related_client", self.related_client.as_deref())? {
            document.insert("related_client", id);
        }
        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLeadPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    pub origin: Option<String>,
    pub segment: Option<String>,
    pub responsible: Option<String>,
    pub related_client: Option<String>,
    #[serde(default)]
    pub related_budgets: Vec<String>,
    #[serde(default)]
    pub related_orders: Vec<String>,
    pub notes: Option<String>,
}

impl UpdateLeadPayload {
    pub fn into_update(self) -> Result<PartialUpdate, AppError> {
        let budgets = parse_object_ids("related_budgets", &self.related_budgets)?;
        let orders = parse_object_ids("related_orders", &self.related_orders)?;

        Ok(PartialUpdate::new()
            .text("name", self.name)
            .text("phone", self.phone)
            .text("email", self.email)
            .text("origin", self.origin)
            .text("segment", self.segment)
            .text("notes", self.notes)
            .object_id("responsible", self.responsible.as_deref())?
            .object_id("related_client", self.related_client.as_deref())?
            .raw("related_budgets", Some(budgets.into()))
            .raw("related_orders", Some(orders.into())))
    }
}

/// Faixa de classificação de leads pelo valor histórico de pedidos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeadTier {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
}

impl LeadTier {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_value && value <= self.max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn criacao_converte_referencias() {
        let client = ObjectId::new();
        let payload = CreateLeadPayload {
            name: " Colégio ".into(),
            phone: Some("5511999990000".into()),
            email: None,
            origin: Some("".into()),
            segment: None,
            responsible: None,
            related_client: Some(client.to_hex()),
            related_budgets: vec![],
            related_orders: vec![ObjectId::new().to_hex()],
            notes: None,
        };
        let document = payload.into_document().unwrap();
        assert_eq!(document.get_str("name").unwrap(), "Colégio");
        assert_eq!(document.get_object_id("related_client").unwrap(), client);
        assert!(!document.contains_key("origin"));
        assert_eq!(document.get_array("related_orders").unwrap().len(), 1);
    }

    #[test]
    fn update_nao_apaga_listas_ausentes() {
        let update = UpdateLeadPayload {
            origin: Some("site".into()),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert!(!update.fields().contains_key("related_orders"));
        assert_eq!(update.fields().get_str("origin").unwrap(), "site");
    }

    #[test]
    fn faixa_inclui_os_limites() {
        let tier = LeadTier { name: "Ouro".into(), min_value: 1000.0, max_value: 5000.0 };
        assert!(tier.contains(1000.0));
        assert!(tier.contains(5000.0));
        assert!(!tier.contains(5000.01));
    }
}
