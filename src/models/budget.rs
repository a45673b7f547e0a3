// src/models/budget.rs

use mongodb::bson::{doc, Bson, Document};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    dates::{parse_instant, to_bson_datetime},
    db_utils::parse_optional_object_id,
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const BUDGET_FILTERS: FilterSpec = &[
    ("seller", FieldKind::ObjectId),
    ("related_client", FieldKind::ObjectId),
    ("related_lead", FieldKind::ObjectId),
    ("payment_method", FieldKind::Text),
    ("approved", FieldKind::Bool),
    ("created_at", FieldKind::Date),
];

/// Parcela de cobrança: `{ value, date }`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InstallmentPayload {
    #[validate(range(min = 0.01, message = "O valor da parcela deve ser positivo"))]
    #[schema(example = 450.0)]
    pub value: f64,
    #[schema(example = "2024-03-10")]
    pub date: String,
}

fn installments_to_bson(items: &[InstallmentPayload]) -> Result<Vec<Bson>, AppError> {
    items
        .iter()
        .map(|item| {
            let date = parse_instant(&item.date)
                .ok_or_else(|| AppError::InvalidPayload(format!("data de parcela inválida: {}", item.date)))?;
            Ok(Bson::Document(doc! {
                "value": item.value,
                "date": to_bson_datetime(date),
            }))
        })
        .collect()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBudgetPayload {
    pub seller: Option<String>,
    pub related_client: Option<String>,
    pub related_lead: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[schema(example = "pix")]
    pub payment_method: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub installments: Vec<InstallmentPayload>,
    /// Lista de produtos no formato JSON livre usado pelos orçamentos antigos.
    pub product_list: Option<String>,
    pub notes: Option<String>,
}

impl CreateBudgetPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let mut document = doc! {
            "approved": self.approved,
            "installments": installments_to_bson(&self.installments)?,
        };
        for (key, raw) in [
            ("seller", self.seller.as_deref()),
            ("related_client", self.related_client.as_deref()),
            ("related_lead", self.related_lead.as_deref()),
        ] {
            if let Some(id) = parse_optional_object_id(key, raw)? {
                document.insert(key, id);
            }
        }
        for (key, value) in [
            ("payment_method", self.payment_method),
            ("product_list", self.product_list),
            ("notes", self.notes),
        ] {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                document.insert(key, v);
            }
        }
        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBudgetPayload {
    pub seller: Option<String>,
    pub related_client: Option<String>,
    pub related_lead: Option<String>,
    pub approved: Option<bool>,
    pub payment_method: Option<String>,
    #[validate(nested)]
    pub installments: Option<Vec<InstallmentPayload>>,
    pub product_list: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBudgetPayload {
    pub fn into_update(self) -> Result<PartialUpdate, AppError> {
        let installments = self
            .installments
            .as_deref()
            .map(installments_to_bson)
            .transpose()?
            .map(Bson::Array);

        Ok(PartialUpdate::new()
            .object_id("seller", self.seller.as_deref())?
            .object_id("related_client", self.related_client.as_deref())?
            .object_id("related_lead", self.related_lead.as_deref())?
            .flag("approved", self.approved)
            .text("payment_method", self.payment_method)
            .text("product_list", self.product_list)
            .text("notes", self.notes)
            .raw("installments", installments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parcelas_com_data_invalida_sao_rejeitadas() {
        let payload = CreateBudgetPayload {
            seller: None,
            related_client: None,
            related_lead: None,
            approved: true,
            payment_method: Some("pix".into()),
            installments: vec![InstallmentPayload { value: 100.0, date: "10/03/2024".into() }],
            product_list: None,
            notes: None,
        };
        assert!(matches!(payload.into_document(), Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn aprovacao_falsa_e_aplicada() {
        let update = UpdateBudgetPayload { approved: Some(false), ..Default::default() }
            .into_update()
            .unwrap();
        assert!(!update.fields().get_bool("approved").unwrap());
        assert!(!update.fields().contains_key("installments"));
    }

    #[test]
    fn parcelas_viram_datas_bson() {
        let update = UpdateBudgetPayload {
            installments: Some(vec![
                InstallmentPayload { value: 100.0, date: "2024-03-10".into() },
                InstallmentPayload { value: 50.0, date: "2024-04-10T12:00:00Z".into() },
            ]),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        let items = update.fields().get_array("installments").unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].as_document().unwrap().get_datetime("date").is_ok());
    }
}
