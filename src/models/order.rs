// src/models/order.rs

use std::str::FromStr;

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    db_utils::parse_optional_object_id,
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const ORDER_FILTERS: FilterSpec = &[
    ("status", FieldKind::Text),
    ("stage", FieldKind::Text),
    ("type", FieldKind::Text),
    ("budget", FieldKind::ObjectId),
    ("seller", FieldKind::ObjectId),
    ("designer", FieldKind::ObjectId),
    ("created_at", FieldKind::Date),
];

// Os três enums chegam como texto e são validados aqui, para que um valor
// fora da lista vire o erro 1004 em vez de uma rejeição do serde.
macro_rules! closed_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::InvalidEnumValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum!(OrderStatus, "status", {
    Pending => "pending",
    InProduction => "in_production",
    Finished => "finished",
    Cancelled => "cancelled",
});

closed_enum!(OrderStage, "stage", {
    Design => "design",
    Approval => "approval",
    Printing => "printing",
    Sewing => "sewing",
    Shipping => "shipping",
    Delivered => "delivered",
});

closed_enum!(OrderType, "type", {
    New => "new",
    Reprint => "reprint",
    Sample => "sample",
});

fn parse_enum<T: FromStr<Err = AppError>>(raw: Option<&str>) -> Result<Option<T>, AppError> {
    raw.filter(|v| !v.trim().is_empty()).map(str::parse).transpose()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderPayload {
    pub budget: Option<String>,
    pub seller: Option<String>,
    pub designer: Option<String>,
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = "design")]
    pub stage: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "new")]
    pub order_type: Option<String>,
    /// Lista de produtos no formato JSON livre dos pedidos antigos.
    pub products: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrderPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let status = parse_enum::<OrderStatus>(self.status.as_deref())?.unwrap_or(OrderStatus::Pending);
        let stage = parse_enum::<OrderStage>(self.stage.as_deref())?.unwrap_or(OrderStage::Design);
        let order_type = parse_enum::<OrderType>(self.order_type.as_deref())?.unwrap_or(OrderType::New);

        let mut document = doc! {
            "status": status.as_str(),
            "stage": stage.as_str(),
            "type": order_type.as_str(),
        };
        for (key, raw) in [
            ("budget", self.budget.as_deref()),
            ("seller", self.seller.as_deref()),
            ("designer", self.designer.as_deref()),
        ] {
            if let Some(id) = parse_optional_object_id(key, raw)? {
                document.insert(key, id);
            }
        }
        for (key, value) in [("products", self.products), ("notes", self.notes)] {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                document.insert(key, v);
            }
        }
        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderPayload {
    pub seller: Option<String>,
    pub designer: Option<String>,
    pub status: Option<String>,
    pub stage: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub products: Option<String>,
    pub notes: Option<String>,
}

impl UpdateOrderPayload {
    pub fn into_update(self) -> Result<PartialUpdate, AppError> {
        let status = parse_enum::<OrderStatus>(self.status.as_deref())?;
        let stage = parse_enum::<OrderStage>(self.stage.as_deref())?;
        let order_type = parse_enum::<OrderType>(self.order_type.as_deref())?;

        Ok(PartialUpdate::new()
            .object_id("seller", self.seller.as_deref())?
            .object_id("designer", self.designer.as_deref())?
            .text("status", status.map(|s| s.as_str().to_string()))
            .text("stage", stage.map(|s| s.as_str().to_string()))
            .text("type", order_type.map(|t| t.as_str().to_string()))
            .text("products", self.products)
            .text("notes", self.notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valor_fora_da_lista_e_rejeitado() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, AppError::InvalidEnumValue { field: "status", .. }));
        assert_eq!("in_production".parse::<OrderStatus>().unwrap(), OrderStatus::InProduction);
        assert_eq!("sewing".parse::<OrderStage>().unwrap(), OrderStage::Sewing);
        assert!("rush".parse::<OrderType>().is_err());
    }

    #[test]
    fn criacao_usa_valores_padrao() {
        let payload = CreateOrderPayload {
            budget: None,
            seller: None,
            designer: None,
            status: None,
            stage: Some("printing".into()),
            order_type: None,
            products: None,
            notes: None,
        };
        let document = payload.into_document().unwrap();
        assert_eq!(document.get_str("status").unwrap(), "pending");
        assert_eq!(document.get_str("stage").unwrap(), "printing");
        assert_eq!(document.get_str("type").unwrap(), "new");
    }

    #[test]
    fn update_com_enum_invalido_falha_antes_de_montar() {
        let err = UpdateOrderPayload { stage: Some("ironing".into()), ..Default::default() }
            .into_update()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidEnumValue { field: "stage", .. }));
    }
}
