// src/models/goal.rs

use std::str::FromStr;

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    dates::{parse_instant, to_bson_datetime},
    db_utils::parse_optional_object_id,
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const GOAL_FILTERS: FilterSpec = &[
    ("seller", FieldKind::ObjectId),
    ("goal_type", FieldKind::Text),
    ("related_to", FieldKind::Text),
    ("starts_at", FieldKind::Date),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Daily,
    Monthly,
    Yearly,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Daily => "daily",
            GoalType::Monthly => "monthly",
            GoalType::Yearly => "yearly",
        }
    }
}

impl FromStr for GoalType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "daily" => Ok(GoalType::Daily),
            "monthly" => Ok(GoalType::Monthly),
            "yearly" => Ok(GoalType::Yearly),
            other => Err(AppError::InvalidEnumValue { field: "goal_type", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GoalTarget {
    Budgets,
    Clients,
    Leads,
    Orders,
}

impl GoalTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalTarget::Budgets => "budgets",
            GoalTarget::Clients => "clients",
            GoalTarget::Leads => "leads",
            GoalTarget::Orders => "orders",
        }
    }
}

impl FromStr for GoalTarget {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "budgets" => Ok(GoalTarget::Budgets),
            "clients" => Ok(GoalTarget::Clients),
            "leads" => Ok(GoalTarget::Leads),
            "orders" => Ok(GoalTarget::Orders),
            other => Err(AppError::InvalidEnumValue { field: "related_to", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGoalPayload {
    pub seller: Option<String>,
    #[schema(example = "monthly")]
    pub goal_type: String,
    #[schema(example = "budgets")]
    pub related_to: String,
    #[validate(range(min = 0.01, message = "A meta deve ser positiva"))]
    #[schema(example = 50000.0)]
    pub value: f64,
    #[schema(example = "2024-03-01")]
    pub starts_at: Option<String>,
    pub description: Option<String>,
}

impl CreateGoalPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let goal_type: GoalType = self.goal_type.parse()?;
        let related_to: GoalTarget = self.related_to.parse()?;

        let mut document = doc! {
            "goal_type": goal_type.as_str(),
            "related_to": related_to.as_str(),
            "value": self.value,
        };
        if let Some(seller) = parse_optional_object_id("seller", self.seller.as_deref())? {
            document.insert("seller", seller);
        }
        if let Some(raw) = self.starts_at.filter(|v| !v.trim().is_empty()) {
            let starts_at = parse_instant(&raw)
                .ok_or_else(|| AppError::InvalidPayload(format!("data de início inválida: {raw}")))?;
            document.insert("starts_at", to_bson_datetime(starts_at));
        }
        if let Some(description) = self.description.filter(|v| !v.trim().is_empty()) {
            document.insert("description", description);
        }
        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGoalPayload {
    pub seller: Option<String>,
    pub goal_type: Option<String>,
    pub related_to: Option<String>,
    pub value: Option<f64>,
    pub description: Option<String>,
}

impl UpdateGoalPayload {
    /// Os enums são validados antes de qualquer escrita: um `goal_type`
    /// inválido não chega ao banco.
    pub fn into_update(self) -> Result<PartialUpdate, AppError> {
        let goal_type = self
            .goal_type
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::parse::<GoalType>)
            .transpose()?;
        let related_to = self
            .related_to
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::parse::<GoalTarget>)
            .transpose()?;

        Ok(PartialUpdate::new()
            .object_id("seller", self.seller.as_deref())?
            .text("goal_type", goal_type.map(|g| g.as_str().to_string()))
            .text("related_to", related_to.map(|r| r.as_str().to_string()))
            .number("value", self.value)
            .text("description", self.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tipos_fechados() {
        assert_eq!("yearly".parse::<GoalType>().unwrap(), GoalType::Yearly);
        assert!("weekly".parse::<GoalType>().is_err());
        assert_eq!("leads".parse::<GoalTarget>().unwrap(), GoalTarget::Leads);
        assert!(matches!(
            "sellers".parse::<GoalTarget>(),
            Err(AppError::InvalidEnumValue { field: "related_to", .. })
        ));
    }

    #[test]
    fn update_com_goal_type_invalido_falha() {
        let err = UpdateGoalPayload {
            goal_type: Some("weekly".into()),
            value: Some(10.0),
            ..Default::default()
        }
        .into_update()
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidEnumValue { field: "goal_type", .. }));
    }

    #[test]
    fn criacao_normaliza_enums() {
        let document = CreateGoalPayload {
            seller: None,
            goal_type: " monthly".into(),
            related_to: "orders".into(),
            value: 120.0,
            starts_at: Some("2024-03-01".into()),
            description: None,
        }
        .into_document()
        .unwrap();
        assert_eq!(document.get_str("goal_type").unwrap(), "monthly");
        assert_eq!(document.get_str("related_to").unwrap(), "orders");
        assert!(document.get_datetime("starts_at").is_ok());
    }
}
