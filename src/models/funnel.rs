// src/models/funnel.rs

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    db_utils::parse_optional_object_id,
    error::AppError,
    listing::{FieldKind, FilterSpec},
    update::PartialUpdate,
};

pub const FUNNEL_FILTERS: FilterSpec = &[("name", FieldKind::Text), ("created_at", FieldKind::Date)];

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StagePayload {
    #[validate(length(min = 1, message = "O nome da etapa é obrigatório"))]
    #[schema(example = "Proposta enviada")]
    pub name: String,
    #[schema(example = "#F5A623")]
    pub color: Option<String>,
}

impl StagePayload {
    pub fn to_document(&self) -> Document {
        let mut stage = doc! { "name": self.name.trim() };
        if let Some(color) = self.color.as_ref().filter(|c| !c.trim().is_empty()) {
            stage.insert("color", color.clone());
        }
        stage
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFunnelPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Vendas Escolas")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub stages: Vec<StagePayload>,
}

impl CreateFunnelPayload {
    pub fn into_document(self) -> Document {
        let stages: Vec<Bson> = self.stages.iter().map(|s| Bson::Document(s.to_document())).collect();
        let mut document = doc! {
            "name": self.name.trim(),
            "stages": stages,
            "placements": [],
        };
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            document.insert("description", description);
        }
        document
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFunnelPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateFunnelPayload {
    pub fn into_update(self) -> PartialUpdate {
        PartialUpdate::new()
            .text("name", self.name)
            .text("description", self.description)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStagePayload {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl UpdateStagePayload {
    /// Atualização pelo caminho do array (`stages.<i>.campo`).
    pub fn into_update(self, index: usize) -> PartialUpdate {
        PartialUpdate::new()
            .text(&format!("stages.{index}.name"), self.name)
            .text(&format!("stages.{index}.color"), self.color)
    }
}

/// Coloca um lead ou um orçamento em uma etapa do funil.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlacementPayload {
    #[schema(example = 0)]
    pub stage_index: usize,
    pub lead: Option<String>,
    pub budget: Option<String>,
}

impl CreatePlacementPayload {
    pub fn into_document(self) -> Result<Document, AppError> {
        let lead = parse_optional_object_id("lead", self.lead.as_deref())?;
        let budget = parse_optional_object_id("budget", self.budget.as_deref())?;

        let mut placement = doc! {
            "_id": ObjectId::new(),
            "stage_index": self.stage_index as i64,
        };
        match (lead, budget) {
            (Some(lead), None) => {
                placement.insert("lead", lead);
            }
            (None, Some(budget)) => {
                placement.insert("budget", budget);
            }
            (None, None) => return Err(AppError::MissingField("lead")),
            (Some(_), Some(_)) => {
                return Err(AppError::InvalidPayload("informe lead ou budget, não os dois".into()));
            }
        }
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etapa_nova_guarda_so_nome_e_cor() {
        let funnel = CreateFunnelPayload {
            name: "Escolas".into(),
            description: None,
            stages: vec![StagePayload { name: " Contato ".into(), color: Some("#000".into()) }],
        }
        .into_document();

        let stage = funnel.get_array("stages").unwrap()[0].as_document().unwrap().clone();
        assert_eq!(stage, doc! { "name": "Contato", "color": "#000" });
        assert!(funnel.get_array("placements").unwrap().is_empty());
    }

    #[test]
    fn etapa_usa_caminho_do_indice() {
        let update = UpdateStagePayload { name: Some("Fechamento".into()), color: None }.into_update(2);
        assert_eq!(update.fields().get_str("stages.2.name").unwrap(), "Fechamento");
        assert_eq!(update.fields().len(), 1);
    }

    #[test]
    fn posicionamento_exige_um_alvo() {
        let empty = CreatePlacementPayload { stage_index: 0, lead: None, budget: None };
        assert!(matches!(empty.into_document(), Err(AppError::MissingField(_))));

        let lead = ObjectId::new();
        let placement = CreatePlacementPayload { stage_index: 1, lead: Some(lead.to_hex()), budget: None }
            .into_document()
            .unwrap();
        assert_eq!(placement.get_object_id("lead").unwrap(), lead);
        assert_eq!(placement.get_i64("stage_index").unwrap(), 1);
    }
}
