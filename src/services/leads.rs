// src/services/leads.rs

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};

use crate::{
    common::{error::AppError, numeric::bson_to_f64, pricing::order_value},
    db::MongoGateway,
    models::lead::LeadTier,
};

const LEADS: &str = "leads";
const ORDERS: &str = "orders";
const LEAD_TIERS: &str = "lead_tiers";

/// Primeira faixa cujo intervalo fechado contém o valor.
pub fn select_tier(value: f64, tiers: &[LeadTier]) -> Option<LeadTier> {
    tiers.iter().find(|tier| tier.contains(value)).cloned()
}

/// Ids dos pedidos relacionados, só quando `related_orders` é uma lista não vazia.
pub fn related_order_ids(lead: &Document) -> Option<Vec<ObjectId>> {
    let ids: Vec<ObjectId> = lead
        .get_array("related_orders")
        .ok()?
        .iter()
        .filter_map(|value| match value {
            Bson::ObjectId(id) => Some(*id),
            Bson::String(raw) => ObjectId::parse_str(raw).ok(),
            _ => None,
        })
        .collect();
    (!ids.is_empty()).then_some(ids)
}

fn tier_from_document(document: &Document) -> Option<LeadTier> {
    Some(LeadTier {
        name: document.get_str("name").ok()?.to_string(),
        min_value: document.get("min_value").and_then(bson_to_f64)?,
        max_value: document.get("max_value").and_then(bson_to_f64)?,
    })
}

#[derive(Clone)]
pub struct LeadService {
    gateway: MongoGateway,
}

impl LeadService {
    pub fn new(gateway: MongoGateway) -> Self {
        Self { gateway }
    }

    pub async fn get_with_tier(&self, id: ObjectId) -> Result<(Document, Option<LeadTier>), AppError> {
        let coll = self.gateway.collection(LEADS);
        let lead = self
            .gateway
            .run(coll.find_one(doc! { "_id": id }))
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        let tier = self.tier_for(&lead).await?;
        Ok((lead, tier))
    }

    /// Faixa pelo valor somado dos pedidos relacionados; `None` sem pedidos
    /// ou sem faixa correspondente.
    pub async fn tier_for(&self, lead: &Document) -> Result<Option<LeadTier>, AppError> {
        let Some(order_ids) = related_order_ids(lead) else {
            return Ok(None);
        };

        let orders_coll = self.gateway.collection(ORDERS);
        let orders: Vec<Document> = self
            .gateway
            .run(async {
                orders_coll
                    .find(doc! { "_id": { "$in": order_ids.clone() } })
                    .projection(doc! { "products": 1, "tiny": 1 })
                    .await?
                    .try_collect()
                    .await
            })
            .await?;
        let total: f64 = orders.iter().filter_map(order_value).sum();

        let tiers_coll = self.gateway.collection(LEAD_TIERS);
        let tier_docs: Vec<Document> = self
            .gateway
            .run(async {
                tiers_coll
                    .find(doc! {})
                    .sort(doc! { "min_value": 1 })
                    .await?
                    .try_collect()
                    .await
            })
            .await?;
        let tiers: Vec<LeadTier> = tier_docs.iter().filter_map(tier_from_document).collect();

        Ok(select_tier(total, &tiers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<LeadTier> {
        vec![
            LeadTier { name: "Bronze".into(), min_value: 0.0, max_value: 999.99 },
            LeadTier { name: "Prata".into(), min_value: 1000.0, max_value: 4999.99 },
            LeadTier { name: "Ouro".into(), min_value: 5000.0, max_value: 50000.0 },
        ]
    }

    #[test]
    fn valor_cai_em_exatamente_uma_faixa() {
        for (value, expected) in [(0.0, "Bronze"), (1000.0, "Prata"), (7500.5, "Ouro"), (50000.0, "Ouro")] {
            let matching: Vec<_> = tiers().into_iter().filter(|t| t.contains(value)).collect();
            assert_eq!(matching.len(), 1);
            assert_eq!(select_tier(value, &tiers()).unwrap().name, expected);
        }
    }

    #[test]
    fn sem_faixa_devolve_none() {
        assert!(select_tier(60000.0, &tiers()).is_none());
        assert!(select_tier(10.0, &[]).is_none());
    }

    #[test]
    fn related_orders_precisa_ser_lista_nao_vazia() {
        assert!(related_order_ids(&doc! { "name": "sem pedidos" }).is_none());
        assert!(related_order_ids(&doc! { "related_orders": "abc" }).is_none());
        assert!(related_order_ids(&doc! { "related_orders": [] }).is_none());

        let id = ObjectId::new();
        let ids = related_order_ids(&doc! { "related_orders": [id, "lixo"] }).unwrap();
        assert_eq!(ids, vec![id]);
    }

    #[test]
    fn faixa_incompleta_e_ignorada() {
        assert!(tier_from_document(&doc! { "name": "X", "min_value": 1 }).is_none());
        let tier = tier_from_document(&doc! { "name": "X", "min_value": 1_i32, "max_value": 2.5 }).unwrap();
        assert_eq!(tier.max_value, 2.5);
    }
}
