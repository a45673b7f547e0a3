// src/common/pricing.rs
//
// Valor de pedidos e orçamentos a partir dos formatos antigos: a lista de
// produtos legada é um JSON livre gravado como string.

use mongodb::bson::Document;
use serde_json::Value;

use crate::common::numeric::{bson_to_f64, json_to_f64};

const PRICE_KEYS: &[&str] = &["unit_value", "value", "price"];

/// Soma `quantidade × preço` da lista legada. `None` quando a string não é
/// uma lista JSON ou nenhum item tem preço.
pub fn legacy_products_total(raw: &str) -> Option<f64> {
    let items: Vec<Value> = serde_json::from_str(raw).ok()?;

    let mut total = 0.0;
    let mut priced = false;
    for item in &items {
        let Some(price) = PRICE_KEYS.iter().find_map(|k| item.get(*k).and_then(json_to_f64)) else {
            continue;
        };
        let quantity = item.get("quantity").and_then(json_to_f64).unwrap_or(1.0);
        total += price * quantity;
        priced = true;
    }

    priced.then_some(total)
}

/// Valor de um pedido: lista legada em `products`, senão o resumo do Tiny.
pub fn order_value(order: &Document) -> Option<f64> {
    order
        .get_str("products")
        .ok()
        .and_then(legacy_products_total)
        .or_else(|| {
            let tiny = order.get_document("tiny").ok()?;
            tiny.get("total_value").or_else(|| tiny.get("total")).and_then(bson_to_f64)
        })
}

/// Valor de um orçamento no modelo antigo (ticket médio v1): lista legada em
/// `product_list`, senão o total do documento de entrega.
pub fn legacy_budget_value(budget: &Document) -> Option<f64> {
    budget
        .get_str("product_list")
        .ok()
        .and_then(legacy_products_total)
        .or_else(|| {
            budget
                .get_document("delivery")
                .ok()?
                .get("total_value")
                .and_then(bson_to_f64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn soma_lista_legada() {
        let raw = r#"[{"name":"Camiseta","quantity":10,"unit_value":"25,00"},{"name":"Boné","value":15}]"#;
        assert_eq!(legacy_products_total(raw), Some(265.0));
        assert_eq!(legacy_products_total("não é json"), None);
        assert_eq!(legacy_products_total(r#"[{"name":"sem preço"}]"#), None);
    }

    #[test]
    fn pedido_cai_no_tiny_sem_lista() {
        let order = doc! { "tiny": { "number": "123", "total_value": 480_i32 } };
        assert_eq!(order_value(&order), Some(480.0));

        let order = doc! { "products": "[]", "tiny": { "total": 99.9 } };
        assert_eq!(order_value(&order), Some(99.9));

        assert_eq!(order_value(&doc! {}), None);
    }

    #[test]
    fn orcamento_v1_usa_entrega_como_fallback() {
        let budget = doc! { "delivery": { "total_value": 150.0 } };
        assert_eq!(legacy_budget_value(&budget), Some(150.0));

        let budget = doc! {
            "product_list": r#"[{"quantity":2,"price":30}]"#,
            "delivery": { "total_value": 150.0 },
        };
        assert_eq!(legacy_budget_value(&budget), Some(60.0));
    }
}
