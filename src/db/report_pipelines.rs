// src/db/report_pipelines.rs
//
// Filtros e pipelines de agregação dos relatórios, e a normalização dos
// documentos que eles devolvem. Nada aqui fala com o banco.

use std::collections::BTreeMap;

use mongodb::bson::{doc, Bson, Document};

use crate::{
    common::numeric::{bson_to_f64, bson_to_i64, round_money},
    models::report::ReportScope,
};

pub const DAY_FORMAT: &str = "%Y-%m-%d";
pub const MONTH_FORMAT: &str = "%Y-%m";

const UNSET_LABEL: &str = "não informado";

// =============================================================================
//  FILTROS
// =============================================================================

/// Filtro por data de criação (e vendedor, quando houver).
pub fn created_filter(scope: &ReportScope, with_seller: bool) -> Document {
    let mut filter = scope.range.as_filter("created_at");
    if with_seller {
        if let Some(seller) = scope.seller {
            filter.insert("seller", seller);
        }
    }
    filter
}

pub fn approved_budgets_filter(scope: &ReportScope) -> Document {
    let mut filter = created_filter(scope, true);
    filter.insert("approved", true);
    filter
}

pub fn converted_leads_filter(scope: &ReportScope) -> Document {
    let mut filter = created_filter(scope, false);
    filter.insert("related_client", doc! { "$exists": true, "$ne": Bson::Null });
    filter
}

// =============================================================================
//  PARCELAS (dinheiro)
// =============================================================================

/// Estágios comuns: orçamentos aprovados (ou não), uma linha por parcela,
/// parcelas dentro do intervalo.
fn installments_stages(scope: &ReportScope, approved: bool) -> Vec<Document> {
    let mut budget_match = if approved {
        doc! { "approved": true }
    } else {
        doc! { "approved": { "$ne": true } }
    };
    if let Some(seller) = scope.seller {
        budget_match.insert("seller", seller);
    }

    let mut stages = vec![
        doc! { "$match": budget_match },
        doc! { "$unwind": "$installments" },
    ];
    if let Some(cond) = scope.range.bson_condition() {
        stages.push(doc! { "$match": { "installments.date": cond } });
    }
    stages
}

/// Total das parcelas: soma por orçamento e depois soma dos orçamentos.
pub fn installments_total_pipeline(scope: &ReportScope, approved: bool) -> Vec<Document> {
    let mut stages = installments_stages(scope, approved);
    stages.push(doc! {
        "$group": { "_id": "$_id", "budget_total": { "$sum": "$installments.value" } }
    });
    stages.push(doc! {
        "$group": { "_id": Bson::Null, "total": { "$sum": "$budget_total" } }
    });
    stages
}

/// Ticket médio v2: média dos totais por orçamento, só pelo modelo de parcelas.
pub fn ticket_average_v2_pipeline(scope: &ReportScope) -> Vec<Document> {
    let mut stages = installments_stages(scope, true);
    stages.push(doc! {
        "$group": { "_id": "$_id", "budget_total": { "$sum": "$installments.value" } }
    });
    stages.push(doc! {
        "$group": { "_id": Bson::Null, "total": { "$avg": "$budget_total" } }
    });
    stages
}

/// Vendas por dia/mês da parcela (`format` = `DAY_FORMAT` ou `MONTH_FORMAT`).
pub fn sales_per_bucket_pipeline(scope: &ReportScope, format: &str) -> Vec<Document> {
    let mut stages = installments_stages(scope, true);
    stages.push(doc! {
        "$group": {
            "_id": {
                "budget": "$_id",
                "label": { "$dateToString": { "format": format, "date": "$installments.date" } },
            },
            "budget_total": { "$sum": "$installments.value" },
        }
    });
    stages.extend(regroup_by_label());
    stages
}

pub fn sales_by_payment_method_pipeline(scope: &ReportScope) -> Vec<Document> {
    let mut stages = installments_stages(scope, true);
    stages.push(doc! {
        "$group": {
            "_id": {
                "budget": "$_id",
                "label": { "$ifNull": ["$payment_method", UNSET_LABEL] },
            },
            "budget_total": { "$sum": "$installments.value" },
        }
    });
    stages.extend(regroup_by_label());
    stages
}

pub fn sales_by_seller_pipeline(scope: &ReportScope) -> Vec<Document> {
    let mut stages = installments_stages(scope, true);
    stages.push(doc! {
        "$group": {
            "_id": { "budget": "$_id", "seller": "$seller" },
            "budget_total": { "$sum": "$installments.value" },
        }
    });
    stages.push(doc! {
        "$group": { "_id": "$_id.seller", "total": { "$sum": "$budget_total" } }
    });
    stages.push(doc! {
        "$lookup": { "from": "users", "localField": "_id", "foreignField": "_id", "as": "seller" }
    });
    stages.push(doc! {
        "$project": {
            "_id": { "$ifNull": [{ "$arrayElemAt": ["$seller.name", 0] }, "sem vendedor"] },
            "total": 1,
        }
    });
    // Dois vendedores com o mesmo nome somam juntos
    stages.push(doc! { "$group": { "_id": "$_id", "total": { "$sum": "$total" } } });
    stages.push(doc! { "$sort": { "_id": 1 } });
    stages
}

/// Vendas por segmento do cliente e mês: `{ segmento: { "YYYY-MM": total } }`.
pub fn sales_by_segment_per_month_pipeline(scope: &ReportScope) -> Vec<Document> {
    let mut stages = installments_stages(scope, true);
    stages.push(doc! {
        "$group": {
            "_id": {
                "budget": "$_id",
                "client": "$related_client",
                "month": { "$dateToString": { "format": MONTH_FORMAT, "date": "$installments.date" } },
            },
            "budget_total": { "$sum": "$installments.value" },
        }
    });
    stages.push(doc! {
        "$lookup": { "from": "clients", "localField": "_id.client", "foreignField": "_id", "as": "client" }
    });
    stages.push(doc! {
        "$group": {
            "_id": {
                "outer": { "$ifNull": [{ "$arrayElemAt": ["$client.segment", 0] }, "sem segmento"] },
                "inner": "$_id.month",
            },
            "total": { "$sum": "$budget_total" },
        }
    });
    stages.push(doc! { "$sort": { "_id.outer": 1, "_id.inner": 1 } });
    stages
}

fn regroup_by_label() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$_id.label", "total": { "$sum": "$budget_total" } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

// =============================================================================
//  CONTAGENS AGRUPADAS
// =============================================================================

/// Contagem por valor de um campo categórico.
pub fn count_by_field_pipeline(filter: Document, field: &str) -> Vec<Document> {
    vec![
        doc! { "$match": filter },
        doc! {
            "$group": {
                "_id": { "$ifNull": [format!("${field}"), UNSET_LABEL] },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// Contagem por dia/mês de criação.
pub fn count_per_bucket_pipeline(filter: Document, format: &str) -> Vec<Document> {
    vec![
        doc! { "$match": filter },
        doc! {
            "$group": {
                "_id": { "$dateToString": { "format": format, "date": "$created_at" } },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ]
}

// =============================================================================
//  NORMALIZAÇÃO DOS RESULTADOS
// =============================================================================

/// Rótulo de um `_id` agrupado, seja string, número ou nulo.
pub fn label_of(value: Option<&Bson>) -> String {
    match value {
        Some(Bson::String(s)) if !s.is_empty() => s.clone(),
        Some(Bson::String(_)) | Some(Bson::Null) | None => UNSET_LABEL.to_string(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => bson_to_i64(other)
            .map(|v| v.to_string())
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Valor escalar do primeiro documento (`total`), ou zero sem documentos.
pub fn single_amount(docs: &[Document]) -> f64 {
    docs.first()
        .and_then(|d| d.get("total"))
        .and_then(bson_to_f64)
        .map(round_money)
        .unwrap_or(0.0)
}

pub fn amounts_by_label(docs: &[Document]) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for d in docs {
        let value = d.get("total").and_then(bson_to_f64).unwrap_or(0.0);
        *out.entry(label_of(d.get("_id"))).or_insert(0.0) += value;
    }
    out.values_mut().for_each(|v| *v = round_money(*v));
    out
}

pub fn counts_by_label(docs: &[Document]) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for d in docs {
        let value = d.get("count").and_then(bson_to_i64).unwrap_or(0);
        *out.entry(label_of(d.get("_id"))).or_insert(0) += value;
    }
    out
}

/// Documentos com `_id: { outer, inner }` viram `{ outer: { inner: total } }`.
pub fn nested_amounts(docs: &[Document]) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut out: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for d in docs {
        let Ok(key) = d.get_document("_id") else {
            continue;
        };
        let value = d.get("total").and_then(bson_to_f64).unwrap_or(0.0);
        *out.entry(label_of(key.get("outer")))
            .or_default()
            .entry(label_of(key.get("inner")))
            .or_insert(0.0) += value;
    }
    for inner in out.values_mut() {
        inner.values_mut().for_each(|v| *v = round_money(*v));
    }
    out
}
