// src/common/listing.rs
//
// Paginação e filtros de query-string compartilhados pelas listagens.

use std::collections::HashMap;

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Serialize;

use crate::common::{dates::DateRange, db_utils::parse_object_id, error::AppError};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Maior página cujo `skip` ainda cabe num i64 (o driver recebe i64).
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// `page` abaixo de 1 vira 1 e acima de `MAX_PAGE` vira `MAX_PAGE`;
    /// `page_size` (ou `pageSize`) é limitado a 100.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let page = params
            .get("page")
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| (p as u64).min(MAX_PAGE))
            .unwrap_or(1);

        let page_size = params
            .get("page_size")
            .or_else(|| params.get("pageSize"))
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s >= 1)
            .map(|s| (s as u64).min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self { page, page_size }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Ordenação fixa das listagens; sem ela a paginação não é estável.
    pub fn sort() -> Document {
        doc! { "_id": -1 }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    ObjectId,
    Date,
    Bool,
}

/// Campos filtráveis de uma coleção.
pub type FilterSpec = &'static [(&'static str, FieldKind)];

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Monta o filtro do Mongo a partir da query-string:
/// `campo=v` (igualdade), `campo_regex=v` (regex sem diferenciar maiúsculas,
/// ou igualdade com `campo_exact=true`), `campo_in=a,b`, `campo_start` /
/// `campo_end` para datas. Parâmetros fora do `spec` são ignorados.
pub fn build_filter(params: &HashMap<String, String>, spec: FilterSpec) -> Result<Document, AppError> {
    let mut filter = Document::new();

    for (field, kind) in spec {
        let field = *field;
        match kind {
            FieldKind::Text => {
                let exact = params
                    .get(&format!("{field}_exact"))
                    .map(|v| is_truthy(v))
                    .unwrap_or(false);
                if let Some(pattern) = params.get(&format!("{field}_regex")).filter(|v| !v.is_empty()) {
                    if exact {
                        filter.insert(field, pattern.clone());
                    } else {
                        filter.insert(field, doc! { "$regex": pattern.clone(), "$options": "i" });
                    }
                } else if let Some(value) = params.get(field).filter(|v| !v.is_empty()) {
                    filter.insert(field, value.clone());
                }
                if let Some(list) = params.get(&format!("{field}_in")) {
                    let values: Vec<Bson> = split_list(list).map(|v| Bson::String(v.to_string())).collect();
                    if !values.is_empty() {
                        filter.insert(field, doc! { "$in": values });
                    }
                }
            }
            FieldKind::ObjectId => {
                if let Some(value) = params.get(field).filter(|v| !v.is_empty()) {
                    filter.insert(field, parse_object_id(field, value)?);
                }
                if let Some(list) = params.get(&format!("{field}_in")) {
                    let ids = split_list(list)
                        .map(|v| parse_object_id(field, v))
                        .collect::<Result<Vec<ObjectId>, _>>()?;
                    if !ids.is_empty() {
                        filter.insert(field, doc! { "$in": ids });
                    }
                }
            }
            FieldKind::Date => {
                let range = DateRange::parse_v1(
                    params.get(&format!("{field}_start")).map(String::as_str),
                    params.get(&format!("{field}_end")).map(String::as_str),
                );
                range.apply(&mut filter, field);
            }
            FieldKind::Bool => {
                if let Some(value) = params.get(field).filter(|v| !v.is_empty()) {
                    filter.insert(field, is_truthy(value));
                }
            }
        }
    }

    Ok(filter)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const SPEC: FilterSpec = &[
        ("name", FieldKind::Text),
        ("status", FieldKind::Text),
        ("seller", FieldKind::ObjectId),
        ("created_at", FieldKind::Date),
        ("approved", FieldKind::Bool),
    ];

    #[test]
    fn page_size_limitado_e_pagina_minima() {
        let p = Pagination::from_params(&params(&[("page", "0"), ("page_size", "500")]));
        assert_eq!(p, Pagination { page: 1, page_size: MAX_PAGE_SIZE });

        let p = Pagination::from_params(&params(&[("page", "-3"), ("pageSize", "10")]));
        assert_eq!(p, Pagination { page: 1, page_size: 10 });

        let p = Pagination::from_params(&params(&[("page", "abc")]));
        assert_eq!(p, Pagination::default());
    }

    #[test]
    fn skip_corresponde_a_fatia_da_pagina() {
        let items: Vec<u64> = (0..250).collect();
        let p = Pagination::from_params(&params(&[("page", "3"), ("page_size", "40")]));
        let slice: Vec<u64> = items
            .iter()
            .skip(p.skip() as usize)
            .take(p.page_size as usize)
            .copied()
            .collect();
        assert_eq!(slice, (80..120).collect::<Vec<u64>>());
    }

    #[test]
    fn pagina_enorme_nao_estoura_o_skip() {
        let p = Pagination::from_params(&params(&[("page", "9223372036854775807"), ("page_size", "100")]));
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.skip() <= i64::MAX as u64);

        let p = Pagination::from_params(&params(&[("page", "99999999999999999999")]));
        assert_eq!(p.page, 1);
    }

    #[test]
    fn filtros_de_texto() {
        let f = build_filter(&params(&[("name_regex", "silva")]), SPEC).unwrap();
        assert_eq!(f.get_document("name").unwrap().get_str("$regex").unwrap(), "silva");

        let f = build_filter(&params(&[("name_regex", "Silva"), ("name_exact", "true")]), SPEC).unwrap();
        assert_eq!(f.get_str("name").unwrap(), "Silva");

        let f = build_filter(&params(&[("status_in", "open, won,")]), SPEC).unwrap();
        assert_eq!(f.get_document("status").unwrap().get_array("$in").unwrap().len(), 2);
    }

    #[test]
    fn filtros_de_id_data_e_bool() {
        let oid = ObjectId::new();
        let f = build_filter(
            &params(&[
                ("seller", &oid.to_hex()),
                ("created_at_start", "2024-01-01"),
                ("created_at_end", "nada"),
                ("approved", "true"),
                ("desconhecido", "x"),
            ]),
            SPEC,
        )
        .unwrap();
        assert_eq!(f.get_object_id("seller").unwrap(), oid);
        let date = f.get_document("created_at").unwrap();
        assert!(date.contains_key("$gte"));
        assert!(!date.contains_key("$lte"));
        assert!(f.get_bool("approved").unwrap());
        assert!(!f.contains_key("desconhecido"));
    }

    #[test]
    fn id_malformado_e_rejeitado() {
        let err = build_filter(&params(&[("seller", "123")]), SPEC).unwrap_err();
        assert!(matches!(err, AppError::InvalidId(_)));
    }
}
