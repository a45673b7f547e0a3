// src/common/db_utils.rs

use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

use crate::common::error::AppError;

pub fn parse_object_id(field: &str, raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(field.to_string()))
}

pub fn parse_optional_object_id(field: &str, raw: Option<&str>) -> Result<Option<ObjectId>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_object_id(field, value).map(Some),
        None => Ok(None),
    }
}

pub fn parse_object_ids(field: &str, raw: &[String]) -> Result<Vec<ObjectId>, AppError> {
    raw.iter().map(|v| parse_object_id(field, v)).collect()
}

/// Converte um documento para o JSON da API: `ObjectId` vira string hex e
/// datas viram RFC 3339, em vez do formato estendido do Mongo.
pub fn document_to_json(document: Document) -> Value {
    bson_to_json(Bson::Document(document))
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => {
            let mut map = Map::new();
            for (key, inner) in doc {
                map.insert(key, bson_to_json(inner));
            }
            Value::Object(map)
        }
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime};
    use serde_json::json;

    #[test]
    fn achata_object_id_e_datas() {
        let oid = ObjectId::new();
        let when = DateTime::from_millis(1_704_067_200_000);
        let value = document_to_json(doc! {
            "_id": oid,
            "created_at": when,
            "installments": [{ "value": 10.5, "date": when }],
            "count": 3_i32,
        });

        assert_eq!(value["_id"], json!(oid.to_hex()));
        assert_eq!(value["created_at"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(value["installments"][0]["date"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(value["count"], json!(3));
    }

    #[test]
    fn id_invalido_aponta_o_campo() {
        let err = parse_object_id("seller", "nope").unwrap_err();
        assert!(matches!(err, AppError::InvalidId(field) if field == "seller"));
        assert_eq!(parse_optional_object_id("seller", Some("  ")).unwrap(), None);
    }
}
