// src/common/numeric.rs
//
// Normalização numérica única para resultados de agregação e JSON legado.
// O Mongo devolve contagens e somas como Int32, Int64 ou Double dependendo
// de como o dado foi gravado; o legado grava números até como string.

use mongodb::bson::Bson;
use serde_json::Value;

pub fn bson_to_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.is_finite() => Some(v.round() as i64),
        _ => None,
    }
}

pub fn bson_to_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) if v.is_finite() => Some(*v),
        _ => None,
    }
}

pub fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // "12,50" também aparece nos pedidos antigos
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Arredonda valores monetários para duas casas.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normaliza_inteiros_e_doubles() {
        assert_eq!(bson_to_i64(&Bson::Int32(7)), Some(7));
        assert_eq!(bson_to_i64(&Bson::Int64(7)), Some(7));
        assert_eq!(bson_to_i64(&Bson::Double(7.0)), Some(7));
        assert_eq!(bson_to_f64(&Bson::Int32(3)), Some(3.0));
        assert_eq!(bson_to_f64(&Bson::Double(2.5)), Some(2.5));
        assert_eq!(bson_to_f64(&Bson::String("2".into())), None);
        assert_eq!(bson_to_f64(&Bson::Null), None);
    }

    #[test]
    fn json_aceita_string_numerica() {
        assert_eq!(json_to_f64(&json!(10)), Some(10.0));
        assert_eq!(json_to_f64(&json!("12,50")), Some(12.5));
        assert_eq!(json_to_f64(&json!("abc")), None);
        assert_eq!(json_to_f64(&json!(null)), None);
    }

    #[test]
    fn arredonda_dinheiro() {
        assert_eq!(round_money(10.005_1), 10.01);
        assert_eq!(round_money(3.333_333), 3.33);
    }
}
