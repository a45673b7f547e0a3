// src/common/update.rs

use mongodb::bson::{doc, Bson, Document};

use crate::common::{db_utils::parse_object_id, error::AppError};

/// Acumula o `$set` de uma atualização parcial. Só entram campos presentes
/// e não vazios: um campo fora do corpo da requisição nunca é apagado.
#[derive(Debug, Default)]
pub struct PartialUpdate {
    set: Document,
}

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.set.insert(key, v);
        }
        self
    }

    pub fn number(mut self, key: &str, value: Option<f64>) -> Self {
        if let Some(v) = value.filter(|v| *v != 0.0) {
            self.set.insert(key, v);
        }
        self
    }

    pub fn flag(mut self, key: &str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            self.set.insert(key, v);
        }
        self
    }

    pub fn object_id(mut self, key: &str, value: Option<&str>) -> Result<Self, AppError> {
        if let Some(raw) = value.filter(|v| !v.trim().is_empty()) {
            self.set.insert(key, parse_object_id(key, raw)?);
        }
        Ok(self)
    }

    pub fn raw(mut self, key: &str, value: Option<Bson>) -> Self {
        match value {
            None | Some(Bson::Null) => {}
            Some(Bson::Array(items)) if items.is_empty() => {}
            Some(Bson::Document(d)) if d.is_empty() => {}
            Some(v) => {
                self.set.insert(key, v);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Documento `{ $set: ... }` com `updated_at` carimbado.
    pub fn into_update(mut self) -> Document {
        self.set.insert("updated_at", mongodb::bson::DateTime::now());
        doc! { "$set": self.set }
    }

    pub fn fields(&self) -> &Document {
        &self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn ignora_campos_vazios() {
        let update = PartialUpdate::new()
            .text("name", Some("Camisetas".into()))
            .text("origin", Some("   ".into()))
            .text("status", None)
            .number("value", Some(0.0))
            .raw("tags", Some(Bson::Array(vec![])));

        assert_eq!(update.fields().len(), 1);
        assert_eq!(update.fields().get_str("name").unwrap(), "Camisetas");
    }

    #[test]
    fn id_invalido_aborta() {
        let err = PartialUpdate::new().object_id("seller", Some("x")).unwrap_err();
        assert!(matches!(err, AppError::InvalidId(_)));

        let oid = ObjectId::new();
        let update = PartialUpdate::new().object_id("seller", Some(&oid.to_hex())).unwrap();
        assert_eq!(update.fields().get_object_id("seller").unwrap(), oid);
    }

    #[test]
    fn update_carimba_updated_at() {
        let update = PartialUpdate::new().flag("approved", Some(true)).into_update();
        let set = update.get_document("$set").unwrap();
        assert!(set.get_bool("approved").unwrap());
        assert!(set.contains_key("updated_at"));
    }
}
