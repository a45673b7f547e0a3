// src/db/space_desk_repo.rs

use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime, Document},
    options::ReturnDocument,
};

use crate::{
    common::{
        error::AppError,
        listing::{Page, Pagination},
    },
    db::MongoGateway,
};

const CHATS: &str = "space_desk_chats";
const MESSAGES: &str = "space_desk_messages";
const GROUPS: &str = "space_desk_groups";

const EXCERPT_CHARS: usize = 100;

/// Resumo da última mensagem guardado no chat.
#[derive(Debug, Clone, PartialEq)]
pub struct LastMessage {
    pub sender: String,
    pub at: DateTime,
    pub excerpt: String,
}

impl LastMessage {
    pub fn new(sender: impl Into<String>, text: &str) -> Self {
        Self {
            sender: sender.into(),
            at: DateTime::now(),
            excerpt: excerpt(text),
        }
    }

    pub fn at(mut self, at: DateTime) -> Self {
        self.at = at;
        self
    }
}

pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Mudanças num grupo: renomear e acrescentar membros (sem duplicar).
#[derive(Debug, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub add_users: Vec<i64>,
    pub add_chats: Vec<ObjectId>,
}

impl GroupChanges {
    pub fn to_update(&self) -> Option<Document> {
        let mut set = doc! {};
        if let Some(name) = self.name.as_ref().filter(|n| !n.trim().is_empty()) {
            set.insert("name", name.trim());
        }
        let mut add = doc! {};
        if !self.add_users.is_empty() {
            add.insert("users", doc! { "$each": self.add_users.clone() });
        }
        if !self.add_chats.is_empty() {
            add.insert("chats", doc! { "$each": self.add_chats.clone() });
        }
        if set.is_empty() && add.is_empty() {
            return None;
        }

        set.insert("updated_at", DateTime::now());
        let mut update = doc! { "$set": set };
        if !add.is_empty() {
            update.insert("$addToSet", add);
        }
        Some(update)
    }
}

/// Filtro e update que criam o chat de um telefone na primeira mensagem.
/// O nome só é gravado na criação; o número da empresa é sempre renovado.
pub fn chat_upsert(phone: &str, contact_name: Option<&str>, business_phone: Option<&str>) -> (Document, Document) {
    let name = contact_name.filter(|n| !n.trim().is_empty()).unwrap_or(phone);
    let now = DateTime::now();

    let mut set = doc! { "updated_at": now };
    if let Some(business) = business_phone {
        set.insert("sender_phone", business);
    }
    let update = doc! {
        "$setOnInsert": { "name": name, "groups": [], "created_at": now },
        "$set": set,
    };
    (doc! { "phone": phone }, update)
}

/// Espelha a participação no grupo nos chats (`chats.groups`).
pub fn chat_membership(group_id: ObjectId, chats: &[ObjectId]) -> Option<(Document, Document)> {
    if chats.is_empty() {
        return None;
    }
    Some((
        doc! { "_id": { "$in": chats.to_vec() } },
        doc! { "$addToSet": { "groups": group_id } },
    ))
}

#[derive(Clone)]
pub struct SpaceDeskRepository {
    gateway: MongoGateway,
}

impl SpaceDeskRepository {
    pub fn new(gateway: MongoGateway) -> Self {
        Self { gateway }
    }

    // =========================================================================
    //  CHATS E MENSAGENS
    // =========================================================================

    pub async fn list_chats(&self, filter: Document, pagination: Pagination) -> Result<Page<Document>, AppError> {
        self.gateway.find_page(CHATS, filter, pagination).await
    }

    pub async fn find_chat(&self, id: ObjectId) -> Result<Document, AppError> {
        let coll = self.gateway.collection(CHATS);
        self.gateway
            .run(coll.find_one(doc! { "_id": id }))
            .await?
            .ok_or(AppError::NotFound("Chat"))
    }

    /// Chat do telefone, criado se ainda não existir. Devolve o `_id`.
    pub async fn upsert_chat(
        &self,
        phone: &str,
        contact_name: Option<&str>,
        business_phone: Option<&str>,
    ) -> Result<ObjectId, AppError> {
        let (filter, update) = chat_upsert(phone, contact_name, business_phone);
        let coll = self.gateway.collection(CHATS);
        let chat = self
            .gateway
            .run(
                coll.find_one_and_update(filter, update)
                    .upsert(true)
                    .return_document(ReturnDocument::After),
            )
            .await?
            .ok_or(AppError::NotFound("Chat"))?;
        chat.get_object_id("_id")
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("chat sem _id: {}", e)))
    }

    pub async fn list_messages(&self, chat_id: ObjectId, pagination: Pagination) -> Result<Page<Document>, AppError> {
        self.gateway
            .find_page(MESSAGES, doc! { "chat_id": chat_id }, pagination)
            .await
    }

    pub async fn insert_message(&self, mut message: Document) -> Result<Document, AppError> {
        message.insert("_id", ObjectId::new());
        message.insert("created_at", DateTime::now());
        let coll = self.gateway.collection(MESSAGES);
        self.gateway.run(coll.insert_one(message.clone())).await?;
        Ok(message)
    }

    pub async fn set_last_message(&self, chat_id: ObjectId, last: &LastMessage) -> Result<(), AppError> {
        let coll = self.gateway.collection(CHATS);
        self.gateway
            .run(coll.update_one(
                doc! { "_id": chat_id },
                doc! { "$set": {
                    "last_message": { "sender": &last.sender, "at": last.at, "excerpt": &last.excerpt },
                    "updated_at": DateTime::now(),
                } },
            ))
            .await?;
        Ok(())
    }

    /// Apaga o chat e as mensagens dele. Devolve quantas mensagens saíram.
    pub async fn delete_chat(&self, id: ObjectId) -> Result<u64, AppError> {
        let chats = self.gateway.collection(CHATS);
        let result = self.gateway.run(chats.delete_one(doc! { "_id": id })).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("Chat"));
        }

        let messages = self.gateway.collection(MESSAGES);
        let removed = self
            .gateway
            .run(messages.delete_many(doc! { "chat_id": id }))
            .await?;
        Ok(removed.deleted_count)
    }

    // =========================================================================
    //  GRUPOS
    // =========================================================================

    pub async fn list_groups(&self, pagination: Pagination) -> Result<Page<Document>, AppError> {
        self.gateway.find_page(GROUPS, doc! {}, pagination).await
    }

    pub async fn create_group(
        &self,
        name: &str,
        users: Vec<i64>,
        chats: Vec<ObjectId>,
    ) -> Result<Document, AppError> {
        let id = ObjectId::new();
        let chats = dedup(chats);
        let now = DateTime::now();
        let group = doc! {
            "_id": id,
            "name": name.trim(),
            "users": dedup(users),
            "chats": chats.clone(),
            "created_at": now,
            "updated_at": now,
        };
        let coll = self.gateway.collection(GROUPS);
        self.gateway.run(coll.insert_one(group.clone())).await?;
        self.link_chats(id, &chats).await?;
        Ok(group)
    }

    pub async fn update_group(&self, id: ObjectId, changes: &GroupChanges) -> Result<Document, AppError> {
        let coll = self.gateway.collection(GROUPS);
        if let Some(update) = changes.to_update() {
            let result = self.gateway.run(coll.update_one(doc! { "_id": id }, update)).await?;
            if result.matched_count == 0 {
                return Err(AppError::NotFound("Grupo"));
            }
            self.link_chats(id, &changes.add_chats).await?;
        }
        self.gateway
            .run(coll.find_one(doc! { "_id": id }))
            .await?
            .ok_or(AppError::NotFound("Grupo"))
    }

    async fn link_chats(&self, group_id: ObjectId, chats: &[ObjectId]) -> Result<(), AppError> {
        let Some((filter, update)) = chat_membership(group_id, chats) else {
            return Ok(());
        };
        let coll = self.gateway.collection(CHATS);
        self.gateway.run(coll.update_many(filter, update)).await?;
        Ok(())
    }

    /// Remove o grupo e tira a referência dele dos chats.
    pub async fn delete_group(&self, id: ObjectId) -> Result<(), AppError> {
        let groups = self.gateway.collection(GROUPS);
        let result = self.gateway.run(groups.delete_one(doc! { "_id": id })).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("Grupo"));
        }

        let chats = self.gateway.collection(CHATS);
        self.gateway
            .run(chats.update_many(doc! { "groups": id }, doc! { "$pull": { "groups": id } }))
            .await?;
        Ok(())
    }
}

fn dedup<T: Ord>(mut ids: Vec<T>) -> Vec<T> {
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trecho_limita_em_100_caracteres() {
        let long = "á".repeat(150);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), 101);
        assert!(cut.ends_with('…'));
        assert_eq!(excerpt("  oi  "), "oi");
    }

    #[test]
    fn grupo_sem_mudancas_nao_gera_update() {
        assert!(GroupChanges::default().to_update().is_none());
    }

    #[test]
    fn membros_entram_com_add_to_set() {
        let user = 42_i64;
        let update = GroupChanges {
            name: None,
            add_users: vec![user],
            add_chats: vec![],
        }
        .to_update()
        .unwrap();
        let add = update.get_document("$addToSet").unwrap();
        assert!(add.contains_key("users"));
        assert!(!add.contains_key("chats"));
        assert!(update.get_document("$set").unwrap().contains_key("updated_at"));
    }

    #[test]
    fn chats_do_grupo_recebem_o_id_do_grupo() {
        let group = ObjectId::new();
        let chats = vec![ObjectId::new(), ObjectId::new()];
        let (filter, update) = chat_membership(group, &chats).unwrap();

        let ids = filter.get_document("_id").unwrap().get_array("$in").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(
            update.get_document("$addToSet").unwrap().get_object_id("groups").unwrap(),
            group
        );
        assert!(chat_membership(group, &[]).is_none());
    }

    #[test]
    fn usuarios_do_grupo_sao_ids_numericos() {
        assert_eq!(dedup(vec![7_i64, 3, 7]), vec![3, 7]);
        let update = GroupChanges { name: None, add_users: vec![3], add_chats: vec![] }
            .to_update()
            .unwrap();
        let users = update.get_document("$addToSet").unwrap().get_document("users").unwrap();
        assert_eq!(users.get_array("$each").unwrap()[0], Bson::Int64(3));
    }

    #[test]
    fn chat_novo_usa_o_nome_do_contato() {
        let (filter, update) = chat_upsert("5511999990000", Some("Ana"), Some("5511900000002"));
        assert_eq!(filter, doc! { "phone": "5511999990000" });

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_str("name").unwrap(), "Ana");
        assert!(on_insert.get_array("groups").unwrap().is_empty());
        assert_eq!(update.get_document("$set").unwrap().get_str("sender_phone").unwrap(), "5511900000002");

        let (_, update) = chat_upsert("5511999990000", None, None);
        assert_eq!(update.get_document("$setOnInsert").unwrap().get_str("name").unwrap(), "5511999990000");
        assert!(!update.get_document("$set").unwrap().contains_key("sender_phone"));
    }
}
