// src/db/funnel_repo.rs

use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};

use crate::{
    common::{error::AppError, update::PartialUpdate},
    db::MongoGateway,
};

const FUNNELS: &str = "funnels";

#[derive(Clone)]
pub struct FunnelRepository {
    gateway: MongoGateway,
}

/// Confere o índice contra a leitura atual do funil.
pub fn check_stage_index(funnel: &Document, index: usize) -> Result<(), AppError> {
    let stages = funnel.get_array("stages").map(Vec::len).unwrap_or(0);
    if index >= stages {
        return Err(AppError::InvalidStageIndex(index));
    }
    Ok(())
}

impl FunnelRepository {
    pub fn new(gateway: MongoGateway) -> Self {
        Self { gateway }
    }

    async fn snapshot(&self, id: ObjectId) -> Result<Document, AppError> {
        let coll = self.gateway.collection(FUNNELS);
        self.gateway
            .run(coll.find_one(doc! { "_id": id }).projection(doc! { "stages": 1 }))
            .await?
            .ok_or(AppError::NotFound("Funil"))
    }

    async fn apply(&self, id: ObjectId, update: Document) -> Result<(), AppError> {
        let coll = self.gateway.collection(FUNNELS);
        let result = self.gateway.run(coll.update_one(doc! { "_id": id }, update)).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Funil"));
        }
        Ok(())
    }

    pub async fn push_stage(&self, id: ObjectId, stage: Document) -> Result<(), AppError> {
        self.apply(
            id,
            doc! { "$push": { "stages": stage }, "$set": { "updated_at": DateTime::now() } },
        )
        .await
    }

    /// O índice é validado numa leitura e a escrita vai pelo caminho
    /// `stages.<i>`. Alterações concorrentes no mesmo funil não são detectadas.
    pub async fn update_stage(&self, id: ObjectId, index: usize, update: PartialUpdate) -> Result<(), AppError> {
        let funnel = self.snapshot(id).await?;
        check_stage_index(&funnel, index)?;
        if update.is_empty() {
            return Ok(());
        }
        self.apply(id, update.into_update()).await
    }

    pub async fn add_placement(&self, id: ObjectId, placement: Document) -> Result<(), AppError> {
        let funnel = self.snapshot(id).await?;
        let index = placement.get_i64("stage_index").unwrap_or(-1);
        check_stage_index(&funnel, usize::try_from(index).unwrap_or(usize::MAX))?;

        self.apply(
            id,
            doc! { "$push": { "placements": placement }, "$set": { "updated_at": DateTime::now() } },
        )
        .await
    }

    pub async fn remove_placement(&self, id: ObjectId, placement_id: ObjectId) -> Result<(), AppError> {
        let coll = self.gateway.collection(FUNNELS);
        let result = self
            .gateway
            .run(coll.update_one(
                doc! { "_id": id, "placements._id": placement_id },
                doc! {
                    "$pull": { "placements": { "_id": placement_id } },
                    "$set": { "updated_at": DateTime::now() },
                },
            ))
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Posicionamento"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indice_fora_das_etapas_e_rejeitado() {
        let funnel = doc! { "stages": [{ "name": "Contato" }, { "name": "Proposta" }] };
        assert!(check_stage_index(&funnel, 1).is_ok());
        assert!(matches!(check_stage_index(&funnel, 2), Err(AppError::InvalidStageIndex(2))));
        assert!(check_stage_index(&doc! {}, 0).is_err());
    }
}
