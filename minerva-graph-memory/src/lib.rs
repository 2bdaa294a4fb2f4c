//! In-memory `GraphStore`, grounded on the teacher's
//! `adapters/in_memory` crate: a `RwLock`-guarded `HashMap` store indexed
//! by uuid, repurposed per entity type instead of per tenant.

use async_trait::async_trait;
use minerva_core::types::{ConceptRelation, Entity, EntityType, Quote, Relation};
use minerva_graph::{cosine_similarity, normalize_name, GraphError, GraphStore, CONCEPT_RELEVANCE_FLOOR, GENERAL_SIMILARITY_FLOOR};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    entities: HashMap<Uuid, Entity>,
    by_type_name: HashMap<(EntityType, String), Uuid>,
    relations: HashMap<(Uuid, Uuid, String), Relation>,
    concept_relations: HashMap<(Uuid, Uuid, String), ConceptRelation>,
    quotes: HashMap<Uuid, Quote>,
    quote_supports: std::collections::HashSet<(Uuid, Uuid)>,
}

pub struct InMemoryGraphStore {
    store: RwLock<Store>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self { store: RwLock::new(Store::default()) }
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn relation_kind_str(kind: &minerva_core::types::ConceptRelationType) -> String {
    format!("{kind:?}")
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn create(&self, entity: Entity) -> Result<Entity, GraphError> {
        let mut store = self.store.write().await;
        let uuid = entity.common().meta.uuid;
        let key = (entity.entity_type(), normalize_name(&entity.common().name));
        store.by_type_name.insert(key, uuid);
        store.entities.insert(uuid, entity.clone());
        debug!(%uuid, "created entity in memory store");
        Ok(entity)
    }

    async fn find_by_uuid(&self, _entity_type: EntityType, id: Uuid) -> Result<Option<Entity>, GraphError> {
        Ok(self.store.read().await.entities.get(&id).cloned())
    }

    async fn find_by_name(&self, entity_type: EntityType, name: &str) -> Result<Option<Entity>, GraphError> {
        let store = self.store.read().await;
        let key = (entity_type, normalize_name(name));
        Ok(store.by_type_name.get(&key).and_then(|id| store.entities.get(id)).cloned())
    }

    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<Entity>, GraphError> {
        let store = self.store.read().await;
        Ok(store.entities.values().filter(|e| e.entity_type() == entity_type).cloned().collect())
    }

    async fn update(&self, entity: Entity) -> Result<Entity, GraphError> {
        let mut store = self.store.write().await;
        let uuid = entity.common().meta.uuid;
        if !store.entities.contains_key(&uuid) {
            return Err(GraphError::NotFound(uuid));
        }
        store.entities.insert(uuid, entity.clone());
        Ok(entity)
    }

    async fn upsert(&self, entity: Entity) -> Result<Entity, GraphError> {
        let existing_by_uuid = self.find_by_uuid(entity.entity_type(), entity.common().meta.uuid).await?;
        if existing_by_uuid.is_some() {
            return self.update(entity).await;
        }
        let existing_by_name = self.find_by_name(entity.entity_type(), &entity.common().name).await?;
        if let Some(existing) = existing_by_name {
            let mut merged = entity;
            merged.common_mut().meta.uuid = existing.common().meta.uuid;
            return self.update(merged).await;
        }
        self.create(entity).await
    }

    async fn delete(&self, _entity_type: EntityType, id: Uuid) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        store.entities.remove(&id).ok_or(GraphError::NotFound(id))?;
        store.by_type_name.retain(|_, v| *v != id);
        Ok(())
    }

    async fn vector_search(&self, entity_type: EntityType, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError> {
        let store = self.store.read().await;
        let mut scored: Vec<(Entity, f32)> = store
            .entities
            .values()
            .filter(|e| e.entity_type() == entity_type)
            .filter_map(|e| e.common().embedding.as_deref().map(|emb| (e.clone(), cosine_similarity(emb, embedding))))
            .filter(|(_, score)| *score >= GENERAL_SIMILARITY_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn concept_relevance_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError> {
        let store = self.store.read().await;
        let mut scored: Vec<(Entity, f32)> = store
            .entities
            .values()
            .filter(|e| e.entity_type() == EntityType::Concept)
            .filter_map(|e| e.common().embedding.as_deref().map(|emb| (e.clone(), cosine_similarity(emb, embedding))))
            .filter(|(_, score)| *score >= CONCEPT_RELEVANCE_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn upsert_relation(&self, relation: Relation) -> Result<Relation, GraphError> {
        let mut store = self.store.write().await;
        let key = (relation.source, relation.target, format!("{:?}", relation.kind));
        store.relations.insert(key, relation.clone());
        Ok(relation)
    }

    async fn create_concept_relation(&self, relation: ConceptRelation) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        let key = (relation.source, relation.target, relation_kind_str(&relation.kind));
        store.concept_relations.insert(key, relation.clone());

        if let Some(inverse_kind) = relation.kind.inverse() {
            let inverse = ConceptRelation {
                meta: minerva_core::types::NodeMeta::new(),
                source: relation.target,
                target: relation.source,
                kind: inverse_kind,
                proposed_types: None,
                summary: relation.summary.clone(),
                summary_short: relation.summary_short.clone(),
                embedding: None,
            };
            let inverse_key = (inverse.source, inverse.target, relation_kind_str(&inverse.kind));
            store.concept_relations.insert(inverse_key, inverse);
        }
        Ok(())
    }

    async fn create_quote(&self, quote: Quote) -> Result<Quote, GraphError> {
        let mut store = self.store.write().await;
        store.quotes.insert(quote.meta.uuid, quote.clone());
        Ok(quote)
    }

    async fn create_quote_support(&self, quote_id: Uuid, concept_id: Uuid) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        store.quote_supports.insert((quote_id, concept_id));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::types::{ConceptRelationType, EntityCommon, NodeMeta};

    fn concept(name: &str) -> Entity {
        Entity::Concept {
            common: EntityCommon::new(name, "s", "ss"),
            title: name.to_string(),
            concept_text: "ss".to_string(),
            analysis: String::new(),
            source: None,
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_by_name() {
        let store = InMemoryGraphStore::new();
        let created = store.create(concept("Mortality")).await.unwrap();
        let mut updated = created.clone();
        updated.common_mut().meta.uuid = Uuid::new_v4(); // simulate a re-proposed entity with a fresh uuid
        updated.common_mut().summary = "updated".to_string();

        let result = store.upsert(updated).await.unwrap();
        assert_eq!(result.common().meta.uuid, created.common().meta.uuid);
        assert_eq!(result.common().summary, "updated");

        let all = store.list_all(EntityType::Concept).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn concept_relation_writes_the_inverse_edge() {
        let store = InMemoryGraphStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .create_concept_relation(ConceptRelation {
                meta: NodeMeta::new(),
                source: a,
                target: b,
                kind: ConceptRelationType::PartOf,
                proposed_types: None,
                summary: "a is part of b".into(),
                summary_short: "a<b".into(),
                embedding: None,
            })
            .await
            .unwrap();

        let store_guard = store.store.read().await;
        assert!(store_guard.concept_relations.contains_key(&(a, b, "PartOf".to_string())));
        assert!(store_guard.concept_relations.contains_key(&(b, a, "HasPart".to_string())));
    }

    #[tokio::test]
    async fn symmetric_relation_writes_only_one_edge() {
        let store = InMemoryGraphStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .create_concept_relation(ConceptRelation {
                meta: NodeMeta::new(),
                source: a,
                target: b,
                kind: ConceptRelationType::SimilarTo,
                proposed_types: None,
                summary: "similar".into(),
                summary_short: "sim".into(),
                embedding: None,
            })
            .await
            .unwrap();

        let store_guard = store.store.read().await;
        assert_eq!(store_guard.concept_relations.len(), 1);
    }
}
