//! The `GraphStore` capability trait: a single generic interface
//! parameterized per call by an `EntityType`, generalized from the
//! original's `BaseRepository[T]` inheritance hierarchy into composition,
//! matching how the teacher's own `GraphStore` trait is structured.

pub mod errors;

pub use errors::GraphError;

use async_trait::async_trait;
use minerva_core::types::{ConceptRelation, Entity, EntityType, Quote, Relation};
use uuid::Uuid;

/// Floor below which a general similarity search result is discarded.
pub const GENERAL_SIMILARITY_FLOOR: f32 = 0.7;
/// Floor below which a concept-relevance search result is discarded.
pub const CONCEPT_RELEVANCE_FLOOR: f32 = 0.6;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Creates a brand new entity. Not idempotent on its own: calling this
    /// twice for the same logical entity creates two nodes. The caller
    /// (the orchestrator) is responsible for only calling `create` once
    /// per logical entity.
    async fn create(&self, entity: Entity) -> Result<Entity, GraphError>;

    async fn find_by_uuid(&self, entity_type: EntityType, id: Uuid) -> Result<Option<Entity>, GraphError>;

    async fn find_by_name(&self, entity_type: EntityType, name: &str) -> Result<Option<Entity>, GraphError>;

    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<Entity>, GraphError>;

    async fn update(&self, entity: Entity) -> Result<Entity, GraphError>;

    /// Idempotent create-or-update: matches on `uuid` if present in the
    /// entity's metadata and found, else on `(entity_type,
    /// normalized_name)`; creates only when neither matches. Embeddings
    /// are only regenerated by the caller when `summary` actually changed
    /// from the previously stored value.
    async fn upsert(&self, entity: Entity) -> Result<Entity, GraphError>;

    async fn delete(&self, entity_type: EntityType, id: Uuid) -> Result<(), GraphError>;

    /// General similarity search; implementations discard results below
    /// `GENERAL_SIMILARITY_FLOOR`.
    async fn vector_search(&self, entity_type: EntityType, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError>;

    /// Concept-only relevance search; implementations discard results
    /// below `CONCEPT_RELEVANCE_FLOOR`.
    async fn concept_relevance_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError>;

    /// MERGE-semantics relation write, matching on `(source, target,
    /// kind)`.
    async fn upsert_relation(&self, relation: Relation) -> Result<Relation, GraphError>;

    /// Writes a concept relation. For the three directed-pair kinds this
    /// also writes the inverse edge in the same logical operation, so
    /// callers never need to know which kinds are paired.
    async fn create_concept_relation(&self, relation: ConceptRelation) -> Result<(), GraphError>;

    /// Creates a lexical Quote node in the temporal/lexical partition.
    async fn create_quote(&self, quote: Quote) -> Result<Quote, GraphError>;

    /// Writes a `(Quote)-[:SUPPORTS]->(Concept)` edge.
    async fn create_quote_support(&self, quote_id: Uuid, concept_id: Uuid) -> Result<(), GraphError>;

    async fn health_check(&self) -> Result<(), GraphError>;
}

/// Normalizes a name for identity matching: trimmed, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Cosine similarity between two equal-length embedding vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![0.1, 0.2, 0.3];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
