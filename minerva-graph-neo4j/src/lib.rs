//! Neo4j-backed `GraphStore`, grounded on the teacher's
//! `adapters/neo4j` crate: connection setup, uniqueness-constraint
//! creation on startup, a thin property-conversion boundary, and a full
//! `GraphStore` implementation with a `health_check`.
//!
//! Each entity is stored as a node labeled by its `EntityType`, carrying
//! `uuid`, `name`, `created_at` (ISO-8601, the same datetime-normalization
//! boundary the original `BaseRepository` enforces) and a `payload_json`
//! property holding the full serialized entity — the rest of this
//! workspace's entity shape lives in Rust, not in a hand-maintained Cypher
//! property mapping per type.

pub mod config;

pub use config::Neo4jConfig;

use async_trait::async_trait;
use minerva_core::types::{ConceptRelation, Entity, EntityType, NodeMeta, Quote, Relation};
use minerva_graph::{cosine_similarity, normalize_name, GraphError, GraphStore, CONCEPT_RELEVANCE_FLOOR, GENERAL_SIMILARITY_FLOOR};
use neo4j::query::Query;
use neo4j::Graph;
use tracing::{debug, info};
use uuid::Uuid;

pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub async fn connect(config: Neo4jConfig) -> Result<Self, GraphError> {
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(|e| GraphError::Backend(format!("failed to connect to neo4j: {e}")))?;

        let store = Self { graph };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), GraphError> {
        for entity_type in ALL_ENTITY_TYPES {
            let label = entity_type.label();
            let constraint = format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{label}) REQUIRE n.uuid IS UNIQUE"
            );
            self.run(Query::new(constraint)).await?;
            let name_index = format!("CREATE INDEX IF NOT EXISTS FOR (n:{label}) ON (n.name)");
            self.run(Query::new(name_index)).await?;
        }
        info!("ensured neo4j uniqueness constraints and name indexes for all entity labels");
        Ok(())
    }

    async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await.map_err(|e| GraphError::Backend(e.to_string()))
    }

    async fn fetch_rows(&self, query: Query) -> Result<Vec<serde_json::Value>, GraphError> {
        let mut rows = self
            .graph
            .execute(query)
            .await
            .map_err(|e| GraphError::Backend(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| GraphError::Backend(e.to_string()))? {
            let payload: String = row.get("payload_json").map_err(|e| GraphError::Backend(e.to_string()))?;
            out.push(serde_json::from_str(&payload).map_err(|e| GraphError::InvalidData(e.to_string()))?);
        }
        Ok(out)
    }

    fn entity_to_row(entity: &Entity) -> (Uuid, String, String, String) {
        let common = entity.common();
        let payload = serde_json::to_string(entity).expect("Entity always serializes");
        (common.meta.uuid, common.name.clone(), common.meta.created_at.to_rfc3339(), payload)
    }
}

const ALL_ENTITY_TYPES: [EntityType; 10] = [
    EntityType::Person,
    EntityType::Emotion,
    EntityType::FeelingEmotion,
    EntityType::FeelingConcept,
    EntityType::Event,
    EntityType::Project,
    EntityType::Concept,
    EntityType::Content,
    EntityType::Consumable,
    EntityType::Place,
];

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn create(&self, entity: Entity) -> Result<Entity, GraphError> {
        let label = entity.entity_type().label();
        let (uuid, name, created_at, payload) = Self::entity_to_row(&entity);
        let query = Query::new(format!(
            "CREATE (n:{label} {{uuid: $uuid, name: $name, created_at: $created_at, payload_json: $payload}})"
        ))
        .param("uuid", uuid.to_string())
        .param("name", name)
        .param("created_at", created_at)
        .param("payload", payload);
        self.run(query).await?;
        debug!(%uuid, %label, "created entity node");
        Ok(entity)
    }

    async fn find_by_uuid(&self, entity_type: EntityType, id: Uuid) -> Result<Option<Entity>, GraphError> {
        let label = entity_type.label();
        let query = Query::new(format!("MATCH (n:{label} {{uuid: $uuid}}) RETURN n.payload_json AS payload_json"))
            .param("uuid", id.to_string());
        Ok(self.fetch_rows(query).await?.into_iter().next().map(serde_json::from_value).transpose().map_err(|e: serde_json::Error| GraphError::InvalidData(e.to_string()))?)
    }

    async fn find_by_name(&self, entity_type: EntityType, name: &str) -> Result<Option<Entity>, GraphError> {
        let label = entity_type.label();
        let query = Query::new(format!(
            "MATCH (n:{label}) WHERE toLower(n.name) = $name RETURN n.payload_json AS payload_json LIMIT 1"
        ))
        .param("name", normalize_name(name));
        Ok(self.fetch_rows(query).await?.into_iter().next().map(serde_json::from_value).transpose().map_err(|e: serde_json::Error| GraphError::InvalidData(e.to_string()))?)
    }

    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<Entity>, GraphError> {
        let label = entity_type.label();
        let query = Query::new(format!("MATCH (n:{label}) RETURN n.payload_json AS payload_json"));
        self.fetch_rows(query)
            .await?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| GraphError::InvalidData(e.to_string())))
            .collect()
    }

    async fn update(&self, entity: Entity) -> Result<Entity, GraphError> {
        let label = entity.entity_type().label();
        let (uuid, name, _created_at, payload) = Self::entity_to_row(&entity);
        if self.find_by_uuid(entity.entity_type(), uuid).await?.is_none() {
            return Err(GraphError::NotFound(uuid));
        }
        let query = Query::new(format!("MATCH (n:{label} {{uuid: $uuid}}) SET n.name = $name, n.payload_json = $payload"))
            .param("uuid", uuid.to_string())
            .param("name", name)
            .param("payload", payload);
        self.run(query).await?;
        Ok(entity)
    }

    async fn upsert(&self, entity: Entity) -> Result<Entity, GraphError> {
        if self.find_by_uuid(entity.entity_type(), entity.common().meta.uuid).await?.is_some() {
            return self.update(entity).await;
        }
        if let Some(existing) = self.find_by_name(entity.entity_type(), &entity.common().name).await? {
            let mut merged = entity;
            merged.common_mut().meta.uuid = existing.common().meta.uuid;
            return self.update(merged).await;
        }
        self.create(entity).await
    }

    async fn delete(&self, entity_type: EntityType, id: Uuid) -> Result<(), GraphError> {
        let label = entity_type.label();
        let query = Query::new(format!("MATCH (n:{label} {{uuid: $uuid}}) DETACH DELETE n")).param("uuid", id.to_string());
        self.run(query).await
    }

    async fn vector_search(&self, entity_type: EntityType, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError> {
        // Scored client-side over the candidate set rather than a Cypher
        // vector index call: keeps the entity's full shape (and the
        // similarity floor/threshold logic) in one place in Rust instead
        // of split across a query-language index configuration.
        let mut scored: Vec<(Entity, f32)> = self
            .list_all(entity_type)
            .await?
            .into_iter()
            .filter_map(|e| e.common().embedding.clone().map(|emb| (e.clone(), cosine_similarity(&emb, embedding))))
            .filter(|(_, score)| *score >= GENERAL_SIMILARITY_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn concept_relevance_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Entity, f32)>, GraphError> {
        let mut scored: Vec<(Entity, f32)> = self
            .list_all(EntityType::Concept)
            .await?
            .into_iter()
            .filter_map(|e| e.common().embedding.clone().map(|emb| (e.clone(), cosine_similarity(&emb, embedding))))
            .filter(|(_, score)| *score >= CONCEPT_RELEVANCE_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn upsert_relation(&self, relation: Relation) -> Result<Relation, GraphError> {
        let payload = serde_json::to_string(&relation).expect("Relation always serializes");
        let query = Query::new(
            "MERGE (s {uuid: $source})-[r:RELATED_TO {kind: $kind}]->(t {uuid: $target}) SET r.payload_json = $payload",
        )
        .param("source", relation.source.to_string())
        .param("target", relation.target.to_string())
        .param("kind", format!("{:?}", relation.kind))
        .param("payload", payload);
        self.run(query).await?;
        Ok(relation)
    }

    async fn create_concept_relation(&self, relation: ConceptRelation) -> Result<(), GraphError> {
        self.write_concept_edge(&relation).await?;
        if let Some(inverse_kind) = relation.kind.inverse() {
            let inverse = ConceptRelation {
                meta: NodeMeta::new(),
                source: relation.target,
                target: relation.source,
                kind: inverse_kind,
                proposed_types: None,
                summary: relation.summary.clone(),
                summary_short: relation.summary_short.clone(),
                embedding: None,
            };
            self.write_concept_edge(&inverse).await?;
        }
        Ok(())
    }

    async fn create_quote(&self, quote: Quote) -> Result<Quote, GraphError> {
        let payload = serde_json::to_string(&quote).expect("Quote always serializes");
        let query = Query::new(
            "CREATE (q:Quote {uuid: $uuid, journal_id: $journal_id, created_at: $created_at, payload_json: $payload})",
        )
        .param("uuid", quote.meta.uuid.to_string())
        .param("journal_id", quote.journal_id.to_string())
        .param("created_at", quote.meta.created_at.to_rfc3339())
        .param("payload", payload);
        self.run(query).await?;
        debug!(uuid = %quote.meta.uuid, "created quote node");
        Ok(quote)
    }

    async fn create_quote_support(&self, quote_id: Uuid, concept_id: Uuid) -> Result<(), GraphError> {
        let query = Query::new("MERGE (q:Quote {uuid: $quote})-[:SUPPORTS]->(c {uuid: $concept})")
            .param("quote", quote_id.to_string())
            .param("concept", concept_id.to_string());
        self.run(query).await
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        self.run(Query::new("RETURN 1")).await
    }
}

impl Neo4jGraphStore {
    async fn write_concept_edge(&self, relation: &ConceptRelation) -> Result<(), GraphError> {
        let kind = format!("{:?}", relation.kind);
        let payload = serde_json::to_string(relation).expect("ConceptRelation always serializes");
        let query = Query::new(format!("MERGE (s {{uuid: $source}})-[r:{kind}]->(t {{uuid: $target}}) SET r.payload_json = $payload"))
            .param("source", relation.source.to_string())
            .param("target", relation.target.to_string())
            .param("payload", payload);
        self.run(query).await
    }
}
