//! The curation store: a transactional ledger of journals and their
//! proposed entities/relations/concept candidates awaiting human decision.
//!
//! Grounded method-for-method on
//! `minerva_backend.processing.curation_manager.CurationManager`.

use crate::errors::CurationError;
use crate::schema::SCHEMA;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ItemStatus {
    fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Accepted => "ACCEPTED",
            ItemStatus::Rejected => "REJECTED",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "ACCEPTED" => ItemStatus::Accepted,
            "REJECTED" => ItemStatus::Rejected,
            _ => ItemStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalOverallStatus {
    PendingEntities,
    EntitiesDone,
    PendingRelations,
    Completed,
}

impl JournalOverallStatus {
    fn as_str(&self) -> &'static str {
        match self {
            JournalOverallStatus::PendingEntities => "PENDING_ENTITIES",
            JournalOverallStatus::EntitiesDone => "ENTITIES_DONE",
            JournalOverallStatus::PendingRelations => "PENDING_RELATIONS",
            JournalOverallStatus::Completed => "COMPLETED",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "ENTITIES_DONE" => JournalOverallStatus::EntitiesDone,
            "PENDING_RELATIONS" => JournalOverallStatus::PendingRelations,
            "COMPLETED" => JournalOverallStatus::Completed,
            _ => JournalOverallStatus::PendingEntities,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurationItem {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub type_tag: String,
    pub payload: Value,
    pub status: ItemStatus,
    pub spans: Value,
    /// Operator-edited data recorded by `accept_entity`, distinct from the
    /// original LLM-proposed `payload`. `get_accepted_*` prefers this over
    /// `payload` when present.
    pub curated: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: Uuid,
    pub type_tag: String,
    pub payload: Value,
    pub spans: Value,
}

#[derive(Debug, Clone, Default)]
pub struct CurationStats {
    pub entities_pending: i64,
    pub entities_accepted: i64,
    pub entities_rejected: i64,
    pub relations_pending: i64,
    pub relations_accepted: i64,
    pub relations_rejected: i64,
    pub concept_candidates_pending: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PendingCurationTasks {
    pub journals_pending_entities: Vec<Uuid>,
    pub journals_pending_relations: Vec<Uuid>,
}

/// Which item table an operation targets. Internal: the three tables
/// share the same id/journal_id/payload/status/spans/created_at/decided_at
/// shape and differ only in their type-discriminant column name.
enum Table {
    Entity,
    Relation,
    ConceptCandidate,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Table::Entity => "entity_items",
            Table::Relation => "relation_items",
            Table::ConceptCandidate => "concept_candidate_items",
        }
    }

    fn type_column(&self) -> &'static str {
        match self {
            Table::Entity => "entity_type",
            Table::Relation => "relation_kind",
            Table::ConceptCandidate => "payload_json", // unused, no discriminant column
        }
    }
}

#[derive(Clone)]
pub struct CurationStore {
    conn: Arc<Mutex<Connection>>,
}

impl CurationStore {
    pub async fn open(path: &Path) -> Result<Self, CurationError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn open_in_memory() -> Result<Self, CurationError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn create_journal_for_curation(&self, journal_id: Uuid) -> Result<(), CurationError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO journals (id, overall_status, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![journal_id.to_string(), JournalOverallStatus::PendingEntities.as_str(), now],
        )?;
        Ok(())
    }

    pub async fn get_journal_status(&self, journal_id: Uuid) -> Result<JournalOverallStatus, CurationError> {
        let conn = self.conn.lock().await;
        let status: String = conn
            .query_row(
                "SELECT overall_status FROM journals WHERE id = ?1",
                params![journal_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(CurationError::JournalNotFound(journal_id))?;
        Ok(JournalOverallStatus::parse(&status))
    }

    pub async fn update_journal_status(
        &self,
        journal_id: Uuid,
        status: JournalOverallStatus,
    ) -> Result<(), CurationError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE journals SET overall_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), journal_id.to_string()],
        )?;
        if changed == 0 {
            return Err(CurationError::JournalNotFound(journal_id));
        }
        Ok(())
    }

    async fn queue_items(
        &self,
        table: Table,
        journal_id: Uuid,
        items: Vec<NewItem>,
    ) -> Result<Vec<Uuid>, CurationError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        let mut ids = Vec::with_capacity(items.len());
        let table_name = table.name();
        for item in items {
            match table {
                Table::ConceptCandidate => {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table_name} (id, journal_id, payload_json, status, spans_json, created_at) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                        ),
                        params![
                            item.id.to_string(),
                            journal_id.to_string(),
                            item.payload.to_string(),
                            ItemStatus::Pending.as_str(),
                            item.spans.to_string(),
                            now,
                        ],
                    )?;
                }
                _ => {
                    let type_col = table.type_column();
                    conn.execute(
                        &format!(
                            "INSERT INTO {table_name} (id, journal_id, {type_col}, payload_json, status, spans_json, created_at) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                        ),
                        params![
                            item.id.to_string(),
                            journal_id.to_string(),
                            item.type_tag,
                            item.payload.to_string(),
                            ItemStatus::Pending.as_str(),
                            item.spans.to_string(),
                            now,
                        ],
                    )?;
                }
            }
            ids.push(item.id);
        }
        Ok(ids)
    }

    fn row_to_item(table: &Table, row: &rusqlite::Row<'_>) -> rusqlite::Result<CurationItem> {
        let id: String = row.get("id")?;
        let journal_id: String = row.get("journal_id")?;
        let type_tag: String = match table {
            Table::ConceptCandidate => "ConceptCandidate".to_string(),
            _ => row.get(table.type_column())?,
        };
        let payload_json: String = row.get("payload_json")?;
        let status: String = row.get("status")?;
        let spans_json: String = row.get("spans_json")?;
        let curated_json: Option<String> = row.get("curated_json")?;
        let created_at: String = row.get("created_at")?;
        let decided_at: Option<String> = row.get("decided_at")?;
        Ok(CurationItem {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            journal_id: Uuid::parse_str(&journal_id).unwrap_or_default(),
            type_tag,
            payload: serde_json::from_str(&payload_json).unwrap_or(Value::Null),
            status: ItemStatus::parse(&status),
            spans: serde_json::from_str(&spans_json).unwrap_or(Value::Null),
            curated: curated_json.and_then(|s| serde_json::from_str(&s).ok()),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            decided_at: decided_at.and_then(|d| DateTime::parse_from_rfc3339(&d).ok()).map(|d| d.with_timezone(&Utc)),
        })
    }

    async fn decide_item(&self, table: Table, item_id: Uuid, decision: ItemStatus) -> Result<CurationItem, CurationError> {
        let conn = self.conn.lock().await;
        let table_name = table.name();
        let existing = conn
            .query_row(&format!("SELECT * FROM {table_name} WHERE id = ?1"), params![item_id.to_string()], |row| {
                Self::row_to_item(&table, row)
            })
            .optional()?
            .ok_or(CurationError::ItemNotFound(item_id))?;

        // Deciding an item already off PENDING is always a no-op, whether
        // the new decision matches the recorded one or not: the status
        // lattice is terminal once decided, and re-deciding never raises.
        if existing.status != ItemStatus::Pending {
            return Ok(existing);
        }

        conn.execute(
            &format!("UPDATE {table_name} SET status = ?1, decided_at = ?2 WHERE id = ?3"),
            params![decision.as_str(), Utc::now().to_rfc3339(), item_id.to_string()],
        )?;

        Ok(CurationItem {
            status: decision,
            decided_at: Some(Utc::now()),
            ..existing
        })
    }

    async fn list_by_status(&self, table: Table, journal_id: Uuid, status: ItemStatus) -> Result<Vec<CurationItem>, CurationError> {
        let conn = self.conn.lock().await;
        let table_name = table.name();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {table_name} WHERE journal_id = ?1 AND status = ?2 ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![journal_id.to_string(), status.as_str()], |row| Self::row_to_item(&table, row))?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    async fn pending_count(&self, table: &str, journal_id: Uuid) -> Result<i64, CurationError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE journal_id = ?1 AND status = 'PENDING'"),
            params![journal_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // -- entities ---------------------------------------------------

    pub async fn queue_entities_for_curation(&self, journal_id: Uuid, items: Vec<NewItem>) -> Result<Vec<Uuid>, CurationError> {
        self.queue_items(Table::Entity, journal_id, items).await
    }

    /// Accepts a proposed entity, optionally overriding the LLM-proposed
    /// payload with operator-edited `curated_json`. If `is_user_added`,
    /// inserts a brand new ACCEPTED row instead of updating `item_id` (a
    /// human-added entity the extraction engine never proposed). Returns
    /// the effective item uuid, or `None` if the target row is no longer
    /// PENDING (an idempotent no-op, never an error).
    pub async fn accept_entity(
        &self,
        journal_id: Uuid,
        item_id: Uuid,
        curated_json: Option<Value>,
        is_user_added: bool,
    ) -> Result<Option<Uuid>, CurationError> {
        if is_user_added {
            return self.insert_user_added_entity(journal_id, curated_json).await.map(Some);
        }

        let conn = self.conn.lock().await;
        let current_status: Option<String> = conn
            .query_row("SELECT status FROM entity_items WHERE id = ?1", params![item_id.to_string()], |row| row.get(0))
            .optional()?;
        let current_status = current_status.ok_or(CurationError::ItemNotFound(item_id))?;
        if ItemStatus::parse(&current_status) != ItemStatus::Pending {
            return Ok(None);
        }

        let curated_str = curated_json.as_ref().map(|v| v.to_string());
        conn.execute(
            "UPDATE entity_items SET status = ?1, decided_at = ?2, curated_json = ?3 WHERE id = ?4 AND journal_id = ?5",
            params![ItemStatus::Accepted.as_str(), Utc::now().to_rfc3339(), curated_str, item_id.to_string(), journal_id.to_string()],
        )?;
        Ok(Some(item_id))
    }

    async fn insert_user_added_entity(&self, journal_id: Uuid, curated_json: Option<Value>) -> Result<Uuid, CurationError> {
        let id = Uuid::new_v4();
        let payload = curated_json.clone().unwrap_or(Value::Null);
        let entity_type = payload.get("entity_type").and_then(|v| v.as_str()).unwrap_or("Unknown").to_string();
        let curated_str = curated_json.as_ref().map(|v| v.to_string());
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO entity_items (id, journal_id, entity_type, payload_json, status, spans_json, curated_json, created_at, decided_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id.to_string(),
                journal_id.to_string(),
                entity_type,
                payload.to_string(),
                ItemStatus::Accepted.as_str(),
                Value::Null.to_string(),
                curated_str,
                now,
            ],
        )?;
        Ok(id)
    }

    pub async fn reject_entity(&self, item_id: Uuid) -> Result<CurationItem, CurationError> {
        self.decide_item(Table::Entity, item_id, ItemStatus::Rejected).await
    }

    /// Reconstitutes accepted entities, preferring the operator-curated
    /// payload over the original LLM proposal when one was recorded.
    pub async fn get_accepted_entities_with_spans(&self, journal_id: Uuid) -> Result<Vec<CurationItem>, CurationError> {
        let mut items = self.list_by_status(Table::Entity, journal_id, ItemStatus::Accepted).await?;
        for item in &mut items {
            if let Some(curated) = item.curated.take() {
                item.payload = curated;
            }
        }
        Ok(items)
    }

    /// Advances `PendingEntities -> EntitiesDone` once no entity item (nor
    /// concept candidate item, per SPEC_FULL S5) for the journal remains
    /// pending. No-op if items are still pending.
    pub async fn complete_entity_phase(&self, journal_id: Uuid) -> Result<bool, CurationError> {
        let entities_pending = self.pending_count("entity_items", journal_id).await?;
        let concepts_pending = self.pending_count("concept_candidate_items", journal_id).await?;
        if entities_pending > 0 || concepts_pending > 0 {
            return Ok(false);
        }
        self.update_journal_status(journal_id, JournalOverallStatus::EntitiesDone).await?;
        Ok(true)
    }

    // -- concept candidates (ADDED) ----------------------------------

    pub async fn queue_concept_candidates_for_curation(&self, journal_id: Uuid, items: Vec<NewItem>) -> Result<Vec<Uuid>, CurationError> {
        self.queue_items(Table::ConceptCandidate, journal_id, items).await
    }

    pub async fn accept_concept_candidate(&self, item_id: Uuid) -> Result<CurationItem, CurationError> {
        self.decide_item(Table::ConceptCandidate, item_id, ItemStatus::Accepted).await
    }

    pub async fn reject_concept_candidate(&self, item_id: Uuid) -> Result<CurationItem, CurationError> {
        self.decide_item(Table::ConceptCandidate, item_id, ItemStatus::Rejected).await
    }

    pub async fn get_accepted_concept_candidates_with_spans(&self, journal_id: Uuid) -> Result<Vec<CurationItem>, CurationError> {
        self.list_by_status(Table::ConceptCandidate, journal_id, ItemStatus::Accepted).await
    }

    // -- relations ----------------------------------------------------

    pub async fn queue_relationships_for_curation(&self, journal_id: Uuid, items: Vec<NewItem>) -> Result<Vec<Uuid>, CurationError> {
        // Queuing relations is the signal that the journal has moved past
        // EntitiesDone into the relation-curation phase (SPEC_FULL S5).
        self.update_journal_status(journal_id, JournalOverallStatus::PendingRelations).await?;
        self.queue_items(Table::Relation, journal_id, items).await
    }

    pub async fn accept_relationship(&self, item_id: Uuid) -> Result<CurationItem, CurationError> {
        self.decide_item(Table::Relation, item_id, ItemStatus::Accepted).await
    }

    pub async fn reject_relationship(&self, item_id: Uuid) -> Result<CurationItem, CurationError> {
        self.decide_item(Table::Relation, item_id, ItemStatus::Rejected).await
    }

    pub async fn get_accepted_relationships_with_spans(&self, journal_id: Uuid) -> Result<Vec<CurationItem>, CurationError> {
        self.list_by_status(Table::Relation, journal_id, ItemStatus::Accepted).await
    }

    pub async fn complete_relationship_phase(&self, journal_id: Uuid) -> Result<bool, CurationError> {
        let pending = self.pending_count("relation_items", journal_id).await?;
        if pending > 0 {
            return Ok(false);
        }
        self.update_journal_status(journal_id, JournalOverallStatus::Completed).await?;
        Ok(true)
    }

    // -- dashboard queries --------------------------------------------

    pub async fn get_journals_pending_entity_curation(&self) -> Result<Vec<Uuid>, CurationError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id FROM journals WHERE overall_status = 'PENDING_ENTITIES'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(Uuid::parse_str(&row?).unwrap_or_default());
        }
        Ok(out)
    }

    pub async fn get_journals_pending_relationship_curation(&self) -> Result<Vec<Uuid>, CurationError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id FROM journals WHERE overall_status = 'PENDING_RELATIONS'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(Uuid::parse_str(&row?).unwrap_or_default());
        }
        Ok(out)
    }

    pub async fn get_all_pending_curation_tasks(&self) -> Result<PendingCurationTasks, CurationError> {
        Ok(PendingCurationTasks {
            journals_pending_entities: self.get_journals_pending_entity_curation().await?,
            journals_pending_relations: self.get_journals_pending_relationship_curation().await?,
        })
    }

    pub async fn get_curation_stats(&self) -> Result<CurationStats, CurationError> {
        let conn = self.conn.lock().await;
        let count = |table: &str, status: &str| -> Result<i64, CurationError> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table} WHERE status = ?1"), params![status], |row| row.get(0))?)
        };
        Ok(CurationStats {
            entities_pending: count("entity_items", "PENDING")?,
            entities_accepted: count("entity_items", "ACCEPTED")?,
            entities_rejected: count("entity_items", "REJECTED")?,
            relations_pending: count("relation_items", "PENDING")?,
            relations_accepted: count("relation_items", "ACCEPTED")?,
            relations_rejected: count("relation_items", "REJECTED")?,
            concept_candidates_pending: count("concept_candidate_items", "PENDING")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn new_store_with_journal() -> (CurationStore, Uuid) {
        let store = CurationStore::open_in_memory().await.unwrap();
        let journal_id = Uuid::new_v4();
        store.create_journal_for_curation(journal_id).await.unwrap();
        (store, journal_id)
    }

    #[tokio::test]
    async fn accepting_twice_leaves_exactly_one_accepted_row() {
        let (store, journal_id) = new_store_with_journal().await;
        let item_id = Uuid::new_v4();
        store
            .queue_entities_for_curation(
                journal_id,
                vec![NewItem {
                    id: item_id,
                    type_tag: "Person".into(),
                    payload: json!({"name": "Ana"}),
                    spans: json!([]),
                }],
            )
            .await
            .unwrap();

        let first = store.accept_entity(journal_id, item_id, None, false).await.unwrap();
        assert_eq!(first, Some(item_id));
        let second = store.accept_entity(journal_id, item_id, None, false).await.unwrap();
        assert_eq!(second, None);

        let accepted = store.get_accepted_entities_with_spans(journal_id).await.unwrap();
        assert_eq!(accepted.len(), 1);
    }

    #[tokio::test]
    async fn accepting_after_reject_is_a_noop() {
        let (store, journal_id) = new_store_with_journal().await;
        let item_id = Uuid::new_v4();
        store
            .queue_entities_for_curation(
                journal_id,
                vec![NewItem {
                    id: item_id,
                    type_tag: "Person".into(),
                    payload: json!({"name": "Ana"}),
                    spans: json!([]),
                }],
            )
            .await
            .unwrap();
        store.reject_entity(item_id).await.unwrap();
        let result = store.accept_entity(journal_id, item_id, None, false).await.unwrap();
        assert_eq!(result, None);

        let accepted = store.get_accepted_entities_with_spans(journal_id).await.unwrap();
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn accept_entity_persists_curated_data_over_the_original_payload() {
        let (store, journal_id) = new_store_with_journal().await;
        let item_id = Uuid::new_v4();
        store
            .queue_entities_for_curation(
                journal_id,
                vec![NewItem {
                    id: item_id,
                    type_tag: "Person".into(),
                    payload: json!({"entity_type": "Person", "name": "Ana"}),
                    spans: json!([]),
                }],
            )
            .await
            .unwrap();

        let curated = json!({"entity_type": "Person", "name": "Ana Sorin"});
        store.accept_entity(journal_id, item_id, Some(curated.clone()), false).await.unwrap();

        let accepted = store.get_accepted_entities_with_spans(journal_id).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].payload, curated);
    }

    #[tokio::test]
    async fn accept_entity_with_is_user_added_inserts_a_fresh_row() {
        let (store, journal_id) = new_store_with_journal().await;
        let curated = json!({"entity_type": "Person", "name": "Walk-in friend"});
        let new_uuid = store.accept_entity(journal_id, Uuid::new_v4(), Some(curated.clone()), true).await.unwrap().unwrap();

        let accepted = store.get_accepted_entities_with_spans(journal_id).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, new_uuid);
        assert_eq!(accepted[0].payload, curated);
    }

    #[tokio::test]
    async fn entity_phase_completes_only_when_all_items_decided() {
        let (store, journal_id) = new_store_with_journal().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .queue_entities_for_curation(
                journal_id,
                vec![
                    NewItem { id: a, type_tag: "Person".into(), payload: json!({}), spans: json!([]) },
                    NewItem { id: b, type_tag: "Place".into(), payload: json!({}), spans: json!([]) },
                ],
            )
            .await
            .unwrap();

        assert!(!store.complete_entity_phase(journal_id).await.unwrap());
        store.accept_entity(journal_id, a, None, false).await.unwrap();
        assert!(!store.complete_entity_phase(journal_id).await.unwrap());
        store.reject_entity(b).await.unwrap();
        assert!(store.complete_entity_phase(journal_id).await.unwrap());
        assert_eq!(store.get_journal_status(journal_id).await.unwrap(), JournalOverallStatus::EntitiesDone);
    }
}
