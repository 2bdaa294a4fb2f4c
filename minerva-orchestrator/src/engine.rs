//! The durable pipeline engine: drives one journal entry through the
//! stage state machine in `state.rs`, retrying non-gate activities per
//! `RetryPolicy::activity_default()` and heartbeat-polling the two
//! human-curation gate stages on a 30-second interval against a 7-day
//! schedule-to-close deadline.

use crate::concept_workflow::ConceptExtractionWorkflow;
use crate::errors::OrchestratorError;
use crate::log::PipelineLog;
use crate::state::PipelineStage;
use minerva_core::retry::RetryPolicy;
use minerva_core::types::{Entity, EntityLookup, JournalEntry, NodeMeta, ProposedRelation, Quote, Span};
use minerva_curation::{CurationStore, NewItem};
use minerva_extraction::{build_entity_lookup, hydrate_span, ExtractionEngine, KnownEntity};
use minerva_graph::GraphStore;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};
use uuid::Uuid;

const GATE_POLL_INTERVAL: Duration = Duration::from_secs(30);
const GATE_SCHEDULE_TO_CLOSE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct PipelineEngine {
    curation: CurationStore,
    extraction: Arc<ExtractionEngine>,
    graph: Arc<dyn GraphStore>,
    concept_workflow: ConceptExtractionWorkflow,
    log: PipelineLog,
    cancellations: Mutex<HashMap<Uuid, Arc<Notify>>>,
}

impl PipelineEngine {
    pub fn new(curation: CurationStore, extraction: Arc<ExtractionEngine>, graph: Arc<dyn GraphStore>, log: PipelineLog) -> Self {
        let concept_workflow = ConceptExtractionWorkflow::new(extraction.clone(), graph.clone());
        Self {
            curation,
            extraction,
            graph,
            concept_workflow,
            log,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    /// Resumes a journal from the last durably recorded stage, or starts
    /// fresh at `Submitted` if no history exists. Already-committed
    /// curation decisions and graph writes are never re-done or rolled
    /// back; resuming only skips stages whose side effects already
    /// happened.
    pub async fn run(&self, journal: JournalEntry, known_entities: Vec<KnownEntity>) -> Result<(), OrchestratorError> {
        let journal_id = journal.meta.uuid;
        let resume_from = self.log.last_stage(journal_id).await?.unwrap_or(PipelineStage::Submitted);
        info!(%journal_id, ?resume_from, "starting pipeline run");

        if resume_from == PipelineStage::Submitted {
            self.curation.create_journal_for_curation(journal_id).await?;
            self.log.record_stage(journal_id, PipelineStage::Submitted, 1, None).await?;
        }

        if self.is_before(resume_from, PipelineStage::SubmitEntityCuration) {
            self.stage_entity_processing(&journal, &known_entities).await?;
        }
        if self.is_before(resume_from, PipelineStage::WaitEntityCuration) {
            self.log.record_stage(journal_id, PipelineStage::SubmitEntityCuration, 1, None).await?;
        }
        self.wait_for_gate(journal_id, PipelineStage::WaitEntityCuration, |curation, id| async move {
            curation.complete_entity_phase(id).await.map_err(OrchestratorError::from)
        })
        .await?;

        if self.is_before(resume_from, PipelineStage::SubmitRelationCuration) {
            self.stage_relation_processing(&journal).await?;
        }
        if self.is_before(resume_from, PipelineStage::WaitRelationCuration) {
            self.log.record_stage(journal_id, PipelineStage::SubmitRelationCuration, 1, None).await?;
        }
        self.wait_for_gate(journal_id, PipelineStage::WaitRelationCuration, |curation, id| async move {
            curation.complete_relationship_phase(id).await.map_err(OrchestratorError::from)
        })
        .await?;

        self.stage_db_write(&journal).await?;
        self.log.record_stage(journal_id, PipelineStage::Completed, 1, None).await?;
        info!(%journal_id, "pipeline run completed");
        Ok(())
    }

    fn is_before(&self, current: PipelineStage, target: PipelineStage) -> bool {
        stage_ordinal(current) < stage_ordinal(target)
    }

    async fn stage_entity_processing(&self, journal: &JournalEntry, known_entities: &[KnownEntity]) -> Result<(), OrchestratorError> {
        let journal_id = journal.meta.uuid;
        let lookup: EntityLookup = build_entity_lookup(known_entities, &journal.narrative);

        let hydrated_entities = self
            .execute_with_retry(journal_id, PipelineStage::EntityProcessing, || {
                let extraction = self.extraction.clone();
                let narrative = journal.narrative.clone();
                let lookup = lookup.clone();
                async move { extraction.extract_entities(&narrative, &lookup).await }
            })
            .await?;

        let concept_candidates = self.concept_workflow.run(&journal.narrative).await;

        let entity_items: Vec<NewItem> = hydrated_entities
            .into_iter()
            .map(|h| NewItem {
                id: h.entity.common().meta.uuid,
                type_tag: h.entity.entity_type().label().to_string(),
                payload: serde_json::to_value(&h.entity).unwrap_or_default(),
                spans: serde_json::to_value(h.span).unwrap_or_default(),
            })
            .collect();
        self.curation.queue_entities_for_curation(journal_id, entity_items).await?;

        let concept_items: Vec<NewItem> = concept_candidates
            .into_iter()
            .map(|entity| {
                let span = hydrate_span(&journal.narrative, &entity.common().name).unwrap_or_default();
                NewItem {
                    id: entity.common().meta.uuid,
                    type_tag: "Concept".to_string(),
                    payload: serde_json::to_value(&entity).unwrap_or_default(),
                    spans: serde_json::to_value(span).unwrap_or_default(),
                }
            })
            .collect();
        if !concept_items.is_empty() {
            self.curation.queue_concept_candidates_for_curation(journal_id, concept_items).await?;
        }

        Ok(())
    }

    async fn stage_relation_processing(&self, journal: &JournalEntry) -> Result<(), OrchestratorError> {
        let journal_id = journal.meta.uuid;
        let accepted = self.curation.get_accepted_entities_with_spans(journal_id).await?;
        let entities: Vec<Entity> = accepted
            .into_iter()
            .filter_map(|item| serde_json::from_value(item.payload).ok())
            .collect();

        let hydrated_relations = self
            .execute_with_retry(journal_id, PipelineStage::RelationProcessing, || {
                let extraction = self.extraction.clone();
                let narrative = journal.narrative.clone();
                let entities = entities.clone();
                async move { extraction.extract_relations(&narrative, &entities).await }
            })
            .await?;

        let relation_items: Vec<NewItem> = hydrated_relations
            .into_iter()
            .map(|h| {
                let kind = match &h.relation {
                    ProposedRelation::Generic(r) => format!("{:?}", r.kind),
                    ProposedRelation::Concept(r) => format!("{:?}", r.kind),
                };
                NewItem {
                    id: Uuid::new_v4(),
                    type_tag: kind,
                    payload: serde_json::to_value(&h.relation).unwrap_or_default(),
                    spans: serde_json::to_value(h.span).unwrap_or_default(),
                }
            })
            .collect();

        if !relation_items.is_empty() {
            self.curation.queue_relationships_for_curation(journal_id, relation_items).await?;
        }
        Ok(())
    }

    async fn stage_db_write(&self, journal: &JournalEntry) -> Result<(), OrchestratorError> {
        let journal_id = journal.meta.uuid;
        let accepted_entities = self.curation.get_accepted_entities_with_spans(journal_id).await?;
        let accepted_relations = self.curation.get_accepted_relationships_with_spans(journal_id).await?;
        let accepted_concepts = self.curation.get_accepted_concept_candidates_with_spans(journal_id).await?;

        self.execute_with_retry(journal_id, PipelineStage::DbWrite, || {
            let graph = self.graph.clone();
            let narrative = journal.narrative.clone();
            let accepted_entities = accepted_entities.clone();
            let accepted_relations = accepted_relations.clone();
            let accepted_concepts = accepted_concepts.clone();
            async move {
                for item in &accepted_entities {
                    if let Ok(entity) = serde_json::from_value::<Entity>(item.payload.clone()) {
                        graph.upsert(entity).await?;
                    }
                }
                for item in &accepted_relations {
                    if let Ok(proposed) = serde_json::from_value::<ProposedRelation>(item.payload.clone()) {
                        match proposed {
                            ProposedRelation::Generic(r) => {
                                graph.upsert_relation(r).await?;
                            }
                            ProposedRelation::Concept(r) => {
                                graph.create_concept_relation(r).await?;
                            }
                        }
                    }
                }
                for item in &accepted_concepts {
                    let Ok(concept) = serde_json::from_value::<Entity>(item.payload.clone()) else { continue };
                    let span: Option<Span> = serde_json::from_value(item.spans.clone()).ok();
                    let concept = graph.upsert(concept).await?;
                    if let Some(quote_text) = span.and_then(|s| s.slice(&narrative)).map(str::to_string) {
                        let quote = Quote { meta: NodeMeta::new(), journal_id, text: quote_text, span };
                        let quote = graph.create_quote(quote).await?;
                        graph.create_quote_support(quote.meta.uuid, concept.common().meta.uuid).await?;
                    }
                }
                Ok::<(), minerva_graph::GraphError>(())
            }
        })
        .await?;
        info!(%journal_id, "content marked processed");
        Ok(())
    }

    /// Cancels a running journal. Non-fatal to already-committed state:
    /// curation decisions already made and graph writes already committed
    /// stand. Only further stage advancement is stopped.
    pub async fn cancel(&self, journal_id: Uuid) -> Result<(), OrchestratorError> {
        if let Some(token) = self.cancellations.lock().await.get(&journal_id) {
            token.notify_waiters();
        }
        self.log.record_stage(journal_id, PipelineStage::Cancelled, 0, None).await
    }

    async fn cancellation_token(&self, journal_id: Uuid) -> Arc<Notify> {
        self.cancellations.lock().await.entry(journal_id).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    async fn wait_for_gate<F, Fut>(&self, journal_id: Uuid, stage: PipelineStage, check: F) -> Result<(), OrchestratorError>
    where
        F: Fn(CurationStore, Uuid) -> Fut,
        Fut: Future<Output = Result<bool, OrchestratorError>>,
    {
        let token = self.cancellation_token(journal_id).await;
        let deadline = tokio::time::Instant::now() + GATE_SCHEDULE_TO_CLOSE;
        let mut interval = tokio::time::interval(GATE_POLL_INTERVAL);

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(OrchestratorError::DeadlineExceeded(stage));
            }
            tokio::select! {
                _ = token.notified() => return Err(OrchestratorError::Cancelled(journal_id)),
                _ = interval.tick() => {
                    if check(self.curation.clone(), journal_id).await? {
                        self.log.record_stage(journal_id, stage, 1, None).await?;
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn execute_with_retry<T, E, Fut, F>(&self, journal_id: Uuid, stage: PipelineStage, mut op: F) -> Result<T, OrchestratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<OrchestratorError> + std::fmt::Display,
    {
        let policy = RetryPolicy::activity_default();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    self.log.record_stage(journal_id, stage, attempt, None).await?;
                    return Ok(value);
                }
                Err(e) => {
                    let message = truncate_message(&e.to_string());
                    warn!(%journal_id, ?stage, attempt, error = %message, "activity attempt failed");
                    self.log.record_stage(journal_id, stage, attempt, Some(&message)).await?;
                    match policy.backoff_for_attempt(attempt) {
                        Some(backoff) => tokio::time::sleep(backoff).await,
                        None => return Err(OrchestratorError::RetriesExhausted(stage, message)),
                    }
                }
            }
        }
    }
}

const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Clips an activity error message to the stage log's column budget,
/// cutting on a char boundary rather than a byte offset.
fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
        Some((cut, _)) => message[..cut].to_string(),
        None => message.to_string(),
    }
}

fn stage_ordinal(stage: PipelineStage) -> u8 {
    use PipelineStage::*;
    match stage {
        Submitted => 0,
        EntityProcessing => 1,
        SubmitEntityCuration => 2,
        WaitEntityCuration => 3,
        RelationProcessing => 4,
        SubmitRelationCuration => 5,
        WaitRelationCuration => 6,
        DbWrite => 7,
        Completed => 8,
        Failed | Cancelled => 9,
    }
}
