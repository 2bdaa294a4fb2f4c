//! Ties lookup, span hydration, dedup and an `LlmClient` together into the
//! entity/relation/concept extraction passes the orchestrator drives.

use crate::dedup::dedupe_proposed_entities;
use crate::errors::ExtractionError;
use crate::span::hydrate_span;
use minerva_core::types::{Entity, EntityLookup, ProposedRelation, Span};
use minerva_llm::{CompletionRequest, LlmClient};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ExtractionEngine {
    llm: Arc<dyn LlmClient>,
}

/// A proposed entity paired with the span (if any) that supports it in the
/// source narrative.
pub struct HydratedEntity {
    pub entity: Entity,
    pub span: Option<Span>,
}

pub struct HydratedRelation {
    pub relation: ProposedRelation,
    pub span: Option<Span>,
}

/// Result of the concept-candidate self-critique pass.
pub struct ConceptCritique {
    pub surviving: Vec<Entity>,
    pub refine_requested: bool,
}

impl ExtractionEngine {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Extracts candidate entities from a journal narrative, deduplicates
    /// within the batch, and hydrates a supporting span for each from the
    /// narrative text.
    pub async fn extract_entities(&self, narrative: &str, lookup: &EntityLookup) -> Result<Vec<HydratedEntity>, ExtractionError> {
        let prompt = build_entity_extraction_prompt(narrative, lookup);
        let response = self
            .llm
            .complete(CompletionRequest::new(prompt).with_json_schema_hint("array of tagged entity objects"))
            .await?;

        let proposed: Vec<Entity> = serde_json::from_str(&response.text)
            .map_err(|e| ExtractionError::InvalidLlmResponse(format!("{e}: {}", response.text)))?;
        let deduped = dedupe_proposed_entities(proposed);

        Ok(deduped
            .into_iter()
            .map(|entity| {
                let span = hydrate_span(narrative, &entity.common().name).unwrap_or_default();
                HydratedEntity { entity, span }
            })
            .collect())
    }

    pub async fn extract_relations(&self, narrative: &str, entities: &[Entity]) -> Result<Vec<HydratedRelation>, ExtractionError> {
        let prompt = build_relation_extraction_prompt(narrative, entities);
        let response = self
            .llm
            .complete(CompletionRequest::new(prompt).with_json_schema_hint("array of tagged relation objects"))
            .await?;

        let proposed: Vec<ProposedRelation> = serde_json::from_str(&response.text)
            .map_err(|e| ExtractionError::InvalidLlmResponse(format!("{e}: {}", response.text)))?;

        Ok(proposed
            .into_iter()
            .map(|relation| {
                let summary = match &relation {
                    ProposedRelation::Generic(r) => r.summary.clone(),
                    ProposedRelation::Concept(r) => r.summary.clone(),
                };
                let span = hydrate_span(narrative, &summary).unwrap_or_default();
                HydratedRelation { relation, span }
            })
            .collect())
    }

    /// Candidate concept extraction. Falls back to an empty candidate list
    /// on LLM failure rather than failing the parent stage, per the
    /// original `extract_candidate_concepts`'s exception-swallowing
    /// behavior.
    pub async fn extract_candidate_concepts(&self, narrative: &str) -> Vec<Entity> {
        let prompt = format!(
            "Identify abstract concepts referenced in this journal entry. Respond with a JSON array of Concept entities.\n\n{narrative}"
        );
        match self.llm.complete(CompletionRequest::new(prompt)).await {
            Ok(response) => serde_json::from_str(&response.text).unwrap_or_else(|e| {
                warn!(error = %e, "candidate concept extraction returned unparseable json, continuing with none");
                Vec::new()
            }),
            Err(e) => {
                warn!(error = %e, "candidate concept extraction failed, continuing with no candidates");
                Vec::new()
            }
        }
    }

    /// Second LLM pass over candidate concepts: scores the set and may
    /// drop low-confidence candidates, optionally requesting one refine
    /// pass.
    pub async fn self_critique_concepts(&self, candidates: Vec<Entity>) -> ConceptCritique {
        if candidates.is_empty() {
            return ConceptCritique { surviving: candidates, refine_requested: false };
        }
        let names: Vec<&str> = candidates.iter().map(|e| e.common().name.as_str()).collect();
        let prompt = format!(
            "Review this list of candidate concepts for quality and specificity: {}. \
             Respond with a JSON object: {{\"keep\": [names], \"refine\": bool}}.",
            names.join(", ")
        );
        let critique = self.llm.complete(CompletionRequest::new(prompt)).await;
        match critique {
            Ok(response) => match serde_json::from_str::<CritiqueResponse>(&response.text) {
                Ok(parsed) => {
                    let surviving = candidates
                        .into_iter()
                        .filter(|e| parsed.keep.iter().any(|k| k.eq_ignore_ascii_case(&e.common().name)))
                        .collect();
                    ConceptCritique { surviving, refine_requested: parsed.refine }
                }
                Err(_) => ConceptCritique { surviving: candidates, refine_requested: false },
            },
            Err(e) => {
                debug!(error = %e, "self-critique call failed, keeping all candidates");
                ConceptCritique { surviving: candidates, refine_requested: false }
            }
        }
    }
}

#[derive(serde::Deserialize)]
struct CritiqueResponse {
    keep: Vec<String>,
    refine: bool,
}

fn build_entity_extraction_prompt(narrative: &str, lookup: &EntityLookup) -> String {
    let known_names: Vec<&String> = lookup.name_to_uuid.keys().collect();
    format!(
        "Extract entities (Person, Emotion, FeelingEmotion, FeelingConcept, Event, Project, Concept, \
         Content, Consumable, Place) from this journal narrative. Known entities already in the graph: \
         {known_names:?}. Respond with a JSON array of tagged entity objects.\n\nNarrative:\n{narrative}"
    )
}

fn build_relation_extraction_prompt(narrative: &str, entities: &[Entity]) -> String {
    let names: Vec<&String> = entities.iter().map(|e| &e.common().name).collect();
    format!(
        "Given these entities: {names:?}, extract relations between them from the narrative below. \
         Respond with a JSON array of tagged relation objects.\n\nNarrative:\n{narrative}"
    )
}
