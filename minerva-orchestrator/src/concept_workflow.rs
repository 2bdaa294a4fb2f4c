//! The concept extraction sub-workflow, grounded stage-for-stage on
//! `concept_extraction_workflow.py`: candidate extraction, duplicate
//! detection against the existing graph, relation discovery (a stub in
//! the original, kept as one here), self-critique, and at most one
//! refine-and-retry pass.

use minerva_core::types::{Entity, EntityType};
use minerva_extraction::ExtractionEngine;
use minerva_graph::GraphStore;
use std::sync::Arc;
use tracing::debug;

pub struct ConceptExtractionWorkflow {
    extraction: Arc<ExtractionEngine>,
    graph: Arc<dyn GraphStore>,
}

impl ConceptExtractionWorkflow {
    pub fn new(extraction: Arc<ExtractionEngine>, graph: Arc<dyn GraphStore>) -> Self {
        Self { extraction, graph }
    }

    /// Runs the full sub-workflow and returns the surviving concept
    /// candidates, ready to be queued for curation.
    pub async fn run(&self, narrative: &str) -> Vec<Entity> {
        let candidates = self.extraction.extract_candidate_concepts(narrative).await;
        let deduped = self.detect_duplicates(candidates).await;

        // Relation discovery between candidates and existing concepts is a
        // stub in the original workflow this is grounded on; no relations
        // are proposed at this stage here either.
        let _ = self.discover_relations(&deduped).await;

        let critique = self.extraction.self_critique_concepts(deduped).await;
        if critique.refine_requested {
            debug!("concept self-critique requested refinement, re-running extraction once");
            let refined = self.extraction.extract_candidate_concepts(narrative).await;
            let refined_deduped = self.detect_duplicates(refined).await;
            let final_critique = self.extraction.self_critique_concepts(refined_deduped).await;
            return final_critique.surviving;
        }

        critique.surviving
    }

    async fn detect_duplicates(&self, candidates: Vec<Entity>) -> Vec<Entity> {
        let mut surviving = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.graph.find_by_name(EntityType::Concept, &candidate.common().name).await {
                Ok(Some(_)) => debug!(name = %candidate.common().name, "dropping concept candidate, already exists in graph"),
                _ => surviving.push(candidate),
            }
        }
        surviving
    }

    async fn discover_relations(&self, _candidates: &[Entity]) -> Vec<()> {
        Vec::new()
    }
}
