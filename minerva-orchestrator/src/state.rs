//! The pipeline stage state machine, grounded on
//! `temporal_orchestrator.py`'s `PipelineStage` enum and `PipelineState`
//! model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Submitted,
    EntityProcessing,
    SubmitEntityCuration,
    WaitEntityCuration,
    RelationProcessing,
    SubmitRelationCuration,
    WaitRelationCuration,
    DbWrite,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineStage {
    pub fn next(&self) -> Option<PipelineStage> {
        use PipelineStage::*;
        match self {
            Submitted => Some(EntityProcessing),
            EntityProcessing => Some(SubmitEntityCuration),
            SubmitEntityCuration => Some(WaitEntityCuration),
            WaitEntityCuration => Some(RelationProcessing),
            RelationProcessing => Some(SubmitRelationCuration),
            SubmitRelationCuration => Some(WaitRelationCuration),
            WaitRelationCuration => Some(DbWrite),
            DbWrite => Some(Completed),
            Completed | Failed | Cancelled => None,
        }
    }

    /// Whether this stage is a human-gate activity, carrying the 7-day
    /// schedule-to-close timeout and 2-minute heartbeat rather than the
    /// activity default retry policy.
    pub fn is_gate(&self) -> bool {
        matches!(self, PipelineStage::WaitEntityCuration | PipelineStage::WaitRelationCuration)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed | PipelineStage::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub journal_id: Uuid,
    pub stage: PipelineStage,
    pub attempt: u32,
    pub updated_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
}

impl PipelineState {
    pub fn new(journal_id: Uuid) -> Self {
        Self {
            journal_id,
            stage: PipelineStage::Submitted,
            attempt: 0,
            updated_at: Utc::now(),
            failure_reason: None,
        }
    }
}
