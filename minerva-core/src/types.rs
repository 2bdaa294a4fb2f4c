//! Data model: journal entries, lexical artifacts, domain entities and relations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Which partition of the graph a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Partition {
    Domain,
    Lexical,
    Temporal,
}

/// Common fields every persisted node carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMeta {
    pub uuid: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NodeMeta {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}

impl Default for NodeMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for NodeMeta {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}
impl Eq for NodeMeta {}
impl std::hash::Hash for NodeMeta {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// A document additionally carries a partition tag.
pub trait Document {
    fn meta(&self) -> &NodeMeta;
    fn partition(&self) -> Partition;
}

// ---------------------------------------------------------------------
// Journal entries
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanasScores {
    pub positive_affect: Option<f32>,
    pub negative_affect: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BpnsScores {
    pub autonomy: Option<f32>,
    pub competence: Option<f32>,
    pub relatedness: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlourishingScores {
    pub overall: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub meta: NodeMeta,
    pub date: NaiveDate,
    pub wake_time: Option<NaiveTime>,
    pub sleep_time: Option<NaiveTime>,
    pub narrative: String,
    pub panas: Option<PanasScores>,
    pub bpns: Option<BpnsScores>,
    pub flourishing: Option<FlourishingScores>,
}

impl Document for JournalEntry {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn partition(&self) -> Partition {
        Partition::Lexical
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("journal text is missing a date header")]
    MissingDate,
    #[error("could not locate the narrative section")]
    MissingNarrative,
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

impl JournalEntry {
    /// Parses a journal template: a date header, optional wake/sleep time
    /// lines, optional PANAS/BPNS/Flourishing score blocks, and a free
    /// narrative section. Missing optional blocks parse to `None`.
    pub fn from_text(raw: &str) -> Result<Self, ParseError> {
        let mut date: Option<NaiveDate> = None;
        let mut wake_time: Option<NaiveTime> = None;
        let mut sleep_time: Option<NaiveTime> = None;
        let mut narrative_lines: Vec<&str> = Vec::new();
        let mut in_narrative = false;

        for line in raw.lines() {
            let trimmed = line.trim();
            if in_narrative {
                narrative_lines.push(line);
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("Date:") {
                date = Some(
                    NaiveDate::parse_from_str(rest.trim(), "%Y-%m-%d")
                        .map_err(|_| ParseError::InvalidDate(rest.trim().to_string()))?,
                );
            } else if let Some(rest) = trimmed.strip_prefix("Wake:") {
                wake_time = NaiveTime::parse_from_str(rest.trim(), "%H:%M").ok();
            } else if let Some(rest) = trimmed.strip_prefix("Sleep:") {
                sleep_time = NaiveTime::parse_from_str(rest.trim(), "%H:%M").ok();
            } else if trimmed.eq_ignore_ascii_case("Narrative:") {
                in_narrative = true;
            }
        }

        let date = date.ok_or(ParseError::MissingDate)?;
        if !in_narrative {
            return Err(ParseError::MissingNarrative);
        }
        let narrative = narrative_lines.join("\n").trim().to_string();

        Ok(Self {
            meta: NodeMeta::new(),
            date,
            wake_time,
            sleep_time,
            narrative,
            panas: None,
            bpns: None,
            flourishing: None,
        })
    }

    /// True if sleep_time falls before wake_time, meaning sleep rolled
    /// over into the following calendar day.
    pub fn sleep_rolled_over(&self) -> bool {
        match (self.wake_time, self.sleep_time) {
            (Some(wake), Some(sleep)) => sleep < wake,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------
// Lexical artifacts
// ---------------------------------------------------------------------

/// A half-open byte range `[start, end)` into a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub meta: NodeMeta,
    pub journal_id: Uuid,
    pub span: Span,
}

impl Document for Chunk {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn partition(&self) -> Partition {
        Partition::Lexical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub meta: NodeMeta,
    pub journal_id: Uuid,
    pub text: String,
    pub span: Option<Span>,
}

impl Document for Quote {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn partition(&self) -> Partition {
        Partition::Lexical
    }
}

// ---------------------------------------------------------------------
// Domain entities
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EntityType {
    Person,
    Emotion,
    FeelingEmotion,
    FeelingConcept,
    Event,
    Project,
    Concept,
    Content,
    Consumable,
    Place,
}

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Person => "Person",
            EntityType::Emotion => "Emotion",
            EntityType::FeelingEmotion => "FeelingEmotion",
            EntityType::FeelingConcept => "FeelingConcept",
            EntityType::Event => "Event",
            EntityType::Project => "Project",
            EntityType::Concept => "Concept",
            EntityType::Content => "Content",
            EntityType::Consumable => "Consumable",
            EntityType::Place => "Place",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResourceType {
    Book,
    Article,
    Video,
    Podcast,
    Course,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResourceStatus {
    Planned,
    InProgress,
    Done,
}

/// A closed vocabulary of emotion names the extraction engine is guided
/// towards; unrecognized names from the LLM are kept as free text rather
/// than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Joy,
    Sadness,
    Anger,
    Fear,
    Disgust,
    Surprise,
    Trust,
    Anticipation,
}

/// A newtype around `chrono::Duration` that can be parsed from the
/// flexible duration grammar (see `crate::duration`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration(pub chrono::Duration);

impl Duration {
    pub fn seconds(self) -> i64 {
        self.0.num_seconds()
    }
}

/// Fields common to every domain entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCommon {
    pub meta: NodeMeta,
    pub name: String,
    pub aliases: Vec<String>,
    pub summary: String,
    pub summary_short: String,
    pub embedding: Option<Vec<f32>>,
}

impl EntityCommon {
    pub fn new(name: impl Into<String>, summary: impl Into<String>, summary_short: impl Into<String>) -> Self {
        Self {
            meta: NodeMeta::new(),
            name: name.into(),
            aliases: Vec::new(),
            summary: summary.into(),
            summary_short: summary_short.into(),
            embedding: None,
        }
    }

    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entity_type")]
pub enum Entity {
    Person {
        #[serde(flatten)]
        common: EntityCommon,
        occupation: Option<String>,
        birth_date: Option<NaiveDate>,
    },
    Emotion {
        #[serde(flatten)]
        common: EntityCommon,
        valence: Option<f32>,
        arousal: Option<f32>,
    },
    FeelingEmotion {
        #[serde(flatten)]
        common: EntityCommon,
        timestamp: DateTime<Utc>,
        person: String,
        emotion: String,
        intensity: Option<f32>,
        duration: Option<Duration>,
    },
    FeelingConcept {
        #[serde(flatten)]
        common: EntityCommon,
        timestamp: DateTime<Utc>,
        person: String,
        concept: String,
        valence: Option<f32>,
        duration: Option<Duration>,
    },
    Event {
        #[serde(flatten)]
        common: EntityCommon,
        category: String,
        occurred_at: Option<DateTime<Utc>>,
        duration: Option<Duration>,
        location: Option<String>,
    },
    Project {
        #[serde(flatten)]
        common: EntityCommon,
        status: ProjectStatus,
        start_date: Option<DateTime<Utc>>,
        target_completion: Option<DateTime<Utc>>,
        progress: Option<f32>,
    },
    Concept {
        #[serde(flatten)]
        common: EntityCommon,
        title: String,
        concept_text: String,
        analysis: String,
        source: Option<String>,
    },
    Content {
        #[serde(flatten)]
        common: EntityCommon,
        resource_type: ResourceType,
        status: Option<ResourceStatus>,
        author: Option<String>,
        quotes: Option<Vec<String>>,
        url: Option<String>,
    },
    Consumable {
        #[serde(flatten)]
        common: EntityCommon,
        resource_type: ResourceType,
        status: ResourceStatus,
    },
    Place {
        #[serde(flatten)]
        common: EntityCommon,
        location: Option<String>,
    },
}

impl Entity {
    pub fn common(&self) -> &EntityCommon {
        match self {
            Entity::Person { common, .. }
            | Entity::Emotion { common, .. }
            | Entity::FeelingEmotion { common, .. }
            | Entity::FeelingConcept { common, .. }
            | Entity::Event { common, .. }
            | Entity::Project { common, .. }
            | Entity::Concept { common, .. }
            | Entity::Content { common, .. }
            | Entity::Consumable { common, .. }
            | Entity::Place { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        match self {
            Entity::Person { common, .. }
            | Entity::Emotion { common, .. }
            | Entity::FeelingEmotion { common, .. }
            | Entity::FeelingConcept { common, .. }
            | Entity::Event { common, .. }
            | Entity::Project { common, .. }
            | Entity::Concept { common, .. }
            | Entity::Content { common, .. }
            | Entity::Consumable { common, .. }
            | Entity::Place { common, .. } => common,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Person { .. } => EntityType::Person,
            Entity::Emotion { .. } => EntityType::Emotion,
            Entity::FeelingEmotion { .. } => EntityType::FeelingEmotion,
            Entity::FeelingConcept { .. } => EntityType::FeelingConcept,
            Entity::Event { .. } => EntityType::Event,
            Entity::Project { .. } => EntityType::Project,
            Entity::Concept { .. } => EntityType::Concept,
            Entity::Content { .. } => EntityType::Content,
            Entity::Consumable { .. } => EntityType::Consumable,
            Entity::Place { .. } => EntityType::Place,
        }
    }
}

// ---------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    RelatedTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConceptRelationType {
    Generalizes,
    SpecificOf,
    PartOf,
    HasPart,
    Supports,
    SupportedBy,
    Opposes,
    SimilarTo,
    RelatesTo,
}

impl ConceptRelationType {
    /// The inverse kind to synthesize when writing a directed-pair
    /// relation. `None` for the symmetric kinds, which are written once.
    pub fn inverse(&self) -> Option<ConceptRelationType> {
        use ConceptRelationType::*;
        match self {
            Generalizes => Some(SpecificOf),
            SpecificOf => Some(Generalizes),
            PartOf => Some(HasPart),
            HasPart => Some(PartOf),
            Supports => Some(SupportedBy),
            SupportedBy => Some(Supports),
            Opposes | SimilarTo | RelatesTo => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub meta: NodeMeta,
    pub source: Uuid,
    pub target: Uuid,
    pub kind: RelationshipType,
    pub proposed_types: Option<Vec<String>>,
    pub summary: String,
    pub summary_short: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRelation {
    pub meta: NodeMeta,
    pub source: Uuid,
    pub target: Uuid,
    pub kind: ConceptRelationType,
    pub proposed_types: Option<Vec<String>>,
    pub summary: String,
    pub summary_short: String,
    pub embedding: Option<Vec<f32>>,
}

/// Proposed entities/relations as they cross the extraction -> curation
/// boundary. A tagged enum stands in for the original's per-type payload
/// converters: one codec table keyed on the tag instead of a hand-written
/// dispatch table per type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProposedRelation {
    Generic(Relation),
    Concept(ConceptRelation),
}

/// A named entity lookup built from the existing graph plus any wiki-link
/// targets mentioned in the narrative that don't yet have a graph entity.
#[derive(Debug, Clone, Default)]
pub struct EntityLookup {
    pub name_to_uuid: HashMap<String, Option<Uuid>>,
}

impl EntityLookup {
    pub fn new() -> Self {
        let mut name_to_uuid = HashMap::new();
        name_to_uuid.insert("Alex Elgier".to_string(), None);
        Self { name_to_uuid }
    }

    pub fn insert_known(&mut self, name: impl Into<String>, uuid: Uuid) {
        self.name_to_uuid.insert(name.into(), Some(uuid));
    }

    pub fn insert_unresolved(&mut self, name: impl Into<String>) {
        self.name_to_uuid.entry(name.into()).or_insert(None);
    }

    /// Entities in the lookup that already have a graph identity.
    pub fn known_entities(&self) -> HashMap<String, Uuid> {
        self.name_to_uuid
            .iter()
            .filter_map(|(name, id)| id.map(|id| (name.clone(), id)))
            .collect()
    }
}
