//! Feelings extraction: turns LLM-flagged `(person, emotion)` and
//! `(person, concept)` pairs into `FeelingEmotion`/`FeelingConcept`
//! entities, parsing any duration phrase the LLM extracted. An
//! unparseable duration phrase yields `duration: None`, never a dropped
//! feeling.

use chrono::{DateTime, Utc};
use minerva_core::duration::parse_duration;
use minerva_core::types::{Entity, EntityCommon};

pub struct FeelingEmotionCandidate {
    pub person: String,
    pub emotion: String,
    pub intensity: Option<f32>,
    pub duration_phrase: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub summary_short: String,
}

pub struct FeelingConceptCandidate {
    pub person: String,
    pub concept: String,
    pub valence: Option<f32>,
    pub duration_phrase: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub summary_short: String,
}

pub fn build_feeling_emotion(candidate: FeelingEmotionCandidate) -> Entity {
    let name = format!("{} feels {}", candidate.person, candidate.emotion);
    Entity::FeelingEmotion {
        common: EntityCommon::new(name, candidate.summary, candidate.summary_short),
        timestamp: candidate.timestamp,
        person: candidate.person,
        emotion: candidate.emotion,
        intensity: candidate.intensity,
        duration: candidate.duration_phrase.as_deref().and_then(parse_duration),
    }
}

pub fn build_feeling_concept(candidate: FeelingConceptCandidate) -> Entity {
    let name = format!("{} feels about {}", candidate.person, candidate.concept);
    Entity::FeelingConcept {
        common: EntityCommon::new(name, candidate.summary, candidate.summary_short),
        timestamp: candidate.timestamp,
        person: candidate.person,
        concept: candidate.concept,
        valence: candidate.valence,
        duration: candidate.duration_phrase.as_deref().and_then(parse_duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_duration_yields_none_not_a_dropped_feeling() {
        let entity = build_feeling_emotion(FeelingEmotionCandidate {
            person: "Alex".into(),
            emotion: "joy".into(),
            intensity: Some(0.8),
            duration_phrase: Some("a little while".into()),
            timestamp: Utc::now(),
            summary: "s".into(),
            summary_short: "ss".into(),
        });
        if let Entity::FeelingEmotion { duration, .. } = entity {
            assert!(duration.is_none());
        } else {
            panic!("expected FeelingEmotion");
        }
    }

    #[test]
    fn parseable_duration_is_attached() {
        let entity = build_feeling_concept(FeelingConceptCandidate {
            person: "Alex".into(),
            concept: "mortality".into(),
            valence: Some(-0.5),
            duration_phrase: Some("2h".into()),
            timestamp: Utc::now(),
            summary: "s".into(),
            summary_short: "ss".into(),
        });
        if let Entity::FeelingConcept { duration, .. } = entity {
            assert_eq!(duration.unwrap().seconds(), 7200);
        } else {
            panic!("expected FeelingConcept");
        }
    }
}
