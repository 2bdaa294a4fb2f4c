//! Merging a freshly proposed entity into one that already exists in the
//! graph: the merged summary/summary_short come from a further LLM call
//! over both summaries; every other field is taken from the new proposal;
//! the existing entity's uuid (and creation time) is preserved so existing
//! edges remain valid.

use minerva_core::types::Entity;
use uuid::Uuid;

/// Applies a merge decision to a proposed entity, given the existing
/// entity's identity and the already-computed merged summary text.
pub fn merge_into_existing(existing_uuid: Uuid, existing_created_at: chrono::DateTime<chrono::Utc>, mut proposed: Entity, merged_summary: String, merged_summary_short: String) -> Entity {
    let common = proposed.common_mut();
    common.meta.uuid = existing_uuid;
    common.meta.created_at = existing_created_at;
    common.summary = merged_summary;
    common.summary_short = merged_summary_short;
    proposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::types::EntityCommon;

    #[test]
    fn preserves_existing_identity_and_uses_new_fields_otherwise() {
        let existing_uuid = Uuid::new_v4();
        let existing_created_at = chrono::Utc::now() - chrono::Duration::days(30);
        let proposed = Entity::Person {
            common: EntityCommon::new("Ana Sorin", "new summary", "new short"),
            occupation: Some("friend".to_string()),
            birth_date: None,
        };

        let merged = merge_into_existing(existing_uuid, existing_created_at, proposed, "merged".into(), "merged short".into());
        assert_eq!(merged.common().meta.uuid, existing_uuid);
        assert_eq!(merged.common().meta.created_at, existing_created_at);
        assert_eq!(merged.common().summary, "merged");
        if let Entity::Person { occupation, .. } = &merged {
            assert_eq!(occupation.as_deref(), Some("friend"));
        } else {
            panic!("expected Person variant");
        }
    }
}
