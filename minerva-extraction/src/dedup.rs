//! Type-scoped deduplication: the same name proposed twice for the same
//! entity type collapses to one candidate; the same name proposed under
//! two different types is kept as two distinct candidates.

use minerva_core::types::{Entity, EntityType};
use std::collections::HashSet;

/// Deduplicates a batch of freshly proposed entities by `(entity_type,
/// normalized_name)`, keeping the first occurrence of each key.
pub fn dedupe_proposed_entities(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    let mut out = Vec::with_capacity(entities.len());
    for entity in entities {
        let key = (entity.entity_type(), entity.common().normalized_name());
        if seen.insert(key) {
            out.push(entity);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::types::EntityCommon;

    fn person(name: &str) -> Entity {
        Entity::Person {
            common: EntityCommon::new(name, "s", "ss"),
            occupation: None,
            birth_date: None,
        }
    }

    fn place(name: &str) -> Entity {
        Entity::Place { common: EntityCommon::new(name, "s", "ss"), location: None }
    }

    #[test]
    fn same_type_same_name_collapses() {
        let deduped = dedupe_proposed_entities(vec![person("Ana"), person("ana")]);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn cross_type_collision_is_kept_separate() {
        let deduped = dedupe_proposed_entities(vec![person("Rio"), place("Rio")]);
        assert_eq!(deduped.len(), 2);
    }
}
