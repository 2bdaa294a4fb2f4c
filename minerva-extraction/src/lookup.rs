//! Wiki-link entity lookup construction, grounded on
//! `_build_obsidian_entity_lookup`: every known name/alias maps to a
//! graph UUID when one exists, `None` when the link target is recognized
//! but has no graph entity yet. "Alex Elgier" is always present as the
//! default narrator.

use minerva_core::types::EntityLookup;
use uuid::Uuid;

/// One existing graph entity, as far as lookup construction needs it.
pub struct KnownEntity {
    pub uuid: Uuid,
    pub name: String,
    pub aliases: Vec<String>,
}

/// A `[[Name]]` or `[[Name|Alias]]` reference found in narrative text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub name: String,
    pub alias: Option<String>,
}

/// Scans narrative text for `[[Name|Alias]]` wiki-links without pulling in
/// a regex dependency the rest of the workspace doesn't otherwise need:
/// `[[` / `]]` delimited spans are rare and simple enough to scan by hand.
pub fn find_wiki_links(text: &str) -> Vec<WikiLink> {
    let mut links = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            if let Some(close) = text[i + 2..].find("]]") {
                let inner = &text[i + 2..i + 2 + close];
                let mut parts = inner.splitn(2, '|');
                let name = parts.next().unwrap_or("").trim().to_string();
                let alias = parts.next().map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
                if !name.is_empty() {
                    links.push(WikiLink { name, alias });
                }
                i += 2 + close + 2;
                continue;
            }
        }
        i += 1;
    }
    links
}

/// Builds the name -> uuid lookup used to resolve entity references before
/// calling the LLM: every known entity's canonical name and aliases, plus
/// any wiki-link targets in the narrative that don't resolve to a known
/// entity (mapped to `None`), plus the default narrator.
pub fn build_entity_lookup(known: &[KnownEntity], narrative: &str) -> EntityLookup {
    let mut lookup = EntityLookup::new();
    for entity in known {
        lookup.insert_known(entity.name.clone(), entity.uuid);
        for alias in &entity.aliases {
            lookup.insert_known(alias.clone(), entity.uuid);
        }
    }
    for link in find_wiki_links(narrative) {
        lookup.insert_unresolved(link.name.clone());
        if let Some(alias) = link.alias {
            lookup.insert_unresolved(alias);
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_and_aliased_links() {
        let links = find_wiki_links("Habl\u{e9} con [[Ana Sorin|Ana]] sobre [[Diario]].");
        assert_eq!(links[0].name, "Ana Sorin");
        assert_eq!(links[0].alias.as_deref(), Some("Ana"));
        assert_eq!(links[1].name, "Diario");
        assert_eq!(links[1].alias, None);
    }

    #[test]
    fn default_narrator_is_always_present() {
        let lookup = build_entity_lookup(&[], "no mentions here");
        assert!(lookup.name_to_uuid.contains_key("Alex Elgier"));
    }

    #[test]
    fn unresolved_link_targets_map_to_none() {
        let lookup = build_entity_lookup(&[], "saw [[Someone New]] today");
        assert_eq!(lookup.name_to_uuid.get("Someone New"), Some(&None));
    }
}
