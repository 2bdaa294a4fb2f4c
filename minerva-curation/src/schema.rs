//! SQLite schema for the curation ledger, grounded on
//! `curation_manager.py`'s table layout: a `journals` header table and one
//! item table per curation phase, each carrying a JSON payload blob plus
//! the item's curation status.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS journals (
    id              TEXT PRIMARY KEY,
    overall_status  TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entity_items (
    id              TEXT PRIMARY KEY,
    journal_id      TEXT NOT NULL REFERENCES journals(id),
    entity_type     TEXT NOT NULL,
    payload_json    TEXT NOT NULL,
    status          TEXT NOT NULL,
    spans_json      TEXT NOT NULL,
    curated_json    TEXT,
    created_at      TEXT NOT NULL,
    decided_at      TEXT
);
CREATE INDEX IF NOT EXISTS idx_entity_items_journal_status
    ON entity_items(journal_id, status);

CREATE TABLE IF NOT EXISTS relation_items (
    id              TEXT PRIMARY KEY,
    journal_id      TEXT NOT NULL REFERENCES journals(id),
    relation_kind   TEXT NOT NULL,
    payload_json    TEXT NOT NULL,
    status          TEXT NOT NULL,
    spans_json      TEXT NOT NULL,
    curated_json    TEXT,
    created_at      TEXT NOT NULL,
    decided_at      TEXT
);
CREATE INDEX IF NOT EXISTS idx_relation_items_journal_status
    ON relation_items(journal_id, status);

CREATE TABLE IF NOT EXISTS concept_candidate_items (
    id              TEXT PRIMARY KEY,
    journal_id      TEXT NOT NULL REFERENCES journals(id),
    payload_json    TEXT NOT NULL,
    status          TEXT NOT NULL,
    spans_json      TEXT NOT NULL,
    curated_json    TEXT,
    created_at      TEXT NOT NULL,
    decided_at      TEXT
);
CREATE INDEX IF NOT EXISTS idx_concept_candidate_items_journal_status
    ON concept_candidate_items(journal_id, status);
"#;
