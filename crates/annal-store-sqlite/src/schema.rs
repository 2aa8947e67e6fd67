//! SQL schema for the annal SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted. The only UPDATE ever issued touches the four
-- tally columns of a single event, inside the transaction that records the
-- vote causing it.
CREATE TABLE IF NOT EXISTS events (
    id               INTEGER PRIMARY KEY,
    title            TEXT    NOT NULL CHECK (title != ''),
    occurred_on      INTEGER NOT NULL,   -- YYYYMMDD
    description      TEXT    NOT NULL CHECK (description != ''),
    evidence_sources TEXT    NOT NULL,   -- JSON array of strings
    tags             TEXT    NOT NULL,   -- JSON array, submission order
    submitter        TEXT    NOT NULL,
    submitted_at     TEXT    NOT NULL,   -- RFC 3339 UTC; server-assigned
    support_votes    INTEGER NOT NULL DEFAULT 0,
    challenge_votes  INTEGER NOT NULL DEFAULT 0,
    consensus_score  INTEGER NOT NULL DEFAULT 0,
    timeline         TEXT    NOT NULL DEFAULT 'Disputed'
);

-- Tag index; one row per (tag, event).
CREATE TABLE IF NOT EXISTS event_tags (
    tag      TEXT    NOT NULL,
    event_id INTEGER NOT NULL REFERENCES events(id),
    PRIMARY KEY (tag, event_id)
);

-- Strictly append-only. `seq` preserves cast order.
CREATE TABLE IF NOT EXISTS votes (
    seq      INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL REFERENCES events(id),
    voter    TEXT    NOT NULL,
    support  INTEGER NOT NULL,   -- 1 = support, 0 = challenge
    cast_at  TEXT    NOT NULL,
    UNIQUE (event_id, voter)
);

CREATE INDEX IF NOT EXISTS events_submitter_idx ON events(submitter, id);
CREATE INDEX IF NOT EXISTS events_timeline_idx  ON events(timeline, id);

PRAGMA user_version = 1;
";
