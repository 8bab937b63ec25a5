//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// The indexes and trigger restate the revision invariants so a bug in the
/// Rust guards surfaces as a constraint error instead of corrupt history.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS pages (
    page_id        TEXT PRIMARY KEY,
    title          TEXT NOT NULL UNIQUE,
    slug           TEXT NOT NULL UNIQUE,
    tags           TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    creator        TEXT NOT NULL,
    is_editable    INTEGER NOT NULL DEFAULT 1,
    is_checked_out INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL                 -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS revisions (
    revision_id  TEXT PRIMARY KEY,
    page_id      TEXT NOT NULL REFERENCES pages(page_id) ON DELETE CASCADE,
    author       TEXT NOT NULL,
    number       INTEGER NOT NULL DEFAULT 0,     -- 0 until published
    body         TEXT NOT NULL,
    is_published INTEGER NOT NULL DEFAULT 0,
    published_at TEXT,
    created_at   TEXT NOT NULL,
    edited_at    TEXT NOT NULL,
    CHECK ((is_published = 0 AND number = 0 AND published_at IS NULL)
        OR (is_published = 1 AND number > 0 AND published_at IS NOT NULL))
);

-- Published numbers are unique per page.
CREATE UNIQUE INDEX IF NOT EXISTS revisions_number_idx
    ON revisions(page_id, number) WHERE is_published = 1;

-- At most one draft per page.
CREATE UNIQUE INDEX IF NOT EXISTS revisions_draft_idx
    ON revisions(page_id) WHERE is_published = 0;

-- Published revisions are frozen.
CREATE TRIGGER IF NOT EXISTS revisions_published_immutable
    BEFORE UPDATE ON revisions
    WHEN OLD.is_published = 1
BEGIN
    SELECT RAISE(ABORT, 'published revisions are immutable');
END;

-- Cached diffs. rev1 is always the lower-numbered revision.
CREATE TABLE IF NOT EXISTS comparisons (
    comparison_id TEXT PRIMARY KEY,
    page_id       TEXT NOT NULL REFERENCES pages(page_id) ON DELETE CASCADE,
    rev1_id       TEXT NOT NULL REFERENCES revisions(revision_id) ON DELETE CASCADE,
    rev1_number   INTEGER NOT NULL,
    rev2_id       TEXT NOT NULL REFERENCES revisions(revision_id) ON DELETE CASCADE,
    rev2_number   INTEGER NOT NULL,
    mode          TEXT NOT NULL,                 -- 'inline' | 'semantic' | 'table'
    diff_html     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE (page_id, rev1_id, rev2_id, mode),
    CHECK  (rev1_number < rev2_number)
);

CREATE INDEX IF NOT EXISTS revisions_page_idx   ON revisions(page_id);
CREATE INDEX IF NOT EXISTS comparisons_page_idx ON comparisons(page_id);

PRAGMA user_version = 1;
";
