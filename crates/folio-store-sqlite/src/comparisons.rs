//! Comparison cache: get-or-create for diffs between published revisions.
//!
//! The diff itself runs between [`lookup`] and [`insert_or_get`], outside
//! any transaction, so a slow comparison never holds the write lock.

use folio_core::{
  Error as CoreError,
  comparison::{Comparison, ComparisonKey},
  diff::DiffMode,
  revision::Revision,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{COMPARISON_COLUMNS, RawComparison, encode_dt, encode_uuid},
  pages, revisions,
};

/// Whether a comparison was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
  Hit,
  Miss,
}

/// The outcome of [`lookup`].
pub enum Cached {
  Hit(Comparison),
  /// No record yet; these are the revisions to diff.
  Miss { older: Revision, newer: Revision },
}

/// Resolve `key` to its two published revisions and look for an existing
/// record. Published revisions never change, so this needs no write lock.
pub fn lookup(conn: &Connection, key: ComparisonKey) -> Result<Cached> {
  pages::require(conn, key.page_id)?;
  let older = resolve(conn, key.page_id, key.older)?;
  let newer = resolve(conn, key.page_id, key.newer)?;

  Ok(match find(conn, key.page_id, older.revision_id, newer.revision_id, key.mode)? {
    Some(existing) => Cached::Hit(existing),
    None => Cached::Miss { older, newer },
  })
}

/// Store a freshly computed comparison unless a concurrent caller stored
/// one for the same key first, and return whichever record is on file.
pub fn insert_or_get(conn: &Connection, cmp: &Comparison) -> Result<(Comparison, Lookup)> {
  pages::require(conn, cmp.page_id)?;
  let inserted = insert(conn, cmp)?;

  let stored = find(conn, cmp.page_id, cmp.rev1_id, cmp.rev2_id, cmp.mode)?
    .ok_or(CoreError::PageNotFound(cmp.page_id))?;
  let lookup = if inserted { Lookup::Miss } else { Lookup::Hit };
  Ok((stored, lookup))
}

fn resolve(conn: &Connection, page_id: Uuid, number: u32) -> Result<Revision> {
  revisions::find_published(conn, page_id, number)?
    .ok_or_else(|| CoreError::RevisionNumberNotFound { page_id, number }.into())
}

fn find(
  conn: &Connection,
  page_id: Uuid,
  rev1_id: Uuid,
  rev2_id: Uuid,
  mode: DiffMode,
) -> Result<Option<Comparison>> {
  let sql = format!(
    "SELECT {COMPARISON_COLUMNS} FROM comparisons
     WHERE page_id = ?1 AND rev1_id = ?2 AND rev2_id = ?3 AND mode = ?4"
  );
  conn
    .query_row(
      &sql,
      params![
        encode_uuid(page_id),
        encode_uuid(rev1_id),
        encode_uuid(rev2_id),
        mode.as_str(),
      ],
      RawComparison::from_row,
    )
    .optional()?
    .map(RawComparison::into_comparison)
    .transpose()
}

/// `true` if the row was written, `false` if the key was already taken.
fn insert(conn: &Connection, cmp: &Comparison) -> Result<bool> {
  let changed = conn.execute(
    "INSERT INTO comparisons (
       comparison_id, page_id, rev1_id, rev1_number, rev2_id, rev2_number,
       mode, diff_html, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT (page_id, rev1_id, rev2_id, mode) DO NOTHING",
    params![
      encode_uuid(cmp.comparison_id),
      encode_uuid(cmp.page_id),
      encode_uuid(cmp.rev1_id),
      cmp.rev1_number,
      encode_uuid(cmp.rev2_id),
      cmp.rev2_number,
      cmp.mode.as_str(),
      cmp.diff_html,
      encode_dt(cmp.created_at),
    ],
  )?;
  Ok(changed == 1)
}
