//! Revision store: row access for `revisions` plus the publish, edit and
//! delete transitions.
//!
//! Every change to an existing revision goes through [`update`], which runs
//! [`Revision::ensure_mutable`] against the stored row before writing. All
//! functions expect to be called inside the caller's transaction.

use folio_core::{Error as CoreError, revision::Revision, user::UserRef};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{REVISION_COLUMNS, RawRevision, encode_dt, encode_uuid},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

fn query_one(conn: &Connection, filter: &str, id: Uuid) -> Result<Option<Revision>> {
  let sql = format!("SELECT {REVISION_COLUMNS} FROM revisions WHERE {filter}");
  conn
    .query_row(&sql, params![encode_uuid(id)], RawRevision::from_row)
    .optional()?
    .map(RawRevision::into_revision)
    .transpose()
}

pub fn find(conn: &Connection, revision_id: Uuid) -> Result<Option<Revision>> {
  query_one(conn, "revision_id = ?1", revision_id)
}

pub fn require(conn: &Connection, revision_id: Uuid) -> Result<Revision> {
  find(conn, revision_id)?.ok_or_else(|| CoreError::RevisionNotFound(revision_id).into())
}

/// The page's unpublished revision, if one exists.
pub fn find_draft(conn: &Connection, page_id: Uuid) -> Result<Option<Revision>> {
  query_one(conn, "page_id = ?1 AND is_published = 0", page_id)
}

pub fn latest_published(conn: &Connection, page_id: Uuid) -> Result<Option<Revision>> {
  query_one(
    conn,
    "page_id = ?1 AND is_published = 1 ORDER BY number DESC LIMIT 1",
    page_id,
  )
}

pub fn find_published(conn: &Connection, page_id: Uuid, number: u32) -> Result<Option<Revision>> {
  let sql = format!(
    "SELECT {REVISION_COLUMNS} FROM revisions
     WHERE page_id = ?1 AND is_published = 1 AND number = ?2"
  );
  conn
    .query_row(&sql, params![encode_uuid(page_id), number], RawRevision::from_row)
    .optional()?
    .map(RawRevision::into_revision)
    .transpose()
}

/// Published revisions, newest first.
pub fn history(conn: &Connection, page_id: Uuid) -> Result<Vec<Revision>> {
  let sql = format!(
    "SELECT {REVISION_COLUMNS} FROM revisions
     WHERE page_id = ?1 AND is_published = 1
     ORDER BY number DESC"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![encode_uuid(page_id)], RawRevision::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRevision::into_revision).collect()
}

pub fn count_published(conn: &Connection, page_id: Uuid) -> Result<u32> {
  let count: u32 = conn.query_row(
    "SELECT COUNT(*) FROM revisions WHERE page_id = ?1 AND is_published = 1",
    params![encode_uuid(page_id)],
    |row| row.get(0),
  )?;
  Ok(count)
}

fn latest_number(conn: &Connection, page_id: Uuid) -> Result<Option<u32>> {
  let latest: Option<u32> = conn.query_row(
    "SELECT MAX(number) FROM revisions WHERE page_id = ?1 AND is_published = 1",
    params![encode_uuid(page_id)],
    |row| row.get(0),
  )?;
  Ok(latest)
}

// ─── Writes ──────────────────────────────────────────────────────────────────

pub fn insert(conn: &Connection, rev: &Revision) -> Result<()> {
  conn.execute(
    "INSERT INTO revisions (
       revision_id, page_id, author, number, body,
       is_published, published_at, created_at, edited_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      encode_uuid(rev.revision_id),
      encode_uuid(rev.page_id),
      rev.author.as_str(),
      rev.number,
      rev.body,
      rev.is_published,
      rev.published_at.map(encode_dt),
      encode_dt(rev.created_at),
      encode_dt(rev.edited_at),
    ],
  )?;
  Ok(())
}

/// The single write path for existing revisions.
fn update(conn: &Connection, stored: &Revision, updated: &Revision) -> Result<()> {
  stored.ensure_mutable()?;
  conn.execute(
    "UPDATE revisions
     SET body = ?2, number = ?3, is_published = ?4, published_at = ?5, edited_at = ?6
     WHERE revision_id = ?1 AND is_published = 0",
    params![
      encode_uuid(stored.revision_id),
      updated.body,
      updated.number,
      updated.is_published,
      updated.published_at.map(encode_dt),
      encode_dt(updated.edited_at),
    ],
  )?;
  Ok(())
}

/// Publish a draft as its page's next number.
///
/// The number is read and written in the caller's transaction, so two
/// publishes on one page can never observe the same latest number.
pub fn publish(conn: &Connection, revision_id: Uuid) -> Result<Revision> {
  let stored = require(conn, revision_id)?;
  let mut updated = stored.clone();
  updated.publish(latest_number(conn, stored.page_id)?)?;
  update(conn, &stored, &updated)?;
  Ok(updated)
}

/// Replace a draft's body on behalf of its author.
pub fn edit(conn: &Connection, revision_id: Uuid, editor: &UserRef, body: String) -> Result<Revision> {
  let stored = require(conn, revision_id)?;
  let mut updated = stored.clone();
  updated.edit(body)?;
  stored.ensure_author(editor)?;
  update(conn, &stored, &updated)?;
  Ok(updated)
}

/// Delete an unpublished revision. Does not touch the page's checkout flag.
pub fn delete_draft(conn: &Connection, draft: &Revision) -> Result<()> {
  draft.ensure_mutable()?;
  conn.execute(
    "DELETE FROM revisions WHERE revision_id = ?1 AND is_published = 0",
    params![encode_uuid(draft.revision_id)],
  )?;
  Ok(())
}
