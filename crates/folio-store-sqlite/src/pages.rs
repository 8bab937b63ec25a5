//! Page store: row access for `pages` and the checkout state machine.
//!
//! `Available` ⇄ `CheckedOut`. A page is checked out exactly while it has a
//! draft revision: [`check_out`] creates the draft and flips the flag,
//! [`check_in`] flips it back only once the draft is gone (published or
//! abandoned). All functions expect to be called inside the caller's
//! transaction.

use std::collections::BTreeSet;

use folio_core::{
  Error as CoreError,
  page::Page,
  revision::Revision,
  user::UserRef,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{PAGE_COLUMNS, RawPage, encode_dt, encode_tags, encode_uuid},
  revisions,
};

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn find(conn: &Connection, page_id: Uuid) -> Result<Option<Page>> {
  let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE page_id = ?1");
  conn
    .query_row(&sql, params![encode_uuid(page_id)], RawPage::from_row)
    .optional()?
    .map(RawPage::into_page)
    .transpose()
}

pub fn require(conn: &Connection, page_id: Uuid) -> Result<Page> {
  find(conn, page_id)?.ok_or_else(|| CoreError::PageNotFound(page_id).into())
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> Result<Option<Page>> {
  let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1");
  conn
    .query_row(&sql, params![slug], RawPage::from_row)
    .optional()?
    .map(RawPage::into_page)
    .transpose()
}

/// Pages ordered by title; those with at least one of `tags` when non-empty.
pub fn list(conn: &Connection, tags: &BTreeSet<String>) -> Result<Vec<Page>> {
  let sql = format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY title");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map([], RawPage::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut pages = raws
    .into_iter()
    .map(RawPage::into_page)
    .collect::<Result<Vec<_>>>()?;
  if !tags.is_empty() {
    pages.retain(|p| !p.tags.is_disjoint(tags));
  }
  Ok(pages)
}

fn exists(conn: &Connection, column: &str, value: &str) -> Result<bool> {
  let sql = format!("SELECT 1 FROM pages WHERE {column} = ?1");
  Ok(conn.query_row(&sql, params![value], |_| Ok(())).optional()?.is_some())
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Insert a page after checking the title and slug are free.
pub fn insert(conn: &Connection, page: &Page) -> Result<()> {
  if exists(conn, "title", &page.title)? {
    return Err(CoreError::DuplicateTitle(page.title.clone()).into());
  }
  if exists(conn, "slug", &page.slug)? {
    return Err(CoreError::DuplicateSlug(page.slug.clone()).into());
  }
  conn.execute(
    "INSERT INTO pages (
       page_id, title, slug, tags, creator, is_editable, is_checked_out, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      encode_uuid(page.page_id),
      page.title,
      page.slug,
      encode_tags(&page.tags)?,
      page.creator.as_str(),
      page.is_editable,
      page.is_checked_out,
      encode_dt(page.created_at),
    ],
  )?;
  Ok(())
}

pub fn set_tags(conn: &Connection, page_id: Uuid, tags: BTreeSet<String>) -> Result<Page> {
  let mut page = require(conn, page_id)?;
  conn.execute(
    "UPDATE pages SET tags = ?2 WHERE page_id = ?1",
    params![encode_uuid(page_id), encode_tags(&tags)?],
  )?;
  page.tags = tags;
  Ok(page)
}

pub fn set_editable(conn: &Connection, page_id: Uuid, is_editable: bool) -> Result<Page> {
  let mut page = require(conn, page_id)?;
  conn.execute(
    "UPDATE pages SET is_editable = ?2 WHERE page_id = ?1",
    params![encode_uuid(page_id), is_editable],
  )?;
  page.is_editable = is_editable;
  Ok(page)
}

/// Delete a page; revisions and comparisons go with it by cascade.
pub fn delete(conn: &Connection, page_id: Uuid) -> Result<()> {
  require(conn, page_id)?;
  conn.execute("DELETE FROM pages WHERE page_id = ?1", params![encode_uuid(page_id)])?;
  Ok(())
}

// ─── Checkout state machine ──────────────────────────────────────────────────

/// `Available` → `CheckedOut`: open a draft for `user` seeded with the latest
/// published body.
///
/// The flag flip is a compare-and-set: of two callers racing on one page,
/// exactly one sees its `UPDATE` change a row.
pub fn check_out(conn: &Connection, page_id: Uuid, user: UserRef) -> Result<Revision> {
  let page = require(conn, page_id)?;
  page.ensure_can_check_out()?;

  let flipped = conn.execute(
    "UPDATE pages SET is_checked_out = 1 WHERE page_id = ?1 AND is_checked_out = 0",
    params![encode_uuid(page_id)],
  )?;
  if flipped == 0 {
    let by = revisions::find_draft(conn, page_id)?.map(|draft| draft.author);
    return Err(CoreError::AlreadyCheckedOut { page_id, by }.into());
  }

  let latest = revisions::latest_published(conn, page_id)?
    .ok_or(CoreError::NoPublishedRevision(page_id))?;
  let draft = Revision::draft(page_id, user, latest.body);
  revisions::insert(conn, &draft)?;
  Ok(draft)
}

/// `CheckedOut` → `Available`, refused while a draft remains.
pub fn check_in(conn: &Connection, page_id: Uuid) -> Result<Page> {
  let mut page = require(conn, page_id)?;
  if let Some(draft) = revisions::find_draft(conn, page_id)? {
    return Err(
      CoreError::UnpublishedRevisionExists { page_id, author: draft.author }.into(),
    );
  }
  conn.execute(
    "UPDATE pages SET is_checked_out = 0 WHERE page_id = ?1",
    params![encode_uuid(page_id)],
  )?;
  page.is_checked_out = false;
  Ok(page)
}

/// Publish a draft and, unless told otherwise, check its page in.
///
/// Only page creation skips the check-in: its first revision is published
/// without the page ever having been checked out.
pub(crate) fn publish(conn: &Connection, revision_id: Uuid, check_in_page: bool) -> Result<Revision> {
  let published = revisions::publish(conn, revision_id)?;
  if check_in_page {
    check_in(conn, published.page_id)?;
  }
  Ok(published)
}

/// Delete a draft and check its page in. With `user` set, only the draft's
/// author may do this.
pub fn abandon(conn: &Connection, revision_id: Uuid, user: Option<&UserRef>) -> Result<Page> {
  let draft = revisions::require(conn, revision_id)?;
  draft.ensure_mutable()?;
  if let Some(user) = user {
    draft.ensure_author(user)?;
  }
  revisions::delete_draft(conn, &draft)?;
  check_in(conn, draft.page_id)
}
