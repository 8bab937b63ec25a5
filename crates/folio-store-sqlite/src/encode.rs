//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, tag
//! sets compact JSON arrays.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use folio_core::{
  comparison::Comparison, diff::DiffMode, page::Page, revision::Revision,
  user::UserRef,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<BTreeSet<String>> { Ok(serde_json::from_str(s)?) }

pub fn decode_mode(s: &str) -> Result<DiffMode> {
  s.parse().map_err(|_| Error::Decode(format!("unknown diff mode: {s:?}")))
}

fn decode_number(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("revision number out of range: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PAGE_COLUMNS: &str =
  "page_id, title, slug, tags, creator, is_editable, is_checked_out, created_at";

/// Raw values read directly from a `pages` row.
pub struct RawPage {
  pub page_id:        String,
  pub title:          String,
  pub slug:           String,
  pub tags:           String,
  pub creator:        String,
  pub is_editable:    bool,
  pub is_checked_out: bool,
  pub created_at:     String,
}

impl RawPage {
  /// Read a row selected with [`PAGE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      page_id:        row.get(0)?,
      title:          row.get(1)?,
      slug:           row.get(2)?,
      tags:           row.get(3)?,
      creator:        row.get(4)?,
      is_editable:    row.get(5)?,
      is_checked_out: row.get(6)?,
      created_at:     row.get(7)?,
    })
  }

  pub fn into_page(self) -> Result<Page> {
    Ok(Page {
      page_id:        decode_uuid(&self.page_id)?,
      title:          self.title,
      slug:           self.slug,
      tags:           decode_tags(&self.tags)?,
      creator:        UserRef::new(self.creator),
      is_editable:    self.is_editable,
      is_checked_out: self.is_checked_out,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const REVISION_COLUMNS: &str = "revision_id, page_id, author, number, body, \
                                    is_published, published_at, created_at, edited_at";

/// Raw values read directly from a `revisions` row.
pub struct RawRevision {
  pub revision_id:  String,
  pub page_id:      String,
  pub author:       String,
  pub number:       i64,
  pub body:         String,
  pub is_published: bool,
  pub published_at: Option<String>,
  pub created_at:   String,
  pub edited_at:    String,
}

impl RawRevision {
  /// Read a row selected with [`REVISION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      revision_id:  row.get(0)?,
      page_id:      row.get(1)?,
      author:       row.get(2)?,
      number:       row.get(3)?,
      body:         row.get(4)?,
      is_published: row.get(5)?,
      published_at: row.get(6)?,
      created_at:   row.get(7)?,
      edited_at:    row.get(8)?,
    })
  }

  pub fn into_revision(self) -> Result<Revision> {
    Ok(Revision {
      revision_id:  decode_uuid(&self.revision_id)?,
      page_id:      decode_uuid(&self.page_id)?,
      author:       UserRef::new(self.author),
      number:       decode_number(self.number)?,
      body:         self.body,
      is_published: self.is_published,
      published_at: self.published_at.as_deref().map(decode_dt).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
      edited_at:    decode_dt(&self.edited_at)?,
    })
  }
}

pub const COMPARISON_COLUMNS: &str = "comparison_id, page_id, rev1_id, rev1_number, \
                                      rev2_id, rev2_number, mode, diff_html, created_at";

/// Raw values read directly from a `comparisons` row.
pub struct RawComparison {
  pub comparison_id: String,
  pub page_id:       String,
  pub rev1_id:       String,
  pub rev1_number:   i64,
  pub rev2_id:       String,
  pub rev2_number:   i64,
  pub mode:          String,
  pub diff_html:     String,
  pub created_at:    String,
}

impl RawComparison {
  /// Read a row selected with [`COMPARISON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comparison_id: row.get(0)?,
      page_id:       row.get(1)?,
      rev1_id:       row.get(2)?,
      rev1_number:   row.get(3)?,
      rev2_id:       row.get(4)?,
      rev2_number:   row.get(5)?,
      mode:          row.get(6)?,
      diff_html:     row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_comparison(self) -> Result<Comparison> {
    Ok(Comparison {
      comparison_id: decode_uuid(&self.comparison_id)?,
      page_id:       decode_uuid(&self.page_id)?,
      rev1_id:       decode_uuid(&self.rev1_id)?,
      rev1_number:   decode_number(self.rev1_number)?,
      rev2_id:       decode_uuid(&self.rev2_id)?,
      rev2_number:   decode_number(self.rev2_number)?,
      mode:          decode_mode(&self.mode)?,
      diff_html:     self.diff_html,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
