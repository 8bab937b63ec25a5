//! Comparisons: cached diffs between two published revisions of a page.
//!
//! Published revisions never change, so a diff computed once for a
//! (page, older, newer, mode) key can be served forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  diff::{self, DiffMode},
  revision::Revision,
};

/// The canonical cache key for a comparison request.
///
/// Revision numbers are stored lowest first so that asking for (A, B) and
/// (B, A) lands on the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparisonKey {
  pub page_id: Uuid,
  pub older:   u32,
  pub newer:   u32,
  pub mode:    DiffMode,
}

impl ComparisonKey {
  pub fn new(page_id: Uuid, rev1: u32, rev2: u32, mode: DiffMode) -> Result<Self> {
    if rev1 == rev2 {
      return Err(Error::ComparingSameRevision(rev1));
    }
    Ok(Self {
      page_id,
      older: rev1.min(rev2),
      newer: rev1.max(rev2),
      mode,
    })
  }
}

/// A persisted diff between two published revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
  pub comparison_id: Uuid,
  pub page_id:       Uuid,
  pub rev1_id:       Uuid,
  pub rev1_number:   u32,
  pub rev2_id:       Uuid,
  pub rev2_number:   u32,
  pub mode:          DiffMode,
  pub diff_html:     String,
  pub created_at:    DateTime<Utc>,
}

impl Comparison {
  /// Run the diff engine for `key` over the resolved revisions.
  ///
  /// `older` and `newer` must be the published revisions the key's numbers
  /// point at.
  pub fn compute(key: ComparisonKey, older: &Revision, newer: &Revision) -> Self {
    debug_assert_eq!(older.number, key.older);
    debug_assert_eq!(newer.number, key.newer);
    Self {
      comparison_id: Uuid::new_v4(),
      page_id:       key.page_id,
      rev1_id:       older.revision_id,
      rev1_number:   older.number,
      rev2_id:       newer.revision_id,
      rev2_number:   newer.number,
      mode:          key.mode,
      diff_html:     diff::render(key.mode, &older.body, &newer.body),
      created_at:    Utc::now(),
    }
  }
}
