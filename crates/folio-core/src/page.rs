//! Pages: the titled documents that own revisions and the unit of checkout.
//!
//! A page holds identity metadata plus the checkout flag. Its body lives in
//! its revisions; the current text is the latest published revision.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::UserRef};

/// Body given to the revision synthesised when a page is created.
pub const FIRST_REVISION_BODY: &str = "hello world!";

// ─── Page ────────────────────────────────────────────────────────────────────

/// A wiki page. Unique by title and by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub page_id:        Uuid,
  pub title:          String,
  pub slug:           String,
  pub tags:           BTreeSet<String>,
  pub creator:        UserRef,
  pub is_editable:    bool,
  pub is_checked_out: bool,
  pub created_at:     DateTime<Utc>,
}

/// Checkout state of a page, derived from [`Page::is_checked_out`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
  Available,
  CheckedOut,
}

impl Page {
  pub fn state(&self) -> PageState {
    if self.is_checked_out {
      PageState::CheckedOut
    } else {
      PageState::Available
    }
  }

  /// Guard run before a check-out is attempted.
  ///
  /// The availability half of the check is only advisory here; backends must
  /// still flip the flag with a compare-and-set so two callers cannot both
  /// pass.
  pub fn ensure_can_check_out(&self) -> Result<()> {
    if !self.is_editable {
      return Err(Error::NotEditable(self.page_id));
    }
    Ok(())
  }
}

// ─── Creation contract ───────────────────────────────────────────────────────

/// The caller-settable fields of a new page. Everything else (id, checkout
/// flag, timestamps, the first revision) is managed by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPage {
  pub title:       String,
  /// Explicit slug; derived from the title when `None`. Either way the
  /// result is normalised with [`slugify`].
  pub slug:        Option<String>,
  pub tags:        BTreeSet<String>,
  pub is_editable: bool,
  pub creator:     UserRef,
}

impl NewPage {
  pub fn new(title: impl Into<String>, creator: UserRef) -> Self {
    Self {
      title: title.into(),
      slug: None,
      tags: BTreeSet::new(),
      is_editable: true,
      creator,
    }
  }

  /// Trim the title and settle the slug, rejecting empty results.
  pub fn validate(&self) -> Result<(String, String)> {
    let title = self.title.trim();
    if title.is_empty() {
      return Err(Error::EmptyTitle);
    }
    let source = self.slug.as_deref().unwrap_or(title);
    let slug = slugify(source);
    if slug.is_empty() {
      return Err(Error::EmptySlug(source.to_owned()));
    }
    Ok((title.to_owned(), slug))
  }
}

/// Parameters for [`WikiStore::list_pages`](crate::store::WikiStore::list_pages).
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
  /// Pages carrying any of these tags. Empty means all pages.
  pub tags: BTreeSet<String>,
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Lowercase `text` and collapse every run of non-word characters into a
/// single `-`, trimming dashes from both ends.
pub fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  let mut pending_dash = false;
  for c in text.chars() {
    if c.is_alphanumeric() || c == '_' {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.extend(c.to_lowercase());
    } else {
      pending_dash = true;
    }
  }
  slug
}

/// Split free-form tag input.
///
/// Commas separate tags when any are present (so tags may contain spaces);
/// otherwise whitespace does. Blank entries are dropped and duplicates
/// collapse.
pub fn parse_tags(input: &str) -> BTreeSet<String> {
  let pieces: Box<dyn Iterator<Item = &str>> = if input.contains(',') {
    Box::new(input.split(','))
  } else {
    Box::new(input.split_whitespace())
  };
  pieces
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}
