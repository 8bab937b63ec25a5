//! Revisions: the versions of a page's body.
//!
//! A revision is a mutable draft until it is published. Publishing assigns
//! the next per-page number and freezes every field; from then on the only
//! way a revision disappears is together with its page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::UserRef};

/// One version of a page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
  pub revision_id:  Uuid,
  pub page_id:      Uuid,
  pub author:       UserRef,
  /// `0` while unpublished; assigned exactly once at publish time.
  pub number:       u32,
  pub body:         String,
  pub is_published: bool,
  pub published_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub edited_at:    DateTime<Utc>,
}

impl Revision {
  /// A fresh unpublished draft.
  pub fn draft(page_id: Uuid, author: UserRef, body: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      revision_id: Uuid::new_v4(),
      page_id,
      author,
      number: 0,
      body: body.into(),
      is_published: false,
      published_at: None,
      created_at: now,
      edited_at: now,
    }
  }

  /// The validation guard every mutation (edit, publish, delete) runs first.
  pub fn ensure_mutable(&self) -> Result<()> {
    if self.is_published {
      return Err(Error::AlreadyPublished(self.revision_id));
    }
    Ok(())
  }

  /// Fails unless `user` wrote this revision.
  pub fn ensure_author(&self, user: &UserRef) -> Result<()> {
    if &self.author != user {
      return Err(Error::NotAuthor {
        revision_id: self.revision_id,
        author:      self.author.clone(),
        user:        user.clone(),
      });
    }
    Ok(())
  }

  /// Replace the draft body.
  pub fn edit(&mut self, body: impl Into<String>) -> Result<()> {
    self.ensure_mutable()?;
    self.body = body.into();
    self.edited_at = Utc::now();
    Ok(())
  }

  /// Transition to published.
  ///
  /// `latest` is the page's highest published number at the moment of the
  /// call, read inside the same atomic unit as the write that persists the
  /// result.
  pub fn publish(&mut self, latest: Option<u32>) -> Result<()> {
    self.ensure_mutable()?;
    let now = Utc::now();
    self.number = next_number(latest);
    self.is_published = true;
    self.published_at = Some(now);
    self.edited_at = now;
    Ok(())
  }
}

/// The number a newly published revision receives.
pub fn next_number(latest: Option<u32>) -> u32 { latest.map_or(1, |n| n + 1) }
