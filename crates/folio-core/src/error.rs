//! Error types for `folio-core`.
//!
//! Every variant is a recoverable, caller-facing condition. Messages name the
//! invariant that blocked the action so the collaborator layer can show them
//! verbatim.

use thiserror::Error;
use uuid::Uuid;

use crate::user::UserRef;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("page not found: {0}")]
  PageNotFound(Uuid),

  #[error("no page with slug {0:?}")]
  SlugNotFound(String),

  #[error("revision not found: {0}")]
  RevisionNotFound(Uuid),

  #[error("page {page_id} has no published revision #{number}")]
  RevisionNumberNotFound { page_id: Uuid, number: u32 },

  #[error("page title must not be empty")]
  EmptyTitle,

  #[error("cannot derive a slug from title {0:?}")]
  EmptySlug(String),

  #[error("a page titled {0:?} already exists")]
  DuplicateTitle(String),

  #[error("a page with slug {0:?} already exists")]
  DuplicateSlug(String),

  #[error("page {0} is not editable")]
  NotEditable(Uuid),

  #[error(
    "page {page_id} is already checked out by {}",
    .by.as_ref().map_or("another user", |u| u.as_str())
  )]
  AlreadyCheckedOut { page_id: Uuid, by: Option<UserRef> },

  #[error(
    "page {page_id} has an unpublished revision by {author}; publish or \
     abandon it first"
  )]
  UnpublishedRevisionExists { page_id: Uuid, author: UserRef },

  #[error("revision {0} is published and can no longer change")]
  AlreadyPublished(Uuid),

  #[error("page {0} has no published revision to check out from")]
  NoPublishedRevision(Uuid),

  #[error("cannot compare revision #{0} with itself")]
  ComparingSameRevision(u32),

  #[error("revision {revision_id} belongs to {author}, not {user}")]
  NotAuthor {
    revision_id: Uuid,
    author:      UserRef,
    user:        UserRef,
  },

  #[error("unknown diff mode: {0:?}")]
  UnknownDiffMode(String),
}

/// Coarse classification of [`Error`], for transports that need to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Forbidden,
  Invalid,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::PageNotFound(_)
      | Self::SlugNotFound(_)
      | Self::RevisionNotFound(_)
      | Self::RevisionNumberNotFound { .. } => ErrorKind::NotFound,
      Self::DuplicateTitle(_)
      | Self::DuplicateSlug(_)
      | Self::AlreadyCheckedOut { .. }
      | Self::UnpublishedRevisionExists { .. }
      | Self::AlreadyPublished(_)
      | Self::NoPublishedRevision(_) => ErrorKind::Conflict,
      Self::NotEditable(_) | Self::NotAuthor { .. } => ErrorKind::Forbidden,
      Self::EmptyTitle
      | Self::EmptySlug(_)
      | Self::ComparingSameRevision(_)
      | Self::UnknownDiffMode(_) => ErrorKind::Invalid,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
