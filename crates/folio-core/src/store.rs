//! The `WikiStore` trait: the page store, revision store and comparison
//! cache as one backend contract.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! Higher layers (`folio-cli`) depend on this abstraction, not on any
//! concrete backend.
//!
//! # Atomicity
//!
//! Implementations must make each of these a single atomic unit with respect
//! to other calls on the same page:
//!
//! - the "already checked out?" test and the flip to checked out in
//!   [`WikiStore::check_out`];
//! - the read of the latest published number and the write of the next one
//!   in [`WikiStore::publish`];
//! - the lookup and insert of [`WikiStore::compare`].
//!
//! Every mutation of an existing revision must run
//! [`Revision::ensure_mutable`] first.

use std::{collections::BTreeSet, future::Future};

use uuid::Uuid;

use crate::{
  comparison::Comparison,
  diff::DiffMode,
  page::{NewPage, Page, PageQuery},
  revision::Revision,
  user::UserRef,
};

/// Abstraction over a Folio wiki backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait WikiStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Pages ─────────────────────────────────────────────────────────────

  /// Create a page together with its first revision, published as #1 with
  /// the creator as author and [`FIRST_REVISION_BODY`] as body.
  ///
  /// [`FIRST_REVISION_BODY`]: crate::page::FIRST_REVISION_BODY
  fn create_page(
    &self,
    input: NewPage,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Retrieve a page by UUID. Returns `None` if not found.
  fn get_page(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Option<Page>, Self::Error>> + Send + '_;

  /// Retrieve a page by its slug. Returns `None` if not found.
  fn get_page_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Page>, Self::Error>> + Send + 'a;

  /// Pages ordered by title, restricted to those carrying any of
  /// `query.tags` when that set is non-empty.
  fn list_pages<'a>(
    &'a self,
    query: &'a PageQuery,
  ) -> impl Future<Output = Result<Vec<Page>, Self::Error>> + Send + 'a;

  /// Replace the tag set of a page.
  fn set_tags(
    &self,
    page_id: Uuid,
    tags: BTreeSet<String>,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  fn set_editable(
    &self,
    page_id: Uuid,
    is_editable: bool,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Delete a page with all of its revisions and comparisons.
  fn delete_page(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Checkout state machine ────────────────────────────────────────────

  /// Open a draft for `user`, seeded with the latest published body.
  ///
  /// Fails with `AlreadyCheckedOut` if another draft is open, and with
  /// `NotEditable` if the page is locked.
  fn check_out(
    &self,
    page_id: Uuid,
    user: UserRef,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + '_;

  /// Leave the checked-out state. Fails with `UnpublishedRevisionExists`
  /// while a draft remains.
  fn check_in(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Replace the body of a draft. Only its author may edit it.
  fn edit_draft(
    &self,
    revision_id: Uuid,
    editor: UserRef,
    body: String,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + '_;

  /// Publish a draft as the page's next numbered revision, then check the
  /// page in.
  fn publish(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + '_;

  /// Delete `user`'s draft and check its page in.
  fn abandon(
    &self,
    revision_id: Uuid,
    user: UserRef,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Delete a draft regardless of author and check its page in. Published
  /// revisions cannot be deleted.
  fn delete_revision(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  // ── Queries ───────────────────────────────────────────────────────────

  fn get_revision(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// The published revision numbered `number`, if any.
  fn get_revision_by_number(
    &self,
    page_id: Uuid,
    number: u32,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// The most recently published revision.
  fn latest_published(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// All published revisions, newest first.
  fn history(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Revision>, Self::Error>> + Send + '_;

  /// The open draft, if the page is checked out.
  fn unpublished(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  fn count_published(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Author of the open draft.
  fn who_checked_out(
    &self,
    page_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRef>, Self::Error>> + Send + '_;

  // ── Comparison cache ──────────────────────────────────────────────────

  /// Diff two published revisions (by number) of a page, computing the
  /// result at most once per canonical pair and mode.
  ///
  /// Fails with `ComparingSameRevision` when `rev1 == rev2` and with
  /// `RevisionNumberNotFound` when either number does not resolve.
  fn compare(
    &self,
    page_id: Uuid,
    rev1: u32,
    rev2: u32,
    mode: DiffMode,
  ) -> impl Future<Output = Result<Comparison, Self::Error>> + Send + '_;
}
