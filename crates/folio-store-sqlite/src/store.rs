//! [`SqliteStore`], the SQLite implementation of [`WikiStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use folio_core::{
  comparison::{Comparison, ComparisonKey},
  diff::DiffMode,
  page::{FIRST_REVISION_BODY, NewPage, Page, PageQuery},
  revision::Revision,
  store::WikiStore,
  user::UserRef,
};
use rusqlite::TransactionBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  comparisons::{self, Cached, Lookup},
  pages, revisions,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio wiki store backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection outside of any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside an `IMMEDIATE` transaction, committing only if it
  /// succeeds. Domain errors roll back every write `f` made.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }
}

// ─── WikiStore impl ──────────────────────────────────────────────────────────

impl WikiStore for SqliteStore {
  type Error = Error;

  // ── Pages ─────────────────────────────────────────────────────────────────

  async fn create_page(&self, input: NewPage) -> Result<Page> {
    let (title, slug) = input.validate()?;
    let page = Page {
      page_id: Uuid::new_v4(),
      title,
      slug,
      tags: input.tags,
      creator: input.creator,
      is_editable: input.is_editable,
      is_checked_out: false,
      created_at: Utc::now(),
    };

    let row = page.clone();
    self
      .write(move |tx| {
        pages::insert(tx, &row)?;
        let first = Revision::draft(row.page_id, row.creator.clone(), FIRST_REVISION_BODY);
        revisions::insert(tx, &first)?;
        // No checkout ever happened, so there is nothing to check in.
        pages::publish(tx, first.revision_id, false)
      })
      .await?;

    info!(page_id = %page.page_id, slug = %page.slug, creator = %page.creator, "page created");
    Ok(page)
  }

  async fn get_page(&self, page_id: Uuid) -> Result<Option<Page>> {
    self.read(move |conn| pages::find(conn, page_id)).await
  }

  async fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
    let slug = slug.to_owned();
    self.read(move |conn| pages::find_by_slug(conn, &slug)).await
  }

  async fn list_pages(&self, query: &PageQuery) -> Result<Vec<Page>> {
    let tags = query.tags.clone();
    self.read(move |conn| pages::list(conn, &tags)).await
  }

  async fn set_tags(&self, page_id: Uuid, tags: BTreeSet<String>) -> Result<Page> {
    self.write(move |tx| pages::set_tags(tx, page_id, tags)).await
  }

  async fn set_editable(&self, page_id: Uuid, is_editable: bool) -> Result<Page> {
    let page = self
      .write(move |tx| pages::set_editable(tx, page_id, is_editable))
      .await?;
    info!(%page_id, is_editable, "page editability changed");
    Ok(page)
  }

  async fn delete_page(&self, page_id: Uuid) -> Result<()> {
    self.write(move |tx| pages::delete(tx, page_id)).await?;
    info!(%page_id, "page deleted");
    Ok(())
  }

  // ── Checkout state machine ────────────────────────────────────────────────

  async fn check_out(&self, page_id: Uuid, user: UserRef) -> Result<Revision> {
    let draft = self
      .write(move |tx| pages::check_out(tx, page_id, user))
      .await?;
    info!(%page_id, revision_id = %draft.revision_id, author = %draft.author, "page checked out");
    Ok(draft)
  }

  async fn check_in(&self, page_id: Uuid) -> Result<Page> {
    let page = self.write(move |tx| pages::check_in(tx, page_id)).await?;
    info!(%page_id, "page checked in");
    Ok(page)
  }

  async fn edit_draft(&self, revision_id: Uuid, editor: UserRef, body: String) -> Result<Revision> {
    let draft = self
      .write(move |tx| revisions::edit(tx, revision_id, &editor, body))
      .await?;
    debug!(%revision_id, bytes = draft.body.len(), "draft edited");
    Ok(draft)
  }

  async fn publish(&self, revision_id: Uuid) -> Result<Revision> {
    let published = self
      .write(move |tx| pages::publish(tx, revision_id, true))
      .await?;
    info!(
      page_id = %published.page_id,
      %revision_id,
      number = published.number,
      "revision published"
    );
    Ok(published)
  }

  async fn abandon(&self, revision_id: Uuid, user: UserRef) -> Result<Page> {
    let page = self
      .write(move |tx| pages::abandon(tx, revision_id, Some(&user)))
      .await?;
    info!(page_id = %page.page_id, %revision_id, "draft abandoned");
    Ok(page)
  }

  async fn delete_revision(&self, revision_id: Uuid) -> Result<Page> {
    let page = self
      .write(move |tx| pages::abandon(tx, revision_id, None))
      .await?;
    info!(page_id = %page.page_id, %revision_id, "draft deleted");
    Ok(page)
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn get_revision(&self, revision_id: Uuid) -> Result<Option<Revision>> {
    self.read(move |conn| revisions::find(conn, revision_id)).await
  }

  async fn get_revision_by_number(&self, page_id: Uuid, number: u32) -> Result<Option<Revision>> {
    self
      .read(move |conn| revisions::find_published(conn, page_id, number))
      .await
  }

  async fn latest_published(&self, page_id: Uuid) -> Result<Option<Revision>> {
    self
      .read(move |conn| revisions::latest_published(conn, page_id))
      .await
  }

  async fn history(&self, page_id: Uuid) -> Result<Vec<Revision>> {
    self.read(move |conn| revisions::history(conn, page_id)).await
  }

  async fn unpublished(&self, page_id: Uuid) -> Result<Option<Revision>> {
    self.read(move |conn| revisions::find_draft(conn, page_id)).await
  }

  async fn count_published(&self, page_id: Uuid) -> Result<u32> {
    self
      .read(move |conn| revisions::count_published(conn, page_id))
      .await
  }

  async fn who_checked_out(&self, page_id: Uuid) -> Result<Option<UserRef>> {
    let draft = self.unpublished(page_id).await?;
    Ok(draft.map(|d| d.author))
  }

  // ── Comparison cache ──────────────────────────────────────────────────────

  async fn compare(&self, page_id: Uuid, rev1: u32, rev2: u32, mode: DiffMode) -> Result<Comparison> {
    let key = ComparisonKey::new(page_id, rev1, rev2, mode)?;
    let (comparison, lookup) = match self.read(move |conn| comparisons::lookup(conn, key)).await? {
      Cached::Hit(existing) => (existing, Lookup::Hit),
      Cached::Miss { older, newer } => {
        let computed =
          tokio::task::spawn_blocking(move || Comparison::compute(key, &older, &newer)).await?;
        self
          .write(move |tx| comparisons::insert_or_get(tx, &computed))
          .await?
      }
    };
    debug!(
      %page_id,
      rev1 = key.older,
      rev2 = key.newer,
      %mode,
      cached = lookup == Lookup::Hit,
      "comparison resolved"
    );
    Ok(comparison)
  }
}
