//! Integration tests for `SqliteStore`, mostly against an in-memory
//! database; the races at the end share a file between two connections.

use std::{
  collections::BTreeSet,
  time::{Duration, Instant},
};

use folio_core::{
  Error as CoreError,
  diff::DiffMode,
  page::{FIRST_REVISION_BODY, NewPage, Page, PageQuery},
  store::WikiStore,
  user::UserRef,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn user(name: &str) -> UserRef { UserRef::from(name) }

async fn home(s: &SqliteStore) -> Page {
  s.create_page(NewPage::new("Home", user("u1"))).await.unwrap()
}

/// Unwrap the domain error out of a store error.
fn domain(err: crate::Error) -> CoreError {
  match err {
    crate::Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

/// Check out, replace the body, publish; returns the published number.
async fn revise(s: &SqliteStore, page: &Page, author: &str, body: &str) -> u32 {
  let draft = s.check_out(page.page_id, user(author)).await.unwrap();
  s.edit_draft(draft.revision_id, user(author), body.into())
    .await
    .unwrap();
  s.publish(draft.revision_id).await.unwrap().number
}

// ─── Page creation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn new_page_has_one_published_revision() {
  let s = store().await;
  let page = home(&s).await;

  assert_eq!(page.slug, "home");
  assert!(!page.is_checked_out);
  assert_eq!(s.count_published(page.page_id).await.unwrap(), 1);

  let first = s.latest_published(page.page_id).await.unwrap().unwrap();
  assert_eq!(first.number, 1);
  assert_eq!(first.body, FIRST_REVISION_BODY);
  assert_eq!(first.author, user("u1"));
  assert!(first.is_published);
  assert!(first.published_at.is_some());

  assert!(s.unpublished(page.page_id).await.unwrap().is_none());
  assert!(s.who_checked_out(page.page_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_title_or_slug_rejected() {
  let s = store().await;
  home(&s).await;

  let err = s
    .create_page(NewPage::new("Home", user("u2")))
    .await
    .unwrap_err();
  assert_eq!(domain(err), CoreError::DuplicateTitle("Home".into()));

  // Different title, same derived slug.
  let err = s
    .create_page(NewPage::new("HOME!", user("u2")))
    .await
    .unwrap_err();
  assert_eq!(domain(err), CoreError::DuplicateSlug("home".into()));

  // Nothing from the failed attempts was left behind.
  let pages = s.list_pages(&PageQuery::default()).await.unwrap();
  assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn lookup_by_slug_and_id() {
  let s = store().await;
  let mut input = NewPage::new("Release Notes", user("u1"));
  input.slug = Some("Notes".into());
  let page = s.create_page(input).await.unwrap();

  let by_slug = s.get_page_by_slug("notes").await.unwrap().unwrap();
  assert_eq!(by_slug, page);
  assert_eq!(s.get_page(page.page_id).await.unwrap(), Some(page));
  assert!(s.get_page(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_page_by_slug("release-notes").await.unwrap().is_none());
}

#[tokio::test]
async fn list_pages_filters_by_any_tag() {
  let s = store().await;

  let mut zebra = NewPage::new("Zebra", user("u1"));
  zebra.tags = ["animals".to_string()].into();
  s.create_page(zebra).await.unwrap();

  let mut apple = NewPage::new("Apple", user("u1"));
  apple.tags = ["food".to_string(), "red".to_string()].into();
  s.create_page(apple).await.unwrap();

  s.create_page(NewPage::new("Misc", user("u1"))).await.unwrap();

  let all = s.list_pages(&PageQuery::default()).await.unwrap();
  let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
  assert_eq!(titles, ["Apple", "Misc", "Zebra"]);

  let query = PageQuery { tags: ["animals".to_string(), "red".to_string()].into() };
  let tagged = s.list_pages(&query).await.unwrap();
  let titles: Vec<_> = tagged.iter().map(|p| p.title.as_str()).collect();
  assert_eq!(titles, ["Apple", "Zebra"]);
}

#[tokio::test]
async fn set_tags_replaces_the_set() {
  let s = store().await;
  let page = home(&s).await;

  let tags: BTreeSet<String> = ["b".to_string(), "a".to_string()].into();
  let updated = s.set_tags(page.page_id, tags.clone()).await.unwrap();
  assert_eq!(updated.tags, tags);

  let fetched = s.get_page(page.page_id).await.unwrap().unwrap();
  assert_eq!(fetched.tags, tags);

  let err = s.set_tags(Uuid::new_v4(), BTreeSet::new()).await.unwrap_err();
  assert!(matches!(domain(err), CoreError::PageNotFound(_)));
}

// ─── Checkout ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn check_out_opens_a_seeded_draft() {
  let s = store().await;
  let page = home(&s).await;

  let draft = s.check_out(page.page_id, user("u2")).await.unwrap();
  assert_eq!(draft.number, 0);
  assert!(!draft.is_published);
  assert!(draft.published_at.is_none());
  assert_eq!(draft.body, FIRST_REVISION_BODY);
  assert_eq!(draft.author, user("u2"));

  let page = s.get_page(page.page_id).await.unwrap().unwrap();
  assert!(page.is_checked_out);
  assert_eq!(s.who_checked_out(page.page_id).await.unwrap(), Some(user("u2")));
  assert_eq!(
    s.unpublished(page.page_id).await.unwrap().map(|r| r.revision_id),
    Some(draft.revision_id)
  );
}

#[tokio::test]
async fn second_check_out_fails_naming_the_holder() {
  let s = store().await;
  let page = home(&s).await;

  s.check_out(page.page_id, user("u2")).await.unwrap();
  let err = s.check_out(page.page_id, user("u3")).await.unwrap_err();
  let err = domain(err);
  assert_eq!(err, CoreError::AlreadyCheckedOut {
    page_id: page.page_id,
    by:      Some(user("u2")),
  });
  assert!(err.to_string().contains("checked out by u2"));
}

#[tokio::test]
async fn check_out_unknown_page() {
  let s = store().await;
  let err = s.check_out(Uuid::new_v4(), user("u1")).await.unwrap_err();
  assert!(matches!(domain(err), CoreError::PageNotFound(_)));
}

#[tokio::test]
async fn locked_page_cannot_be_checked_out() {
  let s = store().await;
  let page = home(&s).await;

  let locked = s.set_editable(page.page_id, false).await.unwrap();
  assert!(!locked.is_editable);

  let err = s.check_out(page.page_id, user("u2")).await.unwrap_err();
  assert_eq!(domain(err), CoreError::NotEditable(page.page_id));
  assert!(!s.get_page(page.page_id).await.unwrap().unwrap().is_checked_out);

  s.set_editable(page.page_id, true).await.unwrap();
  s.check_out(page.page_id, user("u2")).await.unwrap();
}

#[tokio::test]
async fn concurrent_check_outs_yield_one_winner() {
  let s = store().await;
  let page = home(&s).await;

  let handles: Vec<_> = (0..16)
    .map(|i| {
      let s = s.clone();
      let page_id = page.page_id;
      tokio::spawn(async move { s.check_out(page_id, user(&format!("u{i}"))).await })
    })
    .collect();

  let mut wins = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => wins += 1,
      Err(e) => assert!(matches!(domain(e), CoreError::AlreadyCheckedOut { .. })),
    }
  }
  assert_eq!(wins, 1);

  let draft = s.unpublished(page.page_id).await.unwrap().unwrap();
  assert_eq!(s.who_checked_out(page.page_id).await.unwrap(), Some(draft.author));
}

// ─── Check-in & publish ──────────────────────────────────────────────────────

#[tokio::test]
async fn check_in_refused_while_draft_pending() {
  let s = store().await;
  let page = home(&s).await;
  s.check_out(page.page_id, user("u2")).await.unwrap();

  let err = s.check_in(page.page_id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::UnpublishedRevisionExists {
    page_id: page.page_id,
    author:  user("u2"),
  });
  assert!(s.get_page(page.page_id).await.unwrap().unwrap().is_checked_out);
}

#[tokio::test]
async fn publish_numbers_and_checks_in() {
  let s = store().await;
  let page = home(&s).await;

  let draft = s.check_out(page.page_id, user("u2")).await.unwrap();
  let published = s.publish(draft.revision_id).await.unwrap();

  assert_eq!(published.revision_id, draft.revision_id);
  assert_eq!(published.number, 2);
  assert!(published.is_published);
  assert!(published.published_at.is_some());

  let page = s.get_page(page.page_id).await.unwrap().unwrap();
  assert!(!page.is_checked_out);
  assert!(s.unpublished(page.page_id).await.unwrap().is_none());
  assert_eq!(s.count_published(page.page_id).await.unwrap(), 2);
}

/// A page is checked out exactly while it has a draft.
async fn assert_flag_matches_draft(s: &SqliteStore, page_id: Uuid) {
  let page = s.get_page(page_id).await.unwrap().unwrap();
  let draft = s.unpublished(page_id).await.unwrap();
  assert_eq!(page.is_checked_out, draft.is_some(), "flag and draft disagree: {page:?}");
}

#[tokio::test]
async fn checkout_flag_tracks_the_draft_through_every_transition() {
  let s = store().await;
  let id = home(&s).await.page_id;
  assert_flag_matches_draft(&s, id).await;

  let draft = s.check_out(id, user("u2")).await.unwrap();
  assert_flag_matches_draft(&s, id).await;
  s.edit_draft(draft.revision_id, user("u2"), "x".into()).await.unwrap();
  assert_flag_matches_draft(&s, id).await;
  s.check_in(id).await.unwrap_err();
  assert_flag_matches_draft(&s, id).await;
  s.check_out(id, user("u3")).await.unwrap_err();
  assert_flag_matches_draft(&s, id).await;
  s.publish(draft.revision_id).await.unwrap();
  assert_flag_matches_draft(&s, id).await;

  let draft = s.check_out(id, user("u3")).await.unwrap();
  s.abandon(draft.revision_id, user("u4")).await.unwrap_err();
  assert_flag_matches_draft(&s, id).await;
  s.abandon(draft.revision_id, user("u3")).await.unwrap();
  assert_flag_matches_draft(&s, id).await;

  let draft = s.check_out(id, user("u4")).await.unwrap();
  s.delete_revision(draft.revision_id).await.unwrap();
  assert_flag_matches_draft(&s, id).await;

  s.check_in(id).await.unwrap();
  assert_flag_matches_draft(&s, id).await;
  s.set_editable(id, false).await.unwrap();
  s.check_out(id, user("u4")).await.unwrap_err();
  assert_flag_matches_draft(&s, id).await;
}

#[tokio::test]
async fn history_is_newest_first() {
  let s = store().await;
  let page = home(&s).await;

  assert_eq!(revise(&s, &page, "u2", "second").await, 2);
  assert_eq!(revise(&s, &page, "u3", "third").await, 3);

  let history = s.history(page.page_id).await.unwrap();
  let numbers: Vec<_> = history.iter().map(|r| r.number).collect();
  assert_eq!(numbers, [3, 2, 1]);
  assert_eq!(history[0].body, "third");
  assert_eq!(history[0].author, user("u3"));

  let second = s.get_revision_by_number(page.page_id, 2).await.unwrap().unwrap();
  assert_eq!(second.body, "second");
  assert!(s.get_revision_by_number(page.page_id, 4).await.unwrap().is_none());
}

#[tokio::test]
async fn next_draft_is_seeded_from_latest_body() {
  let s = store().await;
  let page = home(&s).await;
  revise(&s, &page, "u2", "revised text").await;

  let draft = s.check_out(page.page_id, user("u3")).await.unwrap();
  assert_eq!(draft.body, "revised text");
}

#[tokio::test]
async fn numbering_has_no_gaps_across_abandoned_drafts() {
  let s = store().await;
  let page = home(&s).await;

  for round in 0..9 {
    let draft = s.check_out(page.page_id, user("u2")).await.unwrap();
    if round % 3 == 0 {
      s.abandon(draft.revision_id, user("u2")).await.unwrap();
    } else {
      s.publish(draft.revision_id).await.unwrap();
    }
    // At most one draft at every step, and it is gone after each round.
    assert!(s.unpublished(page.page_id).await.unwrap().is_none());
  }

  let mut numbers: Vec<_> = s
    .history(page.page_id)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.number)
    .collect();
  numbers.reverse();
  assert_eq!(numbers, (1..=7).collect::<Vec<u32>>());
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_the_author_edits_a_draft() {
  let s = store().await;
  let page = home(&s).await;
  let draft = s.check_out(page.page_id, user("u2")).await.unwrap();

  let edited = s
    .edit_draft(draft.revision_id, user("u2"), "new body".into())
    .await
    .unwrap();
  assert_eq!(edited.body, "new body");
  assert!(edited.edited_at >= draft.edited_at);

  let err = s
    .edit_draft(draft.revision_id, user("u3"), "hijack".into())
    .await
    .unwrap_err();
  assert!(matches!(domain(err), CoreError::NotAuthor { .. }));

  let stored = s.get_revision(draft.revision_id).await.unwrap().unwrap();
  assert_eq!(stored.body, "new body");
}

#[tokio::test]
async fn abandon_by_someone_else_is_refused() {
  let s = store().await;
  let page = home(&s).await;
  let draft = s.check_out(page.page_id, user("u4")).await.unwrap();

  let err = s.abandon(draft.revision_id, user("u5")).await.unwrap_err();
  assert_eq!(domain(err), CoreError::NotAuthor {
    revision_id: draft.revision_id,
    author:      user("u4"),
    user:        user("u5"),
  });
  assert!(s.get_revision(draft.revision_id).await.unwrap().is_some());
}

#[tokio::test]
async fn abandon_deletes_and_checks_in() {
  let s = store().await;
  let page = home(&s).await;
  let draft = s.check_out(page.page_id, user("u4")).await.unwrap();

  let page = s.abandon(draft.revision_id, user("u4")).await.unwrap();
  assert!(!page.is_checked_out);
  assert!(s.get_revision(draft.revision_id).await.unwrap().is_none());
  assert_eq!(s.count_published(page.page_id).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_revision_ignores_authorship() {
  let s = store().await;
  let page = home(&s).await;
  let draft = s.check_out(page.page_id, user("u4")).await.unwrap();

  let page = s.delete_revision(draft.revision_id).await.unwrap();
  assert!(!page.is_checked_out);
  assert!(s.get_revision(draft.revision_id).await.unwrap().is_none());

  let err = s.delete_revision(draft.revision_id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::RevisionNotFound(draft.revision_id));
}

// ─── Immutability ────────────────────────────────────────────────────────────

#[tokio::test]
async fn published_revisions_are_immutable() {
  let s = store().await;
  let page = home(&s).await;
  let first = s.latest_published(page.page_id).await.unwrap().unwrap();
  let id = first.revision_id;

  let err = s.publish(id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(id));

  let err = s.edit_draft(id, user("u1"), "rewrite".into()).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(id));

  let err = s.abandon(id, user("u1")).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(id));

  let err = s.delete_revision(id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(id));

  assert_eq!(s.get_revision(id).await.unwrap(), Some(first));
}

#[tokio::test]
async fn published_check_comes_before_authorship() {
  let s = store().await;
  let page = home(&s).await;
  let first = s.latest_published(page.page_id).await.unwrap().unwrap();

  let err = s
    .edit_draft(first.revision_id, user("someone-else"), "rewrite".into())
    .await
    .unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(first.revision_id));

  let draft = s.check_out(page.page_id, user("u2")).await.unwrap();
  s.publish(draft.revision_id).await.unwrap();
  let err = s.publish(draft.revision_id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AlreadyPublished(draft.revision_id));
  assert_eq!(s.count_published(page.page_id).await.unwrap(), 2);
}

// ─── Comparisons ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn compare_marks_insertion_and_is_cached_both_ways() {
  let s = store().await;
  let page = home(&s).await;
  revise(&s, &page, "u2", "hello there world!").await;

  let forward = s.compare(page.page_id, 1, 2, DiffMode::Inline).await.unwrap();
  assert_eq!(forward.diff_html, "hello <ins>there </ins>world!");
  assert_eq!((forward.rev1_number, forward.rev2_number), (1, 2));

  let backward = s.compare(page.page_id, 2, 1, DiffMode::Inline).await.unwrap();
  assert_eq!(backward, forward);
}

#[tokio::test]
async fn compare_same_revision_rejected() {
  let s = store().await;
  let page = home(&s).await;
  let err = s.compare(page.page_id, 1, 1, DiffMode::Inline).await.unwrap_err();
  assert_eq!(domain(err), CoreError::ComparingSameRevision(1));
}

#[tokio::test]
async fn compare_unknown_or_unpublished_revision() {
  let s = store().await;
  let page = home(&s).await;

  let err = s.compare(page.page_id, 1, 5, DiffMode::Inline).await.unwrap_err();
  assert_eq!(domain(err), CoreError::RevisionNumberNotFound {
    page_id: page.page_id,
    number:  5,
  });

  // A draft has no number yet and cannot be compared.
  s.check_out(page.page_id, user("u2")).await.unwrap();
  let err = s.compare(page.page_id, 0, 1, DiffMode::Inline).await.unwrap_err();
  assert!(matches!(domain(err), CoreError::RevisionNumberNotFound { number: 0, .. }));

  // Revisions of another page do not resolve.
  let other = s.create_page(NewPage::new("Other", user("u1"))).await.unwrap();
  revise(&s, &other, "u1", "other body").await;
  let err = s.compare(page.page_id, 1, 2, DiffMode::Inline).await.unwrap_err();
  assert!(matches!(domain(err), CoreError::RevisionNumberNotFound { number: 2, .. }));
}

#[tokio::test]
async fn each_mode_is_cached_separately() {
  let s = store().await;
  let page = home(&s).await;
  revise(&s, &page, "u2", "hello <there> world!").await;

  let inline = s.compare(page.page_id, 1, 2, DiffMode::Inline).await.unwrap();
  let semantic = s.compare(page.page_id, 1, 2, DiffMode::Semantic).await.unwrap();
  let table = s.compare(page.page_id, 2, 1, DiffMode::Table).await.unwrap();

  assert_ne!(inline.comparison_id, semantic.comparison_id);
  assert_ne!(semantic.comparison_id, table.comparison_id);
  assert!(semantic.diff_html.contains("&lt;there&gt;"));
  assert!(table.diff_html.starts_with("<table"));

  let again = s.compare(page.page_id, 2, 1, DiffMode::Semantic).await.unwrap();
  assert_eq!(again, semantic);
}

// ─── Deletion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_page_cascades() {
  let s = store().await;
  let page = home(&s).await;
  revise(&s, &page, "u2", "two").await;
  s.compare(page.page_id, 1, 2, DiffMode::Inline).await.unwrap();
  let first = s.get_revision_by_number(page.page_id, 1).await.unwrap().unwrap();

  s.delete_page(page.page_id).await.unwrap();

  assert!(s.get_page(page.page_id).await.unwrap().is_none());
  assert!(s.get_revision(first.revision_id).await.unwrap().is_none());
  assert!(s.history(page.page_id).await.unwrap().is_empty());

  // The title is free again.
  home(&s).await;

  let err = s.delete_page(page.page_id).await.unwrap_err();
  assert!(matches!(domain(err), CoreError::PageNotFound(_)));
}

// ─── Shared database file ────────────────────────────────────────────────────

/// Two independent connections to one database, as two processes would have.
async fn two_stores() -> (tempfile::TempDir, SqliteStore, SqliteStore) {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("folio.db");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();
  (dir, a, b)
}

fn raw(dir: &tempfile::TempDir) -> rusqlite::Connection {
  rusqlite::Connection::open(dir.path().join("folio.db")).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn check_out_race_across_connections() {
  let (_dir, a, b) = two_stores().await;
  let page = home(&a).await;

  let handles: Vec<_> = (0..16)
    .map(|i| {
      let s = if i % 2 == 0 { a.clone() } else { b.clone() };
      let page_id = page.page_id;
      tokio::spawn(async move { s.check_out(page_id, user(&format!("u{i}"))).await })
    })
    .collect();

  let mut wins = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => wins += 1,
      Err(e) => assert!(matches!(domain(e), CoreError::AlreadyCheckedOut { .. })),
    }
  }
  assert_eq!(wins, 1);
  assert!(b.unpublished(page.page_id).await.unwrap().is_some());
}

/// Check out and publish `rounds` times, waiting out the other writer.
async fn publish_rounds(s: SqliteStore, page_id: Uuid, author: String, rounds: usize) {
  let mut done = 0;
  while done < rounds {
    match s.check_out(page_id, user(&author)).await {
      Ok(draft) => {
        s.publish(draft.revision_id).await.unwrap();
        done += 1;
      }
      Err(crate::Error::Core(CoreError::AlreadyCheckedOut { .. })) => {
        tokio::time::sleep(Duration::from_millis(1)).await;
      }
      Err(e) => panic!("unexpected error: {e}"),
    }
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_number_without_gaps() {
  let (_dir, a, b) = two_stores().await;
  let page_id = home(&a).await.page_id;

  let first = tokio::spawn(publish_rounds(a.clone(), page_id, "u2".into(), 5));
  let second = tokio::spawn(publish_rounds(b.clone(), page_id, "u3".into(), 5));
  first.await.unwrap();
  second.await.unwrap();

  let numbers: Vec<_> = a
    .history(page_id)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.number)
    .collect();
  assert_eq!(numbers, (1..=11).rev().collect::<Vec<u32>>());
  assert!(!b.get_page(page_id).await.unwrap().unwrap().is_checked_out);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_compares_store_one_record() {
  let (dir, a, b) = two_stores().await;
  let page = home(&a).await;
  revise(&a, &page, "u2", "hello there world!").await;

  let handles: Vec<_> = (0..8)
    .map(|i| {
      let s = if i % 2 == 0 { a.clone() } else { b.clone() };
      let page_id = page.page_id;
      let (rev1, rev2) = if i % 3 == 0 { (2, 1) } else { (1, 2) };
      tokio::spawn(async move { s.compare(page_id, rev1, rev2, DiffMode::Inline).await })
    })
    .collect();

  let mut ids = BTreeSet::new();
  for handle in handles {
    ids.insert(handle.await.unwrap().unwrap().comparison_id);
  }
  assert_eq!(ids.len(), 1);

  let rows: u32 = raw(&dir)
    .query_row("SELECT COUNT(*) FROM comparisons", [], |row| row.get(0))
    .unwrap();
  assert_eq!(rows, 1);
}

#[tokio::test]
async fn database_rejects_changes_to_published_rows() {
  let (dir, a, _b) = two_stores().await;
  let page = home(&a).await;
  let first = a.latest_published(page.page_id).await.unwrap().unwrap();

  let conn = raw(&dir);
  let err = conn
    .execute(
      "UPDATE revisions SET body = 'rewritten' WHERE revision_id = ?1",
      [first.revision_id.hyphenated().to_string()],
    )
    .unwrap_err();
  assert!(err.to_string().contains("immutable"), "{err}");

  assert_eq!(a.get_revision(first.revision_id).await.unwrap(), Some(first));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_compare_leaves_other_pages_writable() {
  let s = store().await;
  let home = home(&s).await;
  let other = s.create_page(NewPage::new("Other", user("u1"))).await.unwrap();
  revise(&s, &home, "u2", &"a".repeat(8_000)).await;
  revise(&s, &home, "u2", &"b".repeat(8_000)).await;

  let started = Instant::now();
  let compare = {
    let s = s.clone();
    tokio::spawn(async move {
      s.compare(home.page_id, 2, 3, DiffMode::Inline).await.unwrap();
      started.elapsed()
    })
  };

  tokio::time::sleep(Duration::from_millis(10)).await;
  s.check_out(other.page_id, user("u3")).await.unwrap();
  let checked_out = started.elapsed();

  let compared = compare.await.unwrap();
  assert!(
    checked_out < compared,
    "check-out took {checked_out:?}, compare {compared:?}"
  );
}
