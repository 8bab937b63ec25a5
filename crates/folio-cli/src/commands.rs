//! Subcommand handlers. Pages are addressed by slug; a page's draft is
//! addressed through its page since there is at most one.

use std::{io::Read as _, path::PathBuf};

use anyhow::{Context as _, anyhow, bail};
use clap::Subcommand;
use folio_core::{
  diff::DiffMode,
  page::{NewPage, Page, PageQuery, PageState, parse_tags},
  revision::Revision,
  store::WikiStore,
  user::UserRef,
};
use folio_store_sqlite::SqliteStore;
use serde::Serialize;

use crate::{retry::with_retries, settings::Settings};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create a page; its first revision is published straight away.
  Create {
    title:  String,
    /// Explicit slug (derived from the title otherwise).
    #[arg(long)]
    slug:   Option<String>,
    /// Comma- or space-separated tags.
    #[arg(long, default_value = "")]
    tags:   String,
    /// Create the page with editing disabled.
    #[arg(long)]
    locked: bool,
  },
  /// List pages, optionally only those carrying any of the given tags.
  List {
    #[arg(long)]
    tags: Option<String>,
  },
  /// Print a page and the body of its latest (or a given) revision.
  Show {
    slug:   String,
    #[arg(long)]
    number: Option<u32>,
  },
  /// Replace a page's tags.
  Tag { slug: String, tags: String },
  /// Disable editing of a page.
  Lock { slug: String },
  /// Re-enable editing of a page.
  Unlock { slug: String },
  /// Delete a page with all its revisions.
  Delete { slug: String },
  /// Check a page out, opening a draft for the acting user.
  Checkout { slug: String },
  /// Replace the draft body with the contents of FILE, or stdin.
  Edit {
    slug: String,
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
  },
  /// Publish the page's draft as its next revision.
  Publish { slug: String },
  /// Discard the acting user's draft and check the page in.
  Abandon { slug: String },
  /// Check a page in once its draft is gone.
  Checkin { slug: String },
  /// Published revisions, newest first.
  History { slug: String },
  /// Diff two published revisions of a page.
  Compare {
    slug: String,
    rev1: u32,
    rev2: u32,
    #[arg(long)]
    mode: Option<DiffMode>,
  },
}

#[derive(Serialize)]
struct PageView<'a> {
  page:           &'a Page,
  revision:       &'a Revision,
  checked_out_by: Option<&'a UserRef>,
}

pub struct App {
  pub store:    SqliteStore,
  pub settings: Settings,
  pub user:     Option<UserRef>,
  pub json:     bool,
}

impl App {
  pub async fn run(&self, command: Command) -> anyhow::Result<()> {
    let retries = self.settings.max_retries;
    match command {
      Command::Create { title, slug, tags, locked } => {
        let mut input = NewPage::new(title, self.acting_user()?);
        input.slug = slug;
        input.tags = parse_tags(&tags);
        input.is_editable = !locked;
        let page = with_retries(retries, || self.store.create_page(input.clone())).await?;
        self.emit(&page, page_line)
      }

      Command::List { tags } => {
        let query = PageQuery {
          tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
        };
        let pages = with_retries(retries, || self.store.list_pages(&query)).await?;
        self.emit(&pages, |pages| {
          pages.iter().map(page_line).collect::<Vec<_>>().join("\n")
        })
      }

      Command::Show { slug, number } => {
        let page = self.page(&slug).await?;
        let revision = match number {
          Some(n) => with_retries(retries, || self.store.get_revision_by_number(page.page_id, n))
            .await?
            .ok_or_else(|| anyhow!("{slug} has no published revision #{n}"))?,
          None => with_retries(retries, || self.store.latest_published(page.page_id))
            .await?
            .ok_or_else(|| anyhow!("{slug} has no published revision"))?,
        };
        let holder = with_retries(retries, || self.store.who_checked_out(page.page_id)).await?;
        let view = PageView {
          page:           &page,
          revision:       &revision,
          checked_out_by: holder.as_ref(),
        };
        self.emit(&view, |v| {
          let mut out = format!("{}\nrevision #{} by {}", page_line(v.page), v.revision.number, v.revision.author);
          if let Some(user) = v.checked_out_by {
            out.push_str(&format!("\nchecked out by {user}"));
          }
          out.push_str("\n\n");
          out.push_str(&v.revision.body);
          out
        })
      }

      Command::Tag { slug, tags } => {
        let page = self.page(&slug).await?;
        let tags = parse_tags(&tags);
        let page = with_retries(retries, || self.store.set_tags(page.page_id, tags.clone())).await?;
        self.emit(&page, page_line)
      }

      Command::Lock { slug } => self.set_editable(&slug, false).await,
      Command::Unlock { slug } => self.set_editable(&slug, true).await,

      Command::Delete { slug } => {
        let page = self.page(&slug).await?;
        with_retries(retries, || self.store.delete_page(page.page_id)).await?;
        Ok(())
      }

      Command::Checkout { slug } => {
        let page = self.page(&slug).await?;
        let user = self.acting_user()?;
        let draft = with_retries(retries, || self.store.check_out(page.page_id, user.clone())).await?;
        self.emit(&draft, revision_line)
      }

      Command::Edit { slug, file } => {
        let draft = self.draft(&slug).await?;
        let user = self.acting_user()?;
        let body = match file {
          Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
          None => {
            let mut body = String::new();
            std::io::stdin()
              .read_to_string(&mut body)
              .context("failed to read draft body from stdin")?;
            body
          }
        };
        let draft = with_retries(retries, || {
          self.store.edit_draft(draft.revision_id, user.clone(), body.clone())
        })
        .await?;
        self.emit(&draft, revision_line)
      }

      Command::Publish { slug } => {
        let draft = self.draft(&slug).await?;
        let published = with_retries(retries, || self.store.publish(draft.revision_id)).await?;
        self.emit(&published, revision_line)
      }

      Command::Abandon { slug } => {
        let draft = self.draft(&slug).await?;
        let user = self.acting_user()?;
        let page = with_retries(retries, || self.store.abandon(draft.revision_id, user.clone())).await?;
        self.emit(&page, page_line)
      }

      Command::Checkin { slug } => {
        let page = self.page(&slug).await?;
        let page = with_retries(retries, || self.store.check_in(page.page_id)).await?;
        self.emit(&page, page_line)
      }

      Command::History { slug } => {
        let page = self.page(&slug).await?;
        let history = with_retries(retries, || self.store.history(page.page_id)).await?;
        self.emit(&history, |revs| {
          revs.iter().map(revision_line).collect::<Vec<_>>().join("\n")
        })
      }

      Command::Compare { slug, rev1, rev2, mode } => {
        let page = self.page(&slug).await?;
        let mode = mode.unwrap_or(self.settings.diff_mode);
        let comparison = with_retries(retries, || self.store.compare(page.page_id, rev1, rev2, mode)).await?;
        self.emit(&comparison, |c| c.diff_html.clone())
      }
    }
  }

  fn acting_user(&self) -> anyhow::Result<UserRef> {
    self
      .user
      .clone()
      .ok_or_else(|| anyhow!("no acting user; pass --user or set FOLIO_USER"))
  }

  async fn page(&self, slug: &str) -> anyhow::Result<Page> {
    with_retries(self.settings.max_retries, || self.store.get_page_by_slug(slug))
      .await?
      .ok_or_else(|| anyhow!("no page with slug {slug:?}"))
  }

  async fn draft(&self, slug: &str) -> anyhow::Result<Revision> {
    let page = self.page(slug).await?;
    match with_retries(self.settings.max_retries, || self.store.unpublished(page.page_id)).await? {
      Some(draft) => Ok(draft),
      None => bail!("{slug} has no draft; check it out first"),
    }
  }

  async fn set_editable(&self, slug: &str, is_editable: bool) -> anyhow::Result<()> {
    let page = self.page(slug).await?;
    let page = with_retries(self.settings.max_retries, || {
      self.store.set_editable(page.page_id, is_editable)
    })
    .await?;
    self.emit(&page, page_line)
  }

  /// Print `value` as JSON with `--json`, otherwise through `text`.
  fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value)?);
    } else {
      println!("{}", text(value));
    }
    Ok(())
  }
}

fn page_line(page: &Page) -> String {
  let tags = page.tags.iter().cloned().collect::<Vec<_>>().join(",");
  let mut flags = Vec::new();
  if page.state() == PageState::CheckedOut {
    flags.push("checked-out");
  }
  if !page.is_editable {
    flags.push("locked");
  }
  format!("{}\t{}\t[{tags}]\t{}", page.slug, page.title, flags.join(" "))
}

fn revision_line(rev: &Revision) -> String {
  match rev.published_at {
    Some(at) => format!("#{}\t{}\t{}", rev.number, at.format("%Y-%m-%d %H:%M:%S"), rev.author),
    None => format!("draft {}\t{}", rev.revision_id, rev.author),
  }
}
