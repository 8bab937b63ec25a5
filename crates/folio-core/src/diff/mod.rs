//! The diff engine: turns two revision bodies into an HTML rendering.
//!
//! Three strategies share one opcode generator ([`opcodes`], a Myers
//! shortest-edit-script over an arbitrary token sequence) and differ only in
//! tokenisation and rendering:
//!
//! | Mode | Granularity | Replace spans |
//! |------|-------------|---------------|
//! | [`DiffMode::Inline`]   | characters | dropped from the output |
//! | [`DiffMode::Semantic`] | words, with semantic cleanup | deletion followed by insertion |
//! | [`DiffMode::Table`]    | lines, side by side | paired rows |
//!
//! Every strategy is pure and escapes HTML metacharacters from the input.

mod inline;
mod opcodes;
mod semantic;
mod table;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

pub use inline::inline;
pub use opcodes::{Opcode, Tag, opcodes};
pub use semantic::{Chunk, semantic, semantic_chunks};
pub use table::table;

/// Which strategy a comparison is rendered with.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
  #[default]
  Inline,
  Semantic,
  Table,
}

impl DiffMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Inline => "inline",
      Self::Semantic => "semantic",
      Self::Table => "table",
    }
  }
}

impl fmt::Display for DiffMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DiffMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "inline" => Ok(Self::Inline),
      "semantic" => Ok(Self::Semantic),
      "table" => Ok(Self::Table),
      other => Err(Error::UnknownDiffMode(other.to_owned())),
    }
  }
}

/// Render the difference between `old` and `new` with the chosen strategy.
pub fn render(mode: DiffMode, old: &str, new: &str) -> String {
  match mode {
    DiffMode::Inline => inline(old, new),
    DiffMode::Semantic => semantic(old, new),
    DiffMode::Table => table(old, new),
  }
}

/// Escape the five HTML metacharacters.
pub(crate) fn escape_html(text: &str, out: &mut String) {
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      c => out.push(c),
    }
  }
}
