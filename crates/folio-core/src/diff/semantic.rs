//! Word-level rendering with semantic cleanup.
//!
//! Bodies are split into word, whitespace and punctuation tokens before
//! diffing. Short equalities trapped between larger edits are then folded
//! into those edits, so "foo bar" → "qux quux" reads as one replacement
//! rather than two edits around a shared space.

use serde::{Deserialize, Serialize};

use super::{Tag, escape_html, opcodes};

/// One run of the semantic diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "lowercase")]
pub enum Chunk {
  Equal(String),
  Delete(String),
  Insert(String),
}

/// Render `old` → `new` as HTML, replacements shown as a deletion followed by
/// an insertion. Newlines are made visible as `&para;<br>`.
pub fn semantic(old: &str, new: &str) -> String {
  let mut out = String::new();
  for chunk in semantic_chunks(old, new) {
    let (open, close, text) = match &chunk {
      Chunk::Equal(t) => ("<span>", "</span>", t),
      Chunk::Delete(t) => ("<del style=\"background:#ffe6e6;\">", "</del>", t),
      Chunk::Insert(t) => ("<ins style=\"background:#e6ffe6;\">", "</ins>", t),
    };
    let mut escaped = String::with_capacity(text.len());
    escape_html(text, &mut escaped);
    out.push_str(open);
    out.push_str(&escaped.replace('\n', "&para;<br>"));
    out.push_str(close);
  }
  out
}

/// The cleaned-up chunk sequence behind [`semantic`].
pub fn semantic_chunks(old: &str, new: &str) -> Vec<Chunk> {
  let a = tokenize(old);
  let b = tokenize(new);

  let mut chunks = Vec::new();
  for op in opcodes(&a, &b) {
    let removed = a[op.old].concat();
    let added = b[op.new].concat();
    match op.tag {
      Tag::Equal => chunks.push(Chunk::Equal(removed)),
      Tag::Delete => chunks.push(Chunk::Delete(removed)),
      Tag::Insert => chunks.push(Chunk::Insert(added)),
      Tag::Replace => {
        chunks.push(Chunk::Delete(removed));
        chunks.push(Chunk::Insert(added));
      }
    }
  }
  cleanup_semantic(chunks)
}

// ─── Tokenisation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
  Word,
  Space,
  /// Punctuation and newlines; every such character is its own token.
  Single,
}

fn classify(c: char) -> Class {
  if c.is_alphanumeric() || c == '_' {
    Class::Word
  } else if c.is_whitespace() && c != '\n' {
    Class::Space
  } else {
    Class::Single
  }
}

fn tokenize(text: &str) -> Vec<&str> {
  let mut tokens = Vec::new();
  let mut start = 0;
  let mut prev: Option<Class> = None;
  for (i, c) in text.char_indices() {
    let class = classify(c);
    if let Some(p) = prev
      && (p != class || class == Class::Single)
    {
      tokens.push(&text[start..i]);
      start = i;
    }
    prev = Some(class);
  }
  if start < text.len() {
    tokens.push(&text[start..]);
  }
  tokens
}

// ─── Cleanup ─────────────────────────────────────────────────────────────────

/// Fold every interior equality that is no longer than the edits on both of
/// its sides into those edits, until none is left.
fn cleanup_semantic(chunks: Vec<Chunk>) -> Vec<Chunk> {
  let mut chunks = merge(chunks);
  while let Some(idx) = find_weak_equality(&chunks) {
    if let Chunk::Equal(text) = chunks.remove(idx) {
      chunks.splice(idx..idx, [Chunk::Delete(text.clone()), Chunk::Insert(text)]);
    }
    chunks = merge(chunks);
  }
  chunks
}

fn find_weak_equality(chunks: &[Chunk]) -> Option<usize> {
  (1..chunks.len().saturating_sub(1)).find(|&idx| {
    let Chunk::Equal(text) = &chunks[idx] else {
      return false;
    };
    let len = text.chars().count();
    len <= edit_weight(chunks[..idx].iter().rev())
      && len <= edit_weight(chunks[idx + 1..].iter())
  })
}

/// Size of the edit run adjacent to an equality: the larger of its deleted
/// and inserted character counts.
fn edit_weight<'a>(run: impl Iterator<Item = &'a Chunk>) -> usize {
  let (mut deleted, mut inserted) = (0, 0);
  for chunk in run {
    match chunk {
      Chunk::Equal(_) => break,
      Chunk::Delete(t) => deleted += t.chars().count(),
      Chunk::Insert(t) => inserted += t.chars().count(),
    }
  }
  deleted.max(inserted)
}

/// Coalesce each run of edits into at most one deletion followed by one
/// insertion, and join neighbouring equalities.
fn merge(chunks: Vec<Chunk>) -> Vec<Chunk> {
  let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
  let mut deleted = String::new();
  let mut inserted = String::new();

  for chunk in chunks {
    match chunk {
      Chunk::Delete(t) => deleted.push_str(&t),
      Chunk::Insert(t) => inserted.push_str(&t),
      Chunk::Equal(t) => {
        flush(&mut out, &mut deleted, &mut inserted);
        if t.is_empty() {
          continue;
        }
        if let Some(Chunk::Equal(prev)) = out.last_mut() {
          prev.push_str(&t);
        } else {
          out.push(Chunk::Equal(t));
        }
      }
    }
  }
  flush(&mut out, &mut deleted, &mut inserted);
  out
}

fn flush(out: &mut Vec<Chunk>, deleted: &mut String, inserted: &mut String) {
  if !deleted.is_empty() {
    out.push(Chunk::Delete(std::mem::take(deleted)));
  }
  if !inserted.is_empty() {
    out.push(Chunk::Insert(std::mem::take(inserted)));
  }
}
