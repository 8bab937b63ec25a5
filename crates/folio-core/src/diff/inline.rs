//! Character-level inline rendering.

use super::{Tag, escape_html, opcodes};

/// Render `old` → `new` as one text stream, wrapping deleted spans in
/// `<del>` and inserted spans in `<ins>`.
///
/// Replaced spans produce no output at all: neither the old nor the new
/// text of a [`Tag::Replace`] opcode appears in the result.
pub fn inline(old: &str, new: &str) -> String {
  let a: Vec<char> = old.chars().collect();
  let b: Vec<char> = new.chars().collect();

  let mut out = String::with_capacity(old.len().max(new.len()));
  for op in opcodes(&a, &b) {
    match op.tag {
      Tag::Equal => escape_html(&collect(&a[op.old]), &mut out),
      Tag::Insert => {
        out.push_str("<ins>");
        escape_html(&collect(&b[op.new]), &mut out);
        out.push_str("</ins>");
      }
      Tag::Delete => {
        out.push_str("<del>");
        escape_html(&collect(&a[op.old]), &mut out);
        out.push_str("</del>");
      }
      Tag::Replace => {}
    }
  }
  out
}

fn collect(chars: &[char]) -> String { chars.iter().collect() }
