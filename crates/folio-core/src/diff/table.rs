//! Line-level side-by-side rendering.

use super::{Tag, escape_html, opcodes};

/// Render `old` → `new` as an HTML table with one row per line pair.
///
/// Each row carries the old line number and text on the left, the new ones
/// on the right, and a class naming the change: `equal`, `deleted`, `added`
/// or `changed`. Missing sides are left blank.
pub fn table(old: &str, new: &str) -> String {
  let a: Vec<&str> = old.lines().collect();
  let b: Vec<&str> = new.lines().collect();

  let mut out = String::from("<table class=\"diff\">\n<tbody>\n");
  for op in opcodes(&a, &b) {
    let class = match op.tag {
      Tag::Equal => "equal",
      Tag::Delete => "deleted",
      Tag::Insert => "added",
      Tag::Replace => "changed",
    };
    let rows = op.old.len().max(op.new.len());
    for k in 0..rows {
      let left = (op.old.start + k < op.old.end).then(|| op.old.start + k);
      let right = (op.new.start + k < op.new.end).then(|| op.new.start + k);
      row(
        &mut out,
        class,
        left.map(|i| (i + 1, a[i])),
        right.map(|j| (j + 1, b[j])),
      );
    }
  }
  out.push_str("</tbody>\n</table>\n");
  out
}

fn row(out: &mut String, class: &str, left: Option<(usize, &str)>, right: Option<(usize, &str)>) {
  out.push_str("<tr class=\"");
  out.push_str(class);
  out.push_str("\">");
  for side in [left, right] {
    match side {
      Some((lineno, text)) => {
        out.push_str("<td class=\"lineno\">");
        out.push_str(&lineno.to_string());
        out.push_str("</td><td>");
        escape_html(text, out);
        out.push_str("</td>");
      }
      None => out.push_str("<td class=\"lineno\"></td><td></td>"),
    }
  }
  out.push_str("</tr>\n");
}
