//! Opcode generation shared by every diff strategy.

use std::{
  iter::repeat_n,
  ops::{Index, IndexMut, Range},
};

/// What an [`Opcode`] does to turn the old span into the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  Equal,
  Insert,
  Delete,
  Replace,
}

/// A span of the old sequence mapped onto a span of the new sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
  pub tag: Tag,
  pub old: Range<usize>,
  pub new: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  Equal,
  Delete,
  Insert,
}

/// Compute the opcodes transforming `old` into `new`.
///
/// The edit script is a longest-common-subsequence alignment found with the
/// linear-space variant of Myers' O(ND) algorithm: the middle snake of the
/// optimal path splits the problem in two, and each half is solved the same
/// way. Memory stays O(N + M) however different the inputs are.
/// Adjacent deletions and insertions are reported as a single
/// [`Tag::Replace`].
pub fn opcodes<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Opcode> {
  let mut vf = Diagonals::new(old.len() + new.len());
  let mut vb = Diagonals::new(old.len() + new.len());
  let mut steps = Vec::with_capacity(old.len().max(new.len()));
  conquer(old, new, &mut vf, &mut vb, &mut steps);
  group(&steps)
}

/// Furthest-reaching x per diagonal `k`, indexed from `-bound` to `bound`.
struct Diagonals {
  offset: isize,
  v:      Vec<isize>,
}

impl Diagonals {
  fn new(len: usize) -> Self {
    let bound = (len / 2 + 2) as isize;
    Self { offset: bound, v: vec![0; (2 * bound + 1) as usize] }
  }
}

impl Index<isize> for Diagonals {
  type Output = isize;

  fn index(&self, k: isize) -> &isize { &self.v[(k + self.offset) as usize] }
}

impl IndexMut<isize> for Diagonals {
  fn index_mut(&mut self, k: isize) -> &mut isize { &mut self.v[(k + self.offset) as usize] }
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
  a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
  a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

fn conquer<T: PartialEq>(
  a: &[T],
  b: &[T],
  vf: &mut Diagonals,
  vb: &mut Diagonals,
  steps: &mut Vec<Step>,
) {
  let prefix = common_prefix(a, b);
  steps.extend(repeat_n(Step::Equal, prefix));
  let (a, b) = (&a[prefix..], &b[prefix..]);
  let suffix = common_suffix(a, b);
  let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

  if a.is_empty() {
    steps.extend(repeat_n(Step::Insert, b.len()));
  } else if b.is_empty() {
    steps.extend(repeat_n(Step::Delete, a.len()));
  } else if let Some((x, y)) = middle_snake(a, b, vf, vb) {
    conquer(&a[..x], &b[..y], vf, vb, steps);
    conquer(&a[x..], &b[y..], vf, vb, steps);
  } else {
    steps.extend(repeat_n(Step::Delete, a.len()));
    steps.extend(repeat_n(Step::Insert, b.len()));
  }

  steps.extend(repeat_n(Step::Equal, suffix));
}

/// Search forwards from the top-left and backwards from the bottom-right
/// until the two frontiers overlap, returning a point on an optimal path
/// strictly inside the grid. `a` and `b` must be non-empty and differ in
/// their first and last elements.
fn middle_snake<T: PartialEq>(
  a: &[T],
  b: &[T],
  vf: &mut Diagonals,
  vb: &mut Diagonals,
) -> Option<(usize, usize)> {
  let n = a.len() as isize;
  let m = b.len() as isize;
  let delta = n - m;
  let odd = delta & 1 == 1;
  let d_max = (n + m + 1) / 2 + 1;

  vf[1] = 0;
  vb[1] = 0;
  for d in 0..d_max {
    let mut k = -d;
    while k <= d {
      let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
        vf[k + 1]
      } else {
        vf[k - 1] + 1
      };
      let (x0, y0) = (x, x - k);
      let mut y = y0;
      while x < n && y >= 0 && y < m && a[x as usize] == b[y as usize] {
        x += 1;
        y += 1;
      }
      vf[k] = x;
      if odd && (k - delta).abs() < d && vf[k] + vb[delta - k] >= n {
        return split(x0, y0, n, m);
      }
      k += 2;
    }

    let mut k = -d;
    while k <= d {
      let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
        vb[k + 1]
      } else {
        vb[k - 1] + 1
      };
      let mut y = x - k;
      while x < n
        && y >= 0
        && y < m
        && a[(n - x - 1) as usize] == b[(m - y - 1) as usize]
      {
        x += 1;
        y += 1;
      }
      vb[k] = x;
      if !odd && (k - delta).abs() <= d && vb[k] + vf[delta - k] >= n {
        return split(n - x, m - y, n, m);
      }
      k += 2;
    }
  }
  None
}

/// Accept `(x, y)` only if it divides the grid into two smaller problems.
fn split(x: isize, y: isize, n: isize, m: isize) -> Option<(usize, usize)> {
  let inside = (0..=n).contains(&x) && (0..=m).contains(&y);
  let trivial = (x, y) == (0, 0) || (x, y) == (n, m);
  (inside && !trivial).then_some((x as usize, y as usize))
}

fn group(steps: &[Step]) -> Vec<Opcode> {
  let mut ops = Vec::new();
  let (mut i, mut j, mut idx) = (0, 0, 0);

  while idx < steps.len() {
    let (start_i, start_j) = (i, j);
    if steps[idx] == Step::Equal {
      while idx < steps.len() && steps[idx] == Step::Equal {
        i += 1;
        j += 1;
        idx += 1;
      }
      ops.push(Opcode { tag: Tag::Equal, old: start_i..i, new: start_j..j });
      continue;
    }

    while idx < steps.len() && steps[idx] != Step::Equal {
      if steps[idx] == Step::Delete {
        i += 1;
      } else {
        j += 1;
      }
      idx += 1;
    }
    let tag = match (i > start_i, j > start_j) {
      (true, true) => Tag::Replace,
      (true, false) => Tag::Delete,
      _ => Tag::Insert,
    };
    ops.push(Opcode { tag, old: start_i..i, new: start_j..j });
  }

  ops
}
