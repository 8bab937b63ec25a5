//! Opaque author/user references supplied by the identity provider.
//!
//! The core never authenticates anyone. It stores the reference on revisions
//! and compares it when an action is restricted to a draft's author.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(String);

impl UserRef {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UserRef {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserRef {
  fn from(s: String) -> Self { Self(s) }
}
