//! Caller identity.
//!
//! The identity provider in front of the core authenticates callers; the core
//! only ever sees the resulting address and trusts it as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The address of an account that submits events or casts votes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
  pub fn new(address: impl Into<String>) -> Self { Self(address.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for AccountId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for AccountId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for AccountId {
  fn from(s: String) -> Self { Self(s) }
}
