//! Error types for `annal-core`.

use thiserror::Error;

use crate::account::AccountId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid event data: {0}")]
  InvalidEventData(String),

  #[error("event not found: {0}")]
  EventNotFound(u64),

  #[error("{voter} has already voted on event {event_id}")]
  AlreadyVoted { event_id: u64, voter: AccountId },

  #[error("unknown timeline: {0:?}")]
  UnknownTimeline(String),

  #[error("unknown tag: {0:?}")]
  UnknownTag(String),

  /// A vote counter would leave the `u64` range. Nothing is written.
  #[error("vote tally overflow on event {0}")]
  TallyOverflow(u64),
}

impl Error {
  pub(crate) fn invalid(reason: impl Into<String>) -> Self {
    Self::InvalidEventData(reason.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Recovers the domain error carried by a backend error, if there is one.
///
/// Backends wrap [`Error`] in their own error enums next to I/O failures;
/// the HTTP layer uses this to pick a status code.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
