//! Votes and vote tallies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, account::AccountId};

/// One support or challenge vote. At most one exists per `(event_id, voter)`
/// and it is never changed or removed once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
  pub event_id: u64,
  pub voter:    AccountId,
  /// `true` supports the event, `false` challenges it.
  pub support:  bool,
  /// Store-assigned.
  pub cast_at:  DateTime<Utc>,
}

/// The `(support, challenge)` counters of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub support:   u64,
  pub challenge: u64,
}

impl Tally {
  /// The tally after one more vote on `event_id`.
  ///
  /// Exactly one counter grows by one. Fails with [`Error::TallyOverflow`]
  /// if that counter, or the total, would leave the `u64` range.
  pub fn record(self, event_id: u64, support: bool) -> Result<Self> {
    let next = if support {
      self.support.checked_add(1).map(|support| Self { support, ..self })
    } else {
      self
        .challenge
        .checked_add(1)
        .map(|challenge| Self { challenge, ..self })
    };
    next
      .filter(|t| t.support.checked_add(t.challenge).is_some())
      .ok_or(Error::TallyOverflow(event_id))
  }

  pub fn total(self) -> u64 { self.support + self.challenge }
}
