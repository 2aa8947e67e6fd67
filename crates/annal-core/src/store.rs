//! The `HistoryStore` trait: the event store and vote ledger seam.
//!
//! The trait is implemented by storage backends ([`crate::memory::MemoryStore`],
//! `annal-store-sqlite`). [`crate::protocol::Protocol`] drives it and is the
//! only writer; the HTTP layer and the CLI never talk to a store directly.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  account::AccountId,
  error::DomainError,
  event::{HistoricalEvent, NewEvent, Tag, Timeline},
  vote::VoteRecord,
};

/// The result of applying one vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedVote {
  pub record:   VoteRecord,
  /// The event after the vote, with its recomputed score and timeline.
  pub event:    HistoricalEvent,
  /// The timeline the event was in before the vote.
  pub previous: Timeline,
}

impl AppliedVote {
  pub fn timeline_changed(&self) -> bool { self.previous != self.event.timeline }
}

/// Abstraction over an annal storage backend.
///
/// Every write is applied in a single step: a failing call leaves no trace.
/// Events and vote records are never updated except for an event's tally and
/// the two fields derived from it, and are never deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + DomainError + From<Error> + Send + Sync + 'static;

  // ── Event store ───────────────────────────────────────────────────────

  /// Validate `candidate`, assign the next id and persist the event with an
  /// empty tally. Fails with [`Error::InvalidEventData`] without consuming
  /// an id.
  fn create_event(
    &self,
    submitter: AccountId,
    candidate: NewEvent,
  ) -> impl Future<Output = Result<HistoricalEvent, Self::Error>> + Send + '_;

  /// Retrieve an event by id. Returns `None` if not found.
  fn get_event(
    &self,
    id: u64,
  ) -> impl Future<Output = Result<Option<HistoricalEvent>, Self::Error>> + Send + '_;

  /// Events currently in `timeline`, ascending id.
  fn list_by_timeline(
    &self,
    timeline: Timeline,
  ) -> impl Future<Output = Result<Vec<HistoricalEvent>, Self::Error>> + Send + '_;

  /// Events created by `submitter`, ascending id.
  fn list_by_submitter<'a>(
    &'a self,
    submitter: &'a AccountId,
  ) -> impl Future<Output = Result<Vec<HistoricalEvent>, Self::Error>> + Send + 'a;

  /// Events carrying `tag`, ascending id.
  fn list_by_tag(
    &self,
    tag: Tag,
  ) -> impl Future<Output = Result<Vec<HistoricalEvent>, Self::Error>> + Send + '_;

  /// Every event, ascending id.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<HistoricalEvent>, Self::Error>> + Send + '_;

  /// Number of events created so far; also the highest id handed out.
  fn event_count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Record a vote and apply it to the event's tally.
  ///
  /// Fails with [`Error::EventNotFound`] if the event does not exist,
  /// [`Error::AlreadyVoted`] if `voter` already has a record for it and
  /// [`Error::TallyOverflow`] if a counter would overflow. The duplicate
  /// check, the record insert and the tally update happen as one step.
  fn cast_vote(
    &self,
    event_id: u64,
    voter: AccountId,
    support: bool,
  ) -> impl Future<Output = Result<AppliedVote, Self::Error>> + Send + '_;

  /// The vote `voter` cast on `event_id`, if any.
  fn get_vote<'a>(
    &'a self,
    event_id: u64,
    voter: &'a AccountId,
  ) -> impl Future<Output = Result<Option<VoteRecord>, Self::Error>> + Send + 'a;

  /// All votes on `event_id` in the order they were cast.
  fn votes_for(
    &self,
    event_id: u64,
  ) -> impl Future<Output = Result<Vec<VoteRecord>, Self::Error>> + Send + '_;

  /// Whether `voter` has voted on `event_id`.
  fn has_voted<'a>(
    &'a self,
    event_id: u64,
    voter: &'a AccountId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a {
    async move { Ok(self.get_vote(event_id, voter).await?.is_some()) }
  }
}
