//! Read-only projections over a [`Protocol`]'s store.
//!
//! Queries never mutate state and never wait on the write gate. "No data" is
//! an empty list (or `false`), never an error; errors are reserved for
//! malformed input and a missing event looked up by id.

use crate::{
  Error,
  account::AccountId,
  event::{HistoricalEvent, Tag, Timeline},
  protocol::Protocol,
  store::HistoryStore,
  vote::VoteRecord,
};

impl<S: HistoryStore> Protocol<S> {
  /// Fails with [`Error::EventNotFound`] if there is no event `id`.
  pub async fn get_event(&self, id: u64) -> Result<HistoricalEvent, S::Error> {
    self
      .store
      .get_event(id)
      .await?
      .ok_or_else(|| Error::EventNotFound(id).into())
  }

  /// Events in `timeline`, ascending id. Callers wanting chronological order
  /// sort by `occurred_on` themselves.
  pub async fn get_events_by_timeline(&self, timeline: Timeline) -> Result<Vec<HistoricalEvent>, S::Error> {
    self.store.list_by_timeline(timeline).await
  }

  /// As [`Self::get_events_by_timeline`], taking the timeline by name.
  /// Fails with [`Error::UnknownTimeline`] for anything but the three
  /// timeline names (in any ASCII case).
  pub async fn get_events_by_timeline_name(&self, name: &str) -> Result<Vec<HistoricalEvent>, S::Error> {
    let timeline = Timeline::parse(name)?;
    self.get_events_by_timeline(timeline).await
  }

  /// Events submitted by `address`, ascending id.
  pub async fn get_user_events(&self, address: &AccountId) -> Result<Vec<HistoricalEvent>, S::Error> {
    self.store.list_by_submitter(address).await
  }

  pub async fn get_events_by_tag(&self, tag: Tag) -> Result<Vec<HistoricalEvent>, S::Error> {
    self.store.list_by_tag(tag).await
  }

  /// As [`Self::get_events_by_tag`], taking the tag by name. Fails with
  /// [`Error::UnknownTag`] for names outside the vocabulary.
  pub async fn get_events_by_tag_name(&self, name: &str) -> Result<Vec<HistoricalEvent>, S::Error> {
    let tag = Tag::parse(name)?;
    self.get_events_by_tag(tag).await
  }

  /// `false` for unknown events as well as for accounts that have not voted.
  pub async fn has_voted(&self, event_id: u64, voter: &AccountId) -> Result<bool, S::Error> {
    self.store.has_voted(event_id, voter).await
  }

  pub async fn get_vote(&self, event_id: u64, voter: &AccountId) -> Result<Option<VoteRecord>, S::Error> {
    self.store.get_vote(event_id, voter).await
  }

  /// Every vote on `event_id` in cast order. Fails with
  /// [`Error::EventNotFound`] if the event does not exist.
  pub async fn get_votes(&self, event_id: u64) -> Result<Vec<VoteRecord>, S::Error> {
    if self.store.get_event(event_id).await?.is_none() {
      return Err(Error::EventNotFound(event_id).into());
    }
    self.store.votes_for(event_id).await
  }

  /// Every event across all timelines, ascending id.
  pub async fn get_all_events(&self) -> Result<Vec<HistoricalEvent>, S::Error> { self.store.list_all().await }

  pub async fn event_count(&self) -> Result<u64, S::Error> { self.store.event_count().await }
}
