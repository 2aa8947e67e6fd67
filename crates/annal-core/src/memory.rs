//! [`MemoryStore`], an in-process [`HistoryStore`] backed by ordered maps.
//!
//! State lives behind one `RwLock`. A write holds the lock for its whole
//! check-and-apply step, so readers see either all of a command or none of it.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  sync::Arc,
};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
  Error, Result,
  account::AccountId,
  event::{HistoricalEvent, NewEvent, Tag, Timeline},
  store::{AppliedVote, HistoryStore},
  vote::VoteRecord,
};

// ─── Event table ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct EventTable {
  rows:         BTreeMap<u64, HistoricalEvent>,
  last_id:      u64,
  by_submitter: HashMap<AccountId, Vec<u64>>,
  by_tag:       HashMap<Tag, Vec<u64>>,
  by_timeline:  HashMap<Timeline, BTreeSet<u64>>,
}

impl EventTable {
  fn insert(&mut self, event: HistoricalEvent) {
    let id = event.id;
    self.last_id = id;
    self.by_submitter.entry(event.submitter.clone()).or_default().push(id);
    for tag in &event.tags {
      self.by_tag.entry(*tag).or_default().push(id);
    }
    self.by_timeline.entry(event.timeline).or_default().insert(id);
    self.rows.insert(id, event);
  }

  /// Move `id` between timeline indices after its tally changed.
  fn reindex(&mut self, id: u64, from: Timeline, to: Timeline) {
    if from == to {
      return;
    }
    if let Some(ids) = self.by_timeline.get_mut(&from) {
      ids.remove(&id);
    }
    self.by_timeline.entry(to).or_default().insert(id);
  }

  fn collect<'a>(&self, ids: impl IntoIterator<Item = &'a u64>) -> Vec<HistoricalEvent> {
    ids
      .into_iter()
      .filter_map(|id| self.rows.get(id))
      .cloned()
      .collect()
  }
}

// ─── Vote table ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct VoteTable {
  records:  HashMap<(u64, AccountId), VoteRecord>,
  /// Voters per event, in cast order.
  by_event: HashMap<u64, Vec<AccountId>>,
}

#[derive(Debug, Default)]
struct State {
  events: EventTable,
  votes:  VoteTable,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A non-durable history store. Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<RwLock<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl HistoryStore for MemoryStore {
  type Error = Error;

  // ── Event store ───────────────────────────────────────────────────────────

  async fn create_event(
    &self,
    submitter: AccountId,
    candidate: NewEvent,
  ) -> Result<HistoricalEvent> {
    let valid = candidate.validate()?;

    let mut state = self.state.write().await;
    let id = state.events.last_id + 1;
    let event = HistoricalEvent::new(id, submitter, Utc::now(), valid);
    state.events.insert(event.clone());
    Ok(event)
  }

  async fn get_event(&self, id: u64) -> Result<Option<HistoricalEvent>> {
    Ok(self.state.read().await.events.rows.get(&id).cloned())
  }

  async fn list_by_timeline(&self, timeline: Timeline) -> Result<Vec<HistoricalEvent>> {
    let state = self.state.read().await;
    let events = &state.events;
    Ok(
      events
        .by_timeline
        .get(&timeline)
        .map(|ids| events.collect(ids))
        .unwrap_or_default(),
    )
  }

  async fn list_by_submitter(&self, submitter: &AccountId) -> Result<Vec<HistoricalEvent>> {
    let state = self.state.read().await;
    let events = &state.events;
    Ok(
      events
        .by_submitter
        .get(submitter)
        .map(|ids| events.collect(ids))
        .unwrap_or_default(),
    )
  }

  async fn list_by_tag(&self, tag: Tag) -> Result<Vec<HistoricalEvent>> {
    let state = self.state.read().await;
    let events = &state.events;
    Ok(
      events
        .by_tag
        .get(&tag)
        .map(|ids| events.collect(ids))
        .unwrap_or_default(),
    )
  }

  async fn list_all(&self) -> Result<Vec<HistoricalEvent>> {
    Ok(self.state.read().await.events.rows.values().cloned().collect())
  }

  async fn event_count(&self) -> Result<u64> { Ok(self.state.read().await.events.last_id) }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    event_id: u64,
    voter: AccountId,
    support: bool,
  ) -> Result<AppliedVote> {
    let mut guard = self.state.write().await;
    let State { events, votes } = &mut *guard;

    let event = events
      .rows
      .get_mut(&event_id)
      .ok_or(Error::EventNotFound(event_id))?;

    let key = (event_id, voter);
    if votes.records.contains_key(&key) {
      return Err(Error::AlreadyVoted { event_id, voter: key.1 });
    }

    // Compute before writing anything so an overflow leaves no record behind.
    let tally = event.tally().record(event_id, support)?;
    let previous = event.timeline;
    event.update_tally(tally);
    let event = event.clone();

    let record = VoteRecord {
      event_id,
      voter: key.1.clone(),
      support,
      cast_at: Utc::now(),
    };
    votes.by_event.entry(event_id).or_default().push(key.1.clone());
    votes.records.insert(key, record.clone());
    events.reindex(event_id, previous, event.timeline);

    Ok(AppliedVote { record, event, previous })
  }

  async fn get_vote(&self, event_id: u64, voter: &AccountId) -> Result<Option<VoteRecord>> {
    let state = self.state.read().await;
    Ok(state.votes.records.get(&(event_id, voter.clone())).cloned())
  }

  async fn votes_for(&self, event_id: u64) -> Result<Vec<VoteRecord>> {
    let state = self.state.read().await;
    let votes = &state.votes;
    Ok(
      votes
        .by_event
        .get(&event_id)
        .into_iter()
        .flatten()
        .filter_map(|voter| votes.records.get(&(event_id, voter.clone())))
        .cloned()
        .collect(),
    )
  }
}
