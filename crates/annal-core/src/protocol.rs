//! [`Protocol`]: the command and query surface over a [`HistoryStore`].
//!
//! Commands (`submit_event`, `vote`) pass through a single write gate and are
//! applied one at a time, in the order they acquire it. Queries (see
//! [`crate::query`]) never take the gate.
//!
//! Every successful command publishes [`Notification`]s on a broadcast
//! channel while it still holds the gate, so notifications arrive in the
//! order commands were applied. Publishing never blocks or fails a command;
//! a subscriber that falls behind loses the oldest notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, broadcast};

use crate::{
  account::AccountId,
  event::{NewEvent, Timeline},
  store::HistoryStore,
};

/// Default capacity of the notification channel.
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 1024;

/// Something observers of the ledger may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
  EventSubmitted {
    id: u64,
  },
  VoteCast {
    event_id: u64,
    voter:    AccountId,
    support:  bool,
  },
  /// Emitted after [`Notification::VoteCast`], only when the vote moved the
  /// event to another bucket.
  TimelineChanged {
    event_id: u64,
    from:     Timeline,
    to:       Timeline,
  },
}

/// The execution context for one ledger: the store it is constructed with,
/// the write gate and the notification channel.
///
/// Share it as `Arc<Protocol<S>>`; there is no global instance.
pub struct Protocol<S> {
  pub(crate) store: S,
  write_gate:       Mutex<()>,
  notifications:    broadcast::Sender<Notification>,
}

impl<S: HistoryStore> Protocol<S> {
  pub fn new(store: S) -> Self { Self::with_notification_buffer(store, DEFAULT_NOTIFICATION_BUFFER) }

  /// `buffer` is clamped to at least one slot.
  pub fn with_notification_buffer(store: S, buffer: usize) -> Self {
    let (notifications, _) = broadcast::channel(buffer.max(1));
    Self {
      store,
      write_gate: Mutex::new(()),
      notifications,
    }
  }

  /// Read-only access to the underlying store.
  pub fn store(&self) -> &S { &self.store }

  /// Receive every notification published after this call.
  pub fn subscribe(&self) -> broadcast::Receiver<Notification> { self.notifications.subscribe() }

  // ── Commands ──────────────────────────────────────────────────────────────

  /// Submit a new event on behalf of `submitter` and return its id.
  ///
  /// Fails with [`crate::Error::InvalidEventData`]; nothing is created and
  /// no id is consumed in that case.
  pub async fn submit_event(&self, submitter: AccountId, candidate: NewEvent) -> Result<u64, S::Error> {
    let _gate = self.write_gate.lock().await;
    let event = self.store.create_event(submitter, candidate).await?;

    tracing::info!(
      event_id = event.id,
      submitter = %event.submitter,
      tags = ?event.tags,
      "event submitted"
    );
    self.publish(Notification::EventSubmitted { id: event.id });
    Ok(event.id)
  }

  /// Cast `voter`'s single vote on `event_id`.
  ///
  /// Fails with [`crate::Error::EventNotFound`] or
  /// [`crate::Error::AlreadyVoted`] without touching the tally.
  pub async fn vote(&self, voter: AccountId, event_id: u64, support: bool) -> Result<(), S::Error> {
    let _gate = self.write_gate.lock().await;
    let applied = self.store.cast_vote(event_id, voter, support).await?;

    let event = &applied.event;
    tracing::debug!(
      event_id,
      voter = %applied.record.voter,
      support,
      support_votes = event.support_votes,
      challenge_votes = event.challenge_votes,
      score = event.consensus_score,
      "vote cast"
    );
    self.publish(Notification::VoteCast {
      event_id,
      voter: applied.record.voter.clone(),
      support,
    });

    if applied.timeline_changed() {
      tracing::info!(
        event_id,
        from = %applied.previous,
        to = %event.timeline,
        score = event.consensus_score,
        "event changed timeline"
      );
      self.publish(Notification::TimelineChanged {
        event_id,
        from: applied.previous,
        to: event.timeline,
      });
    }
    Ok(())
  }

  fn publish(&self, notification: Notification) {
    // An error only means nobody is subscribed right now.
    let _ = self.notifications.send(notification);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tokio::sync::broadcast::error::TryRecvError;

  use super::*;
  use crate::{Error, memory::MemoryStore};

  fn candidate() -> NewEvent {
    NewEvent {
      title:            "Apollo 11 Moon Landing".into(),
      occurred_on:      1969_07_20,
      description:      "Armstrong and Aldrin land on the Moon.".into(),
      evidence_sources: vec!["https://www.nasa.gov/apollo11".into()],
      tags:             vec!["Space".into(), "Science".into()],
    }
  }

  fn protocol() -> Protocol<MemoryStore> { Protocol::new(MemoryStore::new()) }

  async fn votes(p: &Protocol<MemoryStore>, id: u64, prefix: &str, n: usize, support: bool) {
    for i in 0..n {
      p.vote(AccountId::new(format!("{prefix}-{i}")), id, support)
        .await
        .unwrap();
    }
  }

  #[tokio::test]
  async fn submit_returns_sequential_ids() {
    let p = protocol();
    for expected in 1..=3 {
      let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
      assert_eq!(id, expected);
    }
  }

  #[tokio::test]
  async fn submit_publishes_event_submitted() {
    let p = protocol();
    let mut rx = p.subscribe();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), Notification::EventSubmitted { id });
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
  }

  #[tokio::test]
  async fn invalid_submission_publishes_nothing() {
    let p = protocol();
    let mut rx = p.subscribe();
    let mut bad = candidate();
    bad.tags.clear();
    let err = p.submit_event(AccountId::from("alice"), bad).await.unwrap_err();
    assert!(matches!(err, Error::InvalidEventData(_)));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
  }

  #[tokio::test]
  async fn vote_publishes_timeline_change_only_on_bucket_move() {
    let p = protocol();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    let mut rx = p.subscribe();

    // 0/0 disputed -> 1/0 canonical.
    p.vote(AccountId::from("bob"), id, true).await.unwrap();
    assert_eq!(
      rx.try_recv().unwrap(),
      Notification::VoteCast { event_id: id, voter: AccountId::from("bob"), support: true }
    );
    assert_eq!(
      rx.try_recv().unwrap(),
      Notification::TimelineChanged { event_id: id, from: Timeline::Disputed, to: Timeline::Canonical }
    );

    // 2/0 is still canonical.
    p.vote(AccountId::from("carol"), id, true).await.unwrap();
    assert!(matches!(rx.try_recv().unwrap(), Notification::VoteCast { .. }));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
  }

  #[tokio::test]
  async fn canonical_event_can_fall_back_to_disputed() {
    let p = protocol();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();

    votes(&p, id, "support", 3, true).await;
    votes(&p, id, "early-challenge", 1, false).await;
    let event = p.get_event(id).await.unwrap();
    assert_eq!((event.consensus_score, event.timeline), (75, Timeline::Canonical));

    votes(&p, id, "late-challenge", 4, false).await;
    let event = p.get_event(id).await.unwrap();
    assert_eq!((event.support_votes, event.challenge_votes), (3, 5));
    assert_eq!((event.consensus_score, event.timeline), (37, Timeline::Disputed));
  }

  #[tokio::test]
  async fn one_support_three_challenges_is_alternative() {
    let p = protocol();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    votes(&p, id, "s", 1, true).await;
    votes(&p, id, "c", 3, false).await;
    let event = p.get_event(id).await.unwrap();
    assert_eq!((event.consensus_score, event.timeline), (25, Timeline::Alternative));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn timeline_changes_arrive_in_apply_order() {
    let p = Arc::new(protocol());
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    let mut rx = p.subscribe();

    let handles: Vec<_> = (0..40)
      .map(|i| {
        let p = Arc::clone(&p);
        tokio::spawn(async move { p.vote(AccountId::new(format!("voter-{i}")), id, i % 2 == 0).await })
      })
      .collect();
    for h in handles {
      h.await.unwrap().unwrap();
    }

    let mut current = Timeline::Disputed;
    let mut changes = 0;
    while let Ok(notification) = rx.try_recv() {
      if let Notification::TimelineChanged { from, to, .. } = notification {
        assert_eq!(from, current);
        current = to;
        changes += 1;
      }
    }
    assert!(changes > 0);
    assert_eq!(p.get_event(id).await.unwrap().timeline, current);
  }

  #[tokio::test]
  async fn second_vote_by_same_voter_is_rejected() {
    let p = protocol();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    p.vote(AccountId::from("bob"), id, true).await.unwrap();

    let mut rx = p.subscribe();
    let err = p.vote(AccountId::from("bob"), id, true).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyVoted { .. }));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let event = p.get_event(id).await.unwrap();
    assert_eq!((event.support_votes, event.challenge_votes), (1, 0));
  }

  #[tokio::test]
  async fn vote_on_unknown_event_is_rejected() {
    let p = protocol();
    let err = p.vote(AccountId::from("bob"), 42, false).await.unwrap_err();
    assert!(matches!(err, Error::EventNotFound(42)));
  }

  #[tokio::test]
  async fn submitter_may_vote_on_own_event() {
    let p = protocol();
    let id = p.submit_event(AccountId::from("alice"), candidate()).await.unwrap();
    p.vote(AccountId::from("alice"), id, true).await.unwrap();
    assert!(p.has_voted(id, &AccountId::from("alice")).await.unwrap());
  }
}
