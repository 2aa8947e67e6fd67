//! [`SqliteStore`]: the SQLite implementation of [`HistoryStore`].

use std::path::Path;

use annal_core::{
  AccountId,
  event::{HistoricalEvent, NewEvent, Tag, Timeline, ValidEvent},
  store::{AppliedVote, HistoryStore},
  vote::VoteRecord,
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, RawEvent, RawVote, decode_u64, encode_dt, encode_evidence, encode_tags,
    encode_u64,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A history store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Select events matching `filter` (a SQL fragment placed after `FROM
  /// events`), ascending id.
  async fn select_events(
    &self,
    filter: &'static str,
    args: Vec<Value>,
  ) -> Result<Vec<HistoricalEvent>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events {filter} ORDER BY id");

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── Write transactions ──────────────────────────────────────────────────────

/// Assign the next id and insert `valid` with an empty tally.
fn insert_event(
  conn: &mut rusqlite::Connection,
  submitter: AccountId,
  valid: ValidEvent,
) -> Result<HistoricalEvent> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let last_id: i64 = tx.query_row("SELECT COALESCE(MAX(id), 0) FROM events", [], |r| r.get(0))?;
  let event = HistoricalEvent::new(decode_u64(last_id)? + 1, submitter, Utc::now(), valid);
  let id = encode_u64(event.id)?;

  tx.execute(
    "INSERT INTO events (
       id, title, occurred_on, description, evidence_sources, tags,
       submitter, submitted_at, support_votes, challenge_votes,
       consensus_score, timeline
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      id,
      event.title,
      i64::from(event.occurred_on.get()),
      event.description,
      encode_evidence(&event.evidence_sources)?,
      encode_tags(&event.tags)?,
      event.submitter.as_str(),
      encode_dt(event.submitted_at),
      encode_u64(event.support_votes)?,
      encode_u64(event.challenge_votes)?,
      i64::from(event.consensus_score),
      event.timeline.as_str(),
    ],
  )?;

  {
    let mut stmt = tx.prepare("INSERT INTO event_tags (tag, event_id) VALUES (?1, ?2)")?;
    for tag in &event.tags {
      stmt.execute(rusqlite::params![tag.as_str(), id])?;
    }
  }

  tx.commit()?;
  Ok(event)
}

/// Check, record and tally one vote inside a single transaction.
fn apply_vote(
  conn: &mut rusqlite::Connection,
  event_id: u64,
  voter: AccountId,
  support: bool,
) -> Result<AppliedVote> {
  let id = encode_u64(event_id)?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let mut event = tx
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
      rusqlite::params![id],
      RawEvent::from_row,
    )
    .optional()?
    .ok_or(annal_core::Error::EventNotFound(event_id))?
    .into_event()?;

  let already_voted = tx
    .query_row(
      "SELECT 1 FROM votes WHERE event_id = ?1 AND voter = ?2",
      rusqlite::params![id, voter.as_str()],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if already_voted {
    return Err(annal_core::Error::AlreadyVoted { event_id, voter }.into());
  }

  let tally = event.tally().record(event_id, support)?;
  let previous = event.timeline;
  event.update_tally(tally);

  let record = VoteRecord {
    event_id,
    voter,
    support,
    cast_at: Utc::now(),
  };
  tx.execute(
    "INSERT INTO votes (event_id, voter, support, cast_at) VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![id, record.voter.as_str(), support, encode_dt(record.cast_at)],
  )?;
  update_tally(&tx, &event)?;

  tx.commit()?;
  Ok(AppliedVote { record, event, previous })
}

/// Write the counters and derived fields of `event`. No other column is
/// touched.
fn update_tally(tx: &rusqlite::Transaction<'_>, event: &HistoricalEvent) -> Result<()> {
  tx.execute(
    "UPDATE events
     SET support_votes = ?2, challenge_votes = ?3, consensus_score = ?4, timeline = ?5
     WHERE id = ?1",
    rusqlite::params![
      encode_u64(event.id)?,
      encode_u64(event.support_votes)?,
      encode_u64(event.challenge_votes)?,
      i64::from(event.consensus_score),
      event.timeline.as_str(),
    ],
  )?;
  Ok(())
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  type Error = Error;

  // ── Event store ───────────────────────────────────────────────────────────

  async fn create_event(
    &self,
    submitter: AccountId,
    candidate: NewEvent,
  ) -> Result<HistoricalEvent> {
    let valid = candidate.validate()?;

    self
      .conn
      .call(move |conn| Ok(insert_event(conn, submitter, valid)))
      .await?
  }

  async fn get_event(&self, id: u64) -> Result<Option<HistoricalEvent>> {
    let id = encode_u64(id)?;

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
              rusqlite::params![id],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_by_timeline(&self, timeline: Timeline) -> Result<Vec<HistoricalEvent>> {
    self
      .select_events(
        "WHERE timeline = ?1",
        vec![Value::Text(timeline.as_str().to_owned())],
      )
      .await
  }

  async fn list_by_submitter(&self, submitter: &AccountId) -> Result<Vec<HistoricalEvent>> {
    self
      .select_events(
        "WHERE submitter = ?1",
        vec![Value::Text(submitter.as_str().to_owned())],
      )
      .await
  }

  async fn list_by_tag(&self, tag: Tag) -> Result<Vec<HistoricalEvent>> {
    self
      .select_events(
        "WHERE id IN (SELECT event_id FROM event_tags WHERE tag = ?1)",
        vec![Value::Text(tag.as_str().to_owned())],
      )
      .await
  }

  async fn list_all(&self) -> Result<Vec<HistoricalEvent>> { self.select_events("", Vec::new()).await }

  async fn event_count(&self) -> Result<u64> {
    let last_id: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COALESCE(MAX(id), 0) FROM events", [], |r| r.get(0))?))
      .await?;
    decode_u64(last_id)
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    event_id: u64,
    voter: AccountId,
    support: bool,
  ) -> Result<AppliedVote> {
    self
      .conn
      .call(move |conn| Ok(apply_vote(conn, event_id, voter, support)))
      .await?
  }

  async fn get_vote(&self, event_id: u64, voter: &AccountId) -> Result<Option<VoteRecord>> {
    let id = encode_u64(event_id)?;
    let voter = voter.as_str().to_owned();

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT event_id, voter, support, cast_at FROM votes
               WHERE event_id = ?1 AND voter = ?2",
              rusqlite::params![id, voter],
              RawVote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVote::into_record).transpose()
  }

  async fn votes_for(&self, event_id: u64) -> Result<Vec<VoteRecord>> {
    let id = encode_u64(event_id)?;

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, voter, support, cast_at FROM votes
           WHERE event_id = ?1
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_record).collect()
  }
}
