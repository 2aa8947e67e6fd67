//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Evidence and tag lists are compact JSON.
//! Timelines and tags use their capitalised names. Counters and ids are
//! `INTEGER` (i64) and checked on the way in and out.

use annal_core::{
  AccountId,
  event::{HistoricalEvent, OccurredOn, Tag, Timeline},
  vote::VoteRecord,
};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn encode_u64(v: u64) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::Decode(format!("{v} does not fit an sqlite integer")))
}

pub fn decode_u64(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Decode(format!("negative counter or id: {v}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Timeline / Tag ──────────────────────────────────────────────────────────

pub fn decode_timeline(s: &str) -> Result<Timeline> {
  Timeline::parse(s).map_err(|_| Error::Decode(format!("unknown timeline: {s:?}")))
}

pub fn encode_tags(tags: &[Tag]) -> Result<String> { Ok(serde_json::to_string(tags)?) }

pub fn decode_tags(s: &str) -> Result<Vec<Tag>> { Ok(serde_json::from_str(s)?) }

// ─── Evidence ────────────────────────────────────────────────────────────────

pub fn encode_evidence(sources: &[String]) -> Result<String> { Ok(serde_json::to_string(sources)?) }

pub fn decode_evidence(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawEvent`].
pub const EVENT_COLUMNS: &str = "id, title, occurred_on, description, evidence_sources, tags,
   submitter, submitted_at, support_votes, challenge_votes, consensus_score, timeline";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub id:               i64,
  pub title:            String,
  pub occurred_on:      i64,
  pub description:      String,
  pub evidence_sources: String,
  pub tags:             String,
  pub submitter:        String,
  pub submitted_at:     String,
  pub support_votes:    i64,
  pub challenge_votes:  i64,
  pub consensus_score:  i64,
  pub timeline:         String,
}

impl RawEvent {
  /// Map a row selected with [`EVENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawEvent {
      id:               row.get(0)?,
      title:            row.get(1)?,
      occurred_on:      row.get(2)?,
      description:      row.get(3)?,
      evidence_sources: row.get(4)?,
      tags:             row.get(5)?,
      submitter:        row.get(6)?,
      submitted_at:     row.get(7)?,
      support_votes:    row.get(8)?,
      challenge_votes:  row.get(9)?,
      consensus_score:  row.get(10)?,
      timeline:         row.get(11)?,
    })
  }

  pub fn into_event(self) -> Result<HistoricalEvent> {
    let occurred_on = OccurredOn::new(decode_u64(self.occurred_on)?)
      .map_err(|e| Error::Decode(e.to_string()))?;
    let consensus_score = u8::try_from(self.consensus_score)
      .ok()
      .filter(|s| *s <= 100)
      .ok_or_else(|| Error::Decode(format!("consensus score out of range: {}", self.consensus_score)))?;

    Ok(HistoricalEvent {
      id: decode_u64(self.id)?,
      title: self.title,
      occurred_on,
      description: self.description,
      evidence_sources: decode_evidence(&self.evidence_sources)?,
      tags: decode_tags(&self.tags)?,
      submitter: AccountId::new(self.submitter),
      submitted_at: decode_dt(&self.submitted_at)?,
      support_votes: decode_u64(self.support_votes)?,
      challenge_votes: decode_u64(self.challenge_votes)?,
      consensus_score,
      timeline: decode_timeline(&self.timeline)?,
    })
  }
}

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub event_id: i64,
  pub voter:    String,
  pub support:  bool,
  pub cast_at:  String,
}

impl RawVote {
  /// Map a row selected as `event_id, voter, support, cast_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawVote {
      event_id: row.get(0)?,
      voter:    row.get(1)?,
      support:  row.get(2)?,
      cast_at:  row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<VoteRecord> {
    Ok(VoteRecord {
      event_id: decode_u64(self.event_id)?,
      voter:    AccountId::new(self.voter),
      support:  self.support,
      cast_at:  decode_dt(&self.cast_at)?,
    })
  }
}
