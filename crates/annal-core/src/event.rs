//! Historical events: the claims participants submit and vote on.
//!
//! A submission arrives as a [`NewEvent`] of raw transport values. It becomes a
//! [`ValidEvent`] only through [`NewEvent::validate`], and only a `ValidEvent`
//! can be turned into a stored [`HistoricalEvent`].

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  account::AccountId,
  consensus::{self, Consensus},
  vote::Tally,
};

/// Maximum number of tags on a single event.
pub const MAX_TAGS: usize = 5;

// ─── Timeline ────────────────────────────────────────────────────────────────

/// The classification bucket an event currently sits in.
///
/// Closed set. String forms are canonicalised once, at the boundary, through
/// [`Timeline::parse`]; everything past that point works on the enum.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Timeline {
  Canonical,
  Disputed,
  Alternative,
}

impl Timeline {
  /// Parse a timeline name, ignoring ASCII case (`"canonical"`,
  /// `"Canonical"`, `"CANONICAL"` are all accepted).
  pub fn parse(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownTimeline(name.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The controlled tag vocabulary.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Tag {
  Science,
  Technology,
  Politics,
  Culture,
  Economics,
  Military,
  Space,
  Medicine,
  Environment,
  Social,
}

impl Tag {
  /// Parse a tag name, ignoring ASCII case.
  pub fn parse(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownTag(name.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── OccurredOn ──────────────────────────────────────────────────────────────

/// The calendar date an event claims to have happened, encoded `YYYYMMDD`
/// (e.g. `19690720`). Distinct from the submission timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurredOn(u32);

impl OccurredOn {
  pub const MIN: u32 = 1000_01_01;
  pub const MAX: u32 = 9999_12_31;

  /// Accepts any value within `MIN..=MAX`. The core checks the bound only;
  /// calendar validity of the month/day digits is left to the presentation
  /// layer.
  pub fn new(yyyymmdd: u64) -> Result<Self> {
    u32::try_from(yyyymmdd)
      .ok()
      .filter(|v| (Self::MIN..=Self::MAX).contains(v))
      .map(Self)
      .ok_or_else(|| {
        Error::invalid(format!(
          "occurred_on {yyyymmdd} is outside {}..={}",
          Self::MIN,
          Self::MAX
        ))
      })
  }

  /// Encode a calendar date. Years outside `1000..=9999` are rejected.
  pub fn from_date(date: NaiveDate) -> Result<Self> {
    let year = u64::try_from(date.year())
      .map_err(|_| Error::invalid(format!("year {} is negative", date.year())))?;
    Self::new(year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day()))
  }

  pub fn get(self) -> u32 { self.0 }

  /// Decode into a calendar date, if the digits form one.
  pub fn to_date(self) -> Option<NaiveDate> {
    let year = (self.0 / 10_000) as i32;
    let month = (self.0 / 100) % 100;
    let day = self.0 % 100;
    NaiveDate::from_ymd_opt(year, month, day)
  }
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// A submission as it arrives from a caller, before any validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:            String,
  /// `YYYYMMDD`.
  pub occurred_on:      u64,
  pub description:      String,
  pub evidence_sources: Vec<String>,
  /// Tag names; matched against [`Tag`] ignoring ASCII case.
  pub tags:             Vec<String>,
}

impl NewEvent {
  /// Check every structural constraint on a submission.
  ///
  /// Fails with [`Error::InvalidEventData`] on an empty title or
  /// description, no evidence, zero or more than [`MAX_TAGS`] tags, a tag
  /// outside the vocabulary, a repeated tag, or an out-of-range date.
  pub fn validate(self) -> Result<ValidEvent> {
    if self.title.is_empty() {
      return Err(Error::invalid("title is empty"));
    }
    if self.description.is_empty() {
      return Err(Error::invalid("description is empty"));
    }
    if self.evidence_sources.is_empty() {
      return Err(Error::invalid("at least one evidence source is required"));
    }
    if self.tags.is_empty() {
      return Err(Error::invalid("at least one tag is required"));
    }
    if self.tags.len() > MAX_TAGS {
      return Err(Error::invalid(format!(
        "{} tags given, at most {MAX_TAGS} allowed",
        self.tags.len()
      )));
    }

    let mut tags: Vec<Tag> = Vec::with_capacity(self.tags.len());
    for name in &self.tags {
      let tag = Tag::parse(name)
        .map_err(|_| Error::invalid(format!("unknown tag {name:?}")))?;
      if tags.contains(&tag) {
        return Err(Error::invalid(format!("duplicate tag {tag}")));
      }
      tags.push(tag);
    }

    let occurred_on = OccurredOn::new(self.occurred_on)?;

    Ok(ValidEvent {
      title: self.title,
      occurred_on,
      description: self.description,
      evidence_sources: self.evidence_sources,
      tags,
    })
  }
}

/// A submission that passed [`NewEvent::validate`]. Fields are private so the
/// only way to obtain one is through validation.
#[derive(Debug, Clone)]
pub struct ValidEvent {
  title:            String,
  occurred_on:      OccurredOn,
  description:      String,
  evidence_sources: Vec<String>,
  tags:             Vec<Tag>,
}

impl ValidEvent {
  pub fn tags(&self) -> &[Tag] { &self.tags }
}

// ─── HistoricalEvent ─────────────────────────────────────────────────────────

/// A stored claim. Everything except the tally and the two fields derived
/// from it is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
  pub id:               u64,
  pub title:            String,
  pub occurred_on:      OccurredOn,
  pub description:      String,
  pub evidence_sources: Vec<String>,
  pub tags:             Vec<Tag>,
  pub submitter:        AccountId,
  /// Store-assigned; never changes after creation.
  pub submitted_at:     DateTime<Utc>,
  pub support_votes:    u64,
  pub challenge_votes:  u64,
  /// Derived from the tally; see [`consensus::evaluate`].
  pub consensus_score:  u8,
  /// Derived from the tally; see [`consensus::evaluate`].
  pub timeline:         Timeline,
}

impl HistoricalEvent {
  /// A freshly created event: no votes, score 0, [`Timeline::Disputed`].
  pub fn new(
    id: u64,
    submitter: AccountId,
    submitted_at: DateTime<Utc>,
    event: ValidEvent,
  ) -> Self {
    let Consensus { score, timeline } = consensus::evaluate(Tally::default());
    Self {
      id,
      title: event.title,
      occurred_on: event.occurred_on,
      description: event.description,
      evidence_sources: event.evidence_sources,
      tags: event.tags,
      submitter,
      submitted_at,
      support_votes: 0,
      challenge_votes: 0,
      consensus_score: score,
      timeline,
    }
  }

  pub fn tally(&self) -> Tally {
    Tally {
      support:   self.support_votes,
      challenge: self.challenge_votes,
    }
  }

  /// Replace the counters and recompute the derived score and timeline.
  /// Nothing else on the event is touched.
  pub fn update_tally(&mut self, tally: Tally) {
    let Consensus { score, timeline } = consensus::evaluate(tally);
    self.support_votes = tally.support;
    self.challenge_votes = tally.challenge;
    self.consensus_score = score;
    self.timeline = timeline;
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn moon_landing() -> NewEvent {
    NewEvent {
      title:            "Apollo 11 Moon Landing".into(),
      occurred_on:      1969_07_20,
      description:      "First crewed landing on the Moon.".into(),
      evidence_sources: vec!["https://www.nasa.gov/apollo11".into()],
      tags:             vec!["Space".into(), "science".into()],
    }
  }

  fn reason(err: Error) -> String {
    match err {
      Error::InvalidEventData(r) => r,
      other => panic!("expected InvalidEventData, got {other:?}"),
    }
  }

  #[test]
  fn timeline_parse_ignores_case() {
    assert_eq!(Timeline::parse("canonical").unwrap(), Timeline::Canonical);
    assert_eq!(Timeline::parse("Disputed").unwrap(), Timeline::Disputed);
    assert_eq!(Timeline::parse(" ALTERNATIVE ").unwrap(), Timeline::Alternative);
    assert!(matches!(
      Timeline::parse("fringe"),
      Err(Error::UnknownTimeline(name)) if name == "fringe"
    ));
  }

  #[test]
  fn timeline_serialises_capitalised() {
    let json = serde_json::to_string(&Timeline::Canonical).unwrap();
    assert_eq!(json, "\"Canonical\"");
    assert_eq!(Timeline::Alternative.as_str(), "Alternative");
  }

  #[test]
  fn every_tag_round_trips_through_its_name() {
    for tag in Tag::iter() {
      assert_eq!(Tag::parse(tag.as_str()).unwrap(), tag);
    }
    assert_eq!(Tag::iter().count(), 10);
    assert!(matches!(Tag::parse("Astrology"), Err(Error::UnknownTag(_))));
  }

  #[test]
  fn valid_submission_canonicalises_tags() {
    let valid = moon_landing().validate().unwrap();
    assert_eq!(valid.tags(), &[Tag::Space, Tag::Science]);
  }

  #[test]
  fn empty_title_and_description_are_rejected() {
    let mut e = moon_landing();
    e.title.clear();
    assert!(reason(e.validate().unwrap_err()).contains("title"));

    let mut e = moon_landing();
    e.description.clear();
    assert!(reason(e.validate().unwrap_err()).contains("description"));
  }

  #[test]
  fn evidence_is_required() {
    let mut e = moon_landing();
    e.evidence_sources.clear();
    assert!(reason(e.validate().unwrap_err()).contains("evidence"));
  }

  #[test]
  fn tag_count_is_bounded() {
    let mut e = moon_landing();
    e.tags.clear();
    assert!(e.validate().is_err());

    let mut e = moon_landing();
    e.tags = ["Science", "Technology", "Politics", "Culture", "Economics", "Space"]
      .map(String::from)
      .to_vec();
    assert!(reason(e.validate().unwrap_err()).contains("at most 5"));

    let mut e = moon_landing();
    e.tags = ["Science", "Technology", "Politics", "Culture", "Economics"]
      .map(String::from)
      .to_vec();
    assert_eq!(e.validate().unwrap().tags().len(), 5);
  }

  #[test]
  fn unknown_and_duplicate_tags_are_rejected() {
    let mut e = moon_landing();
    e.tags = vec!["Tag1".into()];
    assert!(reason(e.validate().unwrap_err()).contains("unknown tag"));

    let mut e = moon_landing();
    e.tags = vec!["Space".into(), "space".into()];
    assert!(reason(e.validate().unwrap_err()).contains("duplicate"));
  }

  #[test]
  fn occurred_on_bounds_are_inclusive() {
    assert!(OccurredOn::new(1000_01_01).is_ok());
    assert!(OccurredOn::new(9999_12_31).is_ok());
    assert!(OccurredOn::new(1000_01_00).is_err());
    assert!(OccurredOn::new(10000_01_01).is_err());
    assert!(OccurredOn::new(u64::MAX).is_err());

    let mut e = moon_landing();
    e.occurred_on = 1000;
    assert!(reason(e.validate().unwrap_err()).contains("occurred_on"));
  }

  #[test]
  fn occurred_on_converts_to_and_from_dates() {
    let date = NaiveDate::from_ymd_opt(1957, 10, 4).unwrap();
    let on = OccurredOn::from_date(date).unwrap();
    assert_eq!(on.get(), 1957_10_04);
    assert_eq!(on.to_date(), Some(date));
    // In range but not a calendar date.
    assert_eq!(OccurredOn::new(1969_02_30).unwrap().to_date(), None);
  }

  #[test]
  fn new_event_starts_disputed_with_no_votes() {
    let event = HistoricalEvent::new(
      1,
      AccountId::from("alice"),
      Utc::now(),
      moon_landing().validate().unwrap(),
    );
    assert_eq!(event.timeline, Timeline::Disputed);
    assert_eq!(event.consensus_score, 0);
    assert_eq!(event.tally(), Tally::default());
  }

  #[test]
  fn update_tally_only_touches_derived_fields() {
    let mut event = HistoricalEvent::new(
      7,
      AccountId::from("alice"),
      Utc::now(),
      moon_landing().validate().unwrap(),
    );
    let before = event.clone();

    event.update_tally(Tally { support: 3, challenge: 1 });

    assert_eq!(event.support_votes, 3);
    assert_eq!(event.challenge_votes, 1);
    assert_eq!(event.consensus_score, 75);
    assert_eq!(event.timeline, Timeline::Canonical);
    assert_eq!(event.title, before.title);
    assert_eq!(event.submitter, before.submitter);
    assert_eq!(event.submitted_at, before.submitted_at);
    assert_eq!(event.tags, before.tags);
    assert_eq!(event.occurred_on, before.occurred_on);
  }
}
