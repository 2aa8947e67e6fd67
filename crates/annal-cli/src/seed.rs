//! `annal seed`: replay a fixture of Space Race era events and vote on each
//! until it lands in the bucket it was written for.
//!
//! Events are submitted as the configured account. Votes come from a pool of
//! distinct `seed-voter-N` identities, so one seeding run casts at most one
//! vote per voter per event.

use std::collections::BTreeMap;

use annal_core::{
  event::{NewEvent, Timeline},
  vote::Tally,
};
use anyhow::{Context, Result};

use crate::client::ApiClient;

/// One fixture entry and the timeline its vote plan targets.
pub struct SeedEvent {
  pub title:       &'static str,
  pub occurred_on: u64,
  pub description: &'static str,
  pub evidence:    &'static [&'static str],
  pub tags:        &'static [&'static str],
  pub target:      Timeline,
}

impl SeedEvent {
  pub fn to_new_event(&self) -> NewEvent {
    NewEvent {
      title:            self.title.to_owned(),
      occurred_on:      self.occurred_on,
      description:      self.description.to_owned(),
      evidence_sources: self.evidence.iter().map(|s| (*s).to_owned()).collect(),
      tags:             self.tags.iter().map(|s| (*s).to_owned()).collect(),
    }
  }
}

/// Votes that put a fresh event into `target`: 4/1 scores 80, 2/2 scores 50,
/// 1/4 scores 20.
pub fn vote_plan(target: Timeline) -> Tally {
  match target {
    Timeline::Canonical => Tally { support: 4, challenge: 1 },
    Timeline::Disputed => Tally { support: 2, challenge: 2 },
    Timeline::Alternative => Tally { support: 1, challenge: 4 },
  }
}

pub fn voter(n: u64) -> String { format!("seed-voter-{n}") }

pub const FIXTURE: &[SeedEvent] = &[
  SeedEvent {
    title:       "Launch of Sputnik 1 - First Artificial Satellite",
    occurred_on: 1957_10_04,
    description: "The Soviet Union launched Sputnik 1, the first artificial satellite, opening the Space Age and the Space Race between the USSR and the USA.",
    evidence:    &[
      "https://history.nasa.gov/sputnik/",
      "https://www.britannica.com/topic/Sputnik",
      "Soviet official press release, October 1957",
    ],
    tags:        &["Space", "Science", "Technology", "Politics"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Yuri Gagarin Becomes First Human in Space",
    occurred_on: 1961_04_12,
    description: "Soviet cosmonaut Yuri Gagarin completed one orbit of Earth aboard Vostok 1.",
    evidence:    &[
      "https://www.roscosmos.ru/en/",
      "Contemporary reports from Pravda and the international press",
    ],
    tags:        &["Space", "Science", "Politics"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Apollo 11 Moon Landing - First Humans on the Moon",
    occurred_on: 1969_07_20,
    description: "Neil Armstrong and Buzz Aldrin landed on the Moon while Michael Collins orbited above. The first steps were broadcast live worldwide.",
    evidence:    &[
      "https://www.nasa.gov/mission_pages/apollo/apollo11.html",
      "Lunar samples returned to Earth and verified by multiple countries",
    ],
    tags:        &["Space", "Science", "Technology"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Alan Shepard - First American in Space",
    occurred_on: 1961_05_05,
    description: "Alan Shepard flew a 15-minute suborbital flight aboard Freedom 7.",
    evidence:    &[
      "NASA mission transcripts and telemetry data",
      "Contemporary newsreel footage",
    ],
    tags:        &["Space", "Science", "Politics"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Valentina Tereshkova - First Woman in Space",
    occurred_on: 1963_06_16,
    description: "Valentina Tereshkova orbited Earth 48 times aboard Vostok 6.",
    evidence:    &[
      "Soviet space program archives",
      "International verification by tracking stations",
    ],
    tags:        &["Space", "Science", "Culture"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Alexei Leonov Performs First Spacewalk",
    occurred_on: 1965_03_18,
    description: "Alexei Leonov left Voskhod 2 and spent 12 minutes outside the spacecraft.",
    evidence:    &[
      "Film footage from the Voskhod 2 mission",
      "Leonov's own account and mission reports",
    ],
    tags:        &["Space", "Science", "Technology"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Apollo 13 Crew Returns Safely After Oxygen Tank Explosion",
    occurred_on: 1970_04_17,
    description: "After an oxygen tank explosion crippled Apollo 13 en route to the Moon, the crew and ground engineers brought the spacecraft home.",
    evidence:    &[
      "https://www.nasa.gov/mission_pages/apollo/missions/apollo13.html",
      "Post-mission investigation reports",
    ],
    tags:        &["Space", "Science", "Technology"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Explorer 6 Captures First Satellite Photo of Earth",
    occurred_on: 1959_08_14,
    description: "Explorer 6 transmitted the first photograph of Earth taken from orbit, showing part of the Pacific Ocean.",
    evidence:    &["NASA JPL archives", "Scientific journals, August 1959"],
    tags:        &["Space", "Science", "Technology"],
    target:      Timeline::Canonical,
  },
  SeedEvent {
    title:       "Debate Over Moon Landing Broadcast Technical Details",
    occurred_on: 1969_07_20,
    description: "Some researchers question the lighting and video quality of the Apollo 11 broadcast given 1969 camera technology.",
    evidence:    &[
      "NASA technical specifications for the Apollo TV camera",
      "Analysis by broadcast engineers (various conclusions)",
    ],
    tags:        &["Space", "Technology", "Science"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Extent and Causes of Soviet Lunar Program Setbacks",
    occurred_on: 1965_01_01,
    description: "Historians debate whether political pressure or technical limits kept the Soviet program from reaching the Moon first.",
    evidence:    &[
      "Declassified Soviet documents (partial)",
      "Memoirs of Soviet engineers (conflicting accounts)",
    ],
    tags:        &["Space", "Politics", "Science"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Disputed Details of Gagarin's Landing Procedure",
    occurred_on: 1961_04_12,
    description: "Soviet officials gave conflicting accounts of whether Gagarin landed inside his capsule or ejected and parachuted down.",
    evidence:    &[
      "Official Soviet reports (contradictory versions)",
      "FAI records",
    ],
    tags:        &["Space", "Science", "Politics"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Alleged Soviet Space Missions Before Gagarin",
    occurred_on: 1960_01_01,
    description: "Claims of failed, covered-up crewed Soviet flights before Vostok 1. The evidence is circumstantial.",
    evidence:    &[
      "Judica-Cordiglia brothers' radio recordings (disputed authenticity)",
      "Analysis by space historians (mostly skeptical)",
    ],
    tags:        &["Space", "Politics", "Science"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Causes and Responsibility for Apollo 1 Fire",
    occurred_on: 1967_01_27,
    description: "Historians debate whether NASA management or contractor oversight was primarily responsible for the fire that killed three astronauts.",
    evidence:    &[
      "NASA accident investigation report",
      "Congressional hearing testimonies",
    ],
    tags:        &["Space", "Politics", "Science"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Primary Motivations Behind the Space Race",
    occurred_on: 1957_10_04,
    description: "Scientific curiosity, military advantage, propaganda and economic rivalry are all argued as the main driver of the Space Race.",
    evidence:    &[
      "Declassified government documents (USA and USSR)",
      "Competing historical analyses",
    ],
    tags:        &["Space", "Politics", "Economics"],
    target:      Timeline::Disputed,
  },
  SeedEvent {
    title:       "Alternative Theory: Moon Landing Filmed in Studio",
    occurred_on: 1969_07_20,
    description: "Conspiracy theory claiming the Apollo 11 landing was staged in a film studio.",
    evidence:    &[
      "Bill Kaysing, 'We Never Went to the Moon' (1976)",
      "Counter-evidence: lunar samples, retroreflectors, independent tracking",
    ],
    tags:        &["Space", "Politics", "Culture"],
    target:      Timeline::Alternative,
  },
  SeedEvent {
    title:       "Alternative Theory: Apollo Missions Discovered Alien Structures",
    occurred_on: 1969_07_20,
    description: "Fringe theory that Apollo astronauts found ancient alien structures on the Moon.",
    evidence:    &[
      "Alleged leaked NASA photos (unverified)",
      "Debunking by planetary scientists",
    ],
    tags:        &["Space", "Science", "Culture"],
    target:      Timeline::Alternative,
  },
  SeedEvent {
    title:       "Alternative Theory: The Moon is an Artificial Hollow Structure",
    occurred_on: 1970_01_01,
    description: "Fringe theory built on misread Apollo seismic data, claiming the Moon is hollow and artificial.",
    evidence:    &[
      "Vasin and Shcherbakov, Sputnik magazine, 1970",
      "Refutations from lunar mass and gravity measurements",
    ],
    tags:        &["Space", "Science"],
    target:      Timeline::Alternative,
  },
];

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedSummary {
  pub submitted:   usize,
  pub votes_cast:  u64,
  pub by_timeline: BTreeMap<&'static str, usize>,
  /// Events that ended somewhere other than their target (titles).
  pub misplaced:   Vec<&'static str>,
}

/// Submit every fixture event, apply its vote plan and record where it ended.
pub async fn run(client: &ApiClient) -> Result<SeedSummary> {
  let mut summary = SeedSummary::default();

  for (n, entry) in FIXTURE.iter().enumerate() {
    let id = client
      .submit_event(&entry.to_new_event())
      .await
      .with_context(|| format!("submitting {:?}", entry.title))?;
    summary.submitted += 1;

    let plan = vote_plan(entry.target);
    let ballots = (0..plan.support)
      .map(|_| true)
      .chain((0..plan.challenge).map(|_| false));
    for (k, support) in (0..).zip(ballots) {
      client
        .vote_as(&voter(k), id, support)
        .await
        .with_context(|| format!("voting on event {id}"))?;
      summary.votes_cast += 1;
    }

    let event = client.get_event(id).await?;
    tracing::info!(
      event_id = id,
      score = event.consensus_score,
      timeline = %event.timeline,
      "seeded {}/{}",
      n + 1,
      FIXTURE.len()
    );
    *summary.by_timeline.entry(event.timeline.as_str()).or_default() += 1;
    if event.timeline != entry.target {
      tracing::warn!(event_id = id, expected = %entry.target, actual = %event.timeline, "seeded event landed elsewhere");
      summary.misplaced.push(entry.title);
    }
  }

  Ok(summary)
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use annal_core::consensus;
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn every_fixture_event_is_valid() {
    for entry in FIXTURE {
      entry
        .to_new_event()
        .validate()
        .unwrap_or_else(|e| panic!("{}: {e}", entry.title));
    }
  }

  #[test]
  fn vote_plans_reach_their_target() {
    for target in Timeline::iter() {
      assert_eq!(consensus::evaluate(vote_plan(target)).timeline, target);
    }
  }

  #[test]
  fn fixture_covers_every_bucket() {
    let count = |t: Timeline| FIXTURE.iter().filter(|e| e.target == t).count();
    assert_eq!(count(Timeline::Canonical), 8);
    assert_eq!(count(Timeline::Disputed), 6);
    assert_eq!(count(Timeline::Alternative), 3);
  }

  #[test]
  fn voter_identities_are_distinct() {
    let max = Timeline::iter()
      .map(|t| vote_plan(t).total())
      .max()
      .unwrap_or(0);
    let voters: HashSet<_> = (0..max).map(voter).collect();
    assert_eq!(voters.len() as u64, max);
  }
}
