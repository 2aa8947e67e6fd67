//! `annal`, the command-line client for the annal history ledger.
//!
//! # Usage
//!
//! ```
//! annal --account alice submit --title "Apollo 11" --date 1969-07-20 \
//!   --description "First crewed Moon landing" --evidence https://nasa.gov --tag Space
//! annal --account bob vote 1 support
//! annal timeline canonical
//! annal --config ~/.config/annal/config.toml seed
//! ```

mod client;
mod seed;

use std::path::PathBuf;

use annal_core::event::{HistoricalEvent, NewEvent, OccurredOn};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "annal", about = "Client for the annal history ledger")]
struct Args {
  /// Path to a TOML config file (url, account).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the annal server (default: http://localhost:8080).
  #[arg(long, env = "ANNAL_URL", global = true)]
  url: Option<String>,

  /// Account address that commands are issued as.
  #[arg(long, env = "ANNAL_ACCOUNT", global = true)]
  account: Option<String>,

  /// Print raw JSON instead of a summary.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Submit a new historical event.
  Submit {
    #[arg(long)]
    title:       String,
    /// `YYYY-MM-DD` or `YYYYMMDD`.
    #[arg(long)]
    date:        String,
    #[arg(long)]
    description: String,
    /// Repeat for each source.
    #[arg(long = "evidence", required = true)]
    evidence:    Vec<String>,
    /// Repeat for each tag (1 to 5).
    #[arg(long = "tag", required = true)]
    tags:        Vec<String>,
  },
  /// Cast your single vote on an event.
  Vote { id: u64, stance: Stance },
  /// Show one event and its votes.
  Show { id: u64 },
  /// List every event.
  List {
    /// Order by the date the event occurred instead of by id.
    #[arg(long)]
    chronological: bool,
  },
  /// List the events in a timeline (canonical, disputed, alternative).
  Timeline { name: String },
  /// List the events submitted by an account (default: your own).
  User { address: Option<String> },
  /// List the events carrying a tag.
  Tag { name: String },
  /// Check whether an account (default: your own) has voted on an event.
  HasVoted { id: u64, voter: Option<String> },
  /// Populate the ledger with the built-in Space Race fixture.
  Seed,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Stance {
  Support,
  Challenge,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  #[serde(default)]
  account: String,
}

impl ConfigFile {
  fn load(path: Option<&PathBuf>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

/// Flags and environment override the config file, which overrides defaults.
fn api_config(url: Option<String>, account: Option<String>, file: ConfigFile) -> ApiConfig {
  ApiConfig {
    base_url: url
      .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    account:  account.or_else(|| (!file.account.is_empty()).then_some(file.account)),
  }
}

/// Accept `YYYY-MM-DD` (checked as a calendar date) or raw `YYYYMMDD`.
fn parse_date(input: &str) -> Result<u64> {
  let input = input.trim();
  if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
    return Ok(u64::from(OccurredOn::from_date(date)?.get()));
  }
  match input.parse::<u64>() {
    Ok(v) if input.len() == 8 => Ok(v),
    _ => bail!("invalid date {input:?}; expected YYYY-MM-DD or YYYYMMDD"),
  }
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn format_date(on: OccurredOn) -> String {
  on.to_date()
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| on.get().to_string())
}

fn print_event_line(e: &HistoricalEvent) {
  println!(
    "#{:<4} {:<11} {:>3}%  {}  {}",
    e.id,
    e.timeline,
    e.consensus_score,
    format_date(e.occurred_on),
    e.title
  );
}

fn print_events(events: &[HistoricalEvent], json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(events)?);
  } else if events.is_empty() {
    println!("(no events)");
  } else {
    events.iter().for_each(print_event_line);
  }
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = ConfigFile::load(args.config.as_ref())?;
  let client = ApiClient::new(api_config(args.url, args.account, file_cfg))?;
  let json = args.json;

  match args.command {
    Command::Submit {
      title,
      date,
      description,
      evidence,
      tags,
    } => {
      let candidate = NewEvent {
        title,
        occurred_on: parse_date(&date)?,
        description,
        evidence_sources: evidence,
        tags,
      };
      let id = client.submit_event(&candidate).await?;
      println!("submitted event #{id}");
    }
    Command::Vote { id, stance } => {
      client.vote(id, matches!(stance, Stance::Support)).await?;
      let event = client.get_event(id).await?;
      println!(
        "voted; #{id} is now {} at {}% ({} support / {} challenge)",
        event.timeline, event.consensus_score, event.support_votes, event.challenge_votes
      );
    }
    Command::Show { id } => {
      let event = client.get_event(id).await?;
      let votes = client.votes(id).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
      } else {
        println!("#{} {}", event.id, event.title);
        println!("  occurred:   {}", format_date(event.occurred_on));
        println!("  timeline:   {} ({}%)", event.timeline, event.consensus_score);
        println!("  votes:      {} support / {} challenge", event.support_votes, event.challenge_votes);
        let tags: Vec<_> = event.tags.iter().map(|t| t.as_str()).collect();
        println!("  tags:       {}", tags.join(", "));
        println!("  submitter:  {} at {}", event.submitter, event.submitted_at.to_rfc3339());
        println!("  {}", event.description);
        println!("  evidence:");
        for source in &event.evidence_sources {
          println!("    - {source}");
        }
        println!("  voters:");
        for v in &votes {
          println!(
            "    - {} {}",
            v.voter,
            if v.support { "supports" } else { "challenges" }
          );
        }
      }
    }
    Command::List { chronological } => {
      let mut events = client.list_events().await?;
      if chronological {
        events.sort_by_key(|e| (e.occurred_on, e.id));
      }
      print_events(&events, json)?;
    }
    Command::Timeline { name } => print_events(&client.timeline(&name).await?, json)?,
    Command::User { address } => {
      let address = match address {
        Some(a) => a,
        None => client.account()?.to_owned(),
      };
      print_events(&client.user_events(&address).await?, json)?;
    }
    Command::Tag { name } => print_events(&client.tag_events(&name).await?, json)?,
    Command::HasVoted { id, voter } => {
      let voter = match voter {
        Some(v) => v,
        None => client.account()?.to_owned(),
      };
      let status = client.vote_status(id, &voter).await?;
      match status.vote {
        Some(v) => println!(
          "{voter} {} event #{id} at {}",
          if v.support { "supports" } else { "challenges" },
          v.cast_at.to_rfc3339()
        ),
        None if !status.has_voted => println!("{voter} has not voted on event #{id}"),
        None => println!("{voter} has voted on event #{id}"),
      }
    }
    Command::Seed => {
      let summary = seed::run(&client).await?;
      println!(
        "seeded {} events with {} votes",
        summary.submitted, summary.votes_cast
      );
      for (timeline, count) in &summary.by_timeline {
        println!("  {timeline:<11} {count}");
      }
      if !summary.misplaced.is_empty() {
        bail!(
          "{} seeded events did not reach their target timeline (was the ledger already seeded?): {}",
          summary.misplaced.len(),
          summary.misplaced.join("; ")
        );
      }
    }
  }

  Ok(())
}
