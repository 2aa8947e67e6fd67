//! Async HTTP client wrapping the annal JSON API.

use std::time::Duration;

use annal_core::{
  event::{HistoricalEvent, NewEvent},
  vote::VoteRecord,
};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Header carrying the caller's address; must match the server's.
const ACCOUNT_HEADER: &str = "x-annal-account";

/// Connection settings for the annal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Address that commands are issued as. Queries work without one.
  pub account:  Option<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
  id: u64,
}

#[derive(Debug, Serialize)]
struct VoteBody {
  support: bool,
}

/// Response of `GET /api/events/{id}/votes/{voter}`.
#[derive(Debug, Deserialize)]
pub struct VoteStatus {
  pub has_voted: bool,
  #[serde(default)]
  pub vote:      Option<VoteRecord>,
}

/// Async HTTP client for the annal JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// `{base_url}/api/{segments...}`, each segment percent-encoded so that
  /// addresses and names can never change the route.
  fn url(&self, segments: &[&str]) -> Result<Url> {
    let base = &self.config.base_url;
    let mut url = Url::parse(base).with_context(|| format!("invalid server URL {base:?}"))?;
    url
      .path_segments_mut()
      .map_err(|()| anyhow!("server URL {base:?} cannot carry a path"))?
      .pop_if_empty()
      .push("api")
      .extend(segments);
    Ok(url)
  }

  /// The configured account, required for commands.
  pub fn account(&self) -> Result<&str> {
    self
      .config
      .account
      .as_deref()
      .ok_or_else(|| anyhow!("no account configured; pass --account or set ANNAL_ACCOUNT"))
  }

  /// Turn a non-success response into an error carrying the server's
  /// `{"error": ...}` message when there is one.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_default();
    Err(anyhow!("{what} → {status} {message}"))
  }

  async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
    let what = format!("GET /{}", segments.join("/"));
    let resp = self
      .client
      .get(self.url(segments)?)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    Self::check(resp, &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {what}"))
  }

  // ── Commands ──────────────────────────────────────────────────────────────

  /// `POST /api/events` as the configured account.
  pub async fn submit_event(&self, candidate: &NewEvent) -> Result<u64> {
    let resp = self
      .client
      .post(self.url(&["events"])?)
      .header(ACCOUNT_HEADER, self.account()?)
      .json(candidate)
      .send()
      .await
      .context("POST /events failed")?;
    let created: Created = Self::check(resp, "POST /events")
      .await?
      .json()
      .await
      .context("deserialising created event")?;
    Ok(created.id)
  }

  /// `POST /api/events/{id}/votes` as the configured account.
  pub async fn vote(&self, event_id: u64, support: bool) -> Result<()> {
    self.vote_as(self.account()?, event_id, support).await
  }

  /// `POST /api/events/{id}/votes` as `voter`.
  pub async fn vote_as(&self, voter: &str, event_id: u64, support: bool) -> Result<()> {
    let path = format!("/events/{event_id}/votes");
    let resp = self
      .client
      .post(self.url(&["events", &event_id.to_string(), "votes"])?)
      .header(ACCOUNT_HEADER, voter)
      .json(&VoteBody { support })
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    Self::check(resp, &format!("POST {path}")).await?;
    Ok(())
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  /// `GET /api/events`
  pub async fn list_events(&self) -> Result<Vec<HistoricalEvent>> { self.get_json(&["events"]).await }

  /// `GET /api/events/{id}`
  pub async fn get_event(&self, id: u64) -> Result<HistoricalEvent> {
    self.get_json(&["events", &id.to_string()]).await
  }

  /// `GET /api/events/{id}/votes`
  pub async fn votes(&self, id: u64) -> Result<Vec<VoteRecord>> {
    self.get_json(&["events", &id.to_string(), "votes"]).await
  }

  /// `GET /api/events/{id}/votes/{voter}`
  pub async fn vote_status(&self, id: u64, voter: &str) -> Result<VoteStatus> {
    self.get_json(&["events", &id.to_string(), "votes", voter]).await
  }

  /// `GET /api/timelines/{name}`
  pub async fn timeline(&self, name: &str) -> Result<Vec<HistoricalEvent>> {
    self.get_json(&["timelines", name]).await
  }

  /// `GET /api/users/{address}/events`
  pub async fn user_events(&self, address: &str) -> Result<Vec<HistoricalEvent>> {
    self.get_json(&["users", address, "events"]).await
  }

  /// `GET /api/tags/{name}/events`
  pub async fn tag_events(&self, name: &str) -> Result<Vec<HistoricalEvent>> {
    self.get_json(&["tags", name, "events"]).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str, account: Option<&str>) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base_url.into(),
      account:  account.map(str::to_owned),
    })
    .unwrap()
  }

  #[test]
  fn url_joins_base_and_api_prefix() {
    let c = client("http://localhost:8080/", None);
    assert_eq!(c.url(&["events", "3"]).unwrap().as_str(), "http://localhost:8080/api/events/3");

    let c = client("http://ledger.example/annal", None);
    assert_eq!(c.url(&["events"]).unwrap().as_str(), "http://ledger.example/annal/api/events");
  }

  #[test]
  fn url_encodes_addresses_as_single_segments() {
    let c = client("http://localhost:8080", None);
    assert_eq!(
      c.url(&["users", "a/b?c#d", "events"]).unwrap().as_str(),
      "http://localhost:8080/api/users/a%2Fb%3Fc%23d/events"
    );
    assert_eq!(
      c.url(&["events", "1", "votes", "bob smith"]).unwrap().as_str(),
      "http://localhost:8080/api/events/1/votes/bob%20smith"
    );
  }

  #[test]
  fn unparseable_base_url_is_an_error() {
    assert!(client("not a url", None).url(&["events"]).is_err());
  }

  #[test]
  fn commands_need_an_account() {
    assert!(client("http://localhost:8080", None).account().is_err());
    assert_eq!(client("http://localhost:8080", Some("alice")).account().unwrap(), "alice");
  }
}
