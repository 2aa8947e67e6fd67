//! JSON REST API for annal.
//!
//! Exposes an axum [`Router`] over a shared [`Protocol`] backed by any
//! [`HistoryStore`]. Identity, TLS, and transport concerns are the caller's
//! responsibility; the authenticated address arrives in the
//! [`caller::ACCOUNT_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", annal_api::api_router(protocol.clone()))
//! ```

pub mod caller;
pub mod error;
pub mod events;
pub mod notifications;
pub mod queries;

use std::sync::Arc;

use annal_core::{Protocol, store::HistoryStore};
use axum::{Router, routing::get};

pub use caller::{ACCOUNT_HEADER, Caller};
pub use error::ApiError;

/// Build a fully-materialised API router for `protocol`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(protocol: Arc<Protocol<S>>) -> Router<()>
where
  S: HistoryStore + 'static,
{
  Router::new()
    // Events and votes
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}", get(events::get_one::<S>))
    .route("/events/{id}/votes", get(events::votes::<S>).post(events::vote::<S>))
    .route("/events/{id}/votes/{voter}", get(events::vote_status::<S>))
    // Projections
    .route("/timelines/{timeline}", get(queries::by_timeline::<S>))
    .route("/users/{address}/events", get(queries::by_user::<S>))
    .route("/tags/{tag}/events", get(queries::by_tag::<S>))
    // Feed
    .route("/notifications", get(notifications::stream::<S>))
    .with_state(protocol)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use annal_core::{
    event::{HistoricalEvent, Timeline},
    memory::MemoryStore,
  };
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tokio_stream::StreamExt as _;
  use tower::ServiceExt as _;

  use super::*;

  fn protocol() -> Arc<Protocol<MemoryStore>> { Arc::new(Protocol::new(MemoryStore::new())) }

  async fn oneshot_raw(
    protocol: Arc<Protocol<MemoryStore>>,
    method:   &str,
    uri:      &str,
    caller:   Option<&str>,
    body:     Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(address) = caller {
      builder = builder.header(ACCOUNT_HEADER, address);
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    api_router(protocol).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn apollo() -> Value {
    json!({
      "title": "Apollo 11 Moon Landing",
      "occurred_on": 19690720,
      "description": "Armstrong and Aldrin land on the Moon.",
      "evidence_sources": ["https://www.nasa.gov/apollo11"],
      "tags": ["space", "Science"],
    })
  }

  async fn submit(p: &Arc<Protocol<MemoryStore>>) -> u64 {
    let resp = oneshot_raw(p.clone(), "POST", "/events", Some("alice"), Some(apollo())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["id"].as_u64().unwrap()
  }

  async fn vote(p: &Arc<Protocol<MemoryStore>>, id: u64, voter: &str, support: bool) -> StatusCode {
    oneshot_raw(
      p.clone(),
      "POST",
      &format!("/events/{id}/votes"),
      Some(voter),
      Some(json!({ "support": support })),
    )
    .await
    .status()
  }

  // ── Submit ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_returns_201_with_id() {
    let p = protocol();
    assert_eq!(submit(&p).await, 1);
    assert_eq!(submit(&p).await, 2);

    let resp = oneshot_raw(p, "GET", "/events/2", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let event: HistoricalEvent = serde_json::from_value(json_body(resp).await).unwrap();
    assert_eq!(event.submitter.as_str(), "alice");
    assert_eq!(event.timeline, Timeline::Disputed);
  }

  #[tokio::test]
  async fn submit_without_caller_is_400() {
    let resp = oneshot_raw(protocol(), "POST", "/events", None, Some(apollo())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains(ACCOUNT_HEADER));
  }

  #[tokio::test]
  async fn invalid_submission_is_400() {
    let mut candidate = apollo();
    candidate["tags"] = json!(["Space", "Folklore"]);
    let resp = oneshot_raw(protocol(), "POST", "/events", Some("alice"), Some(candidate)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn missing_event_is_404() {
    let resp = oneshot_raw(protocol(), "GET", "/events/9", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Votes ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn vote_flow_and_duplicate_conflict() {
    let p = protocol();
    let id = submit(&p).await;

    assert_eq!(vote(&p, id, "bob", true).await, StatusCode::NO_CONTENT);
    assert_eq!(vote(&p, id, "bob", false).await, StatusCode::CONFLICT);
    assert_eq!(vote(&p, 42, "bob", true).await, StatusCode::NOT_FOUND);

    let status = json_body(oneshot_raw(p.clone(), "GET", "/events/1/votes/bob", None, None).await).await;
    assert_eq!(status["has_voted"], true);
    assert_eq!(status["vote"]["support"], true);

    let status = json_body(oneshot_raw(p.clone(), "GET", "/events/1/votes/carol", None, None).await).await;
    assert_eq!(status, json!({ "has_voted": false }));

    let trail = json_body(oneshot_raw(p, "GET", "/events/1/votes", None, None).await).await;
    assert_eq!(trail.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn timeline_listing_follows_votes() {
    let p = protocol();
    let id = submit(&p).await;
    for voter in ["a", "b", "c"] {
      vote(&p, id, voter, true).await;
    }
    vote(&p, id, "d", false).await;

    let canonical = json_body(oneshot_raw(p.clone(), "GET", "/timelines/canonical", None, None).await).await;
    assert_eq!(canonical[0]["id"], id);
    assert_eq!(canonical[0]["consensus_score"], 75);

    let disputed = json_body(oneshot_raw(p.clone(), "GET", "/timelines/Disputed", None, None).await).await;
    assert_eq!(disputed, json!([]));

    let resp = oneshot_raw(p, "GET", "/timelines/mainstream", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Projections ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn user_and_tag_projections() {
    let p = protocol();
    submit(&p).await;

    let mine = json_body(oneshot_raw(p.clone(), "GET", "/users/alice/events", None, None).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let theirs = json_body(oneshot_raw(p.clone(), "GET", "/users/bob/events", None, None).await).await;
    assert_eq!(theirs, json!([]));

    let space = json_body(oneshot_raw(p.clone(), "GET", "/tags/SPACE/events", None, None).await).await;
    assert_eq!(space.as_array().unwrap().len(), 1);
    let resp = oneshot_raw(p, "GET", "/tags/Folklore/events", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Notifications ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn notifications_stream_submissions() {
    let p = protocol();
    let resp = oneshot_raw(p.clone(), "GET", "/notifications", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "text/event-stream"
    );

    submit(&p).await;

    let mut body = resp.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
      .await
      .expect("notification within timeout")
      .expect("stream open")
      .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.contains("event: event_submitted"), "frame: {text}");
    assert!(text.contains(r#""kind":"event_submitted""#), "frame: {text}");
  }
}
