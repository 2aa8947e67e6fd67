//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/events` | Body: [`NewEvent`]; returns 201 + `{"id": n}` |
//! | `GET`  | `/events` | Every event, ascending id |
//! | `GET`  | `/events/{id}` | Single event |
//! | `POST` | `/events/{id}/votes` | Body: `{"support": bool}`; returns 204 |
//! | `GET`  | `/events/{id}/votes` | Votes in cast order |
//! | `GET`  | `/events/{id}/votes/{voter}` | `{"has_voted": bool, "vote": ...}` |
//!
//! Both `POST`s require the [`ACCOUNT_HEADER`](crate::caller::ACCOUNT_HEADER).

use std::sync::Arc;

use annal_core::{
  AccountId, Protocol,
  event::{HistoricalEvent, NewEvent},
  store::HistoryStore,
  vote::VoteRecord,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{caller::Caller, error::ApiError};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub id: u64,
}

/// `POST /events`
pub async fn create<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Caller(submitter): Caller,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  let id = protocol
    .submit_event(submitter, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(Created { id })))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /events`
pub async fn list<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
) -> Result<Json<Vec<HistoricalEvent>>, ApiError> {
  let events = protocol.get_all_events().await.map_err(ApiError::from_store)?;
  Ok(Json(events))
}

/// `GET /events/{id}`
pub async fn get_one<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(id): Path<u64>,
) -> Result<Json<HistoricalEvent>, ApiError> {
  let event = protocol.get_event(id).await.map_err(ApiError::from_store)?;
  Ok(Json(event))
}

// ─── Votes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteBody {
  pub support: bool,
}

/// `POST /events/{id}/votes`
pub async fn vote<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(id): Path<u64>,
  Caller(voter): Caller,
  Json(body): Json<VoteBody>,
) -> Result<StatusCode, ApiError> {
  protocol
    .vote(voter, id, body.support)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /events/{id}/votes`
pub async fn votes<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(id): Path<u64>,
) -> Result<Json<Vec<VoteRecord>>, ApiError> {
  let votes = protocol.get_votes(id).await.map_err(ApiError::from_store)?;
  Ok(Json(votes))
}

/// Response of `GET /events/{id}/votes/{voter}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteStatus {
  pub has_voted: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vote:      Option<VoteRecord>,
}

/// `GET /events/{id}/votes/{voter}`. `has_voted` is `false` for unknown
/// events too.
pub async fn vote_status<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path((id, voter)): Path<(u64, String)>,
) -> Result<Json<VoteStatus>, ApiError> {
  let vote = protocol
    .get_vote(id, &AccountId::from(voter))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(VoteStatus {
    has_voted: vote.is_some(),
    vote,
  }))
}
