//! Projection endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/timelines/{timeline}` | `Canonical`, `Disputed` or `Alternative`, any case |
//! | `GET`  | `/users/{address}/events` | Events submitted by `address` |
//! | `GET`  | `/tags/{tag}/events` | Events carrying `tag`, any case |
//!
//! All lists are in ascending id order. An unknown timeline or tag name is a
//! 400; an empty result is not an error.

use std::sync::Arc;

use annal_core::{AccountId, Protocol, event::HistoricalEvent, store::HistoryStore};
use axum::{
  Json,
  extract::{Path, State},
};

use crate::error::ApiError;

/// `GET /timelines/{timeline}`
pub async fn by_timeline<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(timeline): Path<String>,
) -> Result<Json<Vec<HistoricalEvent>>, ApiError> {
  let events = protocol
    .get_events_by_timeline_name(&timeline)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(events))
}

/// `GET /users/{address}/events`
pub async fn by_user<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(address): Path<String>,
) -> Result<Json<Vec<HistoricalEvent>>, ApiError> {
  let events = protocol
    .get_user_events(&AccountId::from(address))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(events))
}

/// `GET /tags/{tag}/events`
pub async fn by_tag<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
  Path(tag): Path<String>,
) -> Result<Json<Vec<HistoricalEvent>>, ApiError> {
  let events = protocol
    .get_events_by_tag_name(&tag)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(events))
}
