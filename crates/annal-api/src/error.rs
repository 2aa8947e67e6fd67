//! API error type and [`axum::response::IntoResponse`] implementation.

use annal_core::{DomainError, Error};
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store or protocol error by its domain kind. Anything that is
  /// not a caller mistake is reported as a store error.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    let classified = err.domain().and_then(|domain| {
      let message = domain.to_string();
      match domain {
        Error::EventNotFound(_) => Some(ApiError::NotFound(message)),
        Error::InvalidEventData(_) | Error::UnknownTimeline(_) | Error::UnknownTag(_) => {
          Some(ApiError::BadRequest(message))
        }
        Error::AlreadyVoted { .. } => Some(ApiError::Conflict(message)),
        Error::TallyOverflow(_) => None,
      }
    });
    classified.unwrap_or_else(|| ApiError::Store(Box::new(err)))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure while handling request");
        e.to_string()
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use annal_core::AccountId;

  use super::*;

  #[test]
  fn domain_errors_map_to_client_statuses() {
    let cases = [
      (Error::EventNotFound(3), StatusCode::NOT_FOUND),
      (Error::InvalidEventData("title is empty".into()), StatusCode::BAD_REQUEST),
      (Error::UnknownTimeline("Mainstream".into()), StatusCode::BAD_REQUEST),
      (Error::UnknownTag("Folklore".into()), StatusCode::BAD_REQUEST),
      (
        Error::AlreadyVoted { event_id: 1, voter: AccountId::from("bob") },
        StatusCode::CONFLICT,
      ),
      (Error::TallyOverflow(9), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from_store(err).status(), status);
    }
  }
}
