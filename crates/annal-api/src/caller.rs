//! Caller identity extractor.
//!
//! The identity provider in front of the API authenticates requests and
//! forwards the caller's address in [`ACCOUNT_HEADER`]. The value is trusted
//! as-is.

use annal_core::AccountId;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header carrying the authenticated caller's address.
pub const ACCOUNT_HEADER: &str = "x-annal-account";

/// The account on whose behalf a command is issued.
#[derive(Debug, Clone)]
pub struct Caller(pub AccountId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let address = parts
      .headers
      .get(ACCOUNT_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .ok_or_else(|| ApiError::BadRequest(format!("missing {ACCOUNT_HEADER} header")))?;
    Ok(Caller(AccountId::from(address)))
  }
}
