//! `GET /notifications`: a server-sent events feed of [`Notification`]s.
//!
//! Each SSE message is named after the notification kind and carries the
//! notification as JSON. A slow client skips what it missed rather than
//! holding up commands.

use std::{convert::Infallible, sync::Arc};

use annal_core::{Notification, Protocol, store::HistoryStore};
use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{
  Stream, StreamExt as _,
  wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

fn kind(notification: &Notification) -> &'static str {
  match notification {
    Notification::EventSubmitted { .. } => "event_submitted",
    Notification::VoteCast { .. } => "vote_cast",
    Notification::TimelineChanged { .. } => "timeline_changed",
  }
}

/// `GET /notifications`
pub async fn stream<S: HistoryStore + 'static>(
  State(protocol): State<Arc<Protocol<S>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  let feed = BroadcastStream::new(protocol.subscribe()).filter_map(|received| match received {
    Ok(notification) => match Event::default().event(kind(&notification)).json_data(&notification) {
      Ok(event) => Some(Ok(event)),
      Err(error) => {
        tracing::warn!(%error, "could not encode notification");
        None
      }
    },
    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
      tracing::warn!(skipped, "notification subscriber lagged");
      None
    }
  });

  Sse::new(feed).keep_alive(KeepAlive::default())
}
