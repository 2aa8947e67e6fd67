//! Core types and the consensus engine for the annal history ledger.
//!
//! Participants submit claimed historical events and cast one irrevocable
//! support or challenge vote each. Every event is continuously bucketed into
//! a [`Timeline`](event::Timeline) purely from its vote tally.
//!
//! This crate has no HTTP or database dependencies.
//! Storage backends implement [`store::HistoryStore`]; everything else talks
//! to a [`protocol::Protocol`].

// `HistoryStore` spells out `Send` on its futures, so the advisory lint is
// noise here.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod consensus;
pub mod error;
pub mod event;
pub mod memory;
pub mod protocol;
pub mod query;
pub mod store;
pub mod vote;

pub use account::AccountId;
pub use error::{DomainError, Error, Result};
pub use protocol::{Notification, Protocol};
