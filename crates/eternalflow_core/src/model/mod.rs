//! Domain model for countdown events.
//!
//! # Responsibility
//! - Define the persisted `Event` record and its write-boundary checks.
//! - Define ephemeral list view state (filter, sort, search, edit session).
//!
//! # Invariants
//! - Every event is identified by a stable `EventId`.
//! - Invalid titles and dates never reach a repository.

pub mod event;
pub mod view;
