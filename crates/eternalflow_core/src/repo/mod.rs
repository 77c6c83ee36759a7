//! Store adapters for persisted events.
//!
//! # Responsibility
//! - Define the `EventRepository` contract consumed by the service layer.
//! - Provide interchangeable backends chosen at composition time:
//!   indexed SQLite and flat string-keyed storage.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateId`) in
//!   addition to transport errors.

pub mod event_repo;
pub mod flat_repo;
