//! Live countdown refresh.
//!
//! # Responsibility
//! - Keep displayed countdowns in step with wall-clock time.
//! - Decouple per-second cosmetic updates from list recomputation.

pub mod scheduler;
