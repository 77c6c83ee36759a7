//! Countdown / time-since formatting engine.
//!
//! # Responsibility
//! - Decompose signed millisecond deltas into years..seconds.
//! - Pick locale plural forms per unit.
//! - Shape display breakdowns for cards and sentences.

pub mod decompose;
pub mod format;
pub mod plural;
