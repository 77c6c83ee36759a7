//! Import/export of event collections.
//!
//! # Responsibility
//! - Keep the on-disk JSON layout stable across sessions and versions.
//! - Validate imported records before they reach a repository.

pub mod format;
