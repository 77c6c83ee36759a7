//! Event list view pipeline.
//!
//! # Responsibility
//! - Filter, search and sort the in-memory collection into a visible list.
//! - Keep result shaping inside core so presentation only renders.

pub mod collate;
pub mod visible;
