//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls, list derivation and the live timer.
//! - Keep presentation layers decoupled from storage details.

pub mod event_service;
