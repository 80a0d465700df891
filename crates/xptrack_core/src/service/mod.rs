//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and in-memory domain views into
//!   user-action level APIs.
//! - Keep front ends decoupled from storage details.

pub mod tracker_service;
