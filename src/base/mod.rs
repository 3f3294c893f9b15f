//! Core components, types, and utilities for the grievance-triage service.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The classifier instruction prompt.
//! - Common types and result handling.

pub mod config;
pub mod prompts;
/// Common types and result aliases shared across the crate.
pub mod types;
