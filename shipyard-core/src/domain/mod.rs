//! Core domain types
//!
//! This module contains the structures shared between the runner (which
//! executes a single variant) and the orchestrator (which schedules variants,
//! aggregates their reports and publishes the release).

pub mod artifact;
pub mod log;
pub mod outcome;
pub mod pipeline;
pub mod release;
pub mod step;
pub mod trigger;
pub mod variant;
