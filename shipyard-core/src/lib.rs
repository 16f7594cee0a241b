//! Shipyard Core
//!
//! Core types and abstractions for the Shipyard release pipeline.
//!
//! This crate contains:
//! - Domain types: pipeline configuration, variants, steps, artifacts,
//!   release descriptors and outcomes
//! - DTOs: payloads exchanged with the release-hosting API

pub mod domain;
pub mod dto;
