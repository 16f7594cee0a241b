//! Service Module
//!
//! Business logic layer for the orchestrator.

pub mod pipeline;
pub mod publish;

pub use pipeline::Orchestrator;
pub use publish::{PublishError, Publisher, ReleasePublisher, select_artifacts};
