//! Shipyard Orchestrator
//!
//! Coordinates a pipeline run: loads the configuration, gates the trigger,
//! runs every variant in parallel, records the variant reports and publishes
//! the artifacts when the publish gate allows it.

pub mod clock;
pub mod config;
pub mod gate;
pub mod scheduler;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use gate::PublishDecision;
pub use scheduler::VariantScheduler;
pub use service::{Orchestrator, PublishError, Publisher, ReleasePublisher};
pub use store::ReportStore;
