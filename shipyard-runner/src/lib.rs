//! Shipyard Runner
//!
//! Executes one variant of the release pipeline.
//!
//! Architecture:
//! - Plan: the ordered, gated steps of a variant
//! - Process: external tool invocation with a wall-clock timeout
//! - Context: variant state machine and log collection
//! - Services: step execution and log buffering
//!
//! A variant run walks its plan strictly in order and stops at the first step
//! that does not succeed. It never shares state with other variants; the only
//! thing it hands back is a `VariantReport`.

pub mod context;
pub mod plan;
pub mod process;
pub mod service;

pub use plan::{Step, StepAction, plan_variant};
pub use process::{CommandOutput, CommandRunner, Invocation, SystemCommandRunner};
pub use service::{ExecutionService, InMemoryLogBuffer, LogBufferService, StandardExecutionService};
