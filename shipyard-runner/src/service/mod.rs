//! Service layer
//!
//! Services contain the runner's business logic: executing a variant's steps
//! and buffering the logs produced along the way.
//!
//! All services are trait-based to enable testing and dependency injection.

mod execution;
mod log_buffer;

// Re-export traits
pub use execution::ExecutionService;
pub use log_buffer::LogBufferService;

// Re-export implementations
pub use execution::StandardExecutionService;
pub use log_buffer::InMemoryLogBuffer;
