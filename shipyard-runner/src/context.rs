//! Execution context for a variant run
//!
//! Contains all state needed while one variant walks its steps:
//! - Run identity for log correlation
//! - The variant state machine and the states visited so far
//! - The log buffer collecting step transitions and tool output

use shipyard_core::domain::log::{LogEntry, LogLevel};
use shipyard_core::domain::step::VariantState;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::service::LogBufferService;

/// Execution context owned by a single variant run
pub struct Context {
    /// Unique id of this run
    pub run_id: Uuid,

    /// OS identifier, prefixed to tracing output
    pub os: String,

    state: VariantState,
    history: Vec<VariantState>,
    log_buffer: Arc<dyn LogBufferService>,
}

impl Context {
    /// Creates a context in the `Pending` state
    pub fn new(os: impl Into<String>, log_buffer: Arc<dyn LogBufferService>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            os: os.into(),
            state: VariantState::Pending,
            history: vec![VariantState::Pending],
            log_buffer,
        }
    }

    pub fn state(&self) -> VariantState {
        self.state
    }

    pub fn history(&self) -> &[VariantState] {
        &self.history
    }

    /// Moves the state machine to `next`
    ///
    /// Re-entering the current state is a no-op. Terminal states never
    /// advance.
    pub fn transition(&mut self, next: VariantState) {
        if self.state == next {
            return;
        }
        if self.state.is_terminal() {
            warn!(
                "[{}] ignoring transition {} -> {}: state is terminal",
                self.os, self.state, next
            );
            return;
        }

        debug!("[{}] {} -> {}", self.os, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Adds a log entry to the buffer
    pub fn add_log(&self, level: LogLevel, message: String) {
        self.log_buffer.add_entry(LogEntry::now(level, message));
    }

    /// Logs a debug message
    pub fn log_debug(&self, message: String) {
        self.add_log(LogLevel::Debug, message);
    }

    /// Logs an info message
    pub fn log_info(&self, message: String) {
        self.add_log(LogLevel::Info, message);
    }

    /// Logs a warning message
    pub fn log_warning(&self, message: String) {
        self.add_log(LogLevel::Warning, message);
    }

    /// Logs an error message
    pub fn log_error(&self, message: String) {
        self.add_log(LogLevel::Error, message);
    }

    /// Logs captured tool output line by line
    pub fn log_output(&self, level: LogLevel, output: &str) {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            self.add_log(level, line.to_string());
        }
    }

    /// Drains all log entries from the buffer
    pub fn drain_logs(&self) -> Vec<LogEntry> {
        self.log_buffer.drain()
    }
}
