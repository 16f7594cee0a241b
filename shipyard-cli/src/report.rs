//! Human-readable run report

use colored::*;
use shipyard_core::domain::log::{LogEntry, LogLevel};
use shipyard_core::domain::outcome::{PipelineOutcome, PipelineStatus, VariantReport};
use shipyard_core::domain::step::{StepResult, VariantState};

/// Lines of tool output shown for a failed step
const OUTPUT_TAIL_LINES: usize = 20;

/// Print the outcome of a pipeline run
pub fn print_outcome(outcome: &PipelineOutcome) {
    for report in &outcome.variants {
        print_variant(report);
    }

    if let Some(release) = &outcome.release {
        println!("{}", "Release:".bold());
        println!("  Tag:  {}", release.tag.cyan());
        println!("  Name: {}", release.name);
        println!();
    }

    println!("{} {}", "Outcome:".bold(), colorize_status(&outcome.status));

    match &outcome.status {
        PipelineStatus::Published { release } => {
            println!("  URL:    {}", release.url);
            println!("  Assets: {}", release.assets.join(", "));
            if let Some(replaced) = release.replaced {
                println!("  Replaced release {}", replaced.to_string().dimmed());
            }
        }
        PipelineStatus::NotOnReleaseBranch { branch, target } => {
            println!(
                "  Branch {} is not {}; artifacts kept locally:",
                branch.yellow(),
                target.cyan()
            );
            for artifact in outcome.artifacts() {
                println!("    {}", artifact.path.display());
            }
        }
        PipelineStatus::PublishDeferred { built } => {
            println!(
                "  Built {}; run {} once every variant is in",
                built.join(", ").cyan(),
                "shipyard publish".bold()
            );
        }
        PipelineStatus::PublishFailed { message, .. } => {
            println!("  {}", message.red());
        }
        PipelineStatus::SkippedByGate | PipelineStatus::VariantsFailed => {}
    }
}

/// Print one variant's report
fn print_variant(report: &VariantReport) {
    println!(
        "{} {} {}",
        "▸".cyan(),
        report.variant.to_string().bold(),
        colorize_state(report.state)
    );
    println!("  Run ID: {}", report.run_id.to_string().dimmed());

    for step in &report.steps {
        print_step(step);
    }

    if let Some(artifact) = &report.artifact {
        println!("  Artifact: {}", artifact.path.display().to_string().green());
    }

    if let Some(failed) = report.failed_step() {
        let tail = failed.output_tail(OUTPUT_TAIL_LINES);
        if !tail.is_empty() {
            println!("\n  {}", format!("Output of {}:", failed.step).bold());
            println!("  {}", "─".repeat(78).dimmed());
            for line in tail.lines() {
                println!("  {}", line);
            }
            println!("  {}", "─".repeat(78).dimmed());
        }
    } else if report.steps.is_empty() {
        // Aborted runs have no steps; their reason is in the logs
        for log in &report.logs {
            print_log_entry(log);
        }
    }

    println!();
}

fn print_step(step: &StepResult) {
    let marker = if step.succeeded() {
        "✓".green()
    } else {
        "✗".red()
    };

    let status = match (step.timed_out, step.exit_code) {
        (true, _) => "timed out".red().to_string(),
        (false, Some(code)) => format!("exit {}", code),
        (false, None) => "no exit code".red().to_string(),
    };

    println!(
        "  {} {:<22} {:>9} {}",
        marker,
        step.step,
        format!("{}ms", step.duration_ms).dimmed(),
        status
    );
}

/// Print a log entry
fn print_log_entry(log: &LogEntry) {
    let level_str = log.level.to_string();
    let level_colored = match log.level {
        LogLevel::Debug => level_str.dimmed(),
        LogLevel::Info => level_str.cyan(),
        LogLevel::Warning => level_str.yellow(),
        LogLevel::Error => level_str.red(),
    };

    println!(
        "  {} [{}] {}",
        log.timestamp.format("%H:%M:%S").to_string().dimmed(),
        level_colored,
        log.message
    );
}

/// Colorize a variant state for display
fn colorize_state(state: VariantState) -> ColoredString {
    let state_str = state.to_string();
    match state {
        VariantState::Done | VariantState::Collected => state_str.green(),
        VariantState::Failed(_) => state_str.red(),
        _ => state_str.yellow(),
    }
}

/// Colorize the pipeline status for display
fn colorize_status(status: &PipelineStatus) -> ColoredString {
    match status {
        PipelineStatus::Published { .. } => "Published".green(),
        PipelineStatus::NotOnReleaseBranch { .. } => "NotOnReleaseBranch".yellow(),
        PipelineStatus::PublishDeferred { .. } => "PublishDeferred".yellow(),
        PipelineStatus::SkippedByGate => "SkippedByGate".dimmed(),
        PipelineStatus::VariantsFailed => "VariantsFailed".red(),
        PipelineStatus::PublishFailed { kind, .. } => kind.to_string().red(),
    }
}
