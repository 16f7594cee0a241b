//! Plan command handler
//!
//! Prints the exact steps every variant would run. Nothing is executed.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use serde::Serialize;
use shipyard_orchestrator::config;
use shipyard_runner::{Step, plan_variant};
use std::process::ExitCode;

use crate::commands::select_variants;

/// Arguments of `shipyard plan`
#[derive(Args)]
pub struct PlanArgs {
    /// Only plan these variants (by OS identifier); repeatable
    #[arg(long = "only", value_name = "OS")]
    pub only: Vec<String>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct VariantPlan {
    os: String,
    name: String,
    artifact: String,
    steps: Vec<Step>,
}

/// Handle `shipyard plan`
pub fn handle_plan(args: PlanArgs) -> Result<ExitCode> {
    let config = config::load_config().context("Failed to load pipeline configuration")?;
    let config = select_variants(config, &args.only)?;

    let plans: Vec<VariantPlan> = config
        .variants
        .iter()
        .map(|variant| VariantPlan {
            os: variant.os.clone(),
            name: variant.name.clone(),
            artifact: config.artifact_name(variant),
            steps: plan_variant(&config, variant),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Environment passed to every step:".bold());
    for (key, value) in config.passthrough_env() {
        println!("  {} = {}", key.cyan(), value);
    }
    println!();

    for plan in &plans {
        println!(
            "{} {} {}",
            "▸".cyan(),
            plan.name.bold(),
            format!("→ {}", plan.artifact).dimmed()
        );
        for (index, step) in plan.steps.iter().enumerate() {
            println!("  {:>2}. {}", index + 1, step);
        }
        println!();
    }

    Ok(ExitCode::SUCCESS)
}
