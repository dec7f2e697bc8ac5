//! model-select: inspect a model catalog and run selections against it.
//!
//! Usage:
//!   model-select catalog [--config <path>] [--json]
//!   model-select select --task <task> [--speed ..] [--quality ..] [--budget ..] [--complexity ..]
//!   model-select validate <catalog>

use ai_profile_kit::routing::{
    Budget, Capability, Complexity, GenerationParams, ModelCatalog, QualityTier,
    SelectionCriteria, SpeedTier,
};
use ai_profile_kit::config::ENV_CONFIG;
use ai_profile_kit::RuntimeConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "model-select", version, about = "Capability-based model selection")]
struct Cli {
    /// Runtime config file (YAML or JSON)
    #[arg(long, global = true, env = ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Catalog file, overrides the config
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the models in the catalog
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Pick a model for a request
    Select {
        #[arg(long)]
        task: Capability,
        #[arg(long, default_value = "slow")]
        speed: SpeedTier,
        #[arg(long, default_value = "basic")]
        quality: QualityTier,
        #[arg(long, default_value = "high")]
        budget: Budget,
        #[arg(long, default_value = "medium")]
        complexity: Complexity,
        #[arg(long)]
        json: bool,
    },
    /// Check that a catalog file loads and validates
    Validate { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = || -> anyhow::Result<ModelCatalog> {
        let mut config = RuntimeConfig::load(cli.config.as_deref())
            .context("failed to load runtime config")?;
        if let Some(ref path) = cli.catalog {
            config.routing.catalog_path = Some(path.clone());
        }
        config.build_catalog().context("failed to load catalog")
    };

    match cli.command {
        Command::Catalog { json } => {
            let catalog = catalog()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
                return Ok(());
            }
            let budget = catalog.budget();
            println!(
                "budget ceilings: low={} medium={} high={}",
                budget.low, budget.medium, budget.high
            );
            for model in &catalog {
                let marker = if model.id == catalog.default_model().id {
                    "*"
                } else {
                    " "
                };
                let caps: Vec<&str> = model.capabilities.iter().map(|c| c.as_str()).collect();
                println!(
                    "{} {:<24} speed={:<6} quality={:<9} cost={:<8} max_out={:<6} [{}]",
                    marker,
                    model.id,
                    model.speed,
                    model.quality,
                    model.unit_cost,
                    model.max_output_tokens,
                    caps.join(", ")
                );
            }
        }
        Command::Select {
            task,
            speed,
            quality,
            budget,
            complexity,
            json,
        } => {
            let catalog = catalog()?;
            let criteria = SelectionCriteria::new(task)
                .with_speed(speed)
                .with_quality(quality)
                .with_budget(budget)
                .with_complexity(complexity);
            let selection = ai_profile_kit::routing::select_model(&catalog, &criteria);
            let params = GenerationParams::for_request(&criteria, selection.model);
            if json {
                let out = serde_json::json!({
                    "model": selection.model,
                    "fallback": selection.fallback,
                    "candidates": selection.candidates,
                    "params": params,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", selection.model.id);
                if selection.fallback {
                    eprintln!("note: no model matched every requirement, using the catalog default");
                }
                eprintln!(
                    "temperature={} max_output_tokens={}",
                    params.temperature, params.max_output_tokens
                );
            }
        }
        Command::Validate { path } => {
            let catalog = ModelCatalog::from_path(&path)
                .with_context(|| format!("{} is not a valid catalog", path.display()))?;
            println!(
                "{}: {} models, default {}",
                path.display(),
                catalog.len(),
                catalog.default_model().id
            );
        }
    }
    Ok(())
}
