//! visibility-gateway - query LLM providers through the gateway from the shell

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use visibility_gateway::utils::logging::init_tracing;
use visibility_gateway::{CallerId, GatewayConfig, VisibilityGateway};

#[derive(Debug, Parser)]
#[command(name = "visibility-gateway", version, about = "Multi-provider LLM query gateway")]
struct Cli {
    /// YAML configuration file; the environment is used when omitted
    #[arg(long, short, env = "VG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Best single answer with health-aware fallback
    Query {
        prompt: String,
        /// Confidence that ends the fallback early
        #[arg(long)]
        confidence: Option<f64>,
        /// Skip the response cache
        #[arg(long)]
        no_cache: bool,
        #[arg(long, default_value = "cli")]
        caller: String,
    },
    /// Collect answers from several providers
    Aggregate {
        prompt: String,
        #[arg(long, default_value_t = 2)]
        min_providers: usize,
        #[arg(long, default_value = "cli")]
        caller: String,
    },
    /// Provider health, circuit state and cache statistics
    Status,
}

#[derive(Serialize)]
struct StatusOutput {
    system: visibility_gateway::SystemStatus,
    cache: visibility_gateway::CacheStats,
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<GatewayConfig> {
    match path {
        Some(path) => GatewayConfig::from_file(&path)
            .await
            .with_context(|| format!("loading {}", path.display())),
        None => GatewayConfig::from_env().context("loading configuration from environment"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn execute(gateway: &VisibilityGateway, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Query {
            prompt,
            confidence,
            no_cache,
            caller,
        } => {
            let required = confidence
                .unwrap_or(gateway.config().orchestrator.default_required_confidence);
            let response = gateway
                .query_with_fallback(&CallerId::from(caller), &prompt, required, !no_cache)
                .await?;
            print_json(&response)
        }
        Command::Aggregate {
            prompt,
            min_providers,
            caller,
        } => {
            let result = gateway
                .aggregate_responses(&CallerId::from(caller), &prompt, min_providers)
                .await?;
            print_json(&result)
        }
        Command::Status => print_json(&StatusOutput {
            system: gateway.system_status(),
            cache: gateway.cache_stats(),
        }),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config).await?;
    init_tracing(&config.logging);

    let gateway = VisibilityGateway::builder()
        .config(config)
        .build()
        .await
        .context("building gateway")?;

    let outcome = execute(&gateway, cli.command).await;
    gateway.shutdown().await;
    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
