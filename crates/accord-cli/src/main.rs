//! Accord CLI - negotiate licensing terms between two LLM-backed roles
//!
//! # Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! accord negotiate "this song is great, monthly listeners = 100000"
//! accord negotiate "indie track, 2k listeners" --provider ollama --max-rounds 3 --verbose
//! echo '```json {"licensingCost": 500, "royaltiesPercent": 12} ```' | accord parse
//! accord status
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use accord_llm::{LLMRouter, ProviderKind};
use accord_negotiation::{NegotiationConfig, Negotiator, ResponseParser};
use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod display;

/// Accord - two-role licensing negotiation
#[derive(Parser)]
#[command(name = "accord")]
#[command(version)]
#[command(about = "Negotiate a licensing cost and royalty percentage between two LLM roles", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a negotiation and print the settlement
    Negotiate {
        /// Description of the item being licensed
        context: String,

        /// LLM provider (openai, anthropic, ollama, openai_compat)
        #[arg(long)]
        provider: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Maximum full A/B rounds
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Allowed difference on cost and royalty
        #[arg(long)]
        tolerance: Option<u64>,

        /// Per-call timeout in seconds (0 disables)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Overall deadline in seconds (0 disables)
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Emit the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Show every round
        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract a proposal from generated text (file or stdin)
    Parse {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Show the configured provider and negotiation limits
    Status,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Negotiate {
            context,
            provider,
            model,
            max_rounds,
            tolerance,
            timeout_secs,
            deadline_secs,
            json,
            verbose,
        } => {
            let mut config = NegotiationConfig::from_env()?;
            if let Some(max_rounds) = max_rounds {
                config.max_rounds = max_rounds;
            }
            if let Some(tolerance) = tolerance {
                config.tolerance = tolerance;
            }
            if let Some(secs) = timeout_secs {
                config.call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(secs) = deadline_secs {
                config.deadline = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(model) = model {
                config.model = Some(model);
            }

            let router = build_router(provider.as_deref())?;
            let negotiator = Negotiator::with_router(&router, config)?;
            let outcome = negotiator
                .negotiate(&context)
                .await
                .context("negotiation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                if verbose {
                    display::transcript(&outcome);
                }
                display::settlement(&outcome);
            }
        }

        Commands::Parse { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                }
            };

            let parser = ResponseParser::new();
            println!("{} {}", "Candidate:".bright_white(), parser.extract(&text));
            let proposal = parser.parse(&text)?;
            println!("{}", serde_json::to_string_pretty(&proposal)?);
        }

        Commands::Status => show_status().await?,
    }

    Ok(())
}

fn build_router(provider: Option<&str>) -> anyhow::Result<LLMRouter> {
    let router = match provider {
        Some(name) => {
            let kind = ProviderKind::from_str(name)
                .with_context(|| format!("unknown provider '{}'", name))?;
            LLMRouter::from_kind(kind)?
        }
        None => LLMRouter::from_env()?,
    };
    tracing::debug!(provider = %router.kind(), "using provider");
    Ok(router)
}

async fn show_status() -> anyhow::Result<()> {
    display::section("Accord Status");

    let config = NegotiationConfig::from_env()?;
    display::labeled("Max rounds", &config.max_rounds.to_string());
    display::labeled("Tolerance", &config.tolerance.to_string());
    display::labeled(
        "Call timeout",
        &config
            .call_timeout
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
    );
    display::labeled(
        "Deadline",
        &config
            .deadline
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
    );
    if let Some(ref model) = config.model {
        display::labeled("Model override", model);
    }

    println!();
    match LLMRouter::from_env() {
        Ok(router) => {
            display::labeled("Provider", &router.kind().to_string());
            if router.is_available().await {
                display::success(&format!("{} is available", router.provider().name()));
            } else {
                display::warning(&format!("{} is not reachable", router.provider().name()));
            }
        }
        Err(e) => display::warning(&e.to_string()),
    }

    Ok(())
}
