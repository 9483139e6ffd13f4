//! Main entry point for the ryt-decipher CLI

use anyhow::{Context, Result};
use clap::Parser;
use ryt_decipher::cli::{Args, Command, VerbosityLevel};
use ryt_decipher::platform::cipher::extract;
use ryt_decipher::utils::url::extract_video_id;
use ryt_decipher::{OperationPlan, StreamResolver};
use serde::Serialize;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JSON printed by the `plan` command
#[derive(Debug, Serialize)]
struct PlanOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    player_release: Option<String>,
    signature_timestamp: String,
    operations: OperationPlan,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity_level());

    debug!("Starting ryt-decipher with args: {:?}", args);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            token.cancel();
        }
    });

    match &args.command {
        Command::Resolve { video, cipher } => {
            let resolver = StreamResolver::with_config(args.resolver_config())?;
            let video_id = extract_video_id(video)?;
            let stream = resolver
                .decipher_url(&video_id, cipher, &cancel)
                .await
                .with_context(|| format!("failed to decipher stream for {}", video_id))?;
            println!("{}", stream.url);
        }
        Command::Plan {
            player_file: Some(path),
            ..
        } => print_plan_from_file(path).await?,
        Command::Plan { video, .. } => {
            let video = video.as_deref().context("a video ID or --player-file is required")?;
            let resolver = StreamResolver::with_config(args.resolver_config())?;
            let video_id = extract_video_id(video)?;
            let release = resolver.resolve_release(&video_id, &cancel).await?;
            let entry = resolver
                .resolve_plan(&release, &cancel)
                .await
                .with_context(|| format!("failed to extract plan from {}", release))?;
            print_json(&PlanOutput {
                player_release: Some(release.to_string()),
                signature_timestamp: entry.signature_timestamp,
                operations: entry.plan,
            })?;
        }
        Command::Timestamp { video } => {
            let resolver = StreamResolver::with_config(args.resolver_config())?;
            let video_id = extract_video_id(video)?;
            let sts = resolver.signature_timestamp(&video_id, &cancel).await?;
            println!("{}", sts);
        }
    }

    Ok(())
}

async fn print_plan_from_file(path: &Path) -> Result<()> {
    let player_code = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read player code from {}", path.display()))?;
    let extraction = extract(&player_code)
        .with_context(|| format!("failed to extract plan from {}", path.display()))?;
    info!(
        "Extracted {} operations from {}",
        extraction.plan.len(),
        path.display()
    );

    print_json(&PlanOutput {
        player_release: None,
        signature_timestamp: extraction.signature_timestamp,
        operations: extraction.plan,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) {
    // RUST_LOG wins over the verbosity flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
