//! vidhost CLI: upload videos and drive the watch-page actions from a terminal.
//!
//! Set VIDHOST_BASE_URL (or API_URL). See `ClientConfig` for the other variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use vidhost_cli::{init_tracing, SimulatedPlayback, StdinConfirm, TerminalSink};
use vidhost_client::{ApiClient, EngagementClient, UploadOrchestrator, WatchTracker};
use vidhost_core::models::{EngagementState, FilePayload};
use vidhost_core::{ClientConfig, ConfirmPrompt, FixedConfirm};

#[derive(Parser)]
#[command(name = "vidhost", about = "vidhost upload and engagement CLI")]
struct Cli {
    /// Server origin; overrides VIDHOST_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video file and publish it
    Upload {
        /// Path to the video file
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Override the MIME type inferred from the file extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Like a video, or unlike it if --liked is given
    Like {
        /// Video hash
        hash: String,
        /// Watch token of the current page view
        #[arg(long)]
        watch_id: String,
        /// The video is currently liked by you
        #[arg(long)]
        liked: bool,
        /// Current like count
        #[arg(long, default_value = "0")]
        count: u64,
    },
    /// Delete a video
    Delete {
        /// Video hash
        hash: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Post a comment on a video
    Comment {
        /// Video hash
        hash: String,
        text: String,
    },
    /// Simulate playback and record a view once the watch threshold is crossed
    View {
        /// Video hash
        hash: String,
        #[arg(long)]
        watch_id: String,
        /// Playable duration in seconds
        #[arg(long)]
        duration: f64,
        /// Playback speed multiplier
        #[arg(long, default_value = "1.0")]
        rate: f64,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()
        .context("Invalid client configuration. Check VIDHOST_* variables")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    let api = ApiClient::new(config).context("Failed to create API client")?;
    let sink = Arc::new(TerminalSink::new());

    match cli.command {
        Commands::Upload {
            file,
            title,
            description,
            content_type,
        } => {
            let mut payload = FilePayload::from_path(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            if let Some(content_type) = content_type {
                payload = payload.with_content_type(content_type);
            }

            let orchestrator = UploadOrchestrator::new(api, sink.clone());
            orchestrator.open_upload_surface().await?;
            orchestrator.select_file(payload);
            orchestrator.set_details(&title, &description);
            let receipt = orchestrator.submit().await?;

            print_json(&serde_json::json!({
                "upload_hash": receipt.upload_hash,
                "location": receipt.location,
            }))?;
        }
        Commands::Like {
            hash,
            watch_id,
            liked,
            count,
        } => {
            let client = EngagementClient::new(api, sink.clone());
            client.track(EngagementState::new(&hash, watch_id).with_likes(liked, count));
            let state = client.toggle_like(&hash).await?;
            print_json(&state)?;
        }
        Commands::Delete { hash, yes } => {
            let prompt: Box<dyn ConfirmPrompt> = if yes {
                Box::new(FixedConfirm(true))
            } else {
                Box::new(StdinConfirm)
            };

            let client = EngagementClient::new(api, sink.clone());
            client.track(EngagementState::new(&hash, ""));
            let outcome = client.delete_resource(&hash, prompt.as_ref()).await?;

            print_json(&serde_json::json!({
                "deleted": outcome == vidhost_client::DeleteOutcome::Deleted,
                "location": sink.location(),
            }))?;
        }
        Commands::Comment { hash, text } => {
            let client = EngagementClient::new(api, sink.clone());
            client.track(EngagementState::new(&hash, ""));
            client.post_comment(&hash, &text).await?;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::View {
            hash,
            watch_id,
            duration,
            rate,
        } => {
            let config = api.config().clone();
            let client = Arc::new(EngagementClient::new(api, sink.clone()));
            client.track(EngagementState::new(&hash, watch_id));

            let playback = Arc::new(SimulatedPlayback::new(duration, rate));
            let tracker = WatchTracker::start(&hash, playback, client.clone(), &config);

            let exit = tokio::select! {
                exit = tracker.finished() => exit,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C signal");
                    return Ok(());
                }
            };

            print_json(&serde_json::json!({
                "resource_id": hash,
                "exit": format!("{:?}", exit),
                "view_recorded": client.state(&hash).map(|s| s.view_recorded).unwrap_or(false),
            }))?;
        }
    }

    Ok(())
}
