//! Download command.

use std::process::ExitCode;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use super::{DownloadArgs, ensure_tools};
use crate::config;
use crate::downloader::{Orchestrator, RunSummary, Services, TrackOutcome, TrackStatus};
use crate::error::Error;
use crate::providers::ProviderRegistry;
use crate::spotify::{self, ResourceId, SpotifyClient};

pub fn cmd_download(rt: &Runtime, args: &DownloadArgs) -> anyhow::Result<ExitCode> {
    let mut config = config::load();
    args.apply(&mut config);

    let resource = ResourceId::parse(&args.id)?;

    let (client_id, client_secret) = config.credentials.spotify().ok_or_else(|| {
        eprintln!("Error: Spotify API credentials required.");
        eprintln!("Create an app at: https://developer.spotify.com/dashboard");
        eprintln!("Then use: --client-id/--client-secret or set SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET");
        Error::config("Spotify client id/secret not set")
    })?;
    let client = SpotifyClient::new(client_id, client_secret);

    ensure_tools(&config)?;

    let registry = ProviderRegistry::from_config(&config.providers)?;
    let orchestrator =
        Orchestrator::new(config.download, &config.paths, Services::standard(registry))?;

    rt.block_on(run(&client, &resource, &orchestrator, args))
}

async fn run(
    client: &SpotifyClient,
    resource: &ResourceId,
    orchestrator: &Orchestrator,
    args: &DownloadArgs,
) -> anyhow::Result<ExitCode> {
    println!("Resolving {}...", resource);
    let tracks = spotify::resolve(client, resource)
        .await
        .with_context(|| format!("Could not resolve {}", resource))?;
    if tracks.is_empty() {
        println!("Nothing to download.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("Downloading {} track(s) to {:?}\n", tracks.len(), args.output);

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling...");
                cancel.cancel();
            }
        }
    });

    let result = orchestrator.run(tracks, &args.output, cancel).await;
    ctrl_c.abort();
    let summary = result?;

    print_summary(&summary);
    Ok(exit_code(&summary))
}

/// Only a failed single-track run is a failed command; batches report per track.
fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.len() == 1 && summary.failed() == 1 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        print_outcome(outcome);
    }

    println!();
    println!(
        "{} downloaded, {} skipped, {} retagged, {} failed, {} cancelled",
        summary.done(),
        summary.skipped(),
        summary.metadata_updated(),
        summary.failed(),
        summary.cancelled()
    );
    if let Some(dir) = &summary.retained_workspace {
        println!("Untagged files were kept in {:?}", dir);
    }
}

fn print_outcome(outcome: &TrackOutcome) {
    let title = outcome.track.full_title();
    match &outcome.status {
        TrackStatus::Done {
            path,
            provider,
            quality,
        } => {
            println!("✓ {}", title);
            println!("  {} match from {} → {:?}", quality, provider, path);
        }
        TrackStatus::Skipped { path } => {
            println!("- {} (exists: {:?})", title, path);
        }
        TrackStatus::MetadataUpdated {
            path,
            provider,
            quality,
        } => {
            println!("✓ {} (tags updated)", title);
            println!("  {} match from {} → {:?}", quality, provider, path);
        }
        TrackStatus::Failed { stage, error } => {
            eprintln!("✗ {} (during {})", title, stage);
            eprintln!("  {}", error);
            if let Some(report) = error.report() {
                eprintln!("  Report: {:?}", report);
            }
        }
        TrackStatus::Cancelled { stage } => {
            println!("✗ {} (cancelled at {})", title, stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::TrackStage;
    use crate::error::DownloadError;
    use crate::test_utils::mock_track_named;

    fn failed(index: usize) -> TrackOutcome {
        TrackOutcome::new(
            index,
            mock_track_named("Missing"),
            TrackStatus::Failed {
                stage: TrackStage::Searching,
                error: DownloadError::NotFound,
            },
        )
    }

    fn skipped(index: usize) -> TrackOutcome {
        TrackOutcome::new(
            index,
            mock_track_named("Present"),
            TrackStatus::Skipped {
                path: "/music/Present.mp3".into(),
            },
        )
    }

    #[test]
    fn test_single_failed_track_fails_command() {
        let summary = RunSummary::new(vec![failed(0)], None);
        assert_eq!(exit_code(&summary), ExitCode::FAILURE);
    }

    #[test]
    fn test_batch_with_failures_succeeds() {
        let summary = RunSummary::new(vec![failed(0), skipped(1)], None);
        assert_eq!(exit_code(&summary), ExitCode::SUCCESS);

        let summary = RunSummary::new(vec![skipped(0)], None);
        assert_eq!(exit_code(&summary), ExitCode::SUCCESS);
    }
}
