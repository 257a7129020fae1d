//! Download orchestration.
//!
//! Drives every requested track through the same pipeline:
//!
//! ```text
//! QUEUED → SEARCHING → POLICY_CHECK → FETCHING → CONVERTING → TAGGING → PLACING → DONE
//!                          ├─→ SKIPPED           (exists, policy = skip)
//!                          └─→ METADATA_UPDATED  (exists, policy = metadata)
//! ```
//!
//! Any stage may end the track as FAILED or CANCELLED instead. Each track runs
//! end-to-end on one worker task. Searching is cheap and runs ahead of the
//! admission gate, which lets at most `threads` tracks fetch or convert at
//! once. Every submitted track yields exactly one [`TrackOutcome`]; one
//! track's failure never stops the others. Tracks that resolve to the same
//! output file take turns in input order, from the policy check through
//! placement.
//!
//! Intermediate files live in a [`RunWorkspace`] that is removed when the
//! run ends, however it ends.

mod outcome;
mod policy;
mod stage;
mod turns;
mod workspace;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

use crate::config::{DownloadConfig, PathsConfig};
use crate::error::{DownloadError, Error, Result, ResultExt};
use crate::file_tools::{self, AudioFormat};
use crate::library::Track;
use crate::providers::{AudioProvider, Download, ProviderRegistry, SearchResult};
use crate::tagging::{CoverArtClient, CoverImage, CoverSource, LoftyTagWriter, TagWriter};
use crate::transcode::{self, FfmpegTranscoder, TranscodeRequest, Transcoder};

pub use outcome::{RunSummary, TrackOutcome, TrackStatus};
pub use policy::{CancelMode, OverwritePolicy, PolicyAction};
pub use stage::TrackStage;
pub use workspace::{RunWorkspace, ScratchSpace, TrackScratch};

use stage::StageCell;
use turns::Turn;

/// Worker tasks per admission slot; the surplus is searching ahead.
const SEARCH_AHEAD: usize = 2;

/// Lyric candidates tried per lyrics provider before moving on.
const LYRICS_CANDIDATES: usize = 3;

/// External collaborators the pipeline drives.
#[derive(Clone)]
pub struct Services {
    pub registry: ProviderRegistry,
    pub transcoder: Arc<dyn Transcoder>,
    pub tagger: Arc<dyn TagWriter>,
    /// `None` disables cover art regardless of config
    pub covers: Option<Arc<dyn CoverSource>>,
}

impl Services {
    /// ffmpeg, lofty and HTTP cover downloads around `registry`.
    pub fn standard(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            transcoder: Arc::new(FfmpegTranscoder::new()),
            tagger: Arc::new(LoftyTagWriter),
            covers: Some(Arc::new(CoverArtClient::new())),
        }
    }
}

pub struct Orchestrator {
    config: DownloadConfig,
    errors_dir: PathBuf,
    temp_root: Option<PathBuf>,
    services: Services,
}

impl Orchestrator {
    pub fn new(config: DownloadConfig, paths: &PathsConfig, services: Services) -> Result<Self> {
        if config.threads == 0 {
            return Err(Error::config("download threads must be at least 1"));
        }
        if services.registry.audio.is_empty() {
            return Err(Error::config("no audio providers configured"));
        }

        Ok(Self {
            config,
            errors_dir: paths.errors_dir(),
            temp_root: paths.temp_root.clone(),
            services,
        })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Process `tracks` into `output_dir`.
    ///
    /// Only setup failures (output or temp directory) are returned as
    /// errors; everything that happens to a track is in its outcome.
    /// Cancelling `cancel` stops admission of further tracks, and in-flight
    /// tracks stop as [`CancelMode`] says.
    pub async fn run(
        &self,
        tracks: Vec<Track>,
        output_dir: &Path,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(format!("creating output directory {:?}", output_dir))?;
        let workspace = RunWorkspace::create(self.temp_root.as_deref())
            .with_context("creating run workspace")?;

        tracing::info!(
            tracks = tracks.len(),
            threads = self.config.threads,
            format = %self.config.format,
            overwrite = ?self.config.overwrite,
            "Starting download run"
        );

        let pipeline = Arc::new(Pipeline {
            config: self.config.clone(),
            services: self.services.clone(),
            output_dir: output_dir.to_path_buf(),
            errors_dir: self.errors_dir.clone(),
            scratch: workspace.scratch_space(),
            gate: Semaphore::new(self.config.threads),
            cancel,
        });

        let turns = turns::assign(
            tracks
                .iter()
                .map(|track| file_tools::output_path(output_dir, track, self.config.format)),
        );

        let outcomes: Vec<TrackOutcome> = stream::iter(tracks.into_iter().zip(turns).enumerate())
            .map(|(index, (track, turn))| Arc::clone(&pipeline).admit(index, track, turn))
            .buffer_unordered(self.config.threads * SEARCH_AHEAD)
            .collect()
            .await;

        let retained = match workspace.finish() {
            Ok(retained) => retained,
            Err(e) => {
                tracing::warn!("Could not remove run workspace: {}", e);
                None
            }
        };

        let summary = RunSummary::new(outcomes, retained);
        tracing::info!(
            done = summary.done(),
            skipped = summary.skipped(),
            metadata_updated = summary.metadata_updated(),
            failed = summary.failed(),
            cancelled = summary.cancelled(),
            "Download run finished"
        );
        Ok(summary)
    }
}

/// Why a track left the pipeline early.
enum Halt {
    Failed(TrackStage, DownloadError),
    Cancelled(TrackStage),
}

/// Best search result and the provider that produced it.
struct Found {
    position: usize,
    provider: Arc<dyn AudioProvider>,
    result: SearchResult,
}

/// State shared by every worker of one run.
struct Pipeline {
    config: DownloadConfig,
    services: Services,
    output_dir: PathBuf,
    errors_dir: PathBuf,
    scratch: ScratchSpace,
    gate: Semaphore,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Run one track on its own task and turn whatever happens into an outcome.
    async fn admit(self: Arc<Self>, index: usize, track: Track, turn: Turn) -> TrackOutcome {
        if self.cancel.is_cancelled() {
            return TrackOutcome::new(
                index,
                track,
                TrackStatus::Cancelled {
                    stage: TrackStage::Queued,
                },
            );
        }

        let cell = Arc::new(StageCell::default());
        let worker = {
            let pipeline = Arc::clone(&self);
            let cell = Arc::clone(&cell);
            let track = track.clone();
            tokio::spawn(async move { pipeline.process(index, &track, &cell, turn).await })
        };

        let status = match worker.await {
            Ok(status) => status,
            Err(e) => TrackStatus::Failed {
                stage: cell.get(),
                error: DownloadError::Worker(e.to_string()),
            },
        };

        log_outcome(&track, &status);
        TrackOutcome::new(index, track, status)
    }

    async fn process(
        &self,
        index: usize,
        track: &Track,
        cell: &StageCell,
        mut turn: Turn,
    ) -> TrackStatus {
        match self.pipeline(index, track, cell, &mut turn).await {
            Ok(status) => status,
            Err(Halt::Failed(stage, error)) => TrackStatus::Failed { stage, error },
            Err(Halt::Cancelled(stage)) => TrackStatus::Cancelled { stage },
        }
    }

    async fn pipeline(
        &self,
        index: usize,
        track: &Track,
        cell: &StageCell,
        turn: &mut Turn,
    ) -> std::result::Result<TrackStatus, Halt> {
        let found = self
            .step(cell, TrackStage::Searching, self.search_from(track, 0))
            .await?;

        let destination = file_tools::output_path(&self.output_dir, track, self.config.format);
        let exists = self
            .step(cell, TrackStage::PolicyCheck, async {
                turn.wait().await;
                tokio::fs::try_exists(&destination)
                    .await
                    .map_err(|e| DownloadError::filesystem(&destination, e))
            })
            .await?;

        match self.config.overwrite.decide(exists) {
            PolicyAction::Skip => {
                return Ok(TrackStatus::Skipped { path: destination });
            }
            PolicyAction::MetadataOnly => {
                self.step(
                    cell,
                    TrackStage::Tagging,
                    self.tag(&destination, found.result.song()),
                )
                .await?;
                return Ok(TrackStatus::MetadataUpdated {
                    path: destination,
                    provider: found.result.provider.clone(),
                    quality: found.result.quality(),
                });
            }
            PolicyAction::Replace => {}
        }

        let permit = self.acquire_slot(cell).await?;
        let scratch = self
            .step(cell, TrackStage::Fetching, async {
                self.scratch
                    .track_dir(index)
                    .map_err(|e| DownloadError::filesystem(self.scratch.root(), e))
            })
            .await?;

        let download = self
            .step(
                cell,
                TrackStage::Fetching,
                self.fetch_with_fallback(track, found, scratch.path()),
            )
            .await?;
        let converted = self
            .step(
                cell,
                TrackStage::Converting,
                self.convert(&download, scratch.path()),
            )
            .await?;
        drop(permit);

        let song = download.song();
        if let Err(halt) = self
            .step(cell, TrackStage::Tagging, self.tag(&converted, song))
            .await
        {
            if matches!(halt, Halt::Failed(_, DownloadError::Tagging { .. })) {
                let kept = scratch.keep();
                tracing::warn!("Untagged file left in {:?}", kept);
            }
            return Err(halt);
        }

        self.step(
            cell,
            TrackStage::Placing,
            place(converted, destination.clone()),
        )
        .await?;

        Ok(TrackStatus::Done {
            path: destination,
            provider: download.result.provider.clone(),
            quality: download.result.quality(),
        })
    }

    /// Run one stage, honoring cancellation.
    async fn step<T>(
        &self,
        cell: &StageCell,
        stage: TrackStage,
        work: impl Future<Output = std::result::Result<T, DownloadError>>,
    ) -> std::result::Result<T, Halt> {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled(stage));
        }
        cell.set(stage);

        let outcome = match self.config.cancel_mode {
            CancelMode::FinishStage => work.await,
            CancelMode::Immediate => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Halt::Cancelled(stage)),
                outcome = work => outcome,
            },
        };
        outcome.map_err(|e| Halt::Failed(stage, e))
    }

    /// Wait for a fetch/convert slot.
    async fn acquire_slot(
        &self,
        cell: &StageCell,
    ) -> std::result::Result<SemaphorePermit<'_>, Halt> {
        cell.set(TrackStage::Fetching);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Halt::Cancelled(TrackStage::Fetching)),
            permit = self.gate.acquire() => permit.map_err(|e| {
                Halt::Failed(TrackStage::Fetching, DownloadError::Worker(e.to_string()))
            }),
        }
    }

    /// Ask providers from `start` on, in priority order, for their best match.
    ///
    /// Moves on only when a provider finds nothing or fails. All providers
    /// failing yields the last failure; any empty answer makes it NotFound.
    async fn search_from(
        &self,
        track: &Track,
        start: usize,
    ) -> std::result::Result<Found, DownloadError> {
        let mut last_error = None;
        let mut any_empty = false;

        for (position, provider) in self.services.registry.audio.iter().enumerate().skip(start) {
            match provider.search(track).await {
                Ok(results) => match results.into_iter().next() {
                    Some(result) => {
                        tracing::debug!(
                            track = %track.full_title(),
                            provider = provider.name(),
                            quality = ?result.quality(),
                            sum = result.match_result.sum(),
                            "Best candidate"
                        );
                        return Ok(Found {
                            position,
                            provider: Arc::clone(provider),
                            result,
                        });
                    }
                    None => {
                        tracing::debug!(
                            track = %track.full_title(),
                            provider = provider.name(),
                            "No candidates"
                        );
                        any_empty = true;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        track = %track.full_title(),
                        provider = provider.name(),
                        "Search failed: {}",
                        e
                    );
                    last_error = Some(DownloadError::Provider {
                        provider: provider.name().to_string(),
                        source: e,
                    });
                }
            }
        }

        match last_error {
            Some(e) if !any_empty => Err(e),
            _ => Err(DownloadError::NotFound),
        }
    }

    /// Fetch `found`, falling back to later providers' best matches when a
    /// fetch fails. The last fetch failure is reported if none succeed.
    async fn fetch_with_fallback(
        &self,
        track: &Track,
        mut found: Found,
        dest_dir: &Path,
    ) -> std::result::Result<Download, DownloadError> {
        loop {
            match found.provider.fetch(&found.result, dest_dir).await {
                Ok(download) => return Ok(download),
                Err(e) => {
                    tracing::warn!(
                        track = %track.full_title(),
                        provider = found.provider.name(),
                        "Fetch failed: {}",
                        e
                    );
                    let failure = DownloadError::Provider {
                        provider: found.provider.name().to_string(),
                        source: e,
                    };
                    match self.search_from(track, found.position + 1).await {
                        Ok(next) => found = next,
                        Err(_) => return Err(failure),
                    }
                }
            }
        }
    }

    /// Transcode the raw download and remove it.
    async fn convert(
        &self,
        download: &Download,
        dir: &Path,
    ) -> std::result::Result<PathBuf, DownloadError> {
        let format: AudioFormat = self.config.format;
        let output = dir.join(format!("converted.{}", format.extension()));
        let request = TranscodeRequest {
            input: download.path.clone(),
            output: output.clone(),
            format,
            bitrate: transcode::target_bitrate(
                self.config.bitrate.as_deref(),
                download.bitrate,
                self.config.preserve_original_audio,
            ),
        };

        if let Err(source) = self.services.transcoder.convert(&request).await {
            let report = match transcode::write_error_report(&self.errors_dir, &source) {
                Ok(path) => {
                    tracing::error!("Conversion failed, report written to {:?}", path);
                    Some(path)
                }
                Err(e) => {
                    tracing::error!("Conversion failed and the report could not be written: {}", e);
                    None
                }
            };
            return Err(DownloadError::Conversion { source, report });
        }

        tokio::fs::remove_file(&download.path)
            .await
            .map_err(|source| DownloadError::PossibleDuplicate {
                path: download.path.clone(),
                source,
            })?;

        Ok(output)
    }

    /// Embed `song`'s metadata, lyrics and cover into `path`.
    async fn tag(&self, path: &Path, song: &Track) -> std::result::Result<(), DownloadError> {
        let lyrics = if self.config.fetch_lyrics {
            self.find_lyrics(song).await
        } else {
            None
        };
        let cover = self.find_cover(song).await;

        let song = match lyrics {
            Some(text) => song.clone().with_lyrics(text),
            None => song.clone(),
        };
        let tagger = Arc::clone(&self.services.tagger);
        let target = path.to_path_buf();
        let written = tokio::task::spawn_blocking(move || {
            tagger.write(&target, &song, cover.as_ref(), song.lyrics.as_deref())
        })
        .await
        .map_err(|e| DownloadError::Worker(e.to_string()))?;

        written.map_err(|source| DownloadError::Tagging {
            source,
            kept_file: path.to_path_buf(),
        })
    }

    /// First lyrics any provider has for `song`. Failures are not fatal.
    async fn find_lyrics(&self, song: &Track) -> Option<String> {
        for provider in &self.services.registry.lyrics {
            let candidates = match provider.search(song).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "Lyrics search failed: {}", e);
                    continue;
                }
            };

            for candidate in candidates.iter().take(LYRICS_CANDIDATES) {
                match provider.get_lyrics(candidate).await {
                    Ok(Some(text)) => {
                        tracing::debug!(
                            track = %song.full_title(),
                            provider = provider.name(),
                            "Found lyrics"
                        );
                        return Some(text);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(provider = provider.name(), "Lyrics fetch failed: {}", e);
                    }
                }
            }
        }
        None
    }

    async fn find_cover(&self, song: &Track) -> Option<CoverImage> {
        if !self.config.embed_cover {
            return None;
        }
        let covers = self.services.covers.as_ref()?;
        let url = song.cover_url()?;

        match covers.fetch_cover(url).await {
            Ok(cover) => Some(cover),
            Err(e) => {
                tracing::warn!(track = %song.full_title(), "Cover download failed: {}", e);
                None
            }
        }
    }
}

/// Move the finished file to its final name.
async fn place(source: PathBuf, destination: PathBuf) -> std::result::Result<(), DownloadError> {
    let target = destination.clone();
    tokio::task::spawn_blocking(move || file_tools::move_file(&source, &target))
        .await
        .map_err(|e| DownloadError::Worker(e.to_string()))?
        .map_err(|e| DownloadError::filesystem(destination, e))
}

fn log_outcome(track: &Track, status: &TrackStatus) {
    let title = track.full_title();
    match status {
        TrackStatus::Done {
            path,
            provider,
            quality,
        } => tracing::info!(track = %title, provider, ?quality, "Downloaded to {:?}", path),
        TrackStatus::Skipped { path } => {
            tracing::info!(track = %title, "Skipped, {:?} already exists", path)
        }
        TrackStatus::MetadataUpdated { path, .. } => {
            tracing::info!(track = %title, "Updated tags of {:?}", path)
        }
        TrackStatus::Failed { stage, error } => {
            tracing::error!(track = %title, %stage, "Failed: {}", error)
        }
        TrackStatus::Cancelled { stage } => {
            tracing::info!(track = %title, %stage, "Cancelled")
        }
    }
}
