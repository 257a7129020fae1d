//! Per-track results and the run summary.

use std::path::{Path, PathBuf};

use crate::error::DownloadError;
use crate::library::Track;
use crate::matching::MatchQuality;

use super::stage::TrackStage;

/// Terminal state of one track.
#[derive(Debug)]
pub enum TrackStatus {
    /// Downloaded, converted, tagged and placed
    Done {
        path: PathBuf,
        provider: String,
        quality: MatchQuality,
    },
    /// Output existed and the policy said to leave it
    Skipped { path: PathBuf },
    /// Output existed; its tags were rewritten
    MetadataUpdated {
        path: PathBuf,
        provider: String,
        quality: MatchQuality,
    },
    Failed {
        stage: TrackStage,
        error: DownloadError,
    },
    /// Stopped by run cancellation before or during `stage`
    Cancelled { stage: TrackStage },
}

/// Result for one submitted track.
#[derive(Debug)]
pub struct TrackOutcome {
    /// Position in the submitted list
    pub index: usize,
    pub track: Track,
    pub status: TrackStatus,
}

impl TrackOutcome {
    pub fn new(index: usize, track: Track, status: TrackStatus) -> Self {
        Self {
            index,
            track,
            status,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TrackStatus::Failed { .. })
    }

    /// Final file for this track, if one exists.
    pub fn path(&self) -> Option<&Path> {
        match &self.status {
            TrackStatus::Done { path, .. }
            | TrackStatus::Skipped { path }
            | TrackStatus::MetadataUpdated { path, .. } => Some(path),
            TrackStatus::Failed { .. } | TrackStatus::Cancelled { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DownloadError> {
        match &self.status {
            TrackStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Everything a run produced, ordered by submission index.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<TrackOutcome>,
    /// Run directory left on disk because it holds untagged files
    pub retained_workspace: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(mut outcomes: Vec<TrackOutcome>, retained_workspace: Option<PathBuf>) -> Self {
        outcomes.sort_by_key(|o| o.index);
        Self {
            outcomes,
            retained_workspace,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn done(&self) -> usize {
        self.count(|s| matches!(s, TrackStatus::Done { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, TrackStatus::Skipped { .. }))
    }

    pub fn metadata_updated(&self) -> usize {
        self.count(|s| matches!(s, TrackStatus::MetadataUpdated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TrackStatus::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, TrackStatus::Cancelled { .. }))
    }

    fn count(&self, pred: impl Fn(&TrackStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Artist;

    fn track(name: &str) -> Track {
        Track::new(name, vec![Artist::new("piri")], 200.0)
    }

    #[test]
    fn test_summary_sorts_and_counts() {
        let outcomes = vec![
            TrackOutcome::new(
                2,
                track("c"),
                TrackStatus::Failed {
                    stage: TrackStage::Searching,
                    error: DownloadError::NotFound,
                },
            ),
            TrackOutcome::new(
                0,
                track("a"),
                TrackStatus::Done {
                    path: PathBuf::from("/out/a.mp3"),
                    provider: "yt-dlp".to_string(),
                    quality: MatchQuality::Perfect,
                },
            ),
            TrackOutcome::new(
                1,
                track("b"),
                TrackStatus::Skipped {
                    path: PathBuf::from("/out/b.mp3"),
                },
            ),
            TrackOutcome::new(
                3,
                track("d"),
                TrackStatus::Cancelled {
                    stage: TrackStage::Queued,
                },
            ),
        ];

        let summary = RunSummary::new(outcomes, None);
        let order: Vec<_> = summary.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary.done(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.cancelled(), 1);
        assert_eq!(summary.metadata_updated(), 0);
    }

    #[test]
    fn test_outcome_accessors() {
        let done = TrackOutcome::new(
            0,
            track("a"),
            TrackStatus::Skipped {
                path: PathBuf::from("/out/a.mp3"),
            },
        );
        assert_eq!(done.path(), Some(Path::new("/out/a.mp3")));
        assert!(done.error().is_none());
        assert!(!done.is_failed());

        let failed = TrackOutcome::new(
            0,
            track("a"),
            TrackStatus::Failed {
                stage: TrackStage::Fetching,
                error: DownloadError::NotFound,
            },
        );
        assert!(failed.is_failed());
        assert!(failed.path().is_none());
        assert!(matches!(failed.error(), Some(DownloadError::NotFound)));
    }
}
