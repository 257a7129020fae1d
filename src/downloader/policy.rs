//! What to do when a track's output file is already there.

use serde::{Deserialize, Serialize};

/// Configured overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Leave existing files alone
    #[default]
    Skip,
    /// Rewrite tags on existing files without downloading again
    Metadata,
    /// Always download and replace
    Force,
}

/// Decision for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Skip,
    MetadataOnly,
    Replace,
}

impl OverwritePolicy {
    pub fn decide(self, exists: bool) -> PolicyAction {
        match (self, exists) {
            (OverwritePolicy::Skip, true) => PolicyAction::Skip,
            (OverwritePolicy::Metadata, true) => PolicyAction::MetadataOnly,
            (OverwritePolicy::Force, _) | (_, false) => PolicyAction::Replace,
        }
    }
}

/// How in-flight tracks react to cancellation.
///
/// Either way no new track is admitted once the run is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CancelMode {
    /// Let the current stage finish, then stop before the next one
    #[default]
    FinishStage,
    /// Abort the current stage right away, killing child processes
    Immediate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_always_replaces() {
        for policy in [OverwritePolicy::Skip, OverwritePolicy::Metadata, OverwritePolicy::Force] {
            assert_eq!(policy.decide(false), PolicyAction::Replace);
        }
    }

    #[test]
    fn test_existing_file() {
        assert_eq!(OverwritePolicy::Skip.decide(true), PolicyAction::Skip);
        assert_eq!(OverwritePolicy::Metadata.decide(true), PolicyAction::MetadataOnly);
        assert_eq!(OverwritePolicy::Force.decide(true), PolicyAction::Replace);
    }

    #[test]
    fn test_default_is_skip() {
        assert_eq!(OverwritePolicy::default(), OverwritePolicy::Skip);
        assert_eq!(CancelMode::default(), CancelMode::FinishStage);
    }
}
