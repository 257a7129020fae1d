//! Pipeline stages a track moves through.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Non-terminal stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TrackStage {
    Queued,
    Searching,
    PolicyCheck,
    Fetching,
    Converting,
    Tagging,
    Placing,
}

impl TrackStage {
    const ALL: [TrackStage; 7] = [
        TrackStage::Queued,
        TrackStage::Searching,
        TrackStage::PolicyCheck,
        TrackStage::Fetching,
        TrackStage::Converting,
        TrackStage::Tagging,
        TrackStage::Placing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackStage::Queued => "queued",
            TrackStage::Searching => "searching",
            TrackStage::PolicyCheck => "policy check",
            TrackStage::Fetching => "fetching",
            TrackStage::Converting => "converting",
            TrackStage::Tagging => "tagging",
            TrackStage::Placing => "placing",
        }
    }
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last stage a worker entered, readable after the worker is gone.
#[derive(Debug, Default)]
pub(crate) struct StageCell(AtomicU8);

impl StageCell {
    pub fn set(&self, stage: TrackStage) {
        self.0.store(stage as u8, Ordering::Relaxed);
    }

    pub fn get(&self) -> TrackStage {
        let raw = self.0.load(Ordering::Relaxed) as usize;
        TrackStage::ALL.get(raw).copied().unwrap_or(TrackStage::Queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_cell_roundtrip() {
        let cell = StageCell::default();
        assert_eq!(cell.get(), TrackStage::Queued);
        for stage in TrackStage::ALL {
            cell.set(stage);
            assert_eq!(cell.get(), stage);
        }
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(TrackStage::Searching < TrackStage::Fetching);
        assert!(TrackStage::Tagging < TrackStage::Placing);
    }
}
