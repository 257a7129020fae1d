//! Ordering for tracks that resolve to the same output file.
//!
//! A batch can list one song more than once. Those tracks must not race each
//! other between the policy check and placement, so each one waits for the
//! previous track with the same destination to finish. The first occurrence
//! in input order always goes first.

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::oneshot;

/// One track's place in line for its destination.
///
/// Dropping it, however the track ends, lets the next track through.
#[derive(Debug)]
pub(crate) struct Turn {
    previous: Option<oneshot::Receiver<()>>,
    _release: oneshot::Sender<()>,
}

impl Turn {
    /// Wait until the previous track with this destination is finished.
    pub(crate) async fn wait(&mut self) {
        if let Some(previous) = self.previous.as_mut() {
            // A dropped sender is the signal.
            let _ = previous.await;
            self.previous = None;
        }
    }

    #[cfg(test)]
    fn is_first(&self) -> bool {
        self.previous.is_none()
    }
}

/// Build one turn per key, chaining equal keys in iteration order.
pub(crate) fn assign<K: Eq + Hash>(keys: impl IntoIterator<Item = K>) -> Vec<Turn> {
    let mut last: HashMap<K, oneshot::Receiver<()>> = HashMap::new();
    keys.into_iter()
        .map(|key| {
            let (release, done) = oneshot::channel();
            Turn {
                previous: last.insert(key, done),
                _release: release,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_distinct_keys_never_wait() {
        let turns = assign(["a", "b", "c"]);
        assert!(turns.iter().all(Turn::is_first));
    }

    #[test]
    fn test_repeated_keys_are_chained() {
        let turns = assign(["a", "b", "a", "a"]);
        let first: Vec<bool> = turns.iter().map(Turn::is_first).collect();
        assert_eq!(first, vec![true, true, false, false]);
    }

    #[tokio::test]
    async fn test_wait_releases_when_previous_drops() {
        let mut turns = assign(["a", "a"]).into_iter();
        let first = turns.next().unwrap();
        let mut second = turns.next().unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), second.wait()).await;
        assert!(waited.is_err());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), second.wait())
            .await
            .unwrap();
    }
}
