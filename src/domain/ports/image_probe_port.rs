//! Port definition for detached image fetches.

use async_trait::async_trait;

use crate::domain::errors::ProbeError;

/// Outcome of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedImage {
    /// URL that was fetched.
    pub url: String,
    /// Decoded width in pixels, never zero.
    pub natural_width: u32,
    /// Decoded height in pixels.
    pub natural_height: u32,
}

/// Port for triggering and observing image fetches without rendering them.
#[async_trait]
pub trait ImageProbePort: Send + Sync {
    /// Synchronous check: is `url` already fully available with a nonzero width?
    fn is_complete(&self, url: &str) -> bool;

    /// Fetches and decodes `url`. The caller never awaits this inline; it is
    /// driven from a detached task.
    async fn fetch(&self, url: &str) -> Result<ProbedImage, ProbeError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    type Outcome = Result<ProbedImage, ProbeError>;

    /// Probe whose fetches stay pending until the test resolves them.
    #[derive(Default)]
    pub struct MockImageProbe {
        complete: Mutex<HashSet<String>>,
        preset: Mutex<HashMap<String, Outcome>>,
        pending: Mutex<HashMap<String, Vec<oneshot::Sender<Outcome>>>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockImageProbe {
        /// Creates a probe with nothing complete and nothing resolved.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes `is_complete(url)` report true.
        pub fn mark_complete(&self, url: &str) {
            self.complete.lock().insert(url.to_string());
        }

        /// Resolves every fetch of `url` successfully.
        pub fn succeed(&self, url: &str) {
            self.resolve(
                url,
                Ok(ProbedImage {
                    url: url.to_string(),
                    natural_width: 800,
                    natural_height: 600,
                }),
            );
        }

        /// Fails every fetch of `url`.
        pub fn fail(&self, url: &str) {
            self.resolve(url, Err(ProbeError::Status { status: 404 }));
        }

        /// Delivers `outcome` to pending fetches of `url`, or to the next one.
        pub fn resolve(&self, url: &str, outcome: Outcome) {
            let waiters = self.pending.lock().remove(url).unwrap_or_default();
            if waiters.is_empty() {
                self.preset.lock().insert(url.to_string(), outcome);
                return;
            }
            for tx in waiters {
                let _ = tx.send(outcome.clone());
            }
        }

        /// URLs fetched so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ImageProbePort for MockImageProbe {
        fn is_complete(&self, url: &str) -> bool {
            self.complete.lock().contains(url)
        }

        async fn fetch(&self, url: &str) -> Result<ProbedImage, ProbeError> {
            self.requests.lock().push(url.to_string());
            if let Some(outcome) = self.preset.lock().remove(url) {
                return outcome;
            }
            let (tx, rx) = oneshot::channel();
            self.pending
                .lock()
                .entry(url.to_string())
                .or_default()
                .push(tx);
            rx.await
                .unwrap_or_else(|_| Err(ProbeError::network("mock probe dropped")))
        }
    }
}
