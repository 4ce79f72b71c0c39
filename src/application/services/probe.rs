//! Detached, cancellable probe handles.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::domain::errors::ProbeError;
use crate::domain::ports::{ImageProbePort, ProbedImage};

/// Receives the probe outcome, at most once.
pub type ProbeCompletion = Box<dyn FnOnce(Result<ProbedImage, ProbeError>) + Send>;

/// One in-flight fetch of one URL.
///
/// Cancelling first takes the completion out of its slot and only then
/// aborts the fetch task, so nothing the abort provokes can reach the owner.
/// Dropping a probe cancels it.
pub struct Probe {
    url: String,
    completion: Arc<Mutex<Option<ProbeCompletion>>>,
    task: Option<JoinHandle<()>>,
}

impl Probe {
    /// Spawns a fetch of `url` on the current runtime.
    #[must_use]
    pub fn start(port: Arc<dyn ImageProbePort>, url: String, completion: ProbeCompletion) -> Self {
        let completion = Arc::new(Mutex::new(Some(completion)));

        let slot = Arc::clone(&completion);
        let task_url = url.clone();
        let task = tokio::spawn(async move {
            let outcome = port.fetch(&task_url).await;
            let handler = slot.lock().take();
            match handler {
                Some(handler) => handler(outcome),
                None => trace!(url = %task_url, "Probe settled after cancellation"),
            }
        });

        Self {
            url,
            completion,
            task: Some(task),
        }
    }

    /// True while the outcome can still be delivered.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.completion.lock().is_some()
    }

    /// Detaches the completion, then stops the fetch. Idempotent.
    pub fn cancel(&mut self) {
        let detached = self.completion.lock().take().is_some();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if detached {
            trace!(url = %self.url, "Probe cancelled");
        }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("url", &self.url)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockImageProbe;
    use tokio::sync::mpsc;

    fn channel_completion() -> (
        ProbeCompletion,
        mpsc::UnboundedReceiver<Result<ProbedImage, ProbeError>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
            rx,
        )
    }

    #[tokio::test]
    async fn test_probe_delivers_outcome() {
        let port = Arc::new(MockImageProbe::new());
        port.succeed("b.jpg");
        let (completion, mut rx) = channel_completion();

        let probe = Probe::start(port.clone(), "b.jpg".to_string(), completion);
        let outcome = rx.recv().await.expect("outcome delivered");

        assert_eq!(outcome.map(|img| img.url), Ok("b.jpg".to_string()));
        assert!(!probe.is_pending());
    }

    #[tokio::test]
    async fn test_cancelled_probe_never_delivers() {
        let port = Arc::new(MockImageProbe::new());
        let (completion, mut rx) = channel_completion();

        let mut probe = Probe::start(port.clone(), "b.jpg".to_string(), completion);
        tokio::task::yield_now().await;
        assert!(probe.is_pending());

        probe.cancel();
        port.succeed("b.jpg");
        tokio::task::yield_now().await;

        assert!(!probe.is_pending());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let port = Arc::new(MockImageProbe::new());
        let (completion, mut rx) = channel_completion();

        drop(Probe::start(port.clone(), "b.jpg".to_string(), completion));
        port.fail("b.jpg");
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
    }
}
