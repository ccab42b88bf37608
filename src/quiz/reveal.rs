use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1000);

/// Runs a follow-up action once the reveal delay has elapsed.
///
/// The pending action is aborted when the timer is cancelled or dropped, so
/// tearing down the owner of the timer tears down the action with it.
#[derive(Debug)]
pub struct RevealTimer {
    handle: JoinHandle<()>,
}

impl RevealTimer {
    pub fn start<F>(delay: Duration, on_elapsed: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_elapsed.await;
        });
        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
