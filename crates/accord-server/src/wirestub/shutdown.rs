//! Graceful drain of a listener's in-flight connections.
//!
//! Each connection task watches the listener's shutdown channel and asks hyper
//! to finish the current exchange before closing. [`drain`] then waits for
//! those tasks, aborting whatever is left once the timeout elapses.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Sender half used by the manager to stop a listener.
#[derive(Debug)]
pub(crate) struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub(crate) fn trigger(&self) {
        // No receivers means the listener already exited.
        let _ = self.tx.send(true);
    }
}

/// Resolves once shutdown was requested or the trigger was dropped.
pub(crate) async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        let stopped = *rx.borrow_and_update();
        if stopped || rx.changed().await.is_err() {
            return;
        }
    }
}

/// Wait for every connection task; abort the rest after `timeout`.
///
/// Returns `true` if all connections finished on their own.
pub(crate) async fn drain(connections: &mut JoinSet<()>, timeout: Duration) -> bool {
    let pending = connections.len();
    if pending == 0 {
        return true;
    }
    debug!("Draining {} connection(s)", pending);

    let finished = tokio::time::timeout(timeout, async {
        while connections.join_next().await.is_some() {}
    })
    .await
    .is_ok();

    if !finished {
        warn!(
            "Shutdown timeout after {:?}, aborting {} connection(s)",
            timeout,
            connections.len()
        );
        connections.shutdown().await;
    }
    finished
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_quick_tasks() {
        let mut set = JoinSet::new();
        set.spawn(async { tokio::time::sleep(Duration::from_millis(10)).await });
        assert!(drain(&mut set, Duration::from_secs(1)).await);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_drain_aborts_after_timeout() {
        let mut set = JoinSet::new();
        set.spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });
        assert!(!drain(&mut set, Duration::from_millis(20)).await);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let (trigger, mut rx) = ShutdownTrigger::new();
        let waiter = tokio::spawn(async move { wait_for_shutdown(&mut rx).await });
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
