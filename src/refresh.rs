//! Background install-state refresh.
//!
//! Checking the whole curated list spawns a pacman query per app, which is
//! far too slow for the interactive loop. The coordinator runs that work on a
//! blocking worker and delivers the result over a channel. At most one worker
//! exists at a time: a new request waits for the previous worker to finish
//! before starting, so two checks never run concurrently.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::package::{SystemProbe, resolver};
use crate::ui::prelude::*;

/// Which subset of the list a refresh computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshView {
    /// Apps that are not installed yet (installer view)
    Missing,
    /// Apps that are installed (uninstaller view)
    Installed,
}

impl RefreshView {
    fn wants_installed(self) -> bool {
        matches!(self, RefreshView::Installed)
    }
}

/// Result published by a finished worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshUpdate {
    pub generation: u64,
    pub view: RefreshView,
    pub apps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// No worker was running
    Idle,
    /// The worker stopped within the grace period
    Finished,
    /// The worker was still blocked when the grace period ran out
    Abandoned,
}

struct InFlight {
    generation: u64,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct RefreshCoordinator {
    probe: Arc<dyn SystemProbe>,
    slot: Option<InFlight>,
    next_generation: u64,
    updates: mpsc::UnboundedSender<RefreshUpdate>,
}

impl RefreshCoordinator {
    /// Create a coordinator and the receiving end of its update channel
    pub fn new(probe: Arc<dyn SystemProbe>) -> (Self, mpsc::UnboundedReceiver<RefreshUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                probe,
                slot: None,
                next_generation: 1,
                updates,
            },
            rx,
        )
    }

    pub fn is_running(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|inflight| !inflight.handle.is_finished())
    }

    /// Start a refresh of `names` and return its generation number.
    ///
    /// If a previous worker is still running this waits for it to finish
    /// first; its result is still delivered, tagged with its own generation.
    pub async fn request(&mut self, names: Vec<String>, view: RefreshView) -> u64 {
        self.join_in_flight().await;

        let generation = self.next_generation;
        self.next_generation += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&self.probe);
        let updates = self.updates.clone();
        let worker_cancel = Arc::clone(&cancel);

        emit(
            Level::Debug,
            "refresh.start",
            &format!(
                "{} Refresh #{} started for {} apps",
                char::from(NerdFont::Refresh),
                generation,
                names.len()
            ),
            Some(json!({ "generation": generation, "view": view, "count": names.len() })),
        );

        let handle = tokio::task::spawn_blocking(move || {
            let result = resolver::retain_by_state(
                probe.as_ref(),
                &names,
                view.wants_installed(),
                || worker_cancel.load(Ordering::SeqCst),
            );
            // A cancelled worker publishes nothing, even if it completed
            if worker_cancel.load(Ordering::SeqCst) {
                return;
            }
            if let Some(apps) = result {
                let _ = updates.send(RefreshUpdate {
                    generation,
                    view,
                    apps,
                });
            }
        });

        self.slot = Some(InFlight {
            generation,
            cancel,
            handle,
        });
        generation
    }

    /// Request a refresh and wait for its result
    pub async fn refresh_now(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<RefreshUpdate>,
        names: Vec<String>,
        view: RefreshView,
    ) -> Option<RefreshUpdate> {
        let generation = self.request(names, view).await;
        while let Some(update) = rx.recv().await {
            if update.generation == generation {
                return Some(update);
            }
        }
        None
    }

    /// Cancel the running worker and wait at most `grace` for it to stop.
    ///
    /// A worker blocked inside a package query cannot observe the cancel flag
    /// until the query returns; past the grace period it is abandoned and
    /// its result discarded.
    pub async fn shutdown(&mut self, grace: Duration) -> ShutdownOutcome {
        let Some(inflight) = self.slot.take() else {
            return ShutdownOutcome::Idle;
        };

        inflight.cancel.store(true, Ordering::SeqCst);
        let abort = inflight.handle.abort_handle();

        match tokio::time::timeout(grace, inflight.handle).await {
            Ok(_) => ShutdownOutcome::Finished,
            Err(_) => {
                abort.abort();
                emit(
                    Level::Warn,
                    "refresh.abandoned",
                    &format!(
                        "{} Refresh #{} did not stop within {:?}, abandoning it",
                        char::from(NerdFont::Warning),
                        inflight.generation,
                        grace
                    ),
                    Some(json!({ "generation": inflight.generation })),
                );
                ShutdownOutcome::Abandoned
            }
        }
    }

    async fn join_in_flight(&mut self) {
        if let Some(inflight) = self.slot.take()
            && let Err(err) = inflight.handle.await
        {
            emit(
                Level::Warn,
                "refresh.worker_failed",
                &format!("Refresh #{} failed: {}", inflight.generation, err),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::package::fakes::FakeProbe;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Wraps a probe, sleeps on every query and tracks how many queries
    /// overlap
    struct SlowProbe {
        inner: FakeProbe,
        delay: Duration,
        active: AtomicUsize,
        max_active: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl SlowProbe {
        fn new(inner: FakeProbe, delay: Duration) -> Self {
            Self {
                inner,
                delay,
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SystemProbe for SlowProbe {
        fn backend_present(&self, program: &str) -> bool {
            self.inner.backend_present(program)
        }

        fn query_succeeds(&self, program: &str, args: &[&str]) -> bool {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            if let Some(pkg) = args.last() {
                self.seen.lock().unwrap().push(pkg.to_string());
            }
            std::thread::sleep(self.delay);
            let answer = self.inner.query_succeeds(program, args);
            self.active.fetch_sub(1, Ordering::SeqCst);
            answer
        }

        fn query_lines(&self, program: &str, args: &[&str]) -> Vec<String> {
            self.inner.query_lines(program, args)
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_missing_apps() {
        let probe = FakeProbe::new().with_installed("pacman", "git");
        let (mut coordinator, mut rx) = RefreshCoordinator::new(Arc::new(probe));

        let update = coordinator
            .refresh_now(&mut rx, names(&["zed", "git", "btop"]), RefreshView::Missing)
            .await
            .unwrap();

        assert_eq!(update.generation, 1);
        assert_eq!(update.apps, names(&["zed", "btop"]));
    }

    #[tokio::test]
    async fn test_installed_view() {
        let probe = FakeProbe::new().with_installed("pacman", "git");
        let (mut coordinator, mut rx) = RefreshCoordinator::new(Arc::new(probe));

        let update = coordinator
            .refresh_now(&mut rx, names(&["zed", "git"]), RefreshView::Installed)
            .await
            .unwrap();
        assert_eq!(update.view, RefreshView::Installed);
        assert_eq!(update.apps, names(&["git"]));
    }

    #[tokio::test]
    async fn test_second_request_waits_for_first() {
        let probe = Arc::new(SlowProbe::new(
            FakeProbe::new().with_installed("pacman", "b"),
            Duration::from_millis(20),
        ));
        let (mut coordinator, mut rx) = RefreshCoordinator::new(probe.clone());

        let first = coordinator
            .request(names(&["a", "b", "c"]), RefreshView::Missing)
            .await;
        let second = coordinator
            .request(names(&["d", "e"]), RefreshView::Missing)
            .await;
        assert!(second > first);

        let one = rx.recv().await.unwrap();
        let two = rx.recv().await.unwrap();
        assert_eq!(one.generation, first);
        assert_eq!(one.apps, names(&["a", "c"]));
        assert_eq!(two.generation, second);
        assert_eq!(two.apps, names(&["d", "e"]));

        assert_eq!(probe.max_active.load(Ordering::SeqCst), 1);
        let seen = probe.seen.lock().unwrap().clone();
        let first_d = seen.iter().position(|p| p == "d").unwrap();
        let last_c = seen.iter().rposition(|p| p == "c").unwrap();
        assert!(last_c < first_d);
    }

    #[tokio::test]
    async fn test_shutdown_without_worker_is_idle() {
        let (mut coordinator, _rx) = RefreshCoordinator::new(Arc::new(FakeProbe::new()));
        assert_eq!(
            coordinator.shutdown(Duration::from_millis(10)).await,
            ShutdownOutcome::Idle
        );
    }

    #[tokio::test]
    async fn test_cancelled_worker_publishes_nothing() {
        let probe = Arc::new(SlowProbe::new(FakeProbe::new(), Duration::from_millis(10)));
        let (mut coordinator, mut rx) = RefreshCoordinator::new(probe);

        coordinator
            .request(names(&["a", "b", "c", "d", "e", "f"]), RefreshView::Missing)
            .await;
        let outcome = coordinator.shutdown(Duration::from_secs(5)).await;

        assert_eq!(outcome, ShutdownOutcome::Finished);
        assert!(!coordinator.is_running());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_is_bounded_when_worker_blocks() {
        let probe = Arc::new(SlowProbe::new(FakeProbe::new(), Duration::from_millis(300)));
        let (mut coordinator, mut rx) = RefreshCoordinator::new(probe);

        coordinator
            .request(names(&["a", "b"]), RefreshView::Missing)
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let outcome = coordinator.shutdown(Duration::from_millis(50)).await;

        assert_eq!(outcome, ShutdownOutcome::Abandoned);
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(rx.try_recv().is_err());
    }
}
