use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwap;
use engine_logging::{engine_info, engine_warn};
use refresher_core::{update, CycleOutcome, Effect, Msg, SchedulerState, SchedulerStats};
use tokio::sync::watch;

use crate::lookup::PublishedLookup;
use crate::navigate::ReqwestNavigator;
use crate::persist::SnapshotStore;
use crate::pipeline::Refresher;
use crate::settings::{RefreshSettings, MIN_REFRESH_INTERVAL};
use crate::user_agent::UserAgentPool;

const THREAD_NAME: &str = "api-details-refresher";

/// Handle to the background refresh thread.
///
/// The thread owns a single-threaded tokio runtime and runs at most one
/// cycle at a time. Dropping the handle signals stop without waiting.
pub struct RefreshScheduler {
    refresher: Arc<Refresher>,
    stats: Arc<ArcSwap<SchedulerStats>>,
    stop_tx: watch::Sender<bool>,
    done_rx: mpsc::Receiver<()>,
    thread: Option<thread::JoinHandle<()>>,
    stop_wait: Duration,
}

impl RefreshScheduler {
    /// Start refreshing now, then every `interval` (at least [`MIN_REFRESH_INTERVAL`]).
    pub fn start(refresher: Refresher, interval: Duration, stop_wait: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self::launch(refresher, interval, stop_wait, stop_tx, stop_rx)
    }

    fn launch(
        refresher: Refresher,
        interval: Duration,
        stop_wait: Duration,
        stop_tx: watch::Sender<bool>,
        stop_rx: watch::Receiver<bool>,
    ) -> io::Result<Self> {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let refresher = Arc::new(refresher);
        let stats = Arc::new(ArcSwap::from_pointee(SchedulerStats::default()));
        let (done_tx, done_rx) = mpsc::channel();

        let thread = {
            let refresher = Arc::clone(&refresher);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || {
                    runtime.block_on(drive(refresher, interval, stop_rx, stats));
                    // Waits for any snapshot write still on the blocking pool.
                    drop(runtime);
                    let _ = done_tx.send(());
                })?
        };

        engine_info!("API details refresher started, interval {:?}", interval);
        Ok(Self {
            refresher,
            stats,
            stop_tx,
            done_rx,
            thread: Some(thread),
            stop_wait,
        })
    }

    /// Wire the real navigator and an optional snapshot directory from settings.
    pub fn start_with_settings(
        settings: RefreshSettings,
        lookup: Arc<PublishedLookup>,
        snapshot_dir: Option<PathBuf>,
    ) -> io::Result<Self> {
        let interval = settings.interval;
        let stop_wait = settings.stop_wait;
        let operations = settings.operations.clone();
        let navigator = ReqwestNavigator::new(settings, UserAgentPool::default());
        let refresher = Refresher::new(
            Arc::new(navigator),
            lookup,
            snapshot_dir.map(SnapshotStore::new),
            operations,
        );
        Self::start(refresher, interval, stop_wait)
    }

    pub fn lookup(&self) -> &Arc<PublishedLookup> {
        self.refresher.lookup()
    }

    pub fn stats(&self) -> SchedulerStats {
        **self.stats.load()
    }

    pub fn last_snapshot_path(&self) -> Option<PathBuf> {
        self.refresher.last_snapshot_path()
    }

    /// Ask the loop to stop after the current cycle, if any, without waiting.
    pub fn signal_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Signal stop and wait up to the configured bound for the thread to exit.
    ///
    /// Returns `false` if a cycle was still in flight when the wait ran out;
    /// the thread then finishes on its own.
    pub fn stop(&mut self) -> bool {
        self.signal_stop();
        match self.done_rx.recv_timeout(self.stop_wait) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.thread.take() {
                    let _ = handle.join();
                }
                engine_info!("API details refresher stopped");
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                engine_warn!(
                    "API details refresher still busy after {:?}; not waiting further",
                    self.stop_wait
                );
                false
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

async fn drive(
    refresher: Arc<Refresher>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    stats: Arc<ArcSwap<SchedulerStats>>,
) {
    let mut state = SchedulerState::new();
    let mut pending = VecDeque::from([Msg::StartRequested]);

    while let Some(msg) = pending.pop_front() {
        let (next, effects) = update(state, msg);
        state = next;
        stats.store(Arc::new(state.stats()));

        for effect in effects {
            match effect {
                Effect::RunCycle => {
                    if *stop_rx.borrow() {
                        engine_info!("Stop requested before the cycle began; skipping it");
                        pending.push_back(Msg::StopRequested);
                        pending.push_back(Msg::CycleFinished(CycleOutcome::Skipped));
                        continue;
                    }
                    let outcome = match refresher.refresh_once().await {
                        Ok(report) => CycleOutcome::Succeeded {
                            modules: report.module_count,
                        },
                        Err(_) => CycleOutcome::Failed,
                    };
                    // A stop that arrived mid-cycle is delivered before the completion.
                    if *stop_rx.borrow() {
                        pending.push_back(Msg::StopRequested);
                    }
                    pending.push_back(Msg::CycleFinished(outcome));
                }
                Effect::WaitForTick => {
                    let current = state.stats();
                    engine_info!(
                        "Waiting for {:?} before refreshing again ({} ok, {} failed, {} consecutive failures)",
                        interval,
                        current.successful_cycles,
                        current.failed_cycles,
                        current.consecutive_failures
                    );
                    pending.push_back(wait_for_tick(interval, &mut stop_rx).await);
                }
                Effect::Shutdown => {
                    engine_info!("API details refresher loop exiting");
                    return;
                }
            }
        }
    }
}

async fn wait_for_tick(interval: Duration, stop_rx: &mut watch::Receiver<bool>) -> Msg {
    if *stop_rx.borrow_and_update() {
        return Msg::StopRequested;
    }
    tokio::select! {
        _ = tokio::time::sleep(interval) => Msg::TimerElapsed,
        // A dropped sender counts as a stop.
        _ = stop_rx.changed() => Msg::StopRequested,
    }
}
