use crate::error::Result;
use crate::lastfm::MetadataService;
use crate::store::ArtistStore;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// One unit of persistence work: fetch and store a single artist.
#[derive(Debug, Clone)]
pub struct PersistTask {
    pub artist: String,
}

/// Result of one finished persist task.
///
/// Outcomes are delivered on a channel whether or not anyone listens; the
/// default crawl only drains them for the final report, but a hardened
/// deployment can attach retry or alerting logic here.
#[derive(Debug)]
pub struct TaskOutcome {
    pub artist: String,
    pub result: Result<()>,
}

/// Fetch the detail snapshot for `artist` and write it to the store.
///
/// The two steps a pool worker runs per task. A failure in either step is
/// returned to the worker, which logs and drops it: the artist stays claimed
/// and is never retried.
pub async fn persist_artist<S: MetadataService>(
    service: &S,
    store: &ArtistStore,
    artist: &str,
) -> Result<()> {
    let snapshot = service.artist_detail(artist).await?;
    store.put_snapshot(artist, &snapshot).await?;
    Ok(())
}

/// Fixed-size pool of persist workers draining a shared task queue.
///
/// The queue is unbounded, so submission never blocks the walker. Tasks run
/// in no particular order relative to submission or to traversal progress;
/// the only coordination with the walker is that every submitted artist
/// already passed the visited registry, so no two tasks ever target the
/// same store key.
pub struct SnapshotPool {
    tx: mpsc::UnboundedSender<PersistTask>,
    workers: JoinSet<()>,
    outcome_rx: Option<mpsc::UnboundedReceiver<TaskOutcome>>,
}

impl SnapshotPool {
    /// Spawn `workers` persist workers (at least one) sharing `service` and
    /// `store`.
    pub fn spawn<S: MetadataService>(
        service: Arc<S>,
        store: Arc<ArtistStore>,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<PersistTask>();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<TaskOutcome>();
        let rx = Arc::new(Mutex::new(rx));

        let mut set = JoinSet::new();
        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let service = service.clone();
            let store = store.clone();
            let outcome_tx = outcome_tx.clone();

            set.spawn(async move {
                loop {
                    // Lock only to receive, so workers don't serialize on
                    // each other's fetches.
                    let task = { rx.lock().await.recv().await };
                    let Some(task) = task else { break };

                    let result = persist_artist(service.as_ref(), store.as_ref(), &task.artist).await;
                    match &result {
                        Ok(()) => {
                            log::debug!("worker {}: persisted '{}'", worker_id, task.artist)
                        }
                        Err(e) => {
                            log::warn!("worker {}: dropping '{}': {}", worker_id, task.artist, e)
                        }
                    }

                    // Outcomes are advisory; a dropped receiver is fine.
                    let _ = outcome_tx.send(TaskOutcome {
                        artist: task.artist,
                        result,
                    });
                }
            });
        }

        Self {
            tx,
            workers: set,
            outcome_rx: Some(outcome_rx),
        }
    }

    /// Enqueue a task. Never blocks; the send only fails once the pool has
    /// been closed, at which point the task is discarded.
    pub fn submit(&self, task: PersistTask) {
        if let Err(e) = self.tx.send(task) {
            log::debug!("pool closed; discarding task for '{}'", e.0.artist);
        }
    }

    /// Take the outcome receiver. Returns `None` if already taken.
    pub fn take_outcomes(&mut self) -> Option<mpsc::UnboundedReceiver<TaskOutcome>> {
        self.outcome_rx.take()
    }

    /// Close the queue and wait for every worker to finish its remaining
    /// tasks.
    pub async fn close_and_join(self) {
        let Self {
            tx,
            mut workers,
            outcome_rx,
        } = self;
        drop(tx);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                log::warn!("persist worker failed to join: {}", e);
            }
        }
        drop(outcome_rx);
    }
}
