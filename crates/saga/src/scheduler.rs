//! Keyed serial execution.
//!
//! The scheduler owns a fixed set of lanes. Each lane is a FIFO queue
//! drained by one Tokio task, and a pair key always maps to the same lane,
//! so work for one pair runs strictly one task at a time in submission
//! order. Different pairs usually land on different lanes and run in
//! parallel. Nothing is ordered across lanes.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use common::PairKey;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, SagaError};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Serializes tasks per pair key over a fixed number of lanes.
#[derive(Clone)]
pub struct AffinityScheduler {
    lanes: Vec<mpsc::UnboundedSender<Job>>,
}

impl AffinityScheduler {
    /// Starts `lane_count` lanes (at least one).
    ///
    /// Must be called from within a Tokio runtime. Lanes stop once every
    /// clone of the scheduler has been dropped and their queues drained.
    pub fn new(lane_count: usize) -> Self {
        let lanes = (0..lane_count.max(1))
            .map(|lane| {
                let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
                tokio::spawn(async move {
                    while let Some(job) = rx.recv().await {
                        job.await;
                    }
                    tracing::debug!(lane, "affinity lane stopped");
                });
                tx
            })
            .collect();

        Self { lanes }
    }

    /// Returns the number of lanes.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Returns the lane index serving `key`.
    pub fn lane_for(&self, key: PairKey) -> usize {
        (key.stable_hash() % self.lanes.len() as u64) as usize
    }

    /// Runs `task` on the lane of `key` and waits for its output.
    ///
    /// A panicking task is reported as [`SagaError::Scheduler`]; the lane
    /// keeps serving the tasks queued behind it.
    pub async fn run_serialized<F, T>(&self, key: PairKey, task: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let lane = self.lane_for(key);
        let (done_tx, done_rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            let outcome = AssertUnwindSafe(task).catch_unwind().await;
            // The submitter may have stopped waiting.
            let _ = done_tx.send(outcome);
        });

        self.lanes[lane]
            .send(job)
            .map_err(|_| SagaError::Scheduler(format!("lane {lane} is closed")))?;
        metrics::counter!("relation_lane_tasks_total").increment(1);

        match done_rx.await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(_panic)) => {
                tracing::error!(lane, %key, "task panicked on affinity lane");
                Err(SagaError::Scheduler(format!("task for {key} panicked")))
            }
            Err(_) => Err(SagaError::Scheduler(format!("lane {lane} dropped the task"))),
        }
    }
}
