use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::ingest::IngestRunner;
use crate::jobs::JobStatus;

use super::task::IngestTask;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Message recorded on jobs still queued when the pool stops.
pub const SHUTDOWN_MESSAGE: &str = "Ingestion workers shut down before the job ran";

pub struct WorkerPool {
    task_sender: Sender<IngestTask>,
    // Kept to fail whatever is left queued after the workers stop.
    task_receiver: Receiver<IngestTask>,
    runner: Arc<IngestRunner>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads draining a queue of `queue_capacity`
    /// tasks.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(runner: Arc<IngestRunner>, worker_count: usize, queue_capacity: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (task_sender, task_receiver) = bounded::<IngestTask>(queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_runner = Arc::clone(&runner);

            let handle = thread::spawn(move || {
                run_worker(worker_id, task_rx, shutdown_flag, worker_runner);
            });

            workers.push(handle);
        }

        info!("Started {} ingestion workers", worker_count);

        Self {
            task_sender,
            task_receiver,
            runner,
            workers,
            shutdown,
        }
    }

    /// Enqueues a task without blocking.
    pub fn try_submit(&self, task: IngestTask) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.task_sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull,
            TrySendError::Disconnected(_) => WorkerError::ChannelClosed,
        })
    }

    /// Tells workers to stop after their current task. Tasks still queued
    /// are marked failed by [`wait`](Self::wait).
    pub fn shutdown(&self) {
        info!("Shutting down ingestion workers...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Closes the queue and joins the workers. Without a prior `shutdown`
    /// every queued task is processed first; after one, tasks the workers
    /// never picked up end `Failed`.
    pub fn wait(self) {
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        let mut abandoned = 0;
        for task in self.task_receiver.try_iter() {
            abandoned += 1;
            if let Err(e) = self.runner.store().update_status(
                &task.job_id,
                JobStatus::Failed,
                Some(SHUTDOWN_MESSAGE),
            ) {
                error!("Could not fail abandoned job {}: {}", task.job_id, e);
            }
        }
        if abandoned > 0 {
            warn!("Failed {} queued jobs left after shutdown", abandoned);
        }

        info!("All ingestion workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<IngestTask>,
    shutdown: Arc<AtomicBool>,
    runner: Arc<IngestRunner>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match task_receiver.recv_timeout(POLL_INTERVAL) {
            Ok(task) => {
                debug!("Worker {} processing job {}", worker_id, task.job_id);
                runner.run_guarded(&task.job_id, &task.batch);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} task channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
