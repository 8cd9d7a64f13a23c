//! Bounded worker pool for background ingestion runs.
//!
//! Tasks are pulled from a bounded channel by a fixed set of threads, so
//! concurrent bulk uploads queue instead of forking unbounded work. The
//! result channel doubles as the observable handle: tests block on
//! `recv_result()` instead of sleeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::ingest::worker::{EpisodeWorker, IngestTask, RunReport};

pub struct WorkerPool {
    task_sender: Sender<IngestTask>,
    result_receiver: Receiver<RunReport>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads, each running its own clone of the
    /// episode worker.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(worker: EpisodeWorker, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");

        let (task_sender, task_receiver) = bounded::<IngestTask>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<RunReport>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let episode_worker = worker.clone();

            let handle = thread::spawn(move || {
                run_worker(worker_id, task_rx, result_tx, shutdown_flag, episode_worker);
            });

            workers.push(handle);
        }

        info!("Started {} ingestion workers", worker_count);

        Self {
            task_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, task: IngestTask) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.task_sender
            .send(task)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<RunReport> {
        self.result_receiver.try_recv().ok()
    }

    /// Blocks until the next run finishes.
    pub fn recv_result(&self) -> Option<RunReport> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down ingestion worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit.
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
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
    result_sender: Sender<RunReport>,
    shutdown: Arc<AtomicBool>,
    worker: EpisodeWorker,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match task_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(task) => {
                debug!("Worker {} processing run for comic {}", worker_id, task.comic_id);

                let report = worker.process(task);

                if let Err(e) = result_sender.send(report) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
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
