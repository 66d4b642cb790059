//! In-process background queue for calendar sync jobs.

use std::sync::Arc;

use shiftledger_application::{ShiftSyncCommand, ShiftSyncQueue, ShiftSyncService, SyncOutcome};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Bounded channel feeding a pool of sync workers.
///
/// `enqueue` never waits: when the channel is full or the dispatcher has
/// stopped, the job is logged and dropped.
#[derive(Clone)]
pub struct TokioShiftSyncQueue {
    sender: mpsc::Sender<ShiftSyncCommand>,
}

impl TokioShiftSyncQueue {
    /// Starts the dispatcher task and returns the queue handle.
    ///
    /// The dispatcher exits once every queue handle is dropped and the
    /// in-flight jobs finish.
    pub fn start(
        sync_service: ShiftSyncService,
        capacity: usize,
        workers: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let dispatcher = tokio::spawn(run_dispatcher(receiver, sync_service, workers.max(1)));

        (Self { sender }, dispatcher)
    }
}

impl ShiftSyncQueue for TokioShiftSyncQueue {
    fn enqueue(&self, command: ShiftSyncCommand) {
        match self.sender.try_send(command) {
            Ok(()) => debug!(
                tenant_id = %command.tenant_id,
                shift_id = %command.shift_id,
                "queued shift sync job"
            ),
            Err(TrySendError::Full(command)) => warn!(
                tenant_id = %command.tenant_id,
                shift_id = %command.shift_id,
                "shift sync queue is full, dropping job"
            ),
            Err(TrySendError::Closed(command)) => warn!(
                tenant_id = %command.tenant_id,
                shift_id = %command.shift_id,
                "shift sync dispatcher stopped, dropping job"
            ),
        }
    }
}

async fn run_dispatcher(
    mut receiver: mpsc::Receiver<ShiftSyncCommand>,
    sync_service: ShiftSyncService,
    workers: usize,
) {
    info!(workers, "shift sync dispatcher started");
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut jobs: JoinSet<SyncOutcome> = JoinSet::new();

    while let Some(command) = receiver.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("shift sync semaphore closed");
                break;
            }
        };

        let sync_service = sync_service.clone();
        jobs.spawn(async move {
            let _permit = permit;
            sync_service.sync_shift(command).await
        });

        while let Some(finished) = jobs.try_join_next() {
            log_finished_job(finished);
        }
    }

    while let Some(finished) = jobs.join_next().await {
        log_finished_job(finished);
    }

    info!("shift sync dispatcher stopped");
}

fn log_finished_job(finished: Result<SyncOutcome, tokio::task::JoinError>) {
    match finished {
        Ok(outcome) => debug!(outcome = ?outcome, "shift sync job finished"),
        Err(join_error) => error!(error = %join_error, "shift sync job panicked"),
    }
}
