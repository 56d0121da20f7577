//! Runs one `CommandBatch` in order on its own worker thread.
//!
//! Ordering is guaranteed only within a batch. Two batches spawned from two
//! inputs run on independent threads and may interleave freely.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn};

use super::CommandBatch;
use crate::error::Result;
use crate::transport::Transport;

/// Granularity at which an inter-command wait re-checks the running flag.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// How a batch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Every command was sent.
    Completed,
    /// The command at `index` failed to send; later commands were skipped.
    SendFailed { index: usize, detail: String },
    /// The running flag was cleared before the batch finished.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub batch_id: u64,
    /// Number of packets successfully handed to the transport.
    pub sent: usize,
    pub total: usize,
    pub outcome: ExecutionOutcome,
}

#[derive(Clone)]
pub struct CommandExecutor {
    transport: Arc<dyn Transport>,
    running: Arc<AtomicBool>,
}

impl CommandExecutor {
    pub fn new(transport: Arc<dyn Transport>, running: Arc<AtomicBool>) -> Self {
        Self { transport, running }
    }

    /// Run `batch` on a new worker thread.
    pub fn spawn(&self, batch: CommandBatch) -> Result<JoinHandle<ExecutionReport>> {
        let executor = self.clone();
        let handle = thread::Builder::new()
            .name(format!("parley-batch-{}", batch.id))
            .spawn(move || executor.run(batch))?;
        Ok(handle)
    }

    /// Run `batch` on the calling thread.
    pub fn run(&self, batch: CommandBatch) -> ExecutionReport {
        let span = info_span!("command_batch", batch = batch.id);
        let _enter = span.enter();

        let total = batch.commands.len();
        let mut sent = 0usize;

        for (index, command) in batch.commands.iter().enumerate() {
            if !self.running.load(Ordering::Relaxed) {
                debug!(sent, total, "shutdown observed — abandoning batch");
                return self.report(batch.id, sent, total, ExecutionOutcome::Shutdown);
            }

            if let Err(e) = self.transport.send(&command.packet) {
                warn!(index, packet = %command.packet, error = %e, "command send failed — aborting batch");
                return self.report(
                    batch.id,
                    sent,
                    total,
                    ExecutionOutcome::SendFailed {
                        index,
                        detail: e.to_string(),
                    },
                );
            }
            sent += 1;
            debug!(index, packet = %command.packet, "command sent");

            let is_last = index + 1 == total;
            if !is_last && !command.wait.is_zero() && !self.wait(command.wait) {
                debug!(sent, total, "shutdown during wait — abandoning batch");
                return self.report(batch.id, sent, total, ExecutionOutcome::Shutdown);
            }
        }

        self.report(batch.id, sent, total, ExecutionOutcome::Completed)
    }

    /// Sleep for `duration`, returning `false` early if the running flag clears.
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }

    fn report(
        &self,
        batch_id: u64,
        sent: usize,
        total: usize,
        outcome: ExecutionOutcome,
    ) -> ExecutionReport {
        ExecutionReport {
            batch_id,
            sent,
            total,
            outcome,
        }
    }
}
