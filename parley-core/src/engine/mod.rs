//! `ParleyEngine`: top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! ParleyEngine::new(config, transport)
//!     └─► start()   → scheduler thread spawned, running = true
//!         └─► stop() → running = false, scheduler thread joined
//! ```
//!
//! `start()`/`stop()` called in the wrong state return an error rather than
//! panicking. Producer handles stay valid across restarts: requests sent while
//! stopped are picked up by the next `start()`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    chatbox::{
        scheduler::{self, SchedulerContext},
        ChatboxConfig, DiagnosticsSnapshot, OutboundHandle, OutboundRequest, SchedulerDiagnostics,
    },
    command::{CommandDefaults, CommandExecutor, CommandParser, ExecutionReport},
    error::{ParleyError, Result},
    events::OutboundEvent,
    transport::Transport,
};

/// Broadcast channel capacity: 256 outbound events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `ParleyEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scheduler tick period. Default: 10 ms.
    pub poll_interval: Duration,
    /// Capacity of the producer → scheduler request channel. Default: 256.
    pub channel_capacity: usize,
    pub chatbox: ChatboxConfig,
    /// Destination and wait used when a command block omits them.
    pub commands: CommandDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            channel_capacity: 256,
            chatbox: ChatboxConfig::default(),
            commands: CommandDefaults::default(),
        }
    }
}

/// The top-level engine handle.
///
/// `ParleyEngine` is `Send + Sync`; all fields use interior mutability.
/// Wrap in `Arc<ParleyEngine>` to share between the host's input task and
/// event-forwarding tasks.
pub struct ParleyEngine {
    config: EngineConfig,
    chatbox: Arc<ChatboxConfig>,
    transport: Arc<dyn Transport>,
    parser: CommandParser,
    executor: CommandExecutor,
    /// `true` while the scheduler thread is active.
    running: Arc<AtomicBool>,
    requests_tx: Sender<OutboundRequest>,
    requests_rx: Receiver<OutboundRequest>,
    events_tx: broadcast::Sender<OutboundEvent>,
    diagnostics: Arc<SchedulerDiagnostics>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl ParleyEngine {
    /// Create a new engine. Nothing is sent until `start()`.
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        let (events_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (requests_tx, requests_rx) = bounded(config.channel_capacity.max(1));
        let running = Arc::new(AtomicBool::new(false));

        Self {
            chatbox: Arc::new(config.chatbox.clone()),
            parser: CommandParser::new(config.commands.clone()),
            executor: CommandExecutor::new(Arc::clone(&transport), Arc::clone(&running)),
            config,
            transport,
            running,
            requests_tx,
            requests_rx,
            events_tx,
            diagnostics: Arc::new(SchedulerDiagnostics::default()),
            scheduler: Mutex::new(None),
        }
    }

    /// Spawn the scheduler thread.
    ///
    /// # Errors
    /// - `ParleyError::AlreadyRunning` if already started.
    /// - `ParleyError::Io` if the thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ParleyError::AlreadyRunning);
        }

        self.diagnostics.reset();

        let ctx = SchedulerContext {
            config: Arc::clone(&self.chatbox),
            requests: self.requests_rx.clone(),
            transport: Arc::clone(&self.transport),
            running: Arc::clone(&self.running),
            events_tx: self.events_tx.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
            poll_interval: self.config.poll_interval,
        };

        let spawned = std::thread::Builder::new()
            .name("parley-scheduler".into())
            .spawn(move || scheduler::run(ctx));

        match spawned {
            Ok(handle) => {
                *self.scheduler.lock() = Some(handle);
                info!(
                    host = %self.chatbox.host,
                    port = self.chatbox.port,
                    "engine started"
                );
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(ParleyError::Io(e))
            }
        }
    }

    /// Stop the scheduler and wait for its thread to exit.
    ///
    /// In-flight command batches observe the same flag and abandon their
    /// remaining commands.
    ///
    /// # Errors
    /// - `ParleyError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ParleyError::NotRunning);
        }

        info!("engine stop requested");
        if let Some(handle) = self.scheduler.lock().take() {
            handle
                .join()
                .map_err(|_| ParleyError::Other(anyhow::anyhow!("scheduler thread panicked")))?;
        }
        info!("engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cloneable producer handle for chatbox text, notifications and typing.
    pub fn outbound(&self) -> OutboundHandle {
        OutboundHandle::new(self.requests_tx.clone(), Arc::clone(&self.chatbox))
    }

    /// Parse `text` and run its command blocks on a new worker thread.
    ///
    /// Returns `Ok(None)` when `text` holds no valid blocks (a malformed
    /// batch is logged by the parser and discarded).
    ///
    /// # Errors
    /// - `ParleyError::NotRunning` if the engine is stopped.
    pub fn execute(&self, text: &str) -> Result<Option<JoinHandle<ExecutionReport>>> {
        if !self.is_running() {
            return Err(ParleyError::NotRunning);
        }

        let batch = self.parser.parse(text);
        if batch.is_empty() {
            return Ok(None);
        }
        debug!(batch = batch.id, commands = batch.len(), "dispatching command batch");
        self.executor.spawn(batch).map(Some)
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Subscribe to outbound chatbox events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<OutboundEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of scheduler counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

impl Drop for ParleyEngine {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            let _ = self.stop();
        }
    }
}
