//! Single-consumer outbound scheduler.
//!
//! ## Decision per tick
//!
//! ```text
//! now ≥ intended?
//!   ├─ yes: queue → message  |  slot → notification  |  !auto_clear_pending → clear
//!   └─ no:  last sent notification(c) && pending notification(c) && override
//!           → pre-empt with the pending notification
//! ```
//!
//! `SchedulerState` is owned by the scheduler thread alone. Producers reach it
//! only through [`OutboundRequest`]s drained at the top of each tick, so the
//! category compare-then-clear and compare-then-preempt steps are never
//! interleaved with another producer.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::format::compute_timeout;
use super::{ChatboxConfig, OutboundRequest};
use crate::error::Result;
use crate::events::{NotificationCategory, OutboundEvent, SentKind};
use crate::osc::{OscArg, Packet};
use crate::transport::Transport;

pub struct SchedulerDiagnostics {
    pub messages_sent: AtomicUsize,
    pub notifications_sent: AtomicUsize,
    pub preemptions: AtomicUsize,
    pub clears_sent: AtomicUsize,
    pub send_failures: AtomicUsize,
    pub typing_sent: AtomicUsize,
    pub typing_suppressed: AtomicUsize,
}

impl Default for SchedulerDiagnostics {
    fn default() -> Self {
        Self {
            messages_sent: AtomicUsize::new(0),
            notifications_sent: AtomicUsize::new(0),
            preemptions: AtomicUsize::new(0),
            clears_sent: AtomicUsize::new(0),
            send_failures: AtomicUsize::new(0),
            typing_sent: AtomicUsize::new(0),
            typing_suppressed: AtomicUsize::new(0),
        }
    }
}

impl SchedulerDiagnostics {
    pub fn reset(&self) {
        self.messages_sent.store(0, Ordering::Relaxed);
        self.notifications_sent.store(0, Ordering::Relaxed);
        self.preemptions.store(0, Ordering::Relaxed);
        self.clears_sent.store(0, Ordering::Relaxed);
        self.send_failures.store(0, Ordering::Relaxed);
        self.typing_sent.store(0, Ordering::Relaxed);
        self.typing_suppressed.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            clears_sent: self.clears_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            typing_sent: self.typing_sent.load(Ordering::Relaxed),
            typing_suppressed: self.typing_suppressed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub messages_sent: usize,
    pub notifications_sent: usize,
    pub preemptions: usize,
    pub clears_sent: usize,
    pub send_failures: usize,
    pub typing_sent: usize,
    pub typing_suppressed: usize,
}

/// Result of one scheduling decision.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing queued, nothing to clear.
    Idle,
    /// The current display time has not elapsed.
    Waiting,
    Sent {
        kind: SentKind,
        text: String,
        preempted: bool,
    },
    /// The payload was dropped after a transport failure.
    Failed { kind: SentKind, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notification {
    text: String,
    category: NotificationCategory,
}

/// Queue, notification slot and pacing bookkeeping.
pub struct SchedulerState {
    config: Arc<ChatboxConfig>,
    queue: VecDeque<String>,
    notification: Option<Notification>,
    /// Earliest instant at which the next regular send may happen.
    intended: Instant,
    /// `true` when the chatbox is already blank (or must not be blanked).
    auto_clear_pending: bool,
    last_sent: Option<SentKind>,
    last_typing_assert: Option<Instant>,
}

impl SchedulerState {
    pub fn new(config: Arc<ChatboxConfig>, now: Instant) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            notification: None,
            intended: now,
            auto_clear_pending: true,
            last_sent: None,
            last_typing_assert: None,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_notification(&self) -> Option<(&str, NotificationCategory)> {
        self.notification
            .as_ref()
            .map(|n| (n.text.as_str(), n.category))
    }

    pub fn intended_timeout(&self) -> Instant {
        self.intended
    }

    pub fn auto_clear_pending(&self) -> bool {
        self.auto_clear_pending
    }

    pub fn last_sent(&self) -> Option<SentKind> {
        self.last_sent
    }

    /// Apply one producer request.
    pub fn apply(
        &mut self,
        request: OutboundRequest,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) {
        match request {
            OutboundRequest::Enqueue(chunks) => {
                self.queue.extend(chunks);
            }
            OutboundRequest::Notify { text, category } if text.is_empty() => {
                if self.notification.as_ref().map(|n| n.category) == Some(category) {
                    debug!(category = category.as_str(), "pending notification cleared");
                    self.notification = None;
                }
            }
            OutboundRequest::Notify { text, category } => {
                self.notification = Some(Notification { text, category });
            }
            OutboundRequest::Clear => {
                self.queue.clear();
                self.notification = None;
                self.intended = now;
                // Blank whatever is on screen at the next tick.
                self.auto_clear_pending = matches!(self.last_sent, None | Some(SentKind::Clear));
                self.last_sent = None;
                debug!("outbound state cleared");
            }
            OutboundRequest::Typing(typing) => self.apply_typing(typing, now, transport, diagnostics),
        }
    }

    /// Make one scheduling decision and perform at most one send.
    pub fn tick(
        &mut self,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) -> TickOutcome {
        if now >= self.intended {
            if let Some(text) = self.queue.pop_front() {
                return self.dispatch_message(text, now, transport, diagnostics);
            }
            if let Some(notification) = self.notification.take() {
                return self.dispatch_notification(notification, false, now, transport, diagnostics);
            }
            if !self.auto_clear_pending {
                return self.dispatch_clear(now, transport, diagnostics);
            }
            return TickOutcome::Idle;
        }

        if self.config.override_same_category {
            if let (Some(SentKind::Notification(shown)), Some(pending)) =
                (self.last_sent, self.notification.as_ref())
            {
                if pending.category == shown {
                    if let Some(notification) = self.notification.take() {
                        return self.dispatch_notification(
                            notification,
                            true,
                            now,
                            transport,
                            diagnostics,
                        );
                    }
                }
            }
        }

        TickOutcome::Waiting
    }

    fn dispatch_message(
        &mut self,
        text: String,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) -> TickOutcome {
        let kind = SentKind::Message;
        match self.send_chatbox(&text, self.config.sound_on_message, transport) {
            Ok(()) => {
                let timeout = compute_timeout(&text, &self.config);
                self.intended = now + timeout;
                self.auto_clear_pending = !self.config.automatic_clear_message;
                self.last_sent = Some(kind);
                diagnostics.messages_sent.fetch_add(1, Ordering::Relaxed);
                debug!(
                    chars = text.chars().count(),
                    timeout_ms = timeout.as_millis() as u64,
                    remaining = self.queue.len(),
                    "message sent"
                );
                TickOutcome::Sent {
                    kind,
                    text,
                    preempted: false,
                }
            }
            Err(e) => self.fail(kind, e.to_string(), diagnostics),
        }
    }

    fn dispatch_notification(
        &mut self,
        notification: Notification,
        preempted: bool,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) -> TickOutcome {
        let Notification { text, category } = notification;
        let kind = SentKind::Notification(category);
        match self.send_chatbox(&text, self.config.sound_on_notification, transport) {
            Ok(()) => {
                let timeout = compute_timeout(&text, &self.config);
                self.intended = now + timeout;
                self.auto_clear_pending = !self.config.automatic_clear_notification;
                self.last_sent = Some(kind);
                diagnostics.notifications_sent.fetch_add(1, Ordering::Relaxed);
                if preempted {
                    diagnostics.preemptions.fetch_add(1, Ordering::Relaxed);
                }
                debug!(
                    category = category.as_str(),
                    preempted,
                    timeout_ms = timeout.as_millis() as u64,
                    "notification sent"
                );
                TickOutcome::Sent {
                    kind,
                    text,
                    preempted,
                }
            }
            Err(e) => self.fail(kind, e.to_string(), diagnostics),
        }
    }

    fn dispatch_clear(
        &mut self,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) -> TickOutcome {
        let kind = SentKind::Clear;
        match self.send_chatbox("", false, transport) {
            Ok(()) => {
                self.auto_clear_pending = true;
                self.intended = now + self.config.clear_guard;
                self.last_sent = Some(kind);
                diagnostics.clears_sent.fetch_add(1, Ordering::Relaxed);
                debug!("chatbox cleared");
                TickOutcome::Sent {
                    kind,
                    text: String::new(),
                    preempted: false,
                }
            }
            Err(e) => self.fail(kind, e.to_string(), diagnostics),
        }
    }

    fn fail(
        &mut self,
        kind: SentKind,
        detail: String,
        diagnostics: &SchedulerDiagnostics,
    ) -> TickOutcome {
        self.auto_clear_pending = true;
        diagnostics.send_failures.fetch_add(1, Ordering::Relaxed);
        warn!(kind = ?kind, error = %detail, "chatbox send failed — payload dropped");
        TickOutcome::Failed { kind, detail }
    }

    fn send_chatbox(&self, text: &str, sound: bool, transport: &dyn Transport) -> Result<()> {
        let packet = Packet::new(
            self.config.input_address.clone(),
            self.config.host.clone(),
            self.config.port,
            vec![
                OscArg::String(text.to_string()),
                OscArg::Bool(true),
                OscArg::Bool(sound),
            ],
        )?;
        transport.send(&packet)
    }

    fn apply_typing(
        &mut self,
        typing: bool,
        now: Instant,
        transport: &dyn Transport,
        diagnostics: &SchedulerDiagnostics,
    ) {
        if !self.config.typing_enabled() {
            diagnostics.typing_suppressed.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if typing {
            let too_soon = self
                .last_typing_assert
                .map(|at| now.duration_since(at) < self.config.typing_min_interval)
                .unwrap_or(false);
            if too_soon {
                diagnostics.typing_suppressed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        match transport.set_typing(typing) {
            Ok(()) => {
                if typing {
                    self.last_typing_assert = Some(now);
                }
                diagnostics.typing_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(typing, error = %e, "typing signal failed"),
        }
    }
}

/// All context the scheduler loop needs, passed as one struct.
pub struct SchedulerContext {
    pub config: Arc<ChatboxConfig>,
    pub requests: Receiver<OutboundRequest>,
    pub transport: Arc<dyn Transport>,
    pub running: Arc<AtomicBool>,
    pub events_tx: broadcast::Sender<OutboundEvent>,
    pub diagnostics: Arc<SchedulerDiagnostics>,
    pub poll_interval: Duration,
}

/// Run the blocking scheduler loop until `ctx.running` becomes false.
pub fn run(ctx: SchedulerContext) {
    info!(
        poll_ms = ctx.poll_interval.as_millis() as u64,
        max_length = ctx.config.max_length,
        "scheduler started"
    );

    let mut state = SchedulerState::new(Arc::clone(&ctx.config), Instant::now());

    loop {
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        let now = Instant::now();
        while let Ok(request) = ctx.requests.try_recv() {
            state.apply(request, now, ctx.transport.as_ref(), &ctx.diagnostics);
        }

        let outcome = state.tick(now, ctx.transport.as_ref(), &ctx.diagnostics);
        let failed = matches!(outcome, TickOutcome::Failed { .. });
        if let Some(event) = outcome_event(outcome, state.queue_len()) {
            let _ = ctx.events_tx.send(event);
        }

        // A failed send moves straight on to the next decision.
        if !failed {
            std::thread::sleep(ctx.poll_interval);
        }
    }

    info!(
        dropped_messages = state.queue_len(),
        "scheduler stopped"
    );
}

fn outcome_event(outcome: TickOutcome, remaining: usize) -> Option<OutboundEvent> {
    match outcome {
        TickOutcome::Idle | TickOutcome::Waiting => None,
        TickOutcome::Sent {
            kind: SentKind::Message,
            text,
            ..
        } => Some(OutboundEvent::MessageSent { text, remaining }),
        TickOutcome::Sent {
            kind: SentKind::Notification(category),
            text,
            preempted,
        } => Some(OutboundEvent::NotificationSent {
            text,
            category,
            preempted,
        }),
        TickOutcome::Sent {
            kind: SentKind::Clear,
            ..
        } => Some(OutboundEvent::ChatboxCleared),
        TickOutcome::Failed { kind, detail } => Some(OutboundEvent::SendFailed { kind, detail }),
    }
}
