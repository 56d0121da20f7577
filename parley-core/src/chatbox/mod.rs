//! Chatbox output: message queue, notification slot, pacing.
//!
//! ## Data flow
//!
//! ```text
//! producers ──► OutboundHandle ──(bounded crossbeam channel)──► scheduler::run
//!   enqueue / set_notification                                     │
//!   clear / set_typing                                  SchedulerState::tick
//!                                                                  │
//!                                                           Transport::send
//! ```
//!
//! Splitting and notification formatting happen on the producer side, so the
//! scheduler thread only ever sees display-ready chunks.

pub mod format;
pub mod handle;
pub mod scheduler;

use std::time::Duration;

pub use handle::{OutboundHandle, OutboundRequest};
pub use scheduler::{
    DiagnosticsSnapshot, SchedulerContext, SchedulerDiagnostics, SchedulerState, TickOutcome,
};

/// Chatbox pacing and formatting configuration.
#[derive(Debug, Clone)]
pub struct ChatboxConfig {
    /// Chatbox destination host.
    pub host: String,
    /// Chatbox destination port.
    pub port: u16,
    /// Address for text payloads. Default: `/chatbox/input`.
    pub input_address: String,
    /// Maximum characters the chatbox displays. Default: 144.
    pub max_length: usize,
    /// Scale display time with text length. Default: true.
    pub dynamic_timeout: bool,
    /// Display time per started 20-character block. Default: 1250 ms.
    pub timeout_multiplier: Duration,
    /// Floor for dynamic display time. Default: 2 s.
    pub minimum_timeout: Duration,
    /// Display time when `dynamic_timeout` is off. Default: 5 s.
    pub default_timeout: Duration,
    /// Guard after a clear payload, respecting the chatbox rate limit.
    /// Default: 1250 ms.
    pub clear_guard: Duration,
    pub sound_on_message: bool,
    pub sound_on_notification: bool,
    /// Blank the chatbox once a message's display time ends. Default: true.
    pub automatic_clear_message: bool,
    /// Blank the chatbox once a notification's display time ends. Default: true.
    pub automatic_clear_notification: bool,
    /// Let a same-category notification replace the displayed one early.
    /// Default: true.
    pub override_same_category: bool,
    /// Marker glued to split boundaries. Default: `"..."`.
    pub continuation_marker: String,
    pub notification_left: String,
    pub notification_right: String,
    /// Whether text is shown in the chatbox at all (gates typing too).
    pub use_textbox: bool,
    /// Drive the typing indicator even when the textbox is off.
    pub indicator_without_box: bool,
    /// Minimum spacing between two typing assertions. Default: 2 s.
    pub typing_min_interval: Duration,
}

impl Default for ChatboxConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9000,
            input_address: "/chatbox/input".into(),
            max_length: 144,
            dynamic_timeout: true,
            timeout_multiplier: Duration::from_millis(1_250),
            minimum_timeout: Duration::from_millis(2_000),
            default_timeout: Duration::from_millis(5_000),
            clear_guard: Duration::from_millis(1_250),
            sound_on_message: true,
            sound_on_notification: false,
            automatic_clear_message: true,
            automatic_clear_notification: true,
            override_same_category: true,
            continuation_marker: "...".into(),
            notification_left: "\u{3014}".into(), // "〔"
            notification_right: "\u{3015}".into(), // "〕"
            use_textbox: true,
            indicator_without_box: false,
            typing_min_interval: Duration::from_millis(2_000),
        }
    }
}

impl ChatboxConfig {
    /// Typing signals are dropped entirely when neither surface wants them.
    pub fn typing_enabled(&self) -> bool {
        self.use_textbox || self.indicator_without_box
    }
}
