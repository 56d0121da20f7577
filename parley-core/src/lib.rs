//! # parley-core
//!
//! OSC command language and paced chatbox output.
//!
//! ## Architecture
//!
//! ```text
//! host text ──► CommandParser ──► CommandBatch ──► CommandExecutor (thread per batch)
//!                                                        │
//! producers ──► OutboundHandle ──► scheduler::run ───────┤
//!                 (crossbeam)       (one thread)         │
//!                                        │         Transport::send
//!                              broadcast::Sender<OutboundEvent>
//! ```
//!
//! Both paths share one running flag owned by `ParleyEngine`.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod chatbox;
pub mod command;
pub mod engine;
pub mod error;
pub mod events;
pub mod osc;
pub mod transport;

// Convenience re-exports for downstream crates
pub use chatbox::{ChatboxConfig, DiagnosticsSnapshot, OutboundHandle};
pub use command::{
    CommandBatch, CommandDefaults, CommandParser, ExecutionOutcome, ExecutionReport, ParsedCommand,
};
pub use engine::{EngineConfig, ParleyEngine};
pub use error::{ParleyError, Result};
pub use events::{NotificationCategory, OutboundEvent, SentKind};
pub use osc::{OscArg, Packet};
pub use transport::{Transport, UdpTransport};
