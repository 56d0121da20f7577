//! Embedded command mini-language.
//!
//! ```text
//! "[ /avatar/parameters/Wave [b]true w500 ] [ /avatar/parameters/Wave [b]false ]"
//!        │
//!  CommandParser::parse ──► CommandBatch { id, [ParsedCommand; 2] }
//!        │
//!  CommandExecutor::spawn ──► send, wait 500 ms, send
//! ```

pub mod executor;
pub mod parser;

use std::time::Duration;

use crate::osc::Packet;

pub use executor::{CommandExecutor, ExecutionOutcome, ExecutionReport};
pub use parser::CommandParser;

/// Values substituted for omitted `host:port` and `wNNN` parts of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefaults {
    pub host: String,
    pub port: u16,
    pub wait_ms: u64,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9000,
            wait_ms: 0,
        }
    }
}

/// One command block: the packet to send and how long to wait after sending.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub packet: Packet,
    pub wait: Duration,
}

/// All commands parsed from one input string, in textual order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    /// Diagnostic identifier shared by every command of the batch.
    pub id: u64,
    pub commands: Vec<ParsedCommand>,
}

impl CommandBatch {
    pub fn empty(id: u64) -> Self {
        Self {
            id,
            commands: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
