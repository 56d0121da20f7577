//! Text → `CommandBatch`.
//!
//! ## Grammar
//!
//! ```text
//! block   := "[" ws? address (ws value)* (ws host ":" port)? (ws "w" wait)? ws? "]"
//! address := ("/" segment)+          segment := [A-Za-z0-9{}+*\[\]-]+
//! value   := "[f]" decimal | "[i]" integer | "[s]" '"' [^"]* '"' | "[b]" ("true" | "false")
//! host    := IPv4 literal            wait    := non-negative integer (ms)
//! ```
//!
//! A batch is all-or-nothing: one bad block (bad host, port or wait, zero
//! usable values, or an opening `[ /` the grammar cannot close) discards
//! every block of the input. A single value token that fails to parse is
//! dropped and the block keeps its remaining values.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use tracing::{debug, info_span, warn};

use super::{CommandBatch, CommandDefaults, ParsedCommand};
use crate::error::{ParleyError, Result};
use crate::osc::{OscArg, Packet};

const BLOCK_PATTERN: &str = concat!(
    r"\[\s*",
    r"(?P<address>(?:/[A-Za-z0-9{}+*\[\]\-]+)+)",
    r#"(?P<values>(?:\s+\[[A-Za-z]\](?:"[^"]*"|[^\s\]"]*))*)"#,
    r"(?:\s+(?P<host>\d{1,3}(?:\.\d{1,3}){3}):(?P<port>[^\s\]]+))?",
    r"(?:\s+w(?P<wait>[^\s\]]+))?",
    r"\s*\]",
);

const VALUE_PATTERN: &str = r#"\[(?P<tag>[A-Za-z])\](?P<payload>"[^"]*"|[^\s\]"]*)"#;

/// Opening of something that is meant to be a block.
const CANDIDATE_PATTERN: &str = r"\[\s*/";

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BLOCK_PATTERN).expect("block pattern compiles"))
}

fn value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VALUE_PATTERN).expect("value pattern compiles"))
}

fn candidate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CANDIDATE_PATTERN).expect("candidate pattern compiles"))
}

/// Parses command blocks out of free text.
///
/// Cheap to share: the regexes are process-wide and the only mutable state is
/// the batch id counter.
#[derive(Debug)]
pub struct CommandParser {
    defaults: CommandDefaults,
    next_batch_id: AtomicU64,
}

impl CommandParser {
    pub fn new(defaults: CommandDefaults) -> Self {
        Self {
            defaults,
            next_batch_id: AtomicU64::new(0),
        }
    }

    /// Parse `text`, logging and swallowing any batch error.
    ///
    /// Returns an empty batch when the input holds no blocks or when any block
    /// is invalid.
    pub fn parse(&self, text: &str) -> CommandBatch {
        let id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        match self.parse_with_id(id, text) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(batch = id, error = %e, "command batch rejected");
                CommandBatch::empty(id)
            }
        }
    }

    /// Parse `text`, returning why a batch was rejected.
    pub fn try_parse(&self, text: &str) -> Result<CommandBatch> {
        let id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        self.parse_with_id(id, text)
    }

    fn parse_with_id(&self, id: u64, text: &str) -> Result<CommandBatch> {
        let span = info_span!("command_batch", batch = id);
        let _enter = span.enter();

        let commands = self.build_commands(text)?;
        for command in &commands {
            debug!(
                packet = %command.packet,
                wait_ms = command.wait.as_millis() as u64,
                "command parsed"
            );
        }
        Ok(CommandBatch { id, commands })
    }

    /// Remove every command block from `text`, collapsing leftover whitespace.
    ///
    /// A rejected batch sends nothing, so its text is kept whole (whitespace
    /// still collapsed) rather than silently erased.
    pub fn strip_commands(&self, text: &str) -> String {
        let kept = match self.build_commands(text) {
            Ok(_) => block_regex().replace_all(text, " "),
            Err(_) => text.into(),
        };
        kept.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn build_commands(&self, text: &str) -> Result<Vec<ParsedCommand>> {
        let blocks: Vec<Captures<'_>> = block_regex().captures_iter(text).collect();

        // Every `[ /` opening must belong to a matched block.
        for candidate in candidate_regex().find_iter(text) {
            let covered = blocks.iter().any(|caps| {
                caps.get(0)
                    .map(|m| m.start() <= candidate.start() && candidate.start() < m.end())
                    .unwrap_or(false)
            });
            if !covered {
                let context: String = text[candidate.start()..].chars().take(32).collect();
                return Err(ParleyError::MalformedCommand(context));
            }
        }

        blocks.iter().map(|caps| self.build_command(caps)).collect()
    }

    fn build_command(&self, caps: &Captures<'_>) -> Result<ParsedCommand> {
        let address = caps.name("address").map(|m| m.as_str()).unwrap_or_default();

        let host = match caps.name("host") {
            Some(m) => m
                .as_str()
                .parse::<Ipv4Addr>()
                .map_err(|_| ParleyError::InvalidHost(m.as_str().to_string()))?
                .to_string(),
            None => self.defaults.host.clone(),
        };

        let port = match caps.name("port") {
            Some(m) => parse_port(m.as_str())?,
            None => self.defaults.port,
        };

        let wait_ms = match caps.name("wait") {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .map_err(|_| ParleyError::InvalidWait(m.as_str().to_string()))?,
            None => self.defaults.wait_ms,
        };

        let values = caps.name("values").map(|m| m.as_str()).unwrap_or_default();
        let args = tokenize_values(values);

        let packet = Packet::new(address, host, port, args)?;
        Ok(ParsedCommand {
            packet,
            wait: Duration::from_millis(wait_ms),
        })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(CommandDefaults::default())
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    match raw.parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ParleyError::InvalidPort(raw.to_string())),
    }
}

fn tokenize_values(segment: &str) -> Vec<OscArg> {
    value_regex()
        .captures_iter(segment)
        .filter_map(|caps| {
            let tag = caps.name("tag")?.as_str();
            let payload = caps.name("payload")?.as_str();
            let arg = parse_value(tag, payload);
            if arg.is_none() {
                debug!(tag, payload, "dropping unparsable value token");
            }
            arg
        })
        .collect()
}

fn parse_value(tag: &str, payload: &str) -> Option<OscArg> {
    match tag {
        "f" if is_signed_decimal(payload) => payload.parse::<f32>().ok().map(OscArg::Float),
        "i" => payload.parse::<i32>().ok().map(OscArg::Int),
        "s" => payload
            .strip_prefix('"')
            .and_then(|p| p.strip_suffix('"'))
            .map(|s| OscArg::String(s.to_string())),
        "b" => match payload {
            "true" => Some(OscArg::Bool(true)),
            "false" => Some(OscArg::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// `-1`, `+2.5`, `.5`, `3.`; no exponents, no `inf`/`NaN`.
fn is_signed_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
