//! Stdin line routing.
//!
//! ```text
//! :notify <category> [text]   set (or, without text, clear) a notification
//! :clear                      drop everything queued and blank the chatbox
//! :typing on|off              drive the typing indicator
//! anything else               run its command blocks, say the remaining prose
//! ```

use std::io::BufRead;
use std::thread;

use anyhow::{anyhow, bail, Result};
use parley_core::NotificationCategory;
use tokio::sync::mpsc;
use tracing::warn;

const LINE_CHANNEL_CAP: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Notify {
        category: NotificationCategory,
        text: String,
    },
    Clear,
    Typing(bool),
    /// Free text that may contain command blocks.
    Say(String),
}

/// Map one input line to an action; `Ok(None)` for blank lines.
pub fn route(line: &str) -> Result<Option<InputAction>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(directive) = line.strip_prefix(':') else {
        return Ok(Some(InputAction::Say(line.to_string())));
    };

    let (name, rest) = split_word(directive);
    let action = match name {
        "notify" => {
            let (category, text) = split_word(rest);
            if category.is_empty() {
                bail!("usage: :notify <category> [text]");
            }
            let category = category
                .parse::<NotificationCategory>()
                .map_err(|e| anyhow!(e))?;
            InputAction::Notify {
                category,
                text: text.to_string(),
            }
        }
        "clear" => InputAction::Clear,
        "typing" => match rest.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => InputAction::Typing(true),
            "off" | "false" | "0" => InputAction::Typing(false),
            other => bail!("usage: :typing on|off (got {other:?})"),
        },
        other => bail!("unknown directive :{other}"),
    };
    Ok(Some(action))
}

/// Forward lines from `reader` into a channel from a dedicated thread.
///
/// The blocking read never occupies a runtime worker, so the runtime can shut
/// down while a read is still pending. The channel closes at EOF or on a
/// read error.
pub fn spawn_line_reader<R>(reader: R) -> Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAP);
    thread::Builder::new()
        .name("parley-stdin".into())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}
