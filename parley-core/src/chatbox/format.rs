//! Display-side text shaping: message splitting, notification wrapping,
//! display timeouts. All lengths are in `char`s.

use std::time::Duration;

use super::ChatboxConfig;

const TIMEOUT_BLOCK_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

/// Split `text` into chunks of at most `max_length` chars on word boundaries.
///
/// Chunks after the first start with the continuation marker; chunks before
/// the last end with it. The first and last chunks carry one marker, middle
/// chunks two. A word is hard-truncated only when it cannot fit the chunk it
/// lands in: longer than `max - marker`, or longer than `max - 2 * marker`
/// while not part of the final chunk.
pub fn split_message(text: &str, cfg: &ChatboxConfig) -> Vec<String> {
    let max = cfg.max_length.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    match words.as_slice() {
        [] => return Vec::new(),
        [only] => return vec![truncate_chars(only, max).to_string()],
        _ => {}
    }

    let joined = words.join(" ");
    if char_len(&joined) <= max {
        return vec![joined];
    }

    let marker = cfg.continuation_marker.as_str();
    let marker_len = char_len(marker);
    // Body room of a first or last chunk (one marker) and of a middle chunk (two).
    let edge_room = max.saturating_sub(marker_len).max(1);
    let middle_room = max.saturating_sub(2 * marker_len).max(1);

    let words: Vec<&str> = words.iter().map(|w| truncate_chars(w, edge_room)).collect();

    let mut bodies: Vec<String> = Vec::new();
    let mut next = 0usize;
    while next < words.len() {
        let rest = &words[next..];
        if !bodies.is_empty() && joined_len(rest) <= edge_room {
            bodies.push(rest.join(" "));
            break;
        }

        let room = if bodies.is_empty() { edge_room } else { middle_room };
        let mut body = String::new();
        let mut body_len = 0usize;
        while let Some(&word) = words.get(next) {
            let word_len = char_len(word);
            if body_len == 0 {
                let fitted = truncate_chars(word, room);
                body.push_str(fitted);
                body_len = char_len(fitted);
                next += 1;
                if word_len > room {
                    break;
                }
            } else if body_len + 1 + word_len <= room {
                body.push(' ');
                body.push_str(word);
                body_len += 1 + word_len;
                next += 1;
            } else {
                break;
            }
        }
        bodies.push(body);
    }

    let last = bodies.len() - 1;
    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let mut chunk = String::with_capacity(body.len() + 2 * marker.len());
            if i > 0 {
                chunk.push_str(marker);
            }
            chunk.push_str(&body);
            if i < last {
                chunk.push_str(marker);
            }
            chunk
        })
        .collect()
}

/// Truncate `text` to fit between the notification brackets, then wrap it.
///
/// Empty (or whitespace-only) text stays empty: it is the clear request.
pub fn format_notification(text: &str, cfg: &ChatboxConfig) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let left = cfg.notification_left.as_str();
    let right = cfg.notification_right.as_str();
    let room = cfg
        .max_length
        .saturating_sub(char_len(left) + char_len(right));

    if char_len(text) <= room {
        return format!("{left}{text}{right}");
    }

    let keep = room.saturating_sub(ELLIPSIS.len());
    format!("{left}{}{ELLIPSIS}{right}", truncate_chars(text, keep))
}

/// Display time for `text`.
///
/// Dynamic: `max(minimum_timeout, ceil(len / 20) * timeout_multiplier)`.
/// Otherwise the fixed `default_timeout`.
pub fn compute_timeout(text: &str, cfg: &ChatboxConfig) -> Duration {
    if !cfg.dynamic_timeout {
        return cfg.default_timeout;
    }
    let blocks = char_len(text).div_ceil(TIMEOUT_BLOCK_CHARS);
    let blocks = u32::try_from(blocks).unwrap_or(u32::MAX);
    cfg.timeout_multiplier
        .saturating_mul(blocks)
        .max(cfg.minimum_timeout)
}

fn joined_len(words: &[&str]) -> usize {
    words.iter().map(|w| char_len(w)).sum::<usize>() + words.len().saturating_sub(1)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
