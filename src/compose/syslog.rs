//! Syslog line composition with strict length bounds
//!
//! Downstream syslog consumers enforce a hard per-line cap, so the composer
//! never emits a line longer than `max_line_length`. The static prefix
//! (fields below the dynamic-start index) opens the first line; dynamic
//! tokens follow until the next token would overflow, at which point a new
//! line is started. A single token longer than the cap is hard-truncated to
//! exactly the cap on its own line, never split across two lines.

use tracing::warn;

use crate::fields::{IndexedFieldPairs, PAIR_SEPARATOR};

/// Builds length-bounded syslog lines from an accumulator
#[derive(Debug, Clone)]
pub struct SyslogComposer {
    max_line_length: usize,
    max_msg_size: Option<usize>,
}

impl SyslogComposer {
    /// Create a composer with the given per-line cap
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            max_msg_size: None,
        }
    }

    /// Per-line cap in characters
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Late-bound cap on the cumulative output size for one record
    ///
    /// Set once before processing begins; lines past the cap are dropped.
    pub fn set_max_msg_size(&mut self, max: usize) {
        self.max_msg_size = Some(max);
    }

    /// Build one or more syslog lines into `messages`
    ///
    /// Fields with index below `dynamic_start` form the static prefix.
    /// Absence of dynamic fields is not a fault and yields a single line
    /// carrying only the prefix. Returns `false` only on an internal
    /// formatting fault (a pair with an empty key cannot be rendered).
    pub fn syslog_messages(
        &self,
        pairs: &IndexedFieldPairs,
        messages: &mut Vec<String>,
        dynamic_start: u32,
    ) -> bool {
        let prefix = pairs.static_info(dynamic_start);
        let mut line = self.truncate(prefix);
        let mut built = Vec::new();

        for (index, (key, value)) in pairs.iter() {
            if index < dynamic_start {
                continue;
            }
            if key.is_empty() {
                warn!(index, "unrenderable field pair: empty key");
                return false;
            }
            let token = crate::fields::format_pair(key, value);
            if line.is_empty() {
                line = self.truncate(token);
            } else if line.chars().count() + PAIR_SEPARATOR.len() + token.chars().count()
                <= self.max_line_length
            {
                line.push_str(PAIR_SEPARATOR);
                line.push_str(&token);
            } else {
                built.push(line);
                line = self.truncate(token);
            }
        }
        built.push(line);

        if let Some(cap) = self.max_msg_size {
            let mut total = 0;
            built.retain(|l| {
                total += l.len();
                total <= cap
            });
        }

        messages.extend(built);
        true
    }

    fn truncate(&self, text: String) -> String {
        if text.chars().count() <= self.max_line_length {
            text
        } else {
            text.chars().take(self.max_line_length).collect()
        }
    }
}
