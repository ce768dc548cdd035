//! Kernel command-line assembly.
//!
//! The rendered string is passed to kexec as one argument:
//! `--command-line=` followed by one `name=value ` (or bare `name `) entry per
//! active tunable in declaration order. Names and values containing whitespace
//! or `=` are wrapped in double quotes.

use crate::catalog::{Tunable, TunableValue};

pub const COMMAND_LINE_PREFIX: &str = "--command-line=";

/// Default byte budget for a rendered command line.
pub const DEFAULT_CMDLINE_CAPACITY: usize = 4096;

/// Bounded text buffer.
///
/// Appends past `capacity` bytes are cut at the last character boundary that
/// fits and every later append is dropped. The cut is recorded so callers can
/// report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl CommandLine {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    pub fn push_str(&mut self, part: &str) {
        let room = self.capacity.saturating_sub(self.text.len());
        if part.len() <= room {
            self.text.push_str(part);
            return;
        }

        let mut cut = room;
        while !part.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&part[..cut]);
        self.truncated = true;
    }

    /// Append `field`, quoted when [`needs_quoting`] says so.
    pub fn push_field(&mut self, field: &str) {
        if needs_quoting(field) {
            self.push_str("\"");
            self.push_str(field);
            self.push_str("\"");
        } else {
            self.push_str(field);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

pub fn needs_quoting(field: &str) -> bool {
    field.chars().any(|ch| ch.is_ascii_whitespace() || ch == '=')
}

/// Render `tunables` into a command line of at most `capacity` bytes.
///
/// Flags contribute their bare name when non-zero. Choice tunables whose
/// selected value is empty are left out entirely.
pub fn build_cmdline(tunables: &[Tunable], capacity: usize) -> CommandLine {
    let mut cmdline = CommandLine::with_capacity(capacity);
    cmdline.push_str(COMMAND_LINE_PREFIX);

    for tunable in tunables {
        match tunable.value() {
            TunableValue::Flag(raw) => {
                if *raw != 0 {
                    cmdline.push_str(&tunable.name);
                    cmdline.push_str(" ");
                }
            }
            TunableValue::Choice { values, selected } => {
                let Some(value) = values.get(*selected).filter(|value| !value.is_empty()) else {
                    continue;
                };
                cmdline.push_field(&tunable.name);
                cmdline.push_str("=");
                cmdline.push_field(value);
                cmdline.push_str(" ");
            }
        }
    }

    cmdline
}
