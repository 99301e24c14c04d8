//! Colored terminal output for one-shot commands.

use std::fmt::Display;
use std::io::IsTerminal;

use owo_colors::OwoColorize;

const LABEL_WIDTH: usize = 14;

/// How a line of output reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// The module accepted a request.
    Done,
    /// A request or the panel itself failed.
    Failed,
    /// Field labels and headings.
    Label,
    /// Hints and empty results.
    Quiet,
}

/// Colors `text` for `tone` when stdout is a terminal.
pub fn paint(tone: Tone, text: impl Display) -> String {
    if !std::io::stdout().is_terminal() {
        return text.to_string();
    }
    match tone {
        Tone::Done => text.green().to_string(),
        Tone::Failed => text.red().bold().to_string(),
        Tone::Label => text.cyan().to_string(),
        Tone::Quiet => text.dimmed().to_string(),
    }
}

/// One `label value` row of the status listing.
pub fn field(label: &str, value: &str) -> String {
    format!("{} {value}", paint(Tone::Label, format!("{label:<LABEL_WIDTH$}")))
}

/// Status row for an optional value, `-` when the module never sent it.
pub fn optional_field(label: &str, value: Option<&str>) -> String {
    field(label, value.unwrap_or("-"))
}
