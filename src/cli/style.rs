//! Terminal styling helpers
//!
//! Colors are always emitted; `anstream::println!` strips them when stdout
//! is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Success mark
pub const CHECK: &str = "✓";
/// Failure mark
pub const CROSS: &str = "✗";
/// Current-commit marker in stack listings
pub const POINTER: &str = "⬅";

/// Semantic styles for any displayable value
pub trait Stylize {
    /// Bold
    fn emphasis(&self) -> String;
    /// Highlighted value (counts, names)
    fn accent(&self) -> String;
    /// De-emphasized text
    fn muted(&self) -> String;
    /// Positive outcome
    fn success(&self) -> String;
    /// Something needs attention
    fn warn(&self) -> String;
    /// Failure
    fn error(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }

    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    fn error(&self) -> String {
        self.red().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Red cross
pub fn cross() -> String {
    CROSS.error()
}

/// Dimmed arrow for list items
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner used while waiting on git or the network
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}
