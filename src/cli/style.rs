//! Terminal styling helpers

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};

/// Success marker
pub const CHECK: &str = "✓";

/// Failure marker
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
///
/// Colors are dropped automatically when stdout is not a terminal.
pub trait Stylize {
    /// De-emphasized text
    fn muted(&self) -> String;
    /// Bold text
    fn emphasis(&self) -> String;
    /// Highlighted value (branch names, SHAs)
    fn accent(&self) -> String;
    /// Warning text
    fn warn(&self) -> String;
}

fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

impl<T: AsRef<str> + ?Sized> Stylize for T {
    fn muted(&self) -> String {
        paint(self.as_ref(), Style::new().dimmed())
    }

    fn emphasis(&self) -> String {
        paint(self.as_ref(), Style::new().bold())
    }

    fn accent(&self) -> String {
        paint(self.as_ref(), Style::new().cyan())
    }

    fn warn(&self) -> String {
        paint(self.as_ref(), Style::new().yellow())
    }
}

/// Green check mark
pub fn check() -> String {
    paint(CHECK, Style::new().green())
}

/// Red cross
pub fn cross() -> String {
    paint(CROSS, Style::new().red())
}

/// Spinner used for long-running host calls
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
}
