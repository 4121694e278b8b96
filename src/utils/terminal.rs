//! Terminal utilities for title setting and output management

use console::Term;
use std::io::Write;

use crate::core::config::DEFAULT_DISPLAY_WIDTH;

/// Sets the terminal title to the specified text
pub fn set_terminal_title(title: &str) {
    // ANSI escape sequence to set terminal title
    print!("\x1b]0;{}\x07", title);
}

/// Sets the terminal title and ensures it's flushed to the terminal
pub fn set_terminal_title_and_flush(title: &str) {
    set_terminal_title(title);
    let _ = std::io::stdout().flush();
}

/// Width of stdout in columns, or the default when stdout is not a terminal
pub fn terminal_width() -> usize {
    let term = Term::stdout();
    if !term.is_term() {
        return DEFAULT_DISPLAY_WIDTH;
    }
    term.size_checked()
        .map(|(_, cols)| cols as usize)
        .filter(|cols| *cols > 0)
        .unwrap_or(DEFAULT_DISPLAY_WIDTH)
}

/// Whether stdout supports colored output
pub fn supports_color() -> bool {
    console::colors_enabled()
}
