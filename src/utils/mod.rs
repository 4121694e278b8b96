pub(crate) mod fs;
pub(crate) mod terminal;

// Public API - utilities used by the CLI
pub use fs::expand_path;
pub use terminal::{
    set_terminal_title, set_terminal_title_and_flush, supports_color, terminal_width,
};
