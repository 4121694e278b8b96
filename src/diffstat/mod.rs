//! Diff-stat computation results and their width-constrained rendering
//!
//! A [`DiffStatTable`] holds per-file insertion/deletion counts between two
//! commits. [`DiffStatRenderer`] turns it into the familiar
//! `git diff --stat` style summary, scaled to the display width.

pub mod render;
pub mod table;

pub use render::{allocate_symbols, graph_width, DiffStatRenderer};
pub use table::{DiffStatTable, FileStat};
