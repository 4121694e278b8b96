//! Width-constrained `--stat` style rendering

use console::Style;

use super::table::DiffStatTable;

/// Columns consumed by fixed punctuation: `" "`, `" | "` and the space before the graph
pub const SEPARATOR_WIDTH: usize = 5;

/// Floor for the graph column so narrow displays still get a readable bar
pub const MIN_GRAPH_WIDTH: usize = 10;

const ADDED_SYMBOL: &str = "+";
const REMOVED_SYMBOL: &str = "-";

/// Computes the number of columns available to the `+`/`-` graph
pub fn graph_width(display_width: usize, max_path_len: usize, max_num_len: usize) -> usize {
    display_width
        .saturating_sub(max_path_len + max_num_len + SEPARATOR_WIDTH)
        .max(MIN_GRAPH_WIDTH)
}

/// Splits a file's change total into `(plus, minus)` symbol counts
///
/// The total is capped at `graph_width` and the added share is rounded
/// down, so any remainder goes to the minus side.
pub fn allocate_symbols(added: usize, removed: usize, graph_width: usize) -> (usize, usize) {
    let total = added + removed;
    if total == 0 {
        return (0, 0);
    }
    let symbol_count = total.min(graph_width);
    let plus = added * symbol_count / total;
    (plus, symbol_count - plus)
}

/// Renders a [`DiffStatTable`] for a given display width
///
/// Output is a pure function of the table, the width and the color flag:
/// entries are always emitted sorted by path.
#[derive(Debug, Clone)]
pub struct DiffStatRenderer {
    display_width: usize,
    color: bool,
}

impl DiffStatRenderer {
    pub fn new(display_width: usize) -> Self {
        Self {
            display_width,
            color: false,
        }
    }

    /// Enables green/red styling of the graph symbols
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn display_width(&self) -> usize {
        self.display_width
    }

    /// Renders the per-file lines followed by the totals line
    ///
    /// An empty table still gets the totals line, so a branch that moved
    /// without touching any file reads as `0 files changed`.
    pub fn render(&self, table: &DiffStatTable) -> String {
        let max_path_len = table
            .iter()
            .map(|(path, _)| path.chars().count())
            .max()
            .unwrap_or(0);
        let max_total = table.iter().map(|(_, stat)| stat.total()).max().unwrap_or(0);
        let max_num_len = max_total.to_string().len();
        let graph_width = graph_width(self.display_width, max_path_len, max_num_len);

        let mut lines: Vec<String> = table
            .iter()
            .map(|(path, stat)| {
                let (plus, minus) = allocate_symbols(stat.added, stat.removed, graph_width);
                let graph = self.graph(plus, minus);
                let line = format!(
                    " {path:<path_width$} | {total:>num_width$} {graph}",
                    total = stat.total(),
                    path_width = max_path_len,
                    num_width = max_num_len,
                );
                line.trim_end().to_string()
            })
            .collect();

        lines.push(format!(
            " {} files changed, {} insertions(+), {} deletions(-)",
            table.len(),
            table.total_added(),
            table.total_removed()
        ));

        lines.join("\n")
    }

    fn graph(&self, plus: usize, minus: usize) -> String {
        let plus = ADDED_SYMBOL.repeat(plus);
        let minus = REMOVED_SYMBOL.repeat(minus);
        if !self.color {
            return format!("{plus}{minus}");
        }
        let mut graph = String::new();
        if !plus.is_empty() {
            graph.push_str(&Style::new().green().force_styling(true).apply_to(plus).to_string());
        }
        if !minus.is_empty() {
            graph.push_str(&Style::new().red().force_styling(true).apply_to(minus).to_string());
        }
        graph
    }
}
