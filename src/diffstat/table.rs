//! Per-file line statistics between two snapshots

use std::collections::BTreeMap;

/// Lines added and removed for a single file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    pub added: usize,
    pub removed: usize,
}

impl FileStat {
    pub fn new(added: usize, removed: usize) -> Self {
        Self { added, removed }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed
    }
}

/// Maps file path to its line statistics
///
/// Entries are kept in a `BTreeMap` so iteration is always lexicographic by
/// path, independent of the order in which the diff produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStatTable {
    entries: BTreeMap<String, FileStat>,
}

impl DiffStatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds line counts for `path`, accumulating if the path is already present.
    /// Empty paths are ignored.
    pub fn record(&mut self, path: impl Into<String>, added: usize, removed: usize) {
        let path = path.into();
        if path.is_empty() {
            return;
        }
        let entry = self.entries.entry(path).or_default();
        entry.added += added;
        entry.removed += removed;
    }

    pub fn get(&self, path: &str) -> Option<&FileStat> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries sorted by path
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileStat)> {
        self.entries.iter().map(|(path, stat)| (path.as_str(), stat))
    }

    pub fn total_added(&self) -> usize {
        self.entries.values().map(|s| s.added).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.entries.values().map(|s| s.removed).sum()
    }

    /// Parses `git diff --numstat` output
    ///
    /// Each line is `<added>\t<removed>\t<path>`. Binary files report `-` for
    /// both counts and are recorded as 0/0. Renames written as
    /// `old => new` are kept verbatim.
    pub fn from_numstat(output: &str) -> Self {
        let mut table = Self::new();
        for line in output.lines() {
            let mut parts = line.splitn(3, '\t');
            let (Some(added), Some(removed), Some(path)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let added = added.trim().parse().unwrap_or(0);
            let removed = removed.trim().parse().unwrap_or(0);
            table.record(path.trim(), added, removed);
        }
        table
    }
}

impl<S: Into<String>> FromIterator<(S, usize, usize)> for DiffStatTable {
    fn from_iter<I: IntoIterator<Item = (S, usize, usize)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (path, added, removed) in iter {
            table.record(path, added, removed);
        }
        table
    }
}
