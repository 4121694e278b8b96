//! Repository discovery across configured directories

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use git2::Repository;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::{ESTIMATED_REPO_COUNT, MAX_SCAN_DEPTH, SKIP_DIRECTORIES};
use crate::git::{RepositoryDescriptor, DEFAULT_UPSTREAM_REMOTE};

/// Check if a .git file (for submodules/worktrees) contains gitdir reference
/// Only reads the first 5 lines for efficiency
fn is_git_file(path: &Path) -> bool {
    match fs::File::open(path) {
        Ok(file) => {
            let reader = BufReader::new(file);
            // Only read first few lines - gitdir is typically in the first line
            reader
                .lines()
                .take(5)
                .map_while(Result::ok)
                .any(|line| line.trim_start().starts_with("gitdir:"))
        }
        Err(_) => false,
    }
}

/// True when `dir` is the root of a working copy
fn is_repository_root(dir: &Path) -> bool {
    let git = dir.join(".git");
    git.is_dir() || (git.is_file() && is_git_file(&git))
}

/// Shared state for one discovery run
#[derive(Clone)]
struct Collector {
    // Lock-free dedup across walker threads; a repo can be reached twice via symlinks
    found: Arc<DashMap<PathBuf, ()>>,
    count: Arc<AtomicUsize>,
    on_found: Arc<dyn Fn(usize) + Send + Sync>,
}

impl Collector {
    fn record(&self, path: &Path) {
        // Check existence first to avoid allocation
        if self.found.contains_key(path) {
            return;
        }
        if let Entry::Vacant(entry) = self.found.entry(path.to_path_buf()) {
            entry.insert(());
            let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
            (self.on_found)(count);
        }
    }
}

fn walk_directory(root: &Path, collector: &Collector) {
    if is_repository_root(root) {
        collector.record(root);
        return;
    }

    let filter_collector = collector.clone();
    let walker = WalkBuilder::new(root)
        .follow_links(true) // Follow symlinks to find symlinked repos
        .max_depth(Some(MAX_SCAN_DEPTH)) // Limit depth to avoid deep recursion
        .threads(num_cpus::get().min(8)) // Use up to 8 threads for directory walking
        .hidden(false)
        .git_ignore(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let file_name = entry.file_name().to_str().unwrap_or("");

            // Skip common build/dependency directories and hidden directories
            if SKIP_DIRECTORIES.contains(&file_name) || file_name.starts_with('.') {
                return false;
            }
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return false;
            }

            // Stop at the repository root; nested checkouts belong to it
            if is_repository_root(entry.path()) {
                filter_collector.record(entry.path());
                return false;
            }
            true
        })
        .build_parallel();

    walker.run(|| {
        Box::new(|result| {
            if let Err(err) = result {
                debug!(error = %err, "skipping unreadable entry");
            }
            ignore::WalkState::Continue
        })
    });
}

/// Opens a discovered path and records whether it has an `upstream` remote
fn describe(path: &Path) -> Option<RepositoryDescriptor> {
    match Repository::open(path) {
        Ok(repo) => {
            let has_upstream = repo.find_remote(DEFAULT_UPSTREAM_REMOTE).is_ok();
            Some(RepositoryDescriptor::new(path, has_upstream))
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err.message(), "not an openable repository");
            None
        }
    }
}

/// Finds every repository below `directories`, sorted by path
///
/// Missing or unreadable directories are skipped. `on_found` receives the
/// running count each time a new repository root is seen.
pub fn find_repositories<F>(directories: &[PathBuf], on_found: F) -> Vec<RepositoryDescriptor>
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let collector = Collector {
        found: Arc::new(DashMap::with_capacity(ESTIMATED_REPO_COUNT)),
        count: Arc::new(AtomicUsize::new(0)),
        on_found: Arc::new(on_found),
    };

    for directory in directories {
        match directory.canonicalize() {
            Ok(root) if root.is_dir() => walk_directory(&root, &collector),
            _ => warn!(path = %directory.display(), "skipping missing directory"),
        }
    }

    let paths: Vec<PathBuf> = collector.found.iter().map(|e| e.key().clone()).collect();
    let mut repos: Vec<RepositoryDescriptor> =
        paths.par_iter().filter_map(|path| describe(path)).collect();

    repos.par_sort_by(|a, b| a.path.cmp(&b.path));
    repos
}
