//! On-disk list of discovered repositories

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use git2::Repository;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use super::config::STALE_CACHE_DAYS;
use crate::git::RepositoryDescriptor;

/// Writes the repository list as pretty JSON, stamping every record with the current time
pub fn save(path: &Path, repositories: &[RepositoryDescriptor]) -> Result<()> {
    let now = Utc::now();
    let records: Vec<RepositoryDescriptor> = repositories
        .iter()
        .cloned()
        .map(|mut repo| {
            repo.last_scanned = now;
            repo
        })
        .collect();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(&records).context("Failed to serialize repository cache")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write repository cache {}", path.display()))?;
    Ok(())
}

/// Reads the repository list, dropping entries that no longer open as repositories
///
/// A missing cache file is an empty list.
pub fn load(path: &Path) -> Result<Vec<RepositoryDescriptor>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read repository cache {}", path.display()))
        }
    };

    let records: Vec<RepositoryDescriptor> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed repository cache {}", path.display()))?;

    Ok(records
        .into_iter()
        .filter(|repo| match Repository::open(&repo.path) {
            Ok(_) => true,
            Err(err) => {
                debug!(
                    path = %repo.path.display(),
                    error = %err.message(),
                    "dropping stale cache entry"
                );
                false
            }
        })
        .collect())
}

/// Time since the cache file was last written, or `None` when it does not exist
pub fn age(path: &Path) -> Result<Option<Duration>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to stat repository cache {}", path.display()))
        }
    };
    let modified: DateTime<Utc> = metadata
        .modified()
        .with_context(|| format!("No modification time for {}", path.display()))?
        .into();
    Ok(Some(Utc::now().signed_duration_since(modified)))
}

/// Whether a cache of this age should be refreshed
pub fn is_stale(age: Duration) -> bool {
    age > Duration::days(STALE_CACHE_DAYS)
}
