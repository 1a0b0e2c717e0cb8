use crate::paths::{is_retained, OutputsLayout};
use crate::{IndexerError, Result};
use ccg_graph::CallGraph;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Sibling temp path: `ccg.json` -> `ccg.json.tmp`
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a temp sibling and rename it over `path`.
///
/// Readers see either the previous file or the new one. On failure the temp
/// file is removed and `path` is left as it was.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    if let Err(source) = write_then_rename(&tmp, path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(IndexerError::Persistence {
            path: path.to_path_buf(),
            source,
        });
    }
    log::info!("Wrote {}", path.display());
    Ok(())
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, path).await
}

pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes).await
}

pub async fn read_graph(path: &Path) -> Result<CallGraph> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Load the persisted graph of one repository.
pub async fn load_graph(layout: &OutputsLayout, repo_name: &str) -> Result<CallGraph> {
    let path = layout.graph_path(repo_name)?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(IndexerError::NotFound(format!(
            "CCG not found for repo '{repo_name}'. Generate documentation first."
        )));
    }
    read_graph(&path).await
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub name: String,
    pub error: String,
}

/// What a cleanup pass removed, and what it could not remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<CleanupFailure>,
}

/// Delete every entry of `dir` that is not a retained file.
///
/// Best effort: a failed removal is logged and recorded, and the pass goes
/// on with the remaining entries.
pub async fn cleanup_repo_dir(dir: &Path) -> Result<CleanupReport> {
    let mut entries = read_entries(dir).await?;
    entries.sort();

    let mut report = CleanupReport::default();
    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_retained(&name) {
            continue;
        }
        match remove_entry(&path).await {
            Ok(()) => {
                log::info!("Removed {}", path.display());
                report.removed.push(name);
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {e}", path.display());
                report.failed.push(CleanupFailure {
                    name,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Remove a repository's whole working directory; returns the removed path.
pub async fn clear_repo_cache(layout: &OutputsLayout, repo_name: &str) -> Result<PathBuf> {
    let dir = layout.repo_dir(repo_name)?;
    let is_dir = tokio::fs::metadata(&dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(IndexerError::NotFound(format!(
            "Repository '{repo_name}' not found in outputs"
        )));
    }

    for path in read_entries(&dir).await? {
        remove_entry(&path).await?;
    }
    tokio::fs::remove_dir(&dir).await?;

    log::info!("Cleared cache for {repo_name} ({})", dir.display());
    Ok(dir)
}

async fn read_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IndexerError::NotFound(format!(
                "Directory not found: {}",
                dir.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(entry.path());
    }
    Ok(entries)
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
