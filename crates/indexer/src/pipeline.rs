use crate::paths::{CACHED_DOCS_ARTIFACT, GRAPH_ARTIFACT, NARRATIVE_DOC};
use crate::persist::{cleanup_repo_dir, write_json_atomic, CleanupFailure};
use crate::scanner::{ScanOptions, ScanOutcome, SourceScanner, ScanStats};
use crate::summary::{unix_now_secs, CachedDocs};
use crate::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of post-processing one repository working directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub ok: bool,

    /// Why nothing was done (`"no_docs"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanStats>,

    /// The graph build failed; cleanup still ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_error: Option<String>,

    #[serde(default)]
    pub removed: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl ProcessReport {
    fn no_docs() -> Self {
        Self {
            ok: false,
            reason: Some("no_docs".to_string()),
            ..Self::default()
        }
    }
}

/// Post-process a repository working directory produced upstream.
///
/// Caches a preview of `docs.md`, builds and writes `ccg.json`, then removes
/// everything except the retained files. A failed build is recorded in the
/// report and does not stop the cleanup.
pub async fn process_repo(repo_dir: &Path, options: ScanOptions) -> Result<ProcessReport> {
    let given = repo_dir;
    let repo_dir = match tokio::fs::canonicalize(given).await {
        Ok(dir) if dir.is_dir() => dir,
        _ => {
            return Err(IndexerError::NotFound(format!(
                "Repo path not found: {}",
                given.display()
            )))
        }
    };
    // Named after the path as given; a symlinked directory keeps its link name.
    let repo_name = given
        .file_name()
        .or_else(|| repo_dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| repo_dir.display().to_string());
    log::info!("Processing {repo_name} @ {}", repo_dir.display());

    let docs_path = repo_dir.join(NARRATIVE_DOC);
    if !tokio::fs::try_exists(&docs_path).await.unwrap_or(false) {
        log::info!("No {NARRATIVE_DOC} in {}, nothing to do", repo_dir.display());
        return Ok(ProcessReport::no_docs());
    }

    let docs = tokio::fs::read_to_string(&docs_path).await?;
    let cached = CachedDocs::from_docs(repo_name.as_str(), &docs, unix_now_secs());
    write_json_atomic(&repo_dir.join(CACHED_DOCS_ARTIFACT), &cached).await?;

    let mut report = ProcessReport {
        ok: true,
        repo_name: Some(repo_name.clone()),
        ..ProcessReport::default()
    };

    match build_graph(repo_dir.clone(), options).await {
        Ok(outcome) => {
            report.nodes_count = Some(outcome.graph.node_count());
            report.edges_count = Some(outcome.graph.edge_count());
            report.scan = Some(outcome.stats);
        }
        Err(e) => {
            log::warn!("Error building CCG for {repo_name}: {e}");
            report.build_error = Some(e.to_string());
        }
    }

    let cleanup = cleanup_repo_dir(&repo_dir).await?;
    report.removed = cleanup.removed;
    report.cleanup_failures = cleanup.failed;

    log::info!(
        "Post-processing of {repo_name} done, kept {NARRATIVE_DOC}, {GRAPH_ARTIFACT}, {CACHED_DOCS_ARTIFACT}"
    );
    Ok(report)
}

async fn build_graph(repo_dir: PathBuf, options: ScanOptions) -> Result<ScanOutcome> {
    let scan_root = repo_dir.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        SourceScanner::new(scan_root).with_options(options).scan()
    })
    .await
    .map_err(|e| IndexerError::Io(std::io::Error::other(e)))??;

    write_json_atomic(&repo_dir.join(GRAPH_ARTIFACT), &outcome.graph).await?;
    Ok(outcome)
}
