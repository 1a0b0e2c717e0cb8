use crate::{IndexerError, Result};
use std::path::{Path, PathBuf};

pub const GRAPH_ARTIFACT: &str = "ccg.json";
pub const CACHED_DOCS_ARTIFACT: &str = "cached_docs.json";
pub const NARRATIVE_DOC: &str = "docs.md";

/// Files kept in a repository working directory after post-processing.
/// The scanner never parses them.
pub const RETAINED_FILES: &[&str] = &[NARRATIVE_DOC, GRAPH_ARTIFACT, CACHED_DOCS_ARTIFACT];

pub const OUTPUTS_DIR_ENV: &str = "CCG_OUTPUTS_DIR";
pub const DEFAULT_OUTPUTS_DIR: &str = "outputs";

pub fn is_retained(file_name: &str) -> bool {
    RETAINED_FILES.contains(&file_name)
}

/// A repository name must be one plain path component.
pub fn validate_repo_name(name: &str) -> Result<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(IndexerError::InvalidRepoName(name.to_string()));
    }
    Ok(name)
}

/// Root directory holding one working directory per repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputsLayout {
    root: PathBuf,
}

impl OutputsLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `explicit` first, then `CCG_OUTPUTS_DIR`, then `./outputs`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let root = explicit
            .or_else(|| {
                std::env::var_os(OUTPUTS_DIR_ENV)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUTS_DIR));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo_dir(&self, repo_name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_repo_name(repo_name)?))
    }

    pub fn graph_path(&self, repo_name: &str) -> Result<PathBuf> {
        Ok(self.repo_dir(repo_name)?.join(GRAPH_ARTIFACT))
    }
}
