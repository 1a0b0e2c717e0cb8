use ccg_graph::CallGraph;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Longest docs prefix kept in the cached summary, in characters
pub const DOCS_PREVIEW_CHARS: usize = 20_000;

/// `cached_docs.json`: a capped preview of the narrative document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDocs {
    pub repo_name: String,
    pub cached_at: u64,
    pub docs_preview: String,
    pub docs_len: usize,
}

impl CachedDocs {
    pub fn from_docs(repo_name: impl Into<String>, docs: &str, cached_at: u64) -> Self {
        Self {
            repo_name: repo_name.into(),
            cached_at,
            docs_preview: docs.chars().take(DOCS_PREVIEW_CHARS).collect(),
            docs_len: docs.chars().count(),
        }
    }
}

/// Full-graph read payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub repo_name: String,
    pub nodes_count: usize,
    pub edges_count: usize,
    pub ccg: CallGraph,
}

impl GraphSnapshot {
    pub fn new(repo_name: impl Into<String>, ccg: CallGraph) -> Self {
        Self {
            repo_name: repo_name.into(),
            nodes_count: ccg.node_count(),
            edges_count: ccg.edge_count(),
            ccg,
        }
    }
}

pub fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn preview_is_capped_in_characters() {
        let docs = "é".repeat(DOCS_PREVIEW_CHARS + 5);
        let cached = CachedDocs::from_docs("demo", &docs, 7);
        assert_eq!(cached.docs_preview.chars().count(), DOCS_PREVIEW_CHARS);
        assert_eq!(cached.docs_len, DOCS_PREVIEW_CHARS + 5);
        assert_eq!(cached.cached_at, 7);
    }

    #[test]
    fn short_docs_are_kept_whole() {
        let cached = CachedDocs::from_docs("demo", "# Demo\n", 0);
        assert_eq!(cached.docs_preview, "# Demo\n");
        assert_eq!(cached.docs_len, 7);
    }
}
