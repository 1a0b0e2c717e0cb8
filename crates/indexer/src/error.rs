use ccg_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid repository name: {0:?}")]
    InvalidRepoName(String),

    /// An atomic write failed; whatever was at `path` before is unchanged.
    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

impl IndexerError {
    pub fn is_not_found(&self) -> bool {
        match self {
            IndexerError::NotFound(_) => true,
            IndexerError::Graph(err) => err.is_not_found(),
            _ => false,
        }
    }
}
