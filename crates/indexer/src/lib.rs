//! # CCG Indexer
//!
//! Repository scanning and artifact persistence for the call graph.
//!
//! ## Pipeline
//!
//! ```text
//! outputs/<repo>/
//!     │
//!     ├──> docs.md ──> cached_docs.json (capped preview)
//!     │
//!     ├──> SourceScanner (every file, reserved outputs excluded)
//!     │      └─> CallGraph ──> ccg.json (atomic rename)
//!     │
//!     └──> Cleanup (keep docs.md, ccg.json, cached_docs.json)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ccg_indexer::{process_repo, ScanOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let report = process_repo(Path::new("outputs/my-repo"), ScanOptions::default()).await?;
//!
//!     println!("{:?} nodes, {:?} edges", report.nodes_count, report.edges_count);
//!     Ok(())
//! }
//! ```

mod error;
mod paths;
mod persist;
mod pipeline;
mod scanner;
mod summary;

pub use error::{IndexerError, Result};
pub use paths::{
    is_retained, validate_repo_name, OutputsLayout, CACHED_DOCS_ARTIFACT, DEFAULT_OUTPUTS_DIR,
    GRAPH_ARTIFACT, NARRATIVE_DOC, OUTPUTS_DIR_ENV, RETAINED_FILES,
};
pub use persist::{
    cleanup_repo_dir, clear_repo_cache, load_graph, read_graph, tmp_path, write_atomic,
    write_json_atomic, CleanupFailure, CleanupReport,
};
pub use pipeline::{process_repo, ProcessReport};
pub use scanner::{ScanOptions, ScanOutcome, ScanStats, SourceScanner};
pub use summary::{unix_now_secs, CachedDocs, GraphSnapshot, DOCS_PREVIEW_CHARS};
