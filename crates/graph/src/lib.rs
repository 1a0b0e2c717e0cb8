//! # CCG Graph
//!
//! Call-graph extraction and relationship queries.
//!
//! ## Architecture
//!
//! ```text
//! (module path, file contents)
//!     │
//!     ├──> ParserRegistry (dispatch by extension)
//!     │      ├─ PythonParser: tree-sitter AST, lexical scope stack
//!     │      └─ HeuristicParser: regex scan, one coarse scope per file
//!     │
//!     ├──> GraphAssembler
//!     │      ├─ Nodes: functions, methods, classes (dedup by id, first wins)
//!     │      └─ Edges: caller id -> raw callee text (never deduplicated)
//!     │
//!     └──> RelationshipEngine
//!            ├─ NameResolver: exact / suffix / bare-name matching
//!            ├─ Forward + backward adjacency
//!            └─ Bounded breadth-first traversal (depth 1..=10)
//! ```

mod builder;
mod error;
mod heuristic;
mod parser;
mod python;
mod query;
mod resolver;
mod types;

pub use builder::GraphAssembler;
pub use error::{GraphError, NotFoundDetail, Result, MAX_SUGGESTIONS};
pub use heuristic::HeuristicParser;
pub use parser::{ParsedFile, ParserRegistry, SourceParser};
pub use python::PythonParser;
pub use query::{
    Direction, EntryKind, MatchedNode, Neighbor, QueryResponse, RelationshipEngine,
    RelationshipQuery, TargetMatching, MAX_DEPTH, MIN_DEPTH,
};
pub use resolver::{bare_name, name_matches, CallTarget, NameResolver};
pub use types::{node_id, CallEdge, CallGraph, EdgeLabel, EdgeOrigin, GraphNode, NodeKind};
