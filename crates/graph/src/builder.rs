use crate::parser::ParsedFile;
use crate::types::{CallGraph, GraphNode};
use std::collections::HashSet;

/// Folds per-file extraction results into one graph.
///
/// Nodes are deduplicated by id with first-seen winning; later duplicates are
/// dropped, not merged. Edges are appended as-is and never resolved here.
#[derive(Debug, Default)]
pub struct GraphAssembler {
    graph: CallGraph,
    seen: HashSet<String>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a node with the same id is already present.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.seen.contains(&node.id) {
            log::debug!("Dropping duplicate node {}", node.id);
            return false;
        }
        self.seen.insert(node.id.clone());
        self.graph.nodes.push(node);
        true
    }

    /// Merge one file's output; returns how many of its nodes were new.
    pub fn add_file(&mut self, parsed: ParsedFile) -> usize {
        let mut added = 0;
        for node in parsed.nodes {
            if self.add_node(node) {
                added += 1;
            }
        }
        self.graph.edges.extend(parsed.edges);
        added
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn finish(self) -> CallGraph {
        log::info!(
            "Built call graph: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.graph
    }
}
