use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of definition a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Function,
    Class,
}

/// Definition extracted from a source file (function, method or class)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Globally unique key: `<module-relative-path>:<qualified-name>`
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Bare definition name (e.g., "load_config")
    pub name: String,

    /// Repository-relative path of the defining file
    pub module: String,

    /// 1-based line of the definition, when the extractor knows it
    #[serde(rename = "lineno", default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl GraphNode {
    pub fn function(module: &str, qualified: &str, name: &str, line: Option<u32>) -> Self {
        Self {
            id: node_id(module, qualified),
            kind: NodeKind::Function,
            name: name.to_string(),
            module: module.to_string(),
            line,
        }
    }

    pub fn class(module: &str, name: &str) -> Self {
        Self {
            id: node_id(module, name),
            kind: NodeKind::Class,
            name: name.to_string(),
            module: module.to_string(),
            line: None,
        }
    }
}

pub fn node_id(module: &str, qualified: &str) -> String {
    format!("{module}:{qualified}")
}

/// Relationship label carried by every edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    #[default]
    Calls,
}

/// Where a call edge was attributed from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeOrigin {
    /// The call sits lexically inside this function.
    Scoped(String),

    /// The call was attributed to a file-level anchor node, not its enclosing scope.
    Unscoped { anchor: String },
}

impl EdgeOrigin {
    pub fn owner(&self) -> &str {
        match self {
            EdgeOrigin::Scoped(owner) => owner,
            EdgeOrigin::Unscoped { anchor } => anchor,
        }
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self, EdgeOrigin::Unscoped { .. })
    }
}

/// Call edge. `to` is the raw callee text as written at the call site and is
/// never rewritten to a node id at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EdgeRecord", into = "EdgeRecord")]
pub struct CallEdge {
    pub origin: Option<EdgeOrigin>,
    pub to: String,
    pub label: EdgeLabel,
}

impl CallEdge {
    pub fn scoped(owner: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            origin: Some(EdgeOrigin::Scoped(owner.into())),
            to: to.into(),
            label: EdgeLabel::Calls,
        }
    }

    pub fn unscoped(anchor: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            origin: Some(EdgeOrigin::Unscoped {
                anchor: anchor.into(),
            }),
            to: to.into(),
            label: EdgeLabel::Calls,
        }
    }

    /// Literal `from` id, if any.
    pub fn from_id(&self) -> Option<&str> {
        self.origin.as_ref().map(EdgeOrigin::owner)
    }
}

/// On-disk shape of an edge
#[derive(Serialize, Deserialize)]
struct EdgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(default)]
    to: String,
    #[serde(default)]
    label: EdgeLabel,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    approximate: bool,
}

impl From<EdgeRecord> for CallEdge {
    fn from(record: EdgeRecord) -> Self {
        let origin = record.from.map(|from| {
            if record.approximate {
                EdgeOrigin::Unscoped { anchor: from }
            } else {
                EdgeOrigin::Scoped(from)
            }
        });
        Self {
            origin,
            to: record.to,
            label: record.label,
        }
    }
}

impl From<CallEdge> for EdgeRecord {
    fn from(edge: CallEdge) -> Self {
        let approximate = edge
            .origin
            .as_ref()
            .is_some_and(EdgeOrigin::is_approximate);
        Self {
            from: edge.origin.map(|origin| match origin {
                EdgeOrigin::Scoped(owner) => owner,
                EdgeOrigin::Unscoped { anchor } => anchor,
            }),
            to: edge.to,
            label: edge.label,
            approximate,
        }
    }
}

/// Repository-wide call graph: ordered nodes plus raw, undeduplicated edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    #[serde(default)]
    pub edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node id -> node lookup table
    pub fn node_table(&self) -> HashMap<&str, &GraphNode> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    /// Ids of all function nodes, lexically sorted
    pub fn function_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Function)
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }
}
