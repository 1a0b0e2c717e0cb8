use crate::error::{GraphError, Result, MAX_SUGGESTIONS};
use crate::resolver::{CallTarget, NameResolver};
use crate::types::{CallGraph, GraphNode, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const MIN_DEPTH: usize = 1;
pub const MAX_DEPTH: usize = 10;

/// Which side of the call relation to walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Callers,
    Callees,
    #[default]
    Both,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Callers => "callers",
            Direction::Callees => "callees",
            Direction::Both => "both",
        }
    }

    pub fn includes_callees(self) -> bool {
        matches!(self, Direction::Callees | Direction::Both)
    }

    pub fn includes_callers(self) -> bool {
        matches!(self, Direction::Callers | Direction::Both)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "callers" => Ok(Direction::Callers),
            "callees" => Ok(Direction::Callees),
            "both" => Ok(Direction::Both),
            other => Err(GraphError::InvalidQuery(format!(
                "unknown direction '{other}' (expected callers, callees or both)"
            ))),
        }
    }
}

/// How call targets are tied to graph nodes during traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetMatching {
    /// Raw `to` text is used as-is in both directions: `to = "foo"` reaches
    /// the node `mod.py:foo` only if the edge spells out that id.
    #[default]
    Literal,

    /// Raw `to` text naming a single node is replaced by that node's id in
    /// both directions.
    Resolved,
}

impl FromStr for TargetMatching {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "literal" => Ok(TargetMatching::Literal),
            "resolved" => Ok(TargetMatching::Resolved),
            other => Err(GraphError::InvalidQuery(format!(
                "unknown target matching '{other}' (expected literal or resolved)"
            ))),
        }
    }
}

fn default_depth() -> usize {
    MIN_DEPTH
}

/// Relationship query as received from a front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipQuery {
    pub function: String,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default = "default_depth")]
    pub depth: usize,
}

impl RelationshipQuery {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            direction: Direction::default(),
            depth: default_depth(),
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.function.trim().is_empty() {
            return Err(GraphError::InvalidQuery("function must not be empty".into()));
        }
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(GraphError::InvalidQuery(format!(
                "depth must be between {MIN_DEPTH} and {MAX_DEPTH}, got {}",
                self.depth
            )));
        }
        Ok(())
    }
}

/// Node kind as reported in responses; dangling targets are `unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Class,
    Unknown,
}

impl From<NodeKind> for EntryKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Function => EntryKind::Function,
            NodeKind::Class => EntryKind::Class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub module: String,
}

/// One node reached by traversal, at its minimum hop count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub module: String,
    pub depth: usize,

    /// Single node the raw text names, when it is not itself a node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub repo_name: String,
    pub query: RelationshipQuery,
    pub matches: Vec<MatchedNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callees: Option<BTreeMap<String, Vec<Neighbor>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callers: Option<BTreeMap<String, Vec<Neighbor>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

/// Answers callers/callees questions against one in-memory graph snapshot.
///
/// Both adjacency maps share one key space: node ids for edge sources and
/// the target text chosen by [`TargetMatching`] for edge targets.
pub struct RelationshipEngine<'g> {
    graph: &'g CallGraph,
    nodes: HashMap<&'g str, &'g GraphNode>,
    resolver: NameResolver<'g>,
    forward: HashMap<&'g str, Vec<&'g str>>,
    backward: HashMap<&'g str, Vec<&'g str>>,
}

impl<'g> RelationshipEngine<'g> {
    pub fn new(graph: &'g CallGraph) -> Self {
        Self::with_matching(graph, TargetMatching::default())
    }

    pub fn with_matching(graph: &'g CallGraph, matching: TargetMatching) -> Self {
        let resolver = NameResolver::new(graph);
        let mut resolved: HashMap<&'g str, &'g str> = HashMap::new();
        let mut forward: HashMap<&'g str, Vec<&'g str>> = HashMap::new();
        let mut backward: HashMap<&'g str, Vec<&'g str>> = HashMap::new();

        for edge in &graph.edges {
            let Some(from) = edge.from_id().filter(|from| !from.is_empty()) else {
                continue;
            };
            let raw = edge.to.as_str();
            if raw.is_empty() {
                continue;
            }

            let to = match matching {
                TargetMatching::Literal => raw,
                TargetMatching::Resolved => *resolved
                    .entry(raw)
                    .or_insert_with(|| resolver.target_id(raw).unwrap_or(raw)),
            };
            forward.entry(from).or_default().push(to);
            backward.entry(to).or_default().push(from);
        }

        Self {
            graph,
            nodes: graph.node_table(),
            resolver,
            forward,
            backward,
        }
    }

    pub fn query(&self, repo_name: &str, query: &RelationshipQuery) -> Result<QueryResponse> {
        query.validate()?;

        let matches = self.resolver.resolve(&query.function);
        if matches.is_empty() {
            let mut candidates = self.graph.function_ids();
            candidates.truncate(MAX_SUGGESTIONS);
            return Err(GraphError::FunctionNotFound {
                function: query.function.clone(),
                candidates,
            });
        }

        let walk = |step: Step| -> BTreeMap<String, Vec<Neighbor>> {
            matches
                .iter()
                .map(|id| (id.to_string(), self.traverse(id, step, query.depth)))
                .collect()
        };

        let callees = query.direction.includes_callees().then(|| walk(Step::Forward));
        let callers = query.direction.includes_callers().then(|| walk(Step::Backward));

        log::debug!(
            "Query '{}' ({}, depth {}) matched {} node(s)",
            query.function,
            query.direction,
            query.depth,
            matches.len()
        );

        Ok(QueryResponse {
            repo_name: repo_name.to_string(),
            query: query.clone(),
            matches: matches.iter().map(|id| self.describe_match(id)).collect(),
            callees,
            callers,
        })
    }

    /// Functions reachable from `start` within `max_depth` calls.
    pub fn callees(&self, start: &str, max_depth: usize) -> Vec<Neighbor> {
        self.traverse(start, Step::Forward, max_depth)
    }

    /// Functions reaching `start` within `max_depth` calls.
    pub fn callers(&self, start: &str, max_depth: usize) -> Vec<Neighbor> {
        self.traverse(start, Step::Backward, max_depth)
    }

    fn neighbors(&self, node: &str, step: Step) -> &[&'g str] {
        let map = match step {
            Step::Forward => &self.forward,
            Step::Backward => &self.backward,
        };
        map.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Level-by-level BFS. A neighbor is reported once, at the depth where it
    /// was first seen. Only text naming a node is expanded further, since
    /// edge sources are always node ids.
    fn traverse(&self, start: &str, step: Step, max_depth: usize) -> Vec<Neighbor> {
        let mut results = Vec::new();
        let mut recorded: HashSet<&str> = HashSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut frontier: Vec<&str> = vec![start];

        for depth in 0..max_depth {
            let mut next = Vec::new();
            for node in frontier {
                if !visited.insert(node) {
                    continue;
                }
                for &neighbor in self.neighbors(node, step) {
                    if recorded.insert(neighbor) {
                        results.push(self.describe_neighbor(neighbor, depth + 1));
                        if self.nodes.contains_key(neighbor) {
                            next.push(neighbor);
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        results
    }

    fn describe_match(&self, id: &str) -> MatchedNode {
        let neighbor = self.describe_neighbor(id, 0);
        MatchedNode {
            id: neighbor.id,
            name: neighbor.name,
            kind: neighbor.kind,
            module: neighbor.module,
        }
    }

    fn describe_neighbor(&self, id: &str, depth: usize) -> Neighbor {
        match self.nodes.get(id) {
            Some(node) => Neighbor {
                id: id.to_string(),
                name: node.name.clone(),
                kind: node.kind.into(),
                module: node.module.clone(),
                depth,
                resolved: None,
            },
            None => Neighbor {
                id: id.to_string(),
                name: id.to_string(),
                kind: EntryKind::Unknown,
                module: "unknown".to_string(),
                depth,
                resolved: match self.resolver.resolve_target(id) {
                    CallTarget::Resolved(target) => Some(target),
                    CallTarget::Unresolved(_) => None,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CallEdge;
    use pretty_assertions::assert_eq;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("Callers".parse::<Direction>().unwrap(), Direction::Callers);
        assert_eq!(" both ".parse::<Direction>().unwrap(), Direction::Both);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Both);
    }

    #[test]
    fn depth_outside_bounds_is_rejected() {
        assert!(RelationshipQuery::new("f").depth(0).validate().is_err());
        assert!(RelationshipQuery::new("f").depth(11).validate().is_err());
        assert!(RelationshipQuery::new("f").depth(10).validate().is_ok());
        assert!(RelationshipQuery::new("  ").validate().is_err());
    }

    #[test]
    fn query_defaults_when_fields_are_missing() {
        let query: RelationshipQuery = serde_json::from_str(r#"{"function":"run"}"#).unwrap();
        assert_eq!(query, RelationshipQuery::new("run"));
        assert_eq!(query.depth, 1);
    }

    #[test]
    fn edges_without_endpoints_are_ignored() {
        let graph = CallGraph {
            nodes: vec![GraphNode::function("m", "a", "a", None)],
            edges: vec![
                CallEdge {
                    origin: None,
                    to: "x".into(),
                    label: Default::default(),
                },
                CallEdge::scoped("m:a", ""),
            ],
        };
        let engine = RelationshipEngine::new(&graph);
        assert!(engine.callees("m:a", 3).is_empty());
        assert!(engine.callers("x", 3).is_empty());
    }

    #[test]
    fn target_matching_parses_case_insensitively() {
        assert_eq!(
            "Resolved".parse::<TargetMatching>().unwrap(),
            TargetMatching::Resolved
        );
        assert_eq!(TargetMatching::default(), TargetMatching::Literal);
        assert!("fuzzy".parse::<TargetMatching>().is_err());
    }

    #[test]
    fn recursion_reports_the_start_node_once() {
        let graph = CallGraph {
            nodes: vec![GraphNode::function("m.py", "fact", "fact", Some(1))],
            edges: vec![CallEdge::scoped("m.py:fact", "m.py:fact")],
        };
        let engine = RelationshipEngine::new(&graph);
        let callees = engine.callees("m.py:fact", 5);
        assert_eq!(callees.len(), 1);
        assert_eq!(callees[0].id, "m.py:fact");
        assert_eq!(callees[0].depth, 1);
    }
}
