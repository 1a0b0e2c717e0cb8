use crate::types::CallGraph;
use std::collections::HashMap;

/// A call target after name resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// The raw text resolved to exactly one node id.
    Resolved(String),

    /// No node, or more than one node, answers to the raw text.
    Unresolved(String),
}

/// Case-insensitive match of `node_id` against `query`: exact equality, a
/// `:query` / `.query` suffix, or equality with the last `:`/`.` segment.
pub fn name_matches(node_id: &str, query: &str) -> bool {
    let id = node_id.to_lowercase();
    let query = query.to_lowercase();
    id == query
        || id.ends_with(&format!(":{query}"))
        || id.ends_with(&format!(".{query}"))
        || bare_name(&id) == query
}

/// Final segment after splitting on `:` and then `.`
pub fn bare_name(node_id: &str) -> &str {
    let tail = node_id.rsplit(':').next().unwrap_or(node_id);
    tail.rsplit('.').next().unwrap_or(tail)
}

/// Resolves free text to node ids using [`name_matches`].
///
/// Every id matching a query shares its bare name, so candidates come from a
/// bare-name index and are then checked against the full predicate. Results
/// keep graph order.
pub struct NameResolver<'g> {
    ids: Vec<&'g str>,
    exact: HashMap<&'g str, usize>,
    by_lower: HashMap<String, Vec<usize>>,
    by_bare: HashMap<String, Vec<usize>>,
}

impl<'g> NameResolver<'g> {
    pub fn new(graph: &'g CallGraph) -> Self {
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut exact = HashMap::new();
        let mut by_lower: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_bare: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, node) in graph.nodes.iter().enumerate() {
            let id = node.id.as_str();
            ids.push(id);
            exact.entry(id).or_insert(idx);
            let lower = id.to_lowercase();
            by_bare
                .entry(bare_name(&lower).to_string())
                .or_default()
                .push(idx);
            by_lower.entry(lower).or_default().push(idx);
        }

        Self {
            ids,
            exact,
            by_lower,
            by_bare,
        }
    }

    /// Every node id matching `query`, each once, in graph order.
    pub fn resolve(&self, query: &str) -> Vec<&'g str> {
        let lowered = query.to_lowercase();
        let candidates = self
            .by_bare
            .get(bare_name(&lowered))
            .into_iter()
            .flatten()
            .copied();
        let mut hits: Vec<usize> = if lowered.contains([':', '.']) {
            candidates
                .filter(|&idx| name_matches(self.ids[idx], &lowered))
                .collect()
        } else {
            self.by_lower
                .get(&lowered)
                .into_iter()
                .flatten()
                .copied()
                .chain(candidates)
                .collect()
        };
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|idx| self.ids[idx]).collect()
    }

    /// Node id that raw callee text stands for: an exact id wins, otherwise a
    /// single fuzzy match.
    pub fn target_id(&self, raw: &str) -> Option<&'g str> {
        if let Some(&idx) = self.exact.get(raw) {
            return Some(self.ids[idx]);
        }
        match self.resolve(raw).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn resolve_target(&self, raw: &str) -> CallTarget {
        match self.target_id(raw) {
            Some(id) => CallTarget::Resolved(id.to_string()),
            None => CallTarget::Unresolved(raw.to_string()),
        }
    }
}
