use crate::error::Result;
use crate::parser::{ParsedFile, SourceParser};
use crate::types::{CallEdge, GraphNode};
use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(def|function|fn)\s+([A-Za-z0-9_\.]+)\b").expect("valid function pattern")
});

static TYPE_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(class|struct)\s+([A-Za-z0-9_\.]+)\b").expect("valid type pattern")
});

static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_\.]+)\s*\(").expect("valid call pattern"));

/// Regex-based fallback for any text source.
///
/// Every call found in a file is attributed to the first node the file
/// produced (definitions are scanned before types), so edges carry
/// [`crate::EdgeOrigin::Unscoped`]. A file without definitions yields no edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for HeuristicParser {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn is_precise(&self) -> bool {
        false
    }

    fn parse(&mut self, module: &str, source: &str) -> Result<ParsedFile> {
        let mut out = ParsedFile::default();

        for caps in FUNCTION_DEF.captures_iter(source) {
            let name = &caps[2];
            out.nodes.push(GraphNode::function(module, name, name, None));
        }
        for caps in TYPE_DEF.captures_iter(source) {
            out.nodes.push(GraphNode::class(module, &caps[2]));
        }

        let Some(anchor) = out.nodes.first().map(|n| n.id.clone()) else {
            return Ok(out);
        };
        for caps in CALL_SITE.captures_iter(source) {
            out.edges.push(CallEdge::unscoped(anchor.as_str(), &caps[1]));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use pretty_assertions::assert_eq;

    fn parse(module: &str, source: &str) -> ParsedFile {
        HeuristicParser::new().parse(module, source).unwrap()
    }

    #[test]
    fn definitions_are_listed_before_types() {
        let parsed = parse("lib.rs", "struct Point {}\nfn origin() -> Point { Point::new() }\n");
        let kinds: Vec<(&str, NodeKind)> =
            parsed.nodes.iter().map(|n| (n.id.as_str(), n.kind)).collect();
        assert_eq!(
            kinds,
            vec![("lib.rs:origin", NodeKind::Function), ("lib.rs:Point", NodeKind::Class)]
        );
    }

    #[test]
    fn every_call_hangs_off_the_first_node() {
        let source = "function a() { b(); }\nfunction c() { d(); }\n";
        let parsed = parse("app.js", source);
        let targets: Vec<&str> = parsed.edges.iter().map(|e| e.to.as_str()).collect();
        // Definition sites match the call pattern as well.
        assert_eq!(targets, vec!["a", "b", "c", "d"]);
        assert!(parsed
            .edges
            .iter()
            .all(|e| e.from_id() == Some("app.js:a") && e.origin.as_ref().unwrap().is_approximate()));
    }

    #[test]
    fn files_without_definitions_produce_no_edges() {
        let parsed = parse("README.md", "Run `make(all)` then print(x)\n");
        assert!(parsed.nodes.is_empty());
        assert!(parsed.edges.is_empty());
    }

    #[test]
    fn dotted_names_are_captured_whole() {
        let parsed = parse("main.go", "fn main() {\n    fmt.Println(\"hi\")\n}\n");
        assert_eq!(parsed.edges[1].to, "fmt.Println");
    }
}
