use crate::error::Result;
use crate::heuristic::HeuristicParser;
use crate::python::PythonParser;
use crate::types::{CallEdge, GraphNode};
use std::collections::HashMap;
use std::path::Path;

/// Nodes and edges extracted from a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<CallEdge>,
}

/// Turns the contents of one file into call-graph fragments.
///
/// `module` is the repository-relative path of the file and becomes the
/// prefix of every node id the parser emits.
pub trait SourceParser: Send {
    fn name(&self) -> &'static str;

    /// `true` when call attribution follows the real lexical scope.
    fn is_precise(&self) -> bool;

    fn parse(&mut self, module: &str, source: &str) -> Result<ParsedFile>;
}

/// Maps file extensions to parsers, with one fallback for everything else
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SourceParser>>,
    by_extension: HashMap<String, usize>,
    fallback: Box<dyn SourceParser>,
}

impl ParserRegistry {
    /// Registry with no extension mappings; every file goes to `fallback`.
    pub fn new(fallback: Box<dyn SourceParser>) -> Self {
        Self {
            parsers: Vec::new(),
            by_extension: HashMap::new(),
            fallback,
        }
    }

    /// Python files go to the AST extractor, everything else to the regex one.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new(Box::new(HeuristicParser::new()));
        registry.register(&["py"], Box::new(PythonParser::new()?));
        Ok(registry)
    }

    /// Route the given extensions (case-insensitive, without the dot) to `parser`.
    pub fn register(&mut self, extensions: &[&str], parser: Box<dyn SourceParser>) {
        let idx = self.parsers.len();
        self.parsers.push(parser);
        for ext in extensions {
            self.by_extension.insert(ext.to_lowercase(), idx);
        }
    }

    pub fn parser_for(&mut self, path: &Path) -> &mut dyn SourceParser {
        let idx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_lowercase()).copied());
        match idx {
            Some(idx) => self.parsers[idx].as_mut(),
            None => self.fallback.as_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension_case_insensitively() {
        let mut registry = ParserRegistry::with_defaults().unwrap();

        assert_eq!(registry.parser_for(Path::new("pkg/mod.py")).name(), "python");
        assert_eq!(registry.parser_for(Path::new("pkg/MOD.PY")).name(), "python");
        assert_eq!(registry.parser_for(Path::new("src/main.rs")).name(), "heuristic");
        assert_eq!(registry.parser_for(Path::new("Makefile")).name(), "heuristic");
        assert_eq!(registry.parser_for(Path::new("tool.pyw")).name(), "heuristic");
    }

    #[test]
    fn precise_flag_follows_the_parser() {
        let mut registry = ParserRegistry::with_defaults().unwrap();
        assert!(registry.parser_for(Path::new("a.py")).is_precise());
        assert!(!registry.parser_for(Path::new("a.js")).is_precise());
    }
}
