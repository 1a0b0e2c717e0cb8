use crate::error::{GraphError, Result};
use crate::parser::{ParsedFile, SourceParser};
use crate::types::{CallEdge, GraphNode};
use tree_sitter::{Node, Parser};

/// AST-level extractor for Python sources
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| GraphError::Parser(format!("Failed to set language: {}", e)))?;
        Ok(Self { parser })
    }
}

impl SourceParser for PythonParser {
    fn name(&self) -> &'static str {
        "python"
    }

    fn is_precise(&self) -> bool {
        true
    }

    fn parse(&mut self, module: &str, source: &str) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| GraphError::Parser(format!("Failed to parse {module}")))?;

        let root = tree.root_node();
        // A module with syntax errors contributes nothing, like a failed compile.
        if root.has_error() {
            log::debug!("Syntax errors in {module}, skipping definitions");
            return Ok(ParsedFile::default());
        }

        let mut visitor = ScopeVisitor::new(module, source);
        visitor.visit(root);
        Ok(visitor.out)
    }
}

/// Lexical position of the walk: enclosing function id and enclosing class name.
#[derive(Debug, Clone, Default)]
struct ScopeFrame {
    function: Option<String>,
    class: Option<String>,
}

struct ScopeVisitor<'s> {
    module: &'s str,
    source: &'s str,
    scopes: Vec<ScopeFrame>,
    out: ParsedFile,
}

impl<'s> ScopeVisitor<'s> {
    fn new(module: &'s str, source: &'s str) -> Self {
        Self {
            module,
            source,
            scopes: vec![ScopeFrame::default()],
            out: ParsedFile::default(),
        }
    }

    fn current(&self) -> ScopeFrame {
        self.scopes.last().cloned().unwrap_or_default()
    }

    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "class_definition" => self.visit_class(node, &[]),
            "function_definition" => self.visit_function(node, &[]),
            "decorated_definition" => self.visit_decorated(node),
            "call" => {
                self.record_call(node);
                self.visit_children(node);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    /// Decorators belong to the definition they wrap: a decorated function
    /// owns the calls in its decorator list.
    fn visit_decorated(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let decorators: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                self.visit_function(def, &decorators)
            }
            Some(def) if def.kind() == "class_definition" => self.visit_class(def, &decorators),
            _ => self.visit_children(node),
        }
    }

    fn visit_class(&mut self, node: Node<'_>, decorators: &[Node<'_>]) {
        let Some(name) = node
            .child_by_field_name("name")
            .and_then(|n| self.text(n))
        else {
            self.visit_children(node);
            return;
        };

        self.out.nodes.push(GraphNode::class(self.module, &name));

        let frame = ScopeFrame {
            function: self.current().function,
            class: Some(name),
        };
        self.scopes.push(frame);
        self.visit_children(node);
        for decorator in decorators {
            self.visit(*decorator);
        }
        self.scopes.pop();
    }

    fn visit_function(&mut self, node: Node<'_>, decorators: &[Node<'_>]) {
        let Some(name) = node
            .child_by_field_name("name")
            .and_then(|n| self.text(n))
        else {
            self.visit_children(node);
            return;
        };

        let scope = self.current();
        // Nested functions use the same class-based naming as methods, so a
        // nested helper can share an id with a sibling method of that name.
        let qualified = match &scope.class {
            Some(class) => format!("{class}.{name}"),
            None => name.clone(),
        };
        let line = u32::try_from(node.start_position().row + 1).ok();
        let function = GraphNode::function(self.module, &qualified, &name, line);
        let id = function.id.clone();
        self.out.nodes.push(function);

        self.scopes.push(ScopeFrame {
            function: Some(id),
            class: scope.class,
        });
        self.visit_children(node);
        for decorator in decorators {
            self.visit(*decorator);
        }
        self.scopes.pop();
    }

    fn record_call(&mut self, node: Node<'_>) {
        let Some(owner) = self.current().function else {
            return;
        };
        let Some(callee) = node
            .child_by_field_name("function")
            .and_then(|target| self.callee_text(target))
        else {
            return;
        };
        self.out.edges.push(CallEdge::scoped(owner, callee));
    }

    /// `foo(...)` -> "foo", `a.b.c(...)` -> "a.b.c". Chains whose base is not a
    /// plain name keep only the attribute part: `f().g()` -> "g".
    fn callee_text(&self, target: Node<'_>) -> Option<String> {
        let target = unwrap_parens(target);
        match target.kind() {
            "identifier" => self.text(target),
            "attribute" => {
                let mut parts = Vec::new();
                let mut cur = target;
                while cur.kind() == "attribute" {
                    let attr = cur.child_by_field_name("attribute");
                    parts.extend(attr.and_then(|n| self.text(n)));
                    match cur.child_by_field_name("object") {
                        Some(object) => cur = unwrap_parens(object),
                        None => break,
                    }
                }
                if cur.kind() == "identifier" {
                    if let Some(base) = self.text(cur) {
                        parts.push(base);
                    }
                }
                if parts.is_empty() {
                    return None;
                }
                parts.reverse();
                Some(parts.join("."))
            }
            _ => None,
        }
    }

    fn text(&self, node: Node<'_>) -> Option<String> {
        node.utf8_text(self.source.as_bytes())
            .ok()
            .map(|s| s.to_string())
    }
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}
