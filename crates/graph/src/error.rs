use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Upper bound on the suggestion list attached to a failed lookup.
pub const MAX_SUGGESTIONS: usize = 50;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Function '{function}' not found in CCG")]
    FunctionNotFound {
        function: String,
        candidates: Vec<String>,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Parser error: {0}")]
    Parser(String),
}

/// Structured payload describing a query that matched no node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFoundDetail {
    pub error: String,
    pub suggestion: String,
    pub candidates: Vec<String>,
}

impl GraphError {
    /// Diagnostic payload for lookups that matched nothing, `None` for other errors.
    pub fn not_found_detail(&self) -> Option<NotFoundDetail> {
        match self {
            GraphError::FunctionNotFound { candidates, .. } => Some(NotFoundDetail {
                error: self.to_string(),
                suggestion: "Try one of these function names".to_string(),
                candidates: candidates.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::FunctionNotFound { .. })
    }
}
