use ccg_graph::GraphError;
use ccg_indexer::IndexerError;
use ccg_protocol::{codes, ErrorEnvelope};
use std::process::ExitCode;

/// Map a command failure onto the JSON error envelope.
pub fn classify_error(err: &anyhow::Error) -> ErrorEnvelope {
    if let Some(graph) = err.downcast_ref::<GraphError>() {
        return graph_envelope(graph);
    }
    if let Some(indexer) = err.downcast_ref::<IndexerError>() {
        return match indexer {
            IndexerError::Graph(graph) => graph_envelope(graph),
            IndexerError::NotFound(message) => ErrorEnvelope::new(codes::NOT_FOUND, message),
            IndexerError::InvalidRepoName(_) => {
                ErrorEnvelope::new(codes::INVALID_REQUEST, indexer.to_string())
                    .with_hint("Repository names are single directory names under the outputs root")
            }
            IndexerError::Persistence { .. } => {
                ErrorEnvelope::new(codes::PERSISTENCE, indexer.to_string())
            }
            IndexerError::Io(_) | IndexerError::Json(_) => {
                ErrorEnvelope::new(codes::INTERNAL, indexer.to_string())
            }
        };
    }
    ErrorEnvelope::new(codes::INTERNAL, format!("{err:#}"))
}

fn graph_envelope(err: &GraphError) -> ErrorEnvelope {
    match err {
        GraphError::FunctionNotFound { .. } => {
            let envelope = ErrorEnvelope::new(codes::NOT_FOUND, err.to_string());
            match err
                .not_found_detail()
                .and_then(|detail| serde_json::to_value(detail).ok())
            {
                Some(details) => envelope.with_details(details),
                None => envelope,
            }
        }
        GraphError::InvalidQuery(message) => ErrorEnvelope::new(codes::INVALID_REQUEST, message),
        GraphError::Parser(message) => ErrorEnvelope::new(codes::INTERNAL, message),
    }
}

pub fn exit_code(envelope: &ErrorEnvelope) -> ExitCode {
    if envelope.is_not_found() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
