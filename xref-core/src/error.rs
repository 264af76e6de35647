use xref_graph::{GraphError, NodeId, NodeIdentity};

/// Top-level cross-reference error type.
///
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum XrefError {
    /// Error while building the usage index.
    #[error("Indexing error: {0}")]
    Index(#[from] IndexError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inconsistent semantic program model.
    #[error("Program graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Errors raised while indexing one class's usages.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The class pass was aborted; its contribution may be missing or partial.
    #[error("Usage indexing failed for class {class}: {source}")]
    IndexingFailure {
        class: FailedClass,
        #[source]
        source: GraphError,
    },

    /// An occurrence points past the end of the generated text.
    #[error("Line {line} out of range ({available} lines available)")]
    OutOfRangeLine {
        line: u32,
        available: usize,
    },
}

/// The class a failed pass was started for.
///
/// A pass rejected before the class resolved to a top-level identity (an
/// unknown handle, a member, a nested class) only has the node handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedClass {
    Identified(NodeIdentity),
    Unresolved(NodeId),
}

impl std::fmt::Display for FailedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identified(identity) => write!(f, "{identity}"),
            Self::Unresolved(node) => write!(f, "node {node}"),
        }
    }
}

/// Errors in configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, XrefError>`.
pub type Result<T> = std::result::Result<T, XrefError>;
