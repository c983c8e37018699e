use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A successor lookup failed; the walk cannot continue without its data
    #[error("Lookup failed for {node}: {source}")]
    LookupFailed {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Traversal budget exceeded")]
    BudgetExceeded,

    #[error("Traversal cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub fn lookup_failed(node: impl ToString, source: impl Into<anyhow::Error>) -> Self {
        Self::LookupFailed {
            node: node.to_string(),
            source: source.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
