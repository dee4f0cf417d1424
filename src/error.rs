// Error types for the reachability engine

use thiserror::Error;

/// Main error type for the engine.
///
/// `Blocked` is the distinguishable "policy denies this traffic" variant
/// that node implementations return from next-hop queries; everything else
/// is a hard failure meaning "we don't know", not "traffic is denied".
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("traffic blocked at {node_id}: {reason}")]
    Blocked { node_id: String, reason: String },

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Destination resolution failed: {0}")]
    Resolver(String),

    #[error("Account scope error: {0}")]
    AccountScope(String),

    #[error("Traversal cancelled")]
    Cancelled,

    #[error("{context}")]
    Simulation {
        context: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Wrap a leg failure with calling context, preserving the source chain.
    pub fn wrap(context: impl Into<String>, source: EngineError) -> Self {
        EngineError::Simulation {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True for the "policy denies this traffic" variant.
    pub fn is_blocking(&self) -> bool {
        match self {
            EngineError::Blocked { .. } => true,
            EngineError::Simulation { source, .. } => source.is_blocking(),
            _ => false,
        }
    }

    /// True when the failure came from cooperative cancellation. Callers
    /// must not interpret a cancelled call as "traffic is blocked".
    pub fn is_cancelled(&self) -> bool {
        match self {
            EngineError::Cancelled => true,
            EngineError::Simulation { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if error is retryable. The engine never retries on its own;
    /// retry policy belongs to the external collaborator.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Lookup(_) | EngineError::Resolver(_) | EngineError::AccountScope(_) => {
                true
            }
            EngineError::Simulation { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Blocked { node_id, reason } => {
                format!("Traffic is blocked at {}: {}", node_id, reason)
            }
            EngineError::Lookup(_) => {
                "Topology lookup failed. Check connectivity to the inventory service.".to_string()
            }
            EngineError::Resolver(_) => {
                "Could not resolve the destination address to a known component.".to_string()
            }
            EngineError::AccountScope(_) => {
                "Could not obtain credentials for the owning account scope.".to_string()
            }
            EngineError::Cancelled => "The operation was cancelled.".to_string(),
            EngineError::Simulation { source, .. } => source.user_message(),
            EngineError::Config(_) => {
                "Configuration error. Check your config file or environment variables.".to_string()
            }
            EngineError::Io(_) => "File system error. Check permissions and paths.".to_string(),
        }
    }
}
