//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model gateway returned an error response
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Model gateway unreachable or not responding
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Rate limited by the model endpoint
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Tool argument validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Two providers registered the same tool name
    #[error("Duplicate tool name '{name}' from provider '{provider}'")]
    DuplicateTool { name: String, provider: String },

    /// Turn exceeded the iteration cap without reaching a final answer
    #[error("Turn exceeded {0} iterations without a final answer")]
    LoopBound(usize),

    /// Turn cancelled by the caller
    #[error("Turn cancelled")]
    Cancelled,

    /// Parse error (e.g., malformed gateway payload)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::GatewayUnavailable(_) | AgentError::RateLimited(_) | AgentError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Gateway(msg) => format!("The model service encountered an error: {}", msg),
            AgentError::GatewayUnavailable(_) => {
                "The model service is currently unavailable. Please try again.".into()
            }
            AgentError::RateLimited(_) => {
                "You've made too many requests. Please wait a moment.".into()
            }
            AgentError::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {}", msg),
            AgentError::ToolExecution(msg) => format!("Tool error: {}", msg),
            AgentError::DuplicateTool { name, .. } => {
                format!("Tool '{}' is registered more than once.", name)
            }
            AgentError::LoopBound(_) => {
                "The request could not be completed within the allowed number of steps.".into()
            }
            AgentError::Cancelled => "The request was cancelled.".into(),
            AgentError::Config(msg) => format!("Configuration problem: {}", msg),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
