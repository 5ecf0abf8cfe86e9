//! # agent-runtime
//!
//! Model gateway implementations for the react-agent system.
//!
//! ## Gateways
//!
//! - **OpenAI-compatible**: any endpoint speaking the chat-completions
//!   protocol with function calling (OpenAI, vLLM, llama.cpp server, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiGateway;
//!
//! let gateway = OpenAiGateway::from_env()?;
//! let agent = Agent::new(Arc::new(gateway), tools, config);
//! ```

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiGateway};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, ChatModel, Conversation, Message, Result, Role};
