//! # agent-core
//!
//! Orchestration core for a tool-augmented conversational agent: drive a
//! language model through a bounded propose → execute → observe loop until
//! it produces an answer requiring no further tool use.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Agent Loop                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │ Conversation │  │ ToolRegistry │  │    ChatModel       │  │
//! │  │ (append-only)│──│  + Invoker   │──│   (boundary)       │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatModel` trait keeps the model behind a boundary: any backend that
//! can turn a conversation plus tool schemas into an assistant completion
//! plugs in without changing loop logic.

pub mod error;
pub mod gateway;
pub mod invoker;
pub mod message;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use gateway::{ChatModel, Completion, GenerationOptions};
pub use invoker::invoke_all;
pub use message::{Conversation, Message, Role};
pub use reasoning::{Agent, AgentConfig, CancelToken, LoopState, TurnOptions, TurnStream};
pub use session::{Session, SessionId};
pub use tool::{Tool, ToolCall, ToolObservation, ToolProvider, ToolRegistry, ToolSchema};
