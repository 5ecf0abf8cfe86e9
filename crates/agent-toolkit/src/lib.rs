//! # agent-toolkit
//!
//! Built-in tool providers for the react-agent system. Each module exposes a
//! `provider()` returning its [`ToolProvider`]; the composition root collects
//! these and hands them to `ToolRegistry::aggregate`.

pub mod clock;
pub mod geo;
pub mod math;

use agent_core::ToolProvider;

/// Every built-in provider, in registration order
pub fn providers() -> Vec<ToolProvider> {
    vec![math::provider(), clock::provider(), geo::provider()]
}
