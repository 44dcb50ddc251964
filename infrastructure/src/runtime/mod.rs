//! Invocation runtime adapter
//!
//! Implements the [`AgentRuntime`](conductor_application::AgentRuntime)
//! port over an OpenAI-compatible chat-completions API with native tool
//! calling. The adapter owns the multi-turn tool loop: it executes the
//! model's tool calls through the bound handles and feeds the results
//! back until the model stops requesting tools.

pub mod http;
pub mod schema;
pub mod wire;

pub use http::ChatRuntime;
