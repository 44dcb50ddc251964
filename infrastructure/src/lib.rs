//! Infrastructure layer for conductor
//!
//! Adapters for the application-layer ports:
//!
//! - [`runtime::ChatRuntime`] — invocation runtime over an
//!   OpenAI-compatible chat-completions API with native tool calling
//! - [`script::LuaToolEngine`] — sandboxed Lua engine that loads
//!   generated tool files
//! - [`tools`] — the builtin tool library
//! - [`history::JsonHistoryStore`] — JSON history persistence
//! - [`config`] — figment-based configuration loading

pub mod config;
pub mod history;
pub mod runtime;
pub mod script;
pub mod tools;

pub use config::{ConfigLoader, FileConfig};
pub use history::JsonHistoryStore;
pub use runtime::ChatRuntime;
pub use script::LuaToolEngine;
