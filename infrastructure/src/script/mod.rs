//! Sandboxed Lua engine for generated tools
//!
//! Generated tools are persisted as `<tools_dir>/<name>.lua`, each
//! defining one top-level function named after the file stem. Every tool
//! loads into its own Lua VM with a restricted environment, so symbols
//! from independently generated tools can never collide.

pub mod engine;
pub mod sandbox;
pub mod vet;

pub use engine::LuaToolEngine;
