//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileConfig, HistoryConfig, ModelConfig, PathsConfig, RuntimeConfig,
};
pub use loader::ConfigLoader;
