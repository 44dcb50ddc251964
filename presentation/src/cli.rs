//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for conductor
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(version, about = "LLM-agent orchestration: decompose, tool up, execute, aggregate")]
#[command(long_about = r#"
Conductor answers a query by running it through a four-stage agent
pipeline:

1. Analyze:   break the query into prioritized subtasks
2. Plan:      select existing tools, synthesize missing ones
3. Run:       execute each subtask with its tools bound
4. Aggregate: compose the final answer from all results

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./conductor.toml      Project-level config
3. ~/.config/conductor/config.toml   Global config

Example:
  conductor "What time is it?"
  conductor --chat
  conductor -m gpt-4o-mini "What's the weather like here?"
"#)]
pub struct Cli {
    /// The query to answer (not required in chat mode)
    pub query: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Model to use for every pipeline stage
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress status output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Do not persist conversation history to disk
    #[arg(long)]
    pub no_save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_query() {
        let cli = Cli::parse_from(["conductor", "what time is it?"]);
        assert_eq!(cli.query.as_deref(), Some("what time is it?"));
        assert!(!cli.chat);
    }

    #[test]
    fn test_parse_chat_with_model_and_verbosity() {
        let cli = Cli::parse_from(["conductor", "--chat", "-m", "gpt-4o-mini", "-vv"]);
        assert!(cli.chat);
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cli.verbose, 2);
    }
}
