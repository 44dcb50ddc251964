//! CLI entrypoint for conductor
//!
//! Wires the layers together: configuration, logging, the HTTP runtime
//! adapter, the Lua tool engine, the builtin tool library, persisted
//! history, and the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use conductor_application::{
    Conductor, HistoryStore, NullStatusSink, StatusSink,
};
use conductor_domain::{History, Model, SymbolTable};
use conductor_infrastructure::{ChatRuntime, ConfigLoader, JsonHistoryStore, LuaToolEngine, tools};
use conductor_presentation::{ChatRepl, Cli, ConsoleFormatter, StatusReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    // Console logging by verbosity, plus a daily file log.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let file_appender =
        tracing_appender::rolling::daily(&config.paths.logs_dir, "conductor.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    info!("Starting conductor");

    let model: Model = cli
        .model
        .as_deref()
        .unwrap_or(&config.model.default)
        .parse()
        .context("Invalid model identifier")?;

    let api_key = std::env::var(&config.runtime.api_key_env).ok();
    if api_key.is_none() {
        warn!(
            var = %config.runtime.api_key_env,
            "API key variable not set; requests will be unauthenticated"
        );
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.runtime.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let runtime = Arc::new(
        ChatRuntime::new(client.clone(), &config.runtime.base_url, api_key)
            .with_max_tool_turns(config.runtime.max_tool_turns),
    );

    // === Symbol table: builtins first, then persisted generated tools ===
    let mut symbols = SymbolTable::new();
    for tool in tools::builtin_tools(&client) {
        symbols
            .register(tool)
            .map_err(|e| anyhow::anyhow!("builtin registration: {}", e))?;
    }

    let engine = Arc::new(LuaToolEngine::new(symbols.plain_snapshot()));
    for tool in engine.load_dir(&config.paths.tools_dir) {
        if symbols.contains(tool.name()) {
            warn!(tool = tool.name(), "Generated tool shadows a builtin; skipped");
        } else {
            symbols.register_replace(tool);
        }
    }
    info!(tools = symbols.len(), "Symbol table ready");

    // === History: restore from disk when present ===
    let store = Arc::new(JsonHistoryStore::new(&config.paths.history_file));
    let history = match store.load() {
        Ok(Some(history)) => history,
        Ok(None) => History::new(config.history.max_items),
        Err(error) => {
            warn!(%error, "Could not read persisted history; starting fresh");
            History::new(config.history.max_items)
        }
    };

    let status: Arc<dyn StatusSink> = if cli.quiet {
        Arc::new(NullStatusSink)
    } else {
        Arc::new(StatusReporter::new())
    };

    let mut builder = Conductor::builder(model.clone(), runtime, engine)
        .with_symbols(symbols)
        .with_history(history)
        .with_status(status)
        .with_tools_dir(&config.paths.tools_dir)
        .with_cache_dir(&config.paths.cache_dir);
    if !cli.no_save {
        builder = builder.with_store(store as Arc<dyn HistoryStore>);
    }
    if let Some(secs) = config.runtime.stage_timeout_secs {
        builder = builder.with_stage_timeout(Duration::from_secs(secs));
    }
    let mut conductor = builder.build();

    if cli.chat {
        let mut repl = ChatRepl::new(conductor, model.to_string());
        repl.run().await?;
        return Ok(());
    }

    let Some(query) = cli.query else {
        bail!("A query is required. Use --chat for interactive mode.");
    };

    match conductor.ask(&query).await {
        Ok(answer) => {
            ConsoleFormatter::print_answer(&answer);
            Ok(())
        }
        Err(error) => {
            ConsoleFormatter::print_error(&error);
            Err(error.into())
        }
    }
}
