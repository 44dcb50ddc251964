//! Pipeline orchestrator
//!
//! [`Conductor`] drives the full pipeline for each query:
//! analyze → for each subtask { plan tools → synthesize gaps → run } →
//! aggregate → update bounded history.
//!
//! Failure boundaries follow the partial-failure contract: a failed
//! subtask is recorded into history as an error result and the pipeline
//! continues; failures of the analyzer or the aggregator propagate to the
//! caller, since no sensible partial answer exists without a plan or an
//! aggregation step.
//!
//! Subtasks always run strictly sequentially — later subtasks may depend
//! on earlier results through the shared history. Each stage call is
//! bounded by an optional timeout and a cooperative cancellation token.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use conductor_domain::{
    Analysis, History, Model, StatusUpdate, SymbolTable, TaskDef, TaskRecord, TaskState, ToolSet,
};

use crate::ports::agent_runtime::{AgentRuntime, RuntimeError};
use crate::ports::history_store::HistoryStore;
use crate::ports::script_engine::ScriptEngine;
use crate::ports::status::{NullStatusSink, StatusSink};
use crate::stages::aggregator::Aggregator;
use crate::stages::analyzer::QuestionAnalyzer;
use crate::stages::runner::TaskRunner;
use crate::stages::synthesizer::Synthesizer;
use crate::stages::tool_planner::ToolPlanner;
use crate::task_unit::TaskError;

/// Fatal pipeline errors. Per-subtask failures never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Query analysis failed: {0}")]
    Analysis(#[source] TaskError),

    #[error("Aggregation failed: {0}")]
    Aggregation(#[source] TaskError),
}

/// Builder for [`Conductor`].
pub struct ConductorBuilder {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    engine: Arc<dyn ScriptEngine>,
    symbols: SymbolTable,
    history: History,
    store: Option<Arc<dyn HistoryStore>>,
    status: Arc<dyn StatusSink>,
    stage_timeout: Option<Duration>,
    tools_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ConductorBuilder {
    pub fn new(
        model: Model,
        runtime: Arc<dyn AgentRuntime>,
        engine: Arc<dyn ScriptEngine>,
    ) -> Self {
        Self {
            model,
            runtime,
            engine,
            symbols: SymbolTable::new(),
            history: History::default(),
            store: None,
            status: Arc::new(NullStatusSink),
            stage_timeout: None,
            tools_dir: PathBuf::from("tools"),
            cache_dir: PathBuf::from("cache"),
        }
    }

    /// Symbol table built at startup (builtins plus loaded generated tools).
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// Seed with previously persisted history.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Upper bound applied to every stage call.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn build(self) -> Conductor {
        let analyzer = QuestionAnalyzer::new(
            self.model.clone(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        );
        let planner = ToolPlanner::new(
            self.model.clone(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        );
        let synthesizer = Synthesizer::new(
            self.model.clone(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.engine),
            Arc::clone(&self.status),
            self.tools_dir,
            self.cache_dir,
        );
        let runner = TaskRunner::new(
            self.model.clone(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        );
        let aggregator = Aggregator::new(
            self.model,
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        );

        Conductor {
            analyzer,
            planner,
            synthesizer,
            runner,
            aggregator,
            symbols: self.symbols,
            history: self.history,
            store: self.store,
            status: self.status,
            stage_timeout: self.stage_timeout,
            cancel: CancellationToken::new(),
        }
    }
}

/// The orchestrator: one instance per conversation, single writer of its
/// own history. Not safe for concurrent queries without external
/// synchronization — `ask` takes `&mut self` to make that explicit.
pub struct Conductor {
    analyzer: QuestionAnalyzer,
    planner: ToolPlanner,
    synthesizer: Synthesizer,
    runner: TaskRunner,
    aggregator: Aggregator,
    symbols: SymbolTable,
    history: History,
    store: Option<Arc<dyn HistoryStore>>,
    status: Arc<dyn StatusSink>,
    stage_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Conductor {
    pub fn builder(
        model: Model,
        runtime: Arc<dyn AgentRuntime>,
        engine: Arc<dyn ScriptEngine>,
    ) -> ConductorBuilder {
        ConductorBuilder::new(model, runtime, engine)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Token for cancelling a query in flight from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Answer one query through the full pipeline.
    pub async fn ask(&mut self, query: &str) -> Result<String, PipelineError> {
        info!(query, "Query received");
        self.history.begin(query);

        let analysis = bounded(
            self.stage_timeout,
            &self.cancel,
            self.analyzer.analyze(query, &self.history),
        )
        .await
        .map_err(PipelineError::Analysis)?;

        match analysis {
            Analysis::Empty => {
                info!("No subtasks needed");
            }
            Analysis::Direct(text) => {
                // A direct answer is a zero-subtask run: record it so the
                // aggregator can ground on it.
                info!("Analyzer answered directly");
                self.history
                    .record_task(TaskRecord::new("direct response", text));
            }
            Analysis::Decomposed(tasks) => {
                let total = tasks.len();
                info!(subtasks = total, "Query decomposed");
                for (index, task_def) in tasks.into_iter().enumerate() {
                    self.status.on_status(
                        &StatusUpdate::new(
                            &task_def.name,
                            TaskState::Pending,
                            format!("Subtask {}/{}", index + 1, total),
                        )
                        .with_progress((index * 100 / total) as u8),
                    );

                    match self.run_subtask(&task_def).await {
                        Ok(record) => self.history.record_task(record),
                        Err(error) => {
                            // Central partial-failure contract: record and
                            // move on to the next subtask.
                            warn!(task = %task_def.name, %error, "Subtask failed");
                            self.history.record_task(TaskRecord::new(
                                &task_def.query,
                                format!("Error running task {}: {}", task_def.name, error),
                            ));
                        }
                    }
                }
            }
        }

        let answer = bounded(
            self.stage_timeout,
            &self.cancel,
            self.aggregator.aggregate(&self.history),
        )
        .await
        .map_err(PipelineError::Aggregation)?;

        self.history.set_final_result(&answer);
        self.persist();

        Ok(answer)
    }

    /// Synchronous entry point; wraps [`ask`](Self::ask) in a
    /// current-thread runtime.
    pub fn ask_sync(&mut self, query: &str) -> Result<String, PipelineError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                PipelineError::Analysis(TaskError::Runtime(RuntimeError::Transport(format!(
                    "Failed to create runtime: {}",
                    e
                ))))
            })?;
        rt.block_on(self.ask(query))
    }

    /// Plan tools, synthesize gaps, and run a single subtask.
    async fn run_subtask(&mut self, task_def: &TaskDef) -> Result<TaskRecord, TaskError> {
        let plan = bounded(
            self.stage_timeout,
            &self.cancel,
            self.planner.plan(task_def, &self.symbols, &self.history),
        )
        .await?;

        let mut toolset: ToolSet = plan.toolset;
        for request in &plan.tool_requests {
            match bounded(
                self.stage_timeout,
                &self.cancel,
                self.synthesizer
                    .synthesize(request, &mut self.symbols, &self.history),
            )
            .await
            {
                Ok(handle) => toolset.insert_or_replace_handle(handle),
                Err(TaskError::Cancelled) => return Err(TaskError::Cancelled),
                Err(error) => {
                    // A failed synthesis degrades the subtask; the runner
                    // still executes with whatever tools resolved.
                    warn!(
                        task = %task_def.name,
                        tool = %request.tool_name,
                        %error,
                        "Tool synthesis failed; continuing without it"
                    );
                    self.status.on_status(&StatusUpdate::new(
                        &task_def.name,
                        TaskState::Running,
                        format!("Tool synthesis failed for '{}'", request.tool_name),
                    ));
                }
            }
        }

        bounded(
            self.stage_timeout,
            &self.cancel,
            self.runner
                .run(task_def, toolset, &self.symbols, &self.history),
        )
        .await
    }

    fn persist(&self) {
        if let Some(store) = &self.store
            && let Err(error) = store.save(&self.history)
        {
            warn!(%error, "Failed to persist history");
        }
    }
}

/// Bound a stage future with the optional timeout and the cancellation
/// token. Synthesis errors are folded through their `TaskError` shape by
/// the caller.
async fn bounded<T, E, F>(
    limit: Option<Duration>,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, TaskError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TaskError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TaskError::Cancelled),
        result = with_limit(limit, fut) => result,
    }
}

async fn with_limit<T, E, F>(limit: Option<Duration>, fut: F) -> Result<T, TaskError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TaskError>,
{
    match limit {
        Some(duration) => match tokio::time::timeout(duration, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(TaskError::Timeout(duration)),
        },
        None => fut.await.map_err(Into::into),
    }
}
