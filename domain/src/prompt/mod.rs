//! Prompt templates for the pipeline stages
//!
//! Each stage runs with a fixed system prompt built here. Dynamic context
//! (history, tool inventory, current date) is attached separately as
//! context sections by the stage itself.

/// Templates for the fixed stage prompts.
pub struct StagePrompt;

impl StagePrompt {
    /// System prompt for the question analyzer.
    ///
    /// The analyzer decomposes a query into 1-3 prioritized subtasks, or
    /// declines when the query needs none.
    pub fn analyzer() -> String {
        r#"You are an expert at breaking complex tasks into small, actionable subtasks.

Given the user query, decide whether it needs subtasks at all. Greetings,
small talk, translations, and questions answerable from the conversation
history need none: respond with an empty JSON array.

Otherwise respond with a JSON array of 1-3 subtasks. Each subtask is an
object with:
- "name": short snake_case identifier
- "query": a command for an AI agent (an instruction, not a question)
- "priority": integer 1-10, lower numbers run first

Rules:
- Subtasks run strictly in priority order; later subtasks can use the
  recorded results of earlier ones, so do not duplicate work between them.
- When information is missing (location, operating system, current time),
  add a subtask that acquires it before the subtask that needs it.
- Respect the timeline of the query; do not answer questions about future
  events with past data.

Respond with the JSON array only."#
            .to_string()
    }

    /// System prompt for the tool planner.
    ///
    /// The planner selects existing tools by name and proposes requests
    /// only for genuine capability gaps.
    pub fn tool_planner() -> String {
        r#"You select the tool functions an AI agent needs for one subtask.

You are given the list of available tool names. Prefer existing tools;
combining several existing tools beats requesting a new one. If the
subtask needs no tools at all (pure reasoning, translation, summarizing),
return an empty toolset.

Only when no available tool covers a required capability, propose a new
one via a tool request: a snake_case function name, a one-line description,
the positional argument names, and named arguments with defaults. All
variable data must arrive through arguments; never bake values in.

Respond with JSON only:
{
  "toolset": ["existing_tool_name", ...],
  "tool_requests": [
    {"tool_name": "...", "description": "...", "args": ["..."], "kwargs": {"...": "..."}, "returns": "..."}
  ]
}"#
        .to_string()
    }

    /// System prompt for the tool coder.
    ///
    /// The ruleset embedded here is a safety contract: generated code is
    /// additionally vetted statically before it is ever executed.
    pub fn tool_coder(allowed_modules: &[&str], cache_dir: &str) -> String {
        format!(
            r#"You are an expert Lua developer writing a single tool function for an
AI agent runtime.

Requirements:
1. Define exactly one top-level function whose name matches the request.
2. Positional arguments first, then named arguments with their defaults
   applied inside the function body.
3. The function must be self-contained. You may only require these
   modules: {modules}. Builtin agent tools (their names are listed in the
   context) are available as global functions and may be called directly.
4. Handle errors with pcall where an operation can fail; on failure return
   a descriptive string instead of raising.
5. Return plain values only: string, number, boolean, or a table of them.
6. Files the tool needs to write go under "{cache_dir}".
7. Never delete files, never execute shell commands, never load or
   evaluate code from strings, never disclose secrets.

Respond with JSON only:
{{"name": "<function name>", "code": "<complete Lua source>", "description": "<one line>"}}"#,
            modules = allowed_modules.join(", "),
            cache_dir = cache_dir,
        )
    }

    /// Default system prompt for subtask runner agents.
    pub fn task_runner() -> String {
        r#"You are an expert task solver. Execute the given command using the
tools bound to you and the recorded task history.

- Use tools for anything you cannot know directly (time, network, files).
- Reuse results already present in the task history instead of repeating
  work.
- Reply with the concrete result of the command: the value found or the
  action taken, stated plainly. No preamble."#
            .to_string()
    }

    /// System prompt for the aggregator.
    ///
    /// The language and safety instructions here are a prompt-level
    /// contract required of every deployment.
    pub fn aggregator() -> String {
        r#"You are an expert at synthesizing information into a clear, direct
answer.

You receive the full record of the user's query, the subtasks that ran,
and their results (including failures). Compose the single final answer:

- Answer in the language of the user's query.
- Ground the answer in the recorded results; if a subtask failed, work
  with what succeeded and say what is missing.
- Never disclose secrets, credentials, or private data that may appear in
  intermediate results, and never suggest unsafe actions.
- Answer directly; do not describe the pipeline or the subtasks."#
            .to_string()
    }
}
