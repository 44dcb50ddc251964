//! Builtin tool library
//!
//! A flat set of leaf functions exposed to agents as `{name → callable}`
//! pairs. They carry no state beyond a shared HTTP client and are merged
//! into the symbol table at startup.

pub mod file;
pub mod net;
pub mod system;
pub mod web;

use std::sync::Arc;

use serde_json::Value;

use conductor_domain::{ToolArgs, ToolDefinition, ToolHandle, ToolParameter};

/// Every builtin tool, in registration order.
pub fn builtin_tools(client: &reqwest::Client) -> Vec<Arc<ToolHandle>> {
    vec![
        system::get_datetime_tool(),
        system::get_user_name_tool(),
        system::get_os_info_tool(),
        net::get_public_ip_tool(client),
        net::get_location_by_ip_tool(client),
        net::get_weather_forecast_tool(client),
        file::read_text_file_tool(),
        file::write_text_file_tool(),
        web::web_search_tool(client),
        web::fetch_url_tool(client),
        recall_history_tool(),
    ]
}

/// Context-consuming tool: renders recent finished exchanges so an agent
/// can look things up in the conversation.
pub fn recall_history_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "recall_history",
        "Recall recent conversation history: past queries and their final answers",
    );
    Arc::new(ToolHandle::contextual(definition, |ctx, _args| {
        Box::pin(async move {
            let text = ctx.history.conversation_text();
            if text.is_empty() {
                Ok(Value::String("(no history)".to_string()))
            } else {
                Ok(Value::String(text))
            }
        })
    }))
}

pub(crate) fn string_arg(args: &ToolArgs, name: &str) -> Option<String> {
    args.get(name).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn f64_arg(args: &ToolArgs, name: &str) -> Option<f64> {
    args.get(name).and_then(Value::as_f64)
}

pub(crate) fn usize_arg(args: &ToolArgs, name: &str) -> Option<usize> {
    args.get(name).and_then(Value::as_u64).map(|v| v as usize)
}

pub(crate) fn required_param(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, true)
}
