//! System information tools

use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use serde_json::{Value, json};

use conductor_domain::{ToolDefinition, ToolError, ToolHandle, ToolParameter};

use super::string_arg;

const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `get_datetime` — current local date and time as a formatted string.
pub fn get_datetime_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "get_datetime",
        "Get the current date and time as a string in the given strftime format",
    )
    .with_parameter(
        ToolParameter::new(
            "format",
            "strftime format string, default '%Y-%m-%d %H:%M:%S'",
            false,
        ),
    );

    Arc::new(ToolHandle::plain(definition, |args| {
        Box::pin(async move {
            let format =
                string_arg(&args, "format").unwrap_or_else(|| DEFAULT_DATETIME_FORMAT.to_string());
            format_now(&format).map(Value::String)
        })
    }))
}

fn format_now(format: &str) -> Result<String, ToolError> {
    // Reject malformed specifiers up front; DelayedFormat panics on them.
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ToolError::invalid_argument(format!(
            "Invalid strftime format: {}",
            format
        )));
    }
    Ok(chrono::Local::now().format(format).to_string())
}

/// `get_user_name` — name of the current OS user.
pub fn get_user_name_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new("get_user_name", "Get the username of the current user");

    Arc::new(ToolHandle::plain(definition, |_args| {
        Box::pin(async move {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .map(Value::String)
                .map_err(|_| ToolError::execution_failed("Could not determine the current user"))
        })
    }))
}

/// `get_os_info` — operating system, architecture, and family.
pub fn get_os_info_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "get_os_info",
        "Get the host operating system, CPU architecture, and OS family",
    );

    Arc::new(ToolHandle::plain(definition, |_args| {
        Box::pin(async move {
            Ok(json!({
                "os": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
                "family": std::env::consts::FAMILY,
            }))
        })
    }))
}
