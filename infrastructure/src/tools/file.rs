//! File access tools

use std::sync::Arc;

use serde_json::Value;

use conductor_domain::{ToolDefinition, ToolError, ToolHandle, ToolParameter};

use super::{required_param, string_arg, usize_arg};

/// Default read cap: keeps tool results within a prompt-friendly size.
const DEFAULT_MAX_BYTES: usize = 64 * 1024;

/// `read_text_file` — read a UTF-8 text file, truncated to a byte limit.
pub fn read_text_file_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new("read_text_file", "Read a UTF-8 text file")
        .with_parameter(required_param("path", "Path of the file to read"))
        .with_parameter(
            ToolParameter::new("max_bytes", "Maximum bytes to return, default 65536", false)
                .with_type("integer"),
        );

    Arc::new(ToolHandle::plain(definition, |args| {
        Box::pin(async move {
            let path = string_arg(&args, "path")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: path"))?;
            let max_bytes = usize_arg(&args, "max_bytes").unwrap_or(DEFAULT_MAX_BYTES);

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ToolError::execution_failed(format!("{}: {}", path, e)))?;

            Ok(Value::String(truncate_utf8(content, max_bytes)))
        })
    }))
}

/// `write_text_file` — write text, creating parent directories.
pub fn write_text_file_tool() -> Arc<ToolHandle> {
    let definition = ToolDefinition::new("write_text_file", "Write text to a file")
        .with_parameter(required_param("path", "Path of the file to write"))
        .with_parameter(required_param("content", "Text content to write"));

    Arc::new(ToolHandle::plain(definition, |args| {
        Box::pin(async move {
            let path = string_arg(&args, "path")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: path"))?;
            let content = string_arg(&args, "content")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: content"))?;

            if let Some(parent) = std::path::Path::new(&path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::execution_failed(e.to_string()))?;
            }

            let bytes = content.len();
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| ToolError::execution_failed(format!("{}: {}", path, e)))?;

            Ok(Value::String(format!("Wrote {} bytes to {}", bytes, path)))
        })
    }))
}

/// Truncate on a char boundary at or below `max_bytes`.
fn truncate_utf8(mut s: String, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s;
    }
    let mut cut = max_bytes;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::{ToolArgs, ToolContext};
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("note.txt");
        let path_str = path.to_str().unwrap();

        let write = write_text_file_tool();
        let result = write
            .invoke(
                &ToolContext::default(),
                args(&[("path", json!(path_str)), ("content", json!("hello file"))]),
            )
            .await
            .unwrap();
        assert!(result.as_str().unwrap().contains("10 bytes"));

        let read = read_text_file_tool();
        let content = read
            .invoke(&ToolContext::default(), args(&[("path", json!(path_str))]))
            .await
            .unwrap();
        assert_eq!(content, json!("hello file"));
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let read = read_text_file_tool();
        let err = read
            .invoke(
                &ToolContext::default(),
                args(&[("path", json!("/definitely/not/here.txt"))]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, "EXECUTION_FAILED");
    }

    #[tokio::test]
    async fn test_read_respects_max_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "a".repeat(100)).unwrap();

        let read = read_text_file_tool();
        let content = read
            .invoke(
                &ToolContext::default(),
                args(&[
                    ("path", json!(path.to_str().unwrap())),
                    ("max_bytes", json!(10)),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(content.as_str().unwrap().len(), 10);
    }

    #[test]
    fn test_truncate_utf8_respects_char_boundary() {
        // 'é' is two bytes; cutting mid-char must back off.
        let truncated = truncate_utf8("aé".to_string(), 2);
        assert_eq!(truncated, "a");
    }
}
