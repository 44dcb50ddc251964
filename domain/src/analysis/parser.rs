//! Parsing structured stage results from model responses.
//!
//! Stages ask the runtime for JSON, but responses still arrive as text and
//! may be wrapped in fenced code blocks or surrounded by prose. The
//! extractors here are deliberately forgiving about the wrapping and strict
//! about the payload shape.

use serde_json::Value;

use crate::analysis::{Analysis, ToolPlan};
use crate::task::{Priority, TaskDef};
use crate::tool::request::{GeneratedTool, ToolRequest, is_valid_tool_name};
use crate::tool::set::ToolSet;

/// Extract the first JSON document from a model response.
///
/// Tries, in order: fenced ```json blocks, any fenced block, the whole
/// text, and finally the first balanced `{...}` or `[...]` span.
pub fn extract_json(text: &str) -> Option<Value> {
    for block in fenced_blocks(text) {
        if let Ok(value) = serde_json::from_str(&block) {
            return Some(value);
        }
    }

    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    first_balanced_span(trimmed).and_then(|span| serde_json::from_str(span).ok())
}

/// Contents of every fenced code block, language tag stripped.
fn fenced_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.starts_with("```") {
            match current.take() {
                Some(block) => blocks.push(block),
                None => current = Some(String::new()),
            }
        } else if let Some(block) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks
}

/// The first balanced `{...}` or `[...]` span in `text`, ignoring brackets
/// inside string literals.
fn first_balanced_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the analyzer's verdict.
///
/// Accepted shapes:
/// - `null`, `[]`, `"none"` → [`Analysis::Empty`]
/// - a JSON array of task objects, or `{"tasks": [...]}` → `Decomposed`
/// - a JSON string, or non-JSON prose → `Direct`
pub fn parse_analysis(text: &str) -> Analysis {
    let Some(value) = extract_json(text) else {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Analysis::Empty;
        }
        return Analysis::Direct(trimmed.to_string());
    };

    match value {
        Value::Null => Analysis::Empty,
        Value::String(s) => {
            if s.trim().is_empty() || s.eq_ignore_ascii_case("none") {
                Analysis::Empty
            } else {
                Analysis::Direct(s)
            }
        }
        Value::Array(items) => decompose(items),
        Value::Object(map) => match map.get("tasks").and_then(Value::as_array) {
            Some(items) => decompose(items.clone()),
            None => Analysis::Empty,
        },
        _ => Analysis::Empty,
    }
}

fn decompose(items: Vec<Value>) -> Analysis {
    let mut defs = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else { continue };
        let Some(query) = obj.get("query").and_then(Value::as_str) else {
            continue;
        };
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("task_{}", index + 1));
        let priority = obj
            .get("priority")
            .and_then(Value::as_i64)
            .map(Priority::clamped)
            .unwrap_or_default();

        defs.push(TaskDef::new(name, query).with_priority(priority));
    }

    if defs.is_empty() {
        return Analysis::Empty;
    }
    TaskDef::sort_by_priority(&mut defs);
    Analysis::Decomposed(defs)
}

/// Parse the tool planner's result:
/// `{"toolset": ["name", ...], "tool_requests": [{...}, ...]}`.
///
/// Invalid request entries are dropped; a shape mismatch yields `None`.
pub fn parse_tool_plan(text: &str) -> Option<ToolPlan> {
    let value = extract_json(text)?;
    let obj = value.as_object()?;

    let mut toolset = ToolSet::new();
    if let Some(names) = obj.get("toolset").and_then(Value::as_array) {
        for name in names.iter().filter_map(Value::as_str) {
            if is_valid_tool_name(name) {
                // Models occasionally repeat a name; replace, don't fail.
                if let Ok(entry) = crate::tool::set::ToolEntry::named(name) {
                    toolset.insert_or_replace(entry);
                }
            }
        }
    }

    let mut tool_requests = Vec::new();
    let requests = obj
        .get("tool_requests")
        .or_else(|| obj.get("tool_request"))
        .and_then(Value::as_array);
    if let Some(requests) = requests {
        for raw in requests {
            match serde_json::from_value::<ToolRequest>(raw.clone()) {
                Ok(request) if is_valid_tool_name(&request.tool_name) => {
                    tool_requests.push(request);
                }
                _ => {}
            }
        }
    }

    Some(ToolPlan { toolset, tool_requests })
}

/// Parse a generated tool: `{"name": ..., "code": ..., "description": ...}`.
///
/// As a fallback for models that reply with a bare fenced Lua block, the
/// caller may supply the expected name via `fallback_name`.
pub fn parse_generated_tool(text: &str, fallback_name: Option<&str>) -> Option<GeneratedTool> {
    if let Some(value) = extract_json(text)
        && let Ok(tool) = serde_json::from_value::<GeneratedTool>(value)
        && is_valid_tool_name(&tool.name)
    {
        return Some(tool);
    }

    let name = fallback_name?;
    let code = fenced_blocks(text).into_iter().find(|b| b.contains("function"))?;
    Some(GeneratedTool {
        name: name.to_string(),
        code,
        description: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json(text).unwrap()["a"], 1);
    }

    #[test]
    fn test_extract_json_raw() {
        assert_eq!(extract_json("[1, 2, 3]").unwrap(), serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let text = "The plan is {\"toolset\": [\"a\"]} as requested.";
        assert!(extract_json(text).unwrap().get("toolset").is_some());
    }

    #[test]
    fn test_extract_json_ignores_braces_in_strings() {
        let text = r#"prefix {"msg": "look: { not a block }"} suffix"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["msg"], "look: { not a block }");
    }

    #[test]
    fn test_parse_analysis_empty_variants() {
        assert!(parse_analysis("null").is_empty());
        assert!(parse_analysis("[]").is_empty());
        assert!(parse_analysis("\"none\"").is_empty());
        assert!(parse_analysis("").is_empty());
    }

    #[test]
    fn test_parse_analysis_sorts_by_priority() {
        let text = r#"[
            {"name": "later", "query": "do later", "priority": 5},
            {"name": "first", "query": "do first", "priority": 1},
            {"name": "middle", "query": "do middle", "priority": 3}
        ]"#;

        let Analysis::Decomposed(tasks) = parse_analysis(text) else {
            panic!("expected decomposed analysis");
        };
        let order: Vec<u8> = tasks.iter().map(|t| t.priority.value()).collect();
        assert_eq!(order, vec![1, 3, 5]);
        assert_eq!(tasks[0].name, "first");
    }

    #[test]
    fn test_parse_analysis_tasks_wrapper_and_defaults() {
        let text = r#"{"tasks": [{"query": "get the current time"}]}"#;
        let Analysis::Decomposed(tasks) = parse_analysis(text) else {
            panic!("expected decomposed analysis");
        };
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "task_1");
        assert_eq!(tasks[0].priority.value(), 5);
    }

    #[test]
    fn test_parse_analysis_direct_prose() {
        let verdict = parse_analysis("Hello! I'm doing well, thanks for asking.");
        assert!(matches!(verdict, Analysis::Direct(s) if s.contains("doing well")));
    }

    #[test]
    fn test_parse_analysis_clamps_priority() {
        let text = r#"[{"query": "q", "priority": 99}]"#;
        let Analysis::Decomposed(tasks) = parse_analysis(text) else {
            panic!("expected decomposed analysis");
        };
        assert_eq!(tasks[0].priority.value(), 10);
    }

    #[test]
    fn test_parse_tool_plan() {
        let text = r#"{
            "toolset": ["get_datetime", "web_search"],
            "tool_requests": [
                {"tool_name": "parse_csv", "description": "Parse a CSV file", "args": ["path"]}
            ]
        }"#;

        let plan = parse_tool_plan(text).unwrap();
        assert_eq!(plan.toolset.names(), vec!["get_datetime", "web_search"]);
        assert_eq!(plan.tool_requests.len(), 1);
        assert_eq!(plan.tool_requests[0].tool_name, "parse_csv");
    }

    #[test]
    fn test_parse_tool_plan_drops_invalid_names() {
        let text = r#"{"toolset": ["ok_tool", "bad name!"], "tool_requests": []}"#;
        let plan = parse_tool_plan(text).unwrap();
        assert_eq!(plan.toolset.names(), vec!["ok_tool"]);
    }

    #[test]
    fn test_parse_tool_plan_accepts_singular_key() {
        let text = r#"{"toolset": [], "tool_request": [{"tool_name": "t", "description": "d"}]}"#;
        let plan = parse_tool_plan(text).unwrap();
        assert_eq!(plan.tool_requests.len(), 1);
    }

    #[test]
    fn test_parse_generated_tool_json() {
        let text = r#"{"name": "shout", "code": "function shout(s) return s end", "description": "Shout"}"#;
        let tool = parse_generated_tool(text, None).unwrap();
        assert_eq!(tool.name, "shout");
        assert!(tool.code.contains("function shout"));
    }

    #[test]
    fn test_parse_generated_tool_fenced_fallback() {
        let text = "Here is the tool:\n```lua\nfunction shout(s)\n  return s\nend\n```";
        let tool = parse_generated_tool(text, Some("shout")).unwrap();
        assert_eq!(tool.name, "shout");
        assert!(tool.code.contains("function shout"));
    }

    #[test]
    fn test_parse_generated_tool_no_fallback_fails() {
        assert!(parse_generated_tool("no code here", None).is_none());
    }
}
