//! Tool definition to JSON Schema conversion
//!
//! The model-invocation layer needs full signatures, not just names:
//! each [`ToolDefinition`] becomes a function declaration with a JSON
//! Schema for its parameters.

use serde_json::{Map, Value, json};

use conductor_domain::ToolDefinition;

/// Convert one definition into the API's function-tool shape.
pub fn to_api_tool(definition: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &definition.parameters {
        properties.insert(
            param.name.clone(),
            json!({
                "type": json_type(&param.param_type),
                "description": param.description,
            }),
        );
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": definition.name,
            "description": definition.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        },
    })
}

/// Map a parameter type hint onto a JSON Schema type. Unknown hints
/// degrade to "string".
fn json_type(hint: &str) -> &'static str {
    match hint {
        "number" | "float" => "number",
        "integer" | "int" => "integer",
        "boolean" | "bool" => "boolean",
        "array" | "list" => "array",
        "object" | "table" | "dict" => "object",
        _ => "string",
    }
}
