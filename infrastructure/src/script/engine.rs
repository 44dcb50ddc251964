//! Lua tool engine
//!
//! Loads a generated tool file into its own sandboxed Lua VM and wraps
//! the extracted function as a [`ToolHandle`]. One VM per tool keeps
//! module namespaces isolated; a snapshot of the plain builtin tools is
//! injected into each environment so generated code can call them as
//! ordinary global functions.
//!
//! Lua execution is synchronous, so invocations run on the blocking
//! thread pool; the injected builtin wrappers drive their async handles
//! on a throwaway current-thread runtime from there.

use std::path::Path;
use std::sync::{Arc, Mutex};

use mlua::prelude::*;
use mlua::{MultiValue, RegistryKey};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use conductor_application::ports::script_engine::{ScriptEngine, ScriptError};
use conductor_domain::{ToolArgs, ToolContext, ToolDefinition, ToolError, ToolHandle, ToolParameter};

use super::sandbox::apply_sandbox;
use super::vet::vet_source;

/// Sandboxed Lua engine implementing the script-engine port.
pub struct LuaToolEngine {
    allowed_modules: Vec<String>,
    builtins: Vec<Arc<ToolHandle>>,
}

impl LuaToolEngine {
    /// Create an engine with the given builtin snapshot. Contextual
    /// builtins are excluded — generated code only sees plain tools.
    pub fn new(builtins: Vec<Arc<ToolHandle>>) -> Self {
        Self {
            allowed_modules: conductor_application::stages::synthesizer::ALLOWED_MODULES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            builtins: builtins.into_iter().filter(|h| !h.is_contextual()).collect(),
        }
    }

    pub fn with_allowed_modules(mut self, modules: Vec<String>) -> Self {
        self.allowed_modules = modules;
        self
    }

    /// Load every `.lua` file in `dir` as a tool, skipping files that
    /// fail to load. Used at startup to recover tools from earlier runs.
    pub fn load_dir(&self, dir: &Path) -> Vec<Arc<ToolHandle>> {
        let mut handles = Vec::new();
        let Ok(entries) = std::fs::read_dir(dir) else {
            return handles;
        };

        let mut paths: Vec<_> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "lua"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };
            let definition = ToolDefinition::new(&name, "generated tool");
            match self.load_tool(&path, definition) {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipping unloadable tool file");
                }
            }
        }
        handles
    }

    /// Build the isolated environment: standard libs readable through the
    /// metatable, builtin tools injected as globals.
    fn build_env(&self, lua: &Lua) -> LuaResult<LuaTable> {
        let env = lua.create_table()?;
        let meta = lua.create_table()?;
        meta.set("__index", lua.globals())?;
        let _ = env.set_metatable(Some(meta));

        for builtin in &self.builtins {
            let handle = Arc::clone(builtin);
            let order: Vec<String> = handle
                .definition
                .parameters
                .iter()
                .map(|p| p.name.clone())
                .collect();
            let wrapper = lua.create_function(move |lua, lua_args: MultiValue| {
                let mut args = ToolArgs::new();
                for (name, value) in order.iter().zip(lua_args.iter()) {
                    args.insert(name.clone(), lua_to_json(value)?);
                }
                let result = block_on_tool(Arc::clone(&handle), args)
                    .map_err(LuaError::external)?;
                json_to_lua(lua, &result)
            })?;
            env.set(builtin.name(), wrapper)?;
        }

        Ok(env)
    }
}

impl ScriptEngine for LuaToolEngine {
    fn vet_source(&self, code: &str) -> Result<(), ScriptError> {
        vet_source(code, &self.allowed_modules)
    }

    fn load_tool(
        &self,
        path: &Path,
        mut definition: ToolDefinition,
    ) -> Result<Arc<ToolHandle>, ScriptError> {
        let code = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::Load(format!("{}: {}", path.display(), e)))?;

        // Hand-edited files are vetted like fresh generations.
        self.vet_source(&code)?;

        let name = definition.name.clone();
        let lua = Lua::new();
        apply_sandbox(&lua).map_err(|e| ScriptError::Load(e.to_string()))?;

        let env = self
            .build_env(&lua)
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        lua.load(&code)
            .set_name(format!("tool:{}", name))
            .set_environment(env.clone())
            .exec()
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        let func: LuaFunction = env
            .get::<Option<LuaFunction>>(name.as_str())
            .map_err(|e| ScriptError::Load(e.to_string()))?
            .ok_or_else(|| ScriptError::MissingFunction(name.clone()))?;

        // Argument order comes from the source signature when it parses;
        // the declared definition is the fallback.
        let order = parse_signature(&code, &name).unwrap_or_else(|| {
            definition
                .parameters
                .iter()
                .map(|p| p.name.clone())
                .collect()
        });

        // A file loaded without declared parameters (startup recovery,
        // hand-edited files) gets them from the signature.
        if definition.parameters.is_empty() {
            for param in &order {
                definition =
                    definition.with_parameter(ToolParameter::new(param, "", false));
            }
        }

        let key = lua
            .create_registry_value(func)
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        debug!(tool = %name, params = order.len(), "Generated tool loaded");
        Ok(Arc::new(make_handle(definition, lua, key, order)))
    }
}

/// Wrap a loaded Lua function as a plain tool handle. Invocations hop to
/// the blocking pool, where the VM lock is taken and named arguments are
/// laid out positionally per `order`.
fn make_handle(
    definition: ToolDefinition,
    lua: Lua,
    key: RegistryKey,
    order: Vec<String>,
) -> ToolHandle {
    let state = Arc::new((Mutex::new(lua), key));
    ToolHandle::plain(definition, move |args: ToolArgs| {
        let state = Arc::clone(&state);
        let order = order.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || invoke_lua(&state.0, &state.1, &order, args))
                .await
                .map_err(|e| ToolError::execution_failed(format!("blocking task failed: {}", e)))?
        })
    })
}

fn invoke_lua(
    lua: &Mutex<Lua>,
    key: &RegistryKey,
    order: &[String],
    args: ToolArgs,
) -> Result<Value, ToolError> {
    let lua = lua
        .lock()
        .map_err(|_| ToolError::execution_failed("tool VM lock poisoned"))?;

    let func: LuaFunction = lua
        .registry_value(key)
        .map_err(|e| ToolError::execution_failed(e.to_string()))?;

    let mut positional = Vec::with_capacity(order.len());
    for name in order {
        let value = args.get(name).unwrap_or(&Value::Null);
        positional.push(
            json_to_lua(&lua, value).map_err(|e| ToolError::execution_failed(e.to_string()))?,
        );
    }

    let result: LuaValue = func
        .call(MultiValue::from_vec(positional))
        .map_err(|e| ToolError::execution_failed(e.to_string()))?;

    lua_to_json(&result).map_err(|e| ToolError::execution_failed(e.to_string()))
}

/// Drive an async builtin to completion from a blocking thread.
fn block_on_tool(handle: Arc<ToolHandle>, args: ToolArgs) -> Result<Value, ToolError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ToolError::execution_failed(format!("failed to create runtime: {}", e)))?;
    rt.block_on(handle.invoke(&ToolContext::default(), args))
}

/// Positional parameter names from `function <name>(a, b, c)`.
fn parse_signature(code: &str, name: &str) -> Option<Vec<String>> {
    let pattern = format!(r"function\s+{}\s*\(([^)]*)\)", regex::escape(name));
    let captures = Regex::new(&pattern).ok()?.captures(code)?;
    let params: Vec<String> = captures[1]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "...")
        .map(str::to_string)
        .collect();
    Some(params)
}

fn json_to_lua(lua: &Lua, value: &Value) -> LuaResult<LuaValue> {
    match value {
        Value::Null => Ok(LuaValue::Nil),
        Value::Bool(b) => Ok(LuaValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(LuaValue::Integer(i))
            } else {
                Ok(LuaValue::Number(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::String(s) => Ok(LuaValue::String(lua.create_string(s)?)),
        Value::Array(items) => {
            let table = lua.create_table()?;
            for (index, item) in items.iter().enumerate() {
                table.set(index + 1, json_to_lua(lua, item)?)?;
            }
            Ok(LuaValue::Table(table))
        }
        Value::Object(map) => {
            let table = lua.create_table()?;
            for (k, v) in map {
                table.set(k.as_str(), json_to_lua(lua, v)?)?;
            }
            Ok(LuaValue::Table(table))
        }
    }
}

fn lua_to_json(value: &LuaValue) -> LuaResult<Value> {
    match value {
        LuaValue::Nil => Ok(Value::Null),
        LuaValue::Boolean(b) => Ok(Value::Bool(*b)),
        LuaValue::Integer(i) => Ok(Value::from(*i)),
        LuaValue::Number(n) => Ok(serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        LuaValue::String(s) => Ok(Value::String(s.to_string_lossy().to_string())),
        LuaValue::Table(table) => {
            let len = table.raw_len();
            if len > 0 {
                let mut items = Vec::with_capacity(len);
                for index in 1..=len {
                    let item: LuaValue = table.raw_get(index)?;
                    items.push(lua_to_json(&item)?);
                }
                Ok(Value::Array(items))
            } else {
                let mut map = serde_json::Map::new();
                for pair in table.clone().pairs::<LuaValue, LuaValue>() {
                    let (k, v) = pair?;
                    if let LuaValue::String(k) = k {
                        map.insert(k.to_string_lossy().to_string(), lua_to_json(&v)?);
                    }
                }
                Ok(Value::Object(map))
            }
        }
        other => Err(LuaError::external(format!(
            "unsupported return type from tool: {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_tool(dir: &Path, name: &str, code: &str) -> std::path::PathBuf {
        let path = dir.join(format!("{}.lua", name));
        std::fs::write(&path, code).unwrap();
        path
    }

    fn args(pairs: &[(&str, Value)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_and_invoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tool(
            dir.path(),
            "shout",
            "function shout(text)\n  return string.upper(text)\nend",
        );

        let engine = LuaToolEngine::new(Vec::new());
        let definition = ToolDefinition::new("shout", "Uppercase a string")
            .with_parameter(ToolParameter::new("text", "Input text", true));
        let handle = engine.load_tool(&path, definition).unwrap();

        let result = handle
            .invoke(&ToolContext::default(), args(&[("text", json!("hello"))]))
            .await
            .unwrap();
        assert_eq!(result, json!("HELLO"));
    }

    #[tokio::test]
    async fn test_missing_function_is_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tool(dir.path(), "wrong", "function other_name() return 1 end");

        let engine = LuaToolEngine::new(Vec::new());
        let err = engine
            .load_tool(&path, ToolDefinition::new("wrong", ""))
            .unwrap_err();
        assert!(matches!(err, ScriptError::MissingFunction(name) if name == "wrong"));
    }

    #[tokio::test]
    async fn test_generated_tool_can_call_builtin() {
        let stamp = Arc::new(ToolHandle::plain(
            ToolDefinition::new("stamp", "Return a fixed stamp"),
            |_args| Box::pin(async { Ok(json!("stamped")) }),
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = write_tool(
            dir.path(),
            "wrap",
            "function wrap(x)\n  return stamp() .. ':' .. x\nend",
        );

        let engine = LuaToolEngine::new(vec![stamp]);
        let definition = ToolDefinition::new("wrap", "")
            .with_parameter(ToolParameter::new("x", "", true));
        let handle = engine.load_tool(&path, definition).unwrap();

        let result = handle
            .invoke(&ToolContext::default(), args(&[("x", json!("a"))]))
            .await
            .unwrap();
        assert_eq!(result, json!("stamped:a"));
    }

    #[tokio::test]
    async fn test_tools_load_into_isolated_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = write_tool(
            dir.path(),
            "tool_a",
            "SHARED = 'a'\nfunction tool_a()\n  return SHARED\nend",
        );
        let path_b = write_tool(
            dir.path(),
            "tool_b",
            "function tool_b()\n  return tostring(SHARED)\nend",
        );

        let engine = LuaToolEngine::new(Vec::new());
        let a = engine.load_tool(&path_a, ToolDefinition::new("tool_a", "")).unwrap();
        let b = engine.load_tool(&path_b, ToolDefinition::new("tool_b", "")).unwrap();

        let ctx = ToolContext::default();
        assert_eq!(a.invoke(&ctx, ToolArgs::new()).await.unwrap(), json!("a"));
        // tool_b lives in its own VM and never sees tool_a's global.
        assert_eq!(b.invoke(&ctx, ToolArgs::new()).await.unwrap(), json!("nil"));
    }

    #[tokio::test]
    async fn test_table_results_become_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tool(
            dir.path(),
            "stats",
            "function stats()\n  return { count = 2, items = { 'a', 'b' } }\nend",
        );

        let engine = LuaToolEngine::new(Vec::new());
        let handle = engine.load_tool(&path, ToolDefinition::new("stats", "")).unwrap();

        let result = handle
            .invoke(&ToolContext::default(), ToolArgs::new())
            .await
            .unwrap();
        assert_eq!(result["count"], json!(2));
        assert_eq!(result["items"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_signature_parsing_orders_named_args() {
        let dir = tempfile::tempdir().unwrap();
        // No declared parameters: the loader reads them off the source.
        let path = write_tool(
            dir.path(),
            "join",
            "function join(first, second)\n  return first .. '-' .. second\nend",
        );

        let engine = LuaToolEngine::new(Vec::new());
        let handle = engine.load_tool(&path, ToolDefinition::new("join", "")).unwrap();

        let result = handle
            .invoke(
                &ToolContext::default(),
                args(&[("second", json!("b")), ("first", json!("a"))]),
            )
            .await
            .unwrap();
        assert_eq!(result, json!("a-b"));
    }

    #[tokio::test]
    async fn test_load_dir_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "good", "function good() return 1 end");
        write_tool(dir.path(), "broken", "function broken( syntax error");
        write_tool(dir.path(), "mismatch", "function not_mismatch() return 1 end");

        let engine = LuaToolEngine::new(Vec::new());
        let handles = engine.load_dir(dir.path());

        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].name(), "good");
    }

    #[tokio::test]
    async fn test_load_rejects_forbidden_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tool(
            dir.path(),
            "evil",
            "function evil()\n  return os.execute('true')\nend",
        );

        let engine = LuaToolEngine::new(Vec::new());
        let err = engine
            .load_tool(&path, ToolDefinition::new("evil", ""))
            .unwrap_err();
        assert!(matches!(err, ScriptError::Vetting(_)));
    }

    #[test]
    fn test_parse_signature() {
        let code = "-- helper\nfunction fetch_rates(base, symbols)\n  return base\nend";
        assert_eq!(
            parse_signature(code, "fetch_rates").unwrap(),
            vec!["base".to_string(), "symbols".to_string()]
        );
        assert_eq!(parse_signature("function f()\nend", "f").unwrap(), Vec::<String>::new());
        assert!(parse_signature(code, "absent").is_none());
    }
}
