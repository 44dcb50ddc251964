//! Static inspection of generated tool source
//!
//! Runs before any generated code executes: `require` targets must be on
//! the allow-list, and constructs the sandbox removes are rejected here
//! first so a bad tool never reaches disk.

use std::sync::LazyLock;

use regex::Regex;

use conductor_application::ports::script_engine::ScriptError;

/// Constructs that are never acceptable in generated tool source.
static FORBIDDEN: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bos\s*\.\s*execute\b", "os.execute"),
        (r"\bos\s*\.\s*remove\b", "os.remove"),
        (r"\bos\s*\.\s*rename\b", "os.rename"),
        (r"\bos\s*\.\s*exit\b", "os.exit"),
        (r"\bos\s*\.\s*getenv\b", "os.getenv"),
        (r"\bio\s*\.\s*popen\b", "io.popen"),
        (r"\bpackage\s*\.\s*loadlib\b", "package.loadlib"),
        (r"\bdofile\s*\(", "dofile"),
        (r"\bloadfile\s*\(", "loadfile"),
        (r"\bloadstring\s*\(", "loadstring"),
        (r"(?:^|[^.\w])load\s*\(", "load"),
        (r"\bdebug\s*\.", "debug library"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("forbidden pattern"), label))
    .collect()
});

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\s*\(?\s*["']([\w.]+)["']"#).expect("require pattern")
});

/// Inspect `code` against the allow-list. Returns the first violation.
pub fn vet_source(code: &str, allowed_modules: &[String]) -> Result<(), ScriptError> {
    for (pattern, label) in FORBIDDEN.iter() {
        if pattern.is_match(code) {
            return Err(ScriptError::Vetting(format!(
                "forbidden construct: {}",
                label
            )));
        }
    }

    for capture in REQUIRE.captures_iter(code) {
        let module = &capture[1];
        let root = module.split('.').next().unwrap_or(module);
        if !allowed_modules.iter().any(|allowed| allowed == root) {
            return Err(ScriptError::Vetting(format!(
                "module not on allow-list: {}",
                module
            )));
        }
    }

    Ok(())
}
