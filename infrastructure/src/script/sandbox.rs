//! Lua sandbox — removes C loading and destructive primitives.
//!
//! Static vetting rejects forbidden constructs before execution; the
//! sandbox removes them from the VM as well, so a construct that slips
//! past inspection (string-built names, hand-edited files) still finds
//! nothing to call.

use mlua::prelude::*;

/// Apply sandbox restrictions to a fresh Lua VM.
///
/// Removes:
/// - `package.loadlib` / `package.cpath` — no C extension loading
/// - `os.execute`, `os.remove`, `os.rename`, `os.exit`, `os.getenv`
/// - `io.popen`
/// - `load`, `loadstring`, `dofile`, `loadfile` — no dynamic evaluation
pub fn apply_sandbox(lua: &Lua) -> LuaResult<()> {
    lua.load(
        r#"
        package.loadlib = nil
        package.cpath = ''
        os.execute = nil
        os.remove = nil
        os.rename = nil
        os.exit = nil
        os.getenv = nil
        io.popen = nil
        load = nil
        loadstring = nil
        dofile = nil
        loadfile = nil
    "#,
    )
    .exec()
}
