//! Sandboxed Lua executor for transformation nodes.

use crate::bindings::{lua_to_table, table_to_lua};
use crate::error::{TransformError, TransformResult};
use mlua::Lua;
use wf_core::Table;

/// Globals stripped from the interpreter before user code runs. The scripts
/// only shape in-memory tables; they get no filesystem, process or module
/// access.
const BLOCKED_GLOBALS: &[&str] = &["os", "io", "debug", "package", "require", "dofile", "loadfile"];

/// Run a transformation script against its inputs and return the resulting
/// table.
///
/// Every input is bound under its binding name (`source_3`,
/// `transformation_7`, ...); the first input is additionally bound as `df`.
/// The script must leave its output in the global `df`.
pub fn execute(code: &str, inputs: &[(String, Table)]) -> TransformResult<Table> {
    let Some((_, primary)) = inputs.first() else {
        return Err(TransformError::Execution {
            message: "transformation has no inputs".to_string(),
        });
    };

    let lua = Lua::new();
    let globals = lua.globals();

    for name in BLOCKED_GLOBALS {
        globals
            .set(*name, mlua::Value::Nil)
            .map_err(internal_error)?;
    }
    globals
        .set("NULL", mlua::Value::NULL)
        .map_err(internal_error)?;

    globals
        .set("df", table_to_lua(&lua, primary).map_err(internal_error)?)
        .map_err(internal_error)?;
    for (name, table) in inputs {
        globals
            .set(
                name.as_str(),
                table_to_lua(&lua, table).map_err(internal_error)?,
            )
            .map_err(internal_error)?;
    }

    if let Err(err) = lua.load(code).exec() {
        return Err(classify(err));
    }

    let result: mlua::Value = globals.get("df").map_err(internal_error)?;
    match result {
        mlua::Value::Table(table) => {
            let out = lua_to_table(&table)?;
            log::debug!(
                "transformation produced {} rows x {} columns",
                out.row_count(),
                out.columns().len()
            );
            Ok(out)
        }
        mlua::Value::Nil => Err(TransformError::MissingResult),
        other => Err(TransformError::Execution {
            message: format!(
                "`df` holds a {} after execution; it must hold a table",
                other.type_name()
            ),
        }),
    }
}

/// Map a Lua runtime error onto the engine's error taxonomy. Type mixing
/// (string arithmetic, concatenating non-strings) gets its own variant with
/// a cast hint; everything else surfaces as an execution failure.
/// Lua 5.4 names the operator when two concrete types mix ("attempt to add
/// a 'string' with a 'number'"); the generic "attempt to perform arithmetic"
/// form only appears for nil and table operands.
const ARITHMETIC_PATTERNS: &[&str] = &[
    "attempt to perform arithmetic",
    "attempt to add a",
    "attempt to sub a",
    "attempt to mul a",
    "attempt to div a",
    "attempt to mod a",
    "attempt to pow a",
    "attempt to idiv a",
];

fn classify(err: mlua::Error) -> TransformError {
    let message = err.to_string();
    if ARITHMETIC_PATTERNS.iter().any(|p| message.contains(p)) {
        TransformError::TypeConversion {
            operation: "arithmetic".to_string(),
            message,
        }
    } else if message.contains("attempt to concatenate") {
        TransformError::TypeConversion {
            operation: "concatenation".to_string(),
            message,
        }
    } else if message.contains("string expected, got") || message.contains("number expected, got") {
        TransformError::TypeConversion {
            operation: "argument coercion".to_string(),
            message,
        }
    } else {
        TransformError::Execution { message }
    }
}

fn internal_error(err: mlua::Error) -> TransformError {
    TransformError::Execution {
        message: err.to_string(),
    }
}
