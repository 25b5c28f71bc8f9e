//! Conversion between engine tables and their Lua representation.
//!
//! A table crosses into Lua as `{ columns = {...}, rows = {{...}, ...} }`.
//! Null cells are passed as the `NULL` sentinel rather than `nil` so that
//! row arrays keep their length; cells the script leaves as `nil` read back
//! as null anyway because rows are scanned by index up to the column count.

use crate::error::{TransformError, TransformResult};
use mlua::Lua;
use wf_core::{Table, Value};

pub fn table_to_lua(lua: &Lua, table: &Table) -> mlua::Result<mlua::Table> {
    let columns = lua.create_table()?;
    for (i, col) in table.columns().iter().enumerate() {
        columns.raw_set(i + 1, col.as_str())?;
    }

    let rows = lua.create_table()?;
    for (ri, row) in table.rows().iter().enumerate() {
        let lua_row = lua.create_table()?;
        for (ci, cell) in row.iter().enumerate() {
            lua_row.raw_set(ci + 1, value_to_lua(lua, cell)?)?;
        }
        rows.raw_set(ri + 1, lua_row)?;
    }

    let out = lua.create_table()?;
    out.raw_set("columns", columns)?;
    out.raw_set("rows", rows)?;
    Ok(out)
}

pub fn lua_to_table(table: &mlua::Table) -> TransformResult<Table> {
    let columns_tbl: mlua::Table = table.raw_get("columns").map_err(|_| shape_error())?;
    let mut columns = Vec::new();
    for col in columns_tbl.sequence_values::<String>() {
        columns.push(col.map_err(|_| shape_error())?);
    }
    if columns.is_empty() {
        return Err(TransformError::Execution {
            message: "result table has no columns".to_string(),
        });
    }
    let width = columns.len();

    let rows_tbl: mlua::Table = table.raw_get("rows").map_err(|_| shape_error())?;
    let mut out = Table::new(columns);
    let row_count = rows_tbl.raw_len();
    for ri in 1..=row_count {
        let lua_row: mlua::Table = rows_tbl.raw_get(ri).map_err(|_| shape_error())?;
        let mut cells = Vec::with_capacity(width);
        for ci in 1..=width {
            let cell: mlua::Value = lua_row.raw_get(ci).map_err(|_| shape_error())?;
            cells.push(lua_to_value(cell)?);
        }
        out.push_row(cells).map_err(|e| TransformError::Execution {
            message: e.to_string(),
        })?;
    }
    Ok(out)
}

fn value_to_lua(lua: &Lua, value: &Value) -> mlua::Result<mlua::Value> {
    Ok(match value {
        Value::Null => mlua::Value::NULL,
        Value::Bool(b) => mlua::Value::Boolean(*b),
        Value::Int(i) => mlua::Value::Integer(*i),
        Value::Float(f) => mlua::Value::Number(*f),
        Value::Text(s) => mlua::Value::String(lua.create_string(s)?),
    })
}

fn lua_to_value(value: mlua::Value) -> TransformResult<Value> {
    if value == mlua::Value::NULL {
        return Ok(Value::Null);
    }
    match value {
        mlua::Value::Nil => Ok(Value::Null),
        mlua::Value::Boolean(b) => Ok(Value::Bool(b)),
        mlua::Value::Integer(i) => Ok(Value::Int(i)),
        mlua::Value::Number(f) => Ok(Value::Float(f)),
        mlua::Value::String(s) => Ok(Value::Text(s.to_string_lossy().to_string())),
        other => Err(TransformError::Execution {
            message: format!(
                "result cell has unsupported type '{}': only booleans, numbers, \
                 strings and NULL may appear in an output table",
                other.type_name()
            ),
        }),
    }
}

fn shape_error() -> TransformError {
    TransformError::Execution {
        message: "result must be a table of the form { columns = {...}, rows = {{...}} }"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_nulls() {
        let lua = Lua::new();
        let table = Table::with_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec![Value::Int(1), Value::Null],
                vec![Value::Text("x".into()), Value::Float(2.5)],
            ],
        )
        .unwrap();

        let bound = table_to_lua(&lua, &table).unwrap();
        let back = lua_to_table(&bound).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_nil_cells_read_back_as_null() {
        let lua = Lua::new();
        let bound: mlua::Table = lua
            .load("return { columns = {'a', 'b'}, rows = {{1}} }")
            .eval()
            .unwrap();
        let back = lua_to_table(&bound).unwrap();
        assert_eq!(back.rows()[0], vec![Value::Int(1), Value::Null]);
    }

    #[test]
    fn test_unsupported_cell_type_rejected() {
        let lua = Lua::new();
        let bound: mlua::Table = lua
            .load("return { columns = {'a'}, rows = {{ {} }} }")
            .eval()
            .unwrap();
        assert!(matches!(
            lua_to_table(&bound),
            Err(TransformError::Execution { .. })
        ));
    }
}
