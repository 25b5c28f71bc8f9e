//! Relational joins over in-memory tables.
//!
//! Hash join on canonicalized key values. Keys match conjunctively; a null
//! in any key column never matches anything, including another null.

use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use wf_core::{JoinKey, JoinKind, Table, Value};

pub fn execute_join(
    left: &Table,
    right: &Table,
    kind: JoinKind,
    keys: &[JoinKey],
) -> EngineResult<Table> {
    if keys.is_empty() {
        return Err(EngineError::Internal(
            "join has no key pairs".to_string(),
        ));
    }

    let mut left_keys = Vec::with_capacity(keys.len());
    let mut right_keys = Vec::with_capacity(keys.len());
    for key in keys {
        left_keys.push(require_column(left, &key.left_key, "left")?);
        right_keys.push(require_column(right, &key.right_key, "right")?);
    }

    // Same-named key pairs collapse into the left column; differently named
    // pairs keep both sides, like a merge on left_on / right_on. The pairing
    // is kept so unmatched right rows coalesce their key values into the
    // collapsed column.
    let coalesced: Vec<(usize, usize)> = keys
        .iter()
        .zip(left_keys.iter().zip(&right_keys))
        .filter(|(k, _)| k.left_key == k.right_key)
        .map(|(_, (l, r))| (*l, *r))
        .collect();
    let dropped_right: Vec<usize> = coalesced.iter().map(|&(_, r)| r).collect();
    let kept_right: Vec<usize> = (0..right.columns().len())
        .filter(|i| !dropped_right.contains(i))
        .collect();

    let columns = output_columns(left, right, &kept_right);
    let left_width = left.columns().len();

    let mut by_key: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = row_key(row, &right_keys) {
            by_key.entry(key).or_default().push(i);
        }
    }

    let mut out = Table::new(columns);
    let mut right_matched = vec![false; right.row_count()];

    for lrow in left.rows() {
        let matches = row_key(lrow, &left_keys)
            .and_then(|key| by_key.get(&key))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        if matches.is_empty() {
            if matches!(kind, JoinKind::Left | JoinKind::Full) {
                push(&mut out, combine(lrow, None, &kept_right))?;
            }
            continue;
        }
        for &ri in matches {
            right_matched[ri] = true;
            push(&mut out, combine(lrow, Some(&right.rows()[ri]), &kept_right))?;
        }
    }

    // Unmatched right rows come after every matched pair, with their key
    // values carried into the collapsed key columns.
    if matches!(kind, JoinKind::Right | JoinKind::Full) {
        for (ri, matched) in right_matched.iter().enumerate() {
            if !matched {
                let rrow = &right.rows()[ri];
                let mut cells = vec![Value::Null; left_width];
                for &(l, r) in &coalesced {
                    cells[l] = rrow[r].clone();
                }
                cells.extend(kept_right.iter().map(|&i| rrow[i].clone()));
                push(&mut out, cells)?;
            }
        }
    }

    Ok(out)
}

fn require_column(table: &Table, name: &str, side: &str) -> EngineResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| EngineError::ColumnNotFound {
            side: side.to_string(),
            column: name.to_string(),
            available_columns: table.columns().to_vec(),
        })
}

/// Composite match key, or None when any key cell is null.
fn row_key(row: &[Value], indices: &[usize]) -> Option<Vec<String>> {
    indices.iter().map(|&i| row[i].canonical()).collect()
}

/// Left columns then kept right columns; names colliding across sides get
/// `_left` / `_right` suffixes on both.
fn output_columns(left: &Table, right: &Table, kept_right: &[usize]) -> Vec<String> {
    let kept_names: Vec<&String> = kept_right.iter().map(|&i| &right.columns()[i]).collect();
    let mut columns = Vec::with_capacity(left.columns().len() + kept_names.len());
    for name in left.columns() {
        if kept_names.iter().any(|n| *n == name) {
            columns.push(format!("{}_left", name));
        } else {
            columns.push(name.clone());
        }
    }
    for name in &kept_names {
        if left.has_column(name) {
            columns.push(format!("{}_right", name));
        } else {
            columns.push((*name).clone());
        }
    }
    columns
}

fn combine(lrow: &[Value], rrow: Option<&Vec<Value>>, kept_right: &[usize]) -> Vec<Value> {
    let mut cells: Vec<Value> = lrow.to_vec();
    match rrow {
        Some(rrow) => cells.extend(kept_right.iter().map(|&i| rrow[i].clone())),
        None => cells.extend(std::iter::repeat(Value::Null).take(kept_right.len())),
    }
    cells
}

fn push(out: &mut Table, cells: Vec<Value>) -> EngineResult<()> {
    out.push_row(cells)
        .map_err(|e| EngineError::Internal(e.to_string()))
}
