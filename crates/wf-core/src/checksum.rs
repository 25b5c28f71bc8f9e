//! SHA-256 checksums for warehouse change detection.

use crate::table::Table;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of a string.
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Content hash of a table over a canonical serialization of its columns and
/// cells. Two tables with the same columns and cell values hash identically
/// regardless of how they were produced.
pub fn table_checksum(table: &Table) -> String {
    let mut hasher = Sha256::new();
    for col in table.columns() {
        hasher.update(col.as_bytes());
        hasher.update([0x1f]);
    }
    hasher.update([0x1e]);
    for row in table.rows() {
        for cell in row {
            match cell.canonical() {
                Some(c) => hasher.update(c.as_bytes()),
                None => hasher.update(b"\0null"),
            }
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}
