//! Joining the personality and asset tables on the shared identifier.

use crate::error::MergeError;
use crate::table::Table;
use std::collections::{HashMap, HashSet};

/// Left join `assets` onto `personality` over `join_key`.
///
/// The join policy is fixed: every personality row appears exactly once, in
/// source order, and asset rows whose identifier has no personality match are
/// dropped. Unmatched asset columns are left empty. The output columns are
/// the personality columns followed by the asset columns minus the join key;
/// a non-key column present in both inputs is disambiguated with `_x`
/// (personality) and `_y` (assets) suffixes.
///
/// Both inputs must contain `join_key`, and its values must be unique within
/// each input; anything else would make the join ambiguous and is an error.
pub fn merge(personality: &Table, assets: &Table, join_key: &str) -> Result<Table, MergeError> {
    let left_key = require_key(personality, join_key)?;
    let right_key = require_key(assets, join_key)?;

    ensure_unique(personality, left_key, join_key)?;
    ensure_unique(assets, right_key, join_key)?;

    let overlap: HashSet<&str> = personality
        .headers()
        .iter()
        .filter(|h| h.as_str() != join_key && assets.column_index(h).is_some())
        .map(|h| h.as_str())
        .collect();

    let mut headers: Vec<String> = personality
        .headers()
        .iter()
        .map(|h| suffixed(h, &overlap, "_x"))
        .collect();
    headers.extend(
        assets
            .headers()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != right_key)
            .map(|(_, h)| suffixed(h, &overlap, "_y")),
    );

    let mut by_key: HashMap<&str, &Vec<String>> = HashMap::with_capacity(assets.row_count());
    for row in assets.rows() {
        by_key.insert(row[right_key].as_str(), row);
    }

    let right_width = assets.column_count() - 1;
    let mut rows = Vec::with_capacity(personality.row_count());
    for left_row in personality.rows() {
        let mut merged_row = left_row.clone();
        match by_key.get(left_row[left_key].as_str()) {
            Some(right_row) => merged_row.extend(
                right_row
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != right_key)
                    .map(|(_, cell)| cell.clone()),
            ),
            None => merged_row.extend(std::iter::repeat(String::new()).take(right_width)),
        }
        rows.push(merged_row);
    }

    Ok(Table::new("merged", headers, rows))
}

fn require_key(table: &Table, join_key: &str) -> Result<usize, MergeError> {
    table
        .column_index(join_key)
        .ok_or_else(|| MergeError::MissingKey {
            table: table.name().to_string(),
            key: join_key.to_string(),
        })
}

fn ensure_unique(table: &Table, key_idx: usize, join_key: &str) -> Result<(), MergeError> {
    let mut seen = HashSet::with_capacity(table.row_count());
    for row in table.rows() {
        if !seen.insert(row[key_idx].as_str()) {
            return Err(MergeError::DuplicateKey {
                table: table.name().to_string(),
                key: join_key.to_string(),
                value: row[key_idx].clone(),
            });
        }
    }
    Ok(())
}

fn suffixed(header: &str, overlap: &HashSet<&str>, suffix: &str) -> String {
    if overlap.contains(header) {
        format!("{header}{suffix}")
    } else {
        header.to_string()
    }
}
