//! In-memory tabular data shared by the acquisition pipeline and the explorer.
//!
//! A [`Table`] is a header row plus string-valued data rows. Sources arrive
//! either as delimited text or as a JSON array of row objects; both are
//! normalized here so the merge and persistence steps only ever see one shape.

use crate::error::FetchError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Parse delimited text with a header row. Ragged rows are rejected.
    pub fn from_csv(name: &str, data: &str) -> Result<Self, FetchError> {
        let mut reader = csv::Reader::from_reader(data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(FetchError::MissingHeader {
                table: name.to_string(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(Self::new(name, headers, rows))
    }

    /// Build a table from a JSON array of row objects.
    ///
    /// Columns are the union of the objects' keys in lexicographic order, so
    /// repeated fetches of the same payload always produce the same layout.
    pub fn from_json_rows(name: &str, value: &Value) -> Result<Self, FetchError> {
        let items = value.as_array().ok_or_else(|| FetchError::JsonShape {
            table: name.to_string(),
            detail: "expected a top-level array of row objects".to_string(),
        })?;

        let mut columns = BTreeSet::new();
        for (idx, item) in items.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| FetchError::JsonShape {
                table: name.to_string(),
                detail: format!("element {idx} is not an object"),
            })?;
            columns.extend(obj.keys().cloned());
        }
        let columns: Vec<String> = columns.into_iter().collect();

        if columns.is_empty() {
            return Err(FetchError::MissingHeader {
                table: name.to_string(),
            });
        }

        let rows = items
            .iter()
            .map(|item| {
                let obj = item.as_object().expect("validated above");
                columns
                    .iter()
                    .map(|col| obj.get(col).map_or_else(String::new, json_cell))
                    .collect()
            })
            .collect();

        Ok(Self::new(name, columns, rows))
    }

    /// Encode the table as delimited text with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Position of a named column, if present.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// All cells of a named column, in row order.
    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(header)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// The first `n` rows, for previews.
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(n)]
    }
}

/// Render a JSON value as a CSV cell the way the merged dataset stores it:
/// nulls become empty cells, scalars keep their JSON text, nested values are
/// embedded as compact JSON.
fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_csv_with_header() {
        let table = Table::from_csv("personality", "_id,confidence\nabc,0.5\ndef,0.9\n").unwrap();
        assert_eq!(table.headers(), &["_id", "confidence"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1], vec!["def", "0.9"]);
    }

    #[test]
    fn header_only_csv_is_a_valid_empty_table() {
        let table = Table::from_csv("personality", "_id,confidence\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn empty_input_is_missing_header() {
        let err = Table::from_csv("personality", "").unwrap_err();
        assert!(matches!(err, FetchError::MissingHeader { .. }));
    }

    #[test]
    fn ragged_row_is_malformed() {
        let err = Table::from_csv("personality", "_id,confidence\nabc,0.5,extra\n").unwrap_err();
        assert!(matches!(err, FetchError::Csv(_)));
    }

    #[test]
    fn json_rows_use_sorted_union_of_keys() {
        let payload = json!([
            {"_id": "a", "asset_value": 1000.5, "currency": "GBP"},
            {"_id": "b", "asset_value": 250, "created": "2024-05-21"}
        ]);
        let table = Table::from_json_rows("assets", &payload).unwrap();
        assert_eq!(
            table.headers(),
            &["_id", "asset_value", "created", "currency"]
        );
        // Missing keys become empty cells.
        assert_eq!(table.rows()[0], vec!["a", "1000.5", "", "GBP"]);
        assert_eq!(table.rows()[1], vec!["b", "250", "2024-05-21", ""]);
    }

    #[test]
    fn json_scalars_render_like_the_source_text() {
        let payload = json!([
            {"flag": true, "note": null, "tags": ["x", "y"], "value": 0.555}
        ]);
        let table = Table::from_json_rows("assets", &payload).unwrap();
        assert_eq!(table.rows()[0], vec!["true", "", "[\"x\",\"y\"]", "0.555"]);
    }

    #[test]
    fn json_non_array_is_rejected() {
        let err = Table::from_json_rows("assets", &json!({"rows": []})).unwrap_err();
        assert!(matches!(err, FetchError::JsonShape { .. }));
    }

    #[test]
    fn json_non_object_element_is_rejected() {
        let err = Table::from_json_rows("assets", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::JsonShape { .. }));
    }

    #[test]
    fn empty_json_array_has_no_header() {
        let err = Table::from_json_rows("assets", &json!([])).unwrap_err();
        assert!(matches!(err, FetchError::MissingHeader { .. }));
    }

    #[test]
    fn csv_encoding_round_trips() {
        let table = Table::new(
            "merged",
            vec!["_id".into(), "note".into()],
            vec![vec!["a".into(), "has, comma".into()]],
        );
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "_id,note\na,\"has, comma\"\n");

        let reparsed = Table::from_csv("merged", &text).unwrap();
        assert_eq!(reparsed.headers(), table.headers());
        assert_eq!(reparsed.rows(), table.rows());
    }

    #[test]
    fn column_lookup() {
        let table = Table::from_csv("assets", "_id,asset_value\na,100\nb,200\n").unwrap();
        assert_eq!(table.column("asset_value").unwrap(), vec!["100", "200"]);
        assert!(table.column("missing").is_none());
    }
}
