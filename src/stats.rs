//! Descriptive statistics over [`Table`] columns.
//!
//! Empty cells are missing values and are skipped everywhere. Numeric
//! summaries follow the conventions the merged dataset was originally
//! explored with: sample standard deviation (ddof = 1) and
//! linearly-interpolated quartiles.

use crate::table::Table;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// How the explorer treats a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-empty cell parses as a float.
    Numeric,
    /// Every non-empty cell parses as a date or timestamp.
    Datetime,
    /// The join key, or a column named like one (`*_id`). Kept out of the
    /// numeric and categorical analyses.
    Identifier,
    Categorical,
}

/// Classify every column of `table`, in header order.
pub fn classify_columns(table: &Table, join_key: &str) -> Vec<(String, ColumnKind)> {
    table
        .headers()
        .iter()
        .map(|header| {
            let cells = table.column(header).unwrap_or_default();
            (header.clone(), classify(header, &cells, join_key))
        })
        .collect()
}

fn classify(header: &str, cells: &[&str], join_key: &str) -> ColumnKind {
    if header == join_key || header.ends_with("_id") {
        return ColumnKind::Identifier;
    }

    let non_empty: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
    if non_empty.is_empty() {
        return ColumnKind::Categorical;
    }
    if non_empty.iter().all(|c| parse_number(c).is_some()) {
        return ColumnKind::Numeric;
    }
    if non_empty.iter().all(|c| parse_date(c).is_some()) {
        return ColumnKind::Datetime;
    }
    ColumnKind::Categorical
}

pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a cell as a calendar date. Accepts RFC 3339 timestamps (what the
/// asset rows carry in `created`), naive timestamps, and plain dates.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(cell) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d").ok()
}

/// Cells of a column parsed as numbers; empty or unparseable cells are `None`.
pub fn numeric_column(table: &Table, header: &str) -> Option<Vec<Option<f64>>> {
    Some(
        table
            .column(header)?
            .iter()
            .map(|cell| parse_number(cell))
            .collect(),
    )
}

pub fn non_null_count(cells: &[&str]) -> usize {
    cells.iter().filter(|c| !c.is_empty()).count()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1). NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Linearly-interpolated percentile of an ascending-sorted slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Count, mean, std, and five-number summary of the given values.
pub fn numeric_summary(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN excluded by parsing"));
    Some(NumericSummary {
        count: values.len(),
        mean: mean(values),
        std: sample_std(values),
        min: sorted[0],
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q3: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: String,
    pub freq: usize,
}

/// Non-null count, distinct count, and the most frequent value. Frequency
/// ties resolve to the lexicographically smallest value so reruns agree.
pub fn categorical_summary(cells: &[&str]) -> Option<CategoricalSummary> {
    let counts = value_counts(cells);
    let (top, freq) = counts.first()?.clone();
    Some(CategoricalSummary {
        count: non_null_count(cells),
        unique: counts.len(),
        top,
        freq,
    })
}

/// Distinct non-empty values with their counts, most frequent first
/// (ties broken by value).
pub fn value_counts(cells: &[&str]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        *counts.entry(cell).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Rows that are exact duplicates of an earlier row.
pub fn duplicate_row_count(table: &Table) -> usize {
    let mut seen = HashSet::with_capacity(table.row_count());
    table.rows().iter().filter(|row| !seen.insert(*row)).count()
}

/// Sum of `values` grouped by `keys`, in ascending key order. Pairs with an
/// empty key or an unparseable value are skipped.
pub fn grouped_sum<'a>(keys: &[&'a str], values: &[&str]) -> BTreeMap<&'a str, f64> {
    let mut sums = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        if key.is_empty() {
            continue;
        }
        if let Some(v) = parse_number(value) {
            *sums.entry(*key).or_insert(0.0) += v;
        }
    }
    sums
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

/// Count/mean/std of `values` per group label, ascending label order.
pub fn grouped_numeric_summary(groups: &[&str], values: &[Option<f64>]) -> Vec<GroupSummary> {
    let mut buckets: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (group, value) in groups.iter().zip(values) {
        if group.is_empty() {
            continue;
        }
        if let Some(v) = value {
            buckets.entry(group).or_default().push(*v);
        }
    }
    buckets
        .into_iter()
        .map(|(label, vals)| GroupSummary {
            label: label.to_string(),
            count: vals.len(),
            mean: mean(&vals),
            std: sample_std(&vals),
        })
        .collect()
}

/// Records per calendar date, in date order.
pub fn date_frequency(cells: &[&str]) -> Vec<(NaiveDate, usize)> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        if let Some(date) = parse_date(cell) {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram. The top edge of the last bin is inclusive, so the
/// maximum value is counted. A constant column collapses into a single bin.
pub fn histogram(values: &[f64], bin_count: usize) -> Option<Vec<HistogramBin>> {
    if values.is_empty() || bin_count == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Some(vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for value in values {
        let idx = (((value - min) / width) as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    Some(bins)
}

/// Pearson correlation over pairwise-complete observations. `None` when
/// fewer than two complete pairs exist or either side is constant.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let mx = mean(&pairs.iter().map(|(x, _)| *x).collect::<Vec<_>>());
    let my = mean(&pairs.iter().map(|(_, y)| *y).collect::<Vec<_>>());
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Correlation matrix across the given named columns, pairwise complete.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> Vec<Vec<Option<f64>>> {
    let n = columns.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = if i == j {
                columns[i].1.iter().any(Option::is_some).then_some(1.0)
            } else {
                pearson(&columns[i].1, &columns[j].1)
            };
        }
    }
    matrix
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `proportions[i][j]` is the share of row label `i` falling in column
    /// label `j`; each row sums to 1.
    pub proportions: Vec<Vec<f64>>,
}

/// Row-normalized contingency table of two categorical columns. Pairs with
/// an empty cell on either side are skipped; labels are sorted ascending.
pub fn crosstab_normalized(row_cells: &[&str], col_cells: &[&str]) -> Option<CrossTab> {
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut col_labels: BTreeSet<&str> = BTreeSet::new();
    for (row, col) in row_cells.iter().zip(col_cells) {
        if row.is_empty() || col.is_empty() {
            continue;
        }
        *counts.entry(row).or_default().entry(col).or_insert(0) += 1;
        col_labels.insert(col);
    }
    if counts.is_empty() {
        return None;
    }

    let col_labels: Vec<String> = col_labels.into_iter().map(String::from).collect();
    let row_labels: Vec<String> = counts.keys().map(|k| k.to_string()).collect();
    let proportions = counts
        .values()
        .map(|row| {
            let total: usize = row.values().sum();
            col_labels
                .iter()
                .map(|col| *row.get(col.as_str()).unwrap_or(&0) as f64 / total as f64)
                .collect()
        })
        .collect();

    Some(CrossTab {
        row_labels,
        col_labels,
        proportions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn mean_and_sample_std() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&values) - 2.5).abs() < EPS);
        assert!((sample_std(&values) - (5.0f64 / 3.0).sqrt()).abs() < EPS);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.25) - 1.75).abs() < EPS);
        assert!((percentile(&sorted, 0.50) - 2.5).abs() < EPS);
        assert!((percentile(&sorted, 0.75) - 3.25).abs() < EPS);
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < EPS);
        assert!((percentile(&sorted, 1.0) - 4.0).abs() < EPS);
    }

    #[test]
    fn numeric_summary_matches_hand_computation() {
        let summary = numeric_summary(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.mean - 2.5).abs() < EPS);
        assert!((summary.min - 1.0).abs() < EPS);
        assert!((summary.q1 - 1.75).abs() < EPS);
        assert!((summary.median - 2.5).abs() < EPS);
        assert!((summary.q3 - 3.25).abs() < EPS);
        assert!((summary.max - 4.0).abs() < EPS);
        assert!(numeric_summary(&[]).is_none());
    }

    #[test]
    fn value_counts_sorted_by_frequency_then_value() {
        let counts = value_counts(&["b", "a", "b", "", "c", "b", "a"]);
        assert_eq!(
            counts,
            vec![
                ("b".to_string(), 3),
                ("a".to_string(), 2),
                ("c".to_string(), 1),
            ]
        );
    }

    #[test]
    fn categorical_summary_reports_top_value() {
        let summary = categorical_summary(&["b", "a", "b", "", "c", "b", "a"]).unwrap();
        assert_eq!(summary.count, 6);
        assert_eq!(summary.unique, 3);
        assert_eq!(summary.top, "b");
        assert_eq!(summary.freq, 3);
        assert!(categorical_summary(&["", ""]).is_none());
    }

    #[test]
    fn duplicate_rows_counted_after_first_occurrence() {
        let table = Table::from_csv("merged", "a,b\n1,2\n1,2\n3,4\n1,2\n").unwrap();
        assert_eq!(duplicate_row_count(&table), 2);
    }

    #[test]
    fn classification_covers_all_kinds() {
        let table = Table::from_csv(
            "merged",
            "_id,allocation_id,score,label,created,empty,mixed\n\
             a,x,0.5,GBP,2025-05-22T09:03:41.132102+00:00,,1\n\
             b,y,1.5,USD,2025-05-23T10:00:00+00:00,,oops\n",
        )
        .unwrap();
        let kinds: HashMap<String, ColumnKind> =
            classify_columns(&table, "_id").into_iter().collect();
        assert_eq!(kinds["_id"], ColumnKind::Identifier);
        assert_eq!(kinds["allocation_id"], ColumnKind::Identifier);
        assert_eq!(kinds["score"], ColumnKind::Numeric);
        assert_eq!(kinds["label"], ColumnKind::Categorical);
        assert_eq!(kinds["created"], ColumnKind::Datetime);
        assert_eq!(kinds["empty"], ColumnKind::Categorical);
        assert_eq!(kinds["mixed"], ColumnKind::Categorical);
    }

    #[test]
    fn date_parsing_accepts_common_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 22).unwrap();
        assert_eq!(
            parse_date("2025-05-22T09:03:41.132102+00:00"),
            Some(expected)
        );
        assert_eq!(parse_date("2025-05-22T09:03:41"), Some(expected));
        assert_eq!(parse_date("2025-05-22 09:03:41.5"), Some(expected));
        assert_eq!(parse_date("2025-05-22"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn date_frequency_sorts_by_date() {
        let freq = date_frequency(&[
            "2025-05-23T08:00:00+00:00",
            "2025-05-22T10:00:00+00:00",
            "2025-05-23T09:30:00+00:00",
        ]);
        assert_eq!(
            freq,
            vec![
                (NaiveDate::from_ymd_opt(2025, 5, 22).unwrap(), 1),
                (NaiveDate::from_ymd_opt(2025, 5, 23).unwrap(), 2),
            ]
        );
    }

    #[test]
    fn grouped_sum_orders_keys() {
        let sums = grouped_sum(&["b", "a", "b", ""], &["10", "5", "2.5", "99"]);
        let entries: Vec<(&str, f64)> = sums.into_iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
        assert!((entries[0].1 - 5.0).abs() < EPS);
        assert_eq!(entries[1].0, "b");
        assert!((entries[1].1 - 12.5).abs() < EPS);
    }

    #[test]
    fn grouped_summary_per_label() {
        let groups = ["x", "y", "x", "y"];
        let values = [Some(1.0), Some(10.0), Some(3.0), None];
        let summary = grouped_numeric_summary(&groups, &values);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].label, "x");
        assert_eq!(summary[0].count, 2);
        assert!((summary[0].mean - 2.0).abs() < EPS);
        assert_eq!(summary[1].label, "y");
        assert_eq!(summary[1].count, 1);
    }

    #[test]
    fn histogram_includes_maximum_in_last_bin() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let bins = histogram(&values, 5).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[4].count, 3); // 8, 9 and the inclusive max 10
        assert!((bins[0].lower - 0.0).abs() < EPS);
        assert!((bins[4].upper - 10.0).abs() < EPS);
    }

    #[test]
    fn histogram_of_constant_column_is_one_bin() {
        let bins = histogram(&[2.0, 2.0, 2.0], 5).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn pearson_detects_perfect_correlation() {
        let xs = [Some(1.0), Some(2.0), Some(3.0)];
        let ys = [Some(2.0), Some(4.0), Some(6.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < EPS);

        let inverted = [Some(6.0), Some(4.0), Some(2.0)];
        assert!((pearson(&xs, &inverted).unwrap() + 1.0).abs() < EPS);
    }

    #[test]
    fn pearson_uses_pairwise_complete_observations() {
        let xs = [Some(1.0), None, Some(2.0), Some(3.0)];
        let ys = [Some(2.0), Some(100.0), Some(4.0), Some(6.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < EPS);
        // One complete pair is not enough.
        assert!(pearson(&[Some(1.0), None], &[Some(2.0), Some(3.0)]).is_none());
        // Constant sides have no defined correlation.
        assert!(pearson(&[Some(1.0), Some(1.0)], &[Some(2.0), Some(3.0)]).is_none());
    }

    #[test]
    fn correlation_matrix_has_unit_diagonal() {
        let columns = vec![
            ("a".to_string(), vec![Some(1.0), Some(2.0), Some(3.0)]),
            ("b".to_string(), vec![Some(2.0), Some(4.0), Some(6.0)]),
        ];
        let matrix = correlation_matrix(&columns);
        assert!((matrix[0][0].unwrap() - 1.0).abs() < EPS);
        assert!((matrix[1][1].unwrap() - 1.0).abs() < EPS);
        assert!((matrix[0][1].unwrap() - 1.0).abs() < EPS);
        assert!((matrix[1][0].unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn crosstab_rows_sum_to_one() {
        let rows = ["Equity", "Equity", "Bond", "Equity", ""];
        let cols = ["GBP", "USD", "GBP", "GBP", "EUR"];
        let tab = crosstab_normalized(&rows, &cols).unwrap();
        assert_eq!(tab.row_labels, vec!["Bond", "Equity"]);
        assert_eq!(tab.col_labels, vec!["GBP", "USD"]);
        assert!((tab.proportions[0][0] - 1.0).abs() < EPS);
        assert!((tab.proportions[1][0] - 2.0 / 3.0).abs() < EPS);
        assert!((tab.proportions[1][1] - 1.0 / 3.0).abs() < EPS);
        for row in &tab.proportions {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < EPS);
        }
    }
}
