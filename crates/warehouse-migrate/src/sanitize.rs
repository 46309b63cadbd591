//! Cell sanitization for landing-table loads.
//!
//! Legacy values reach the loader as text with a short list of repairs
//! applied: missing values become empty strings, embedded single quotes are
//! doubled, line breaks and tabs collapse to a single space, and oversized
//! cells are truncated. The transform is deterministic so the same source
//! row always produces the same landing row.

use crate::source::{RawValue, TableSample};

/// Hard cap on a single cell after sanitization, in characters.
pub const MAX_CELL_LEN: usize = 16_000;

/// Render a raw value as its textual form, before escaping.
fn render(value: &RawValue) -> String {
    match value {
        RawValue::Null => String::new(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Int(i) => i.to_string(),
        RawValue::Float(f) => {
            if f.is_nan() {
                String::new()
            } else {
                f.to_string()
            }
        }
        RawValue::Text(s) => s.clone(),
        RawValue::Bytes(b) => b.iter().map(|byte| format!("{byte:02x}")).collect(),
        RawValue::Uuid(u) => u.to_string(),
        RawValue::Date(d) => d.to_string(),
        RawValue::Timestamp(ts) => ts.to_string(),
    }
}

/// Sanitize a single cell into loader-safe text.
///
/// Missing values (NULL, NaN) become the empty string. Single quotes are
/// doubled for SQL-literal embedding, and CR, LF, and TAB each become one
/// space. Output longer than `max_len` characters is truncated without
/// splitting a doubled quote, so every cell stays loader-safe.
pub fn sanitize_cell(value: &RawValue, max_len: usize) -> String {
    if value.is_missing() {
        return String::new();
    }

    let text = render(value);
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(ch),
        }
    }

    if out.chars().count() > max_len {
        out = out.chars().take(max_len).collect();
        // The cap can land inside a doubled quote; an odd trailing quote
        // run means it did, so drop the orphan half.
        let trailing_quotes = out.chars().rev().take_while(|&c| c == '\'').count();
        if trailing_quotes % 2 == 1 {
            out.pop();
        }
    }
    out
}

/// Undo quote doubling, recovering the logical cell value.
///
/// Whitespace collapsing and truncation are lossy and cannot be reversed;
/// this only inverts the escaping step.
pub fn unescape(cell: &str) -> String {
    cell.replace("''", "'")
}

/// Sanitize every cell of an extracted sample, preserving row and column
/// order.
pub fn sanitize_rows(sample: &TableSample, max_len: usize) -> Vec<Vec<String>> {
    sample
        .rows
        .iter()
        .map(|row| row.iter().map(|v| sanitize_cell(v, max_len)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_become_empty() {
        assert_eq!(sanitize_cell(&RawValue::Null, MAX_CELL_LEN), "");
        assert_eq!(sanitize_cell(&RawValue::Float(f64::NAN), MAX_CELL_LEN), "");
    }

    #[test]
    fn test_quotes_are_doubled_and_reversible() {
        let cell = sanitize_cell(&RawValue::Text("O'Brien".into()), MAX_CELL_LEN);
        assert_eq!(cell, "O''Brien");
        assert_eq!(unescape(&cell), "O'Brien");
    }

    #[test]
    fn test_line_breaks_collapse_to_spaces() {
        let cell = sanitize_cell(&RawValue::Text("line1\nline2".into()), MAX_CELL_LEN);
        assert_eq!(cell, "line1 line2");

        let cell = sanitize_cell(&RawValue::Text("a\r\nb\tc".into()), MAX_CELL_LEN);
        assert_eq!(cell, "a  b c");
    }

    #[test]
    fn test_oversized_cells_truncate() {
        let long = "x".repeat(MAX_CELL_LEN + 100);
        let cell = sanitize_cell(&RawValue::Text(long), MAX_CELL_LEN);
        assert_eq!(cell.len(), MAX_CELL_LEN);
    }

    #[test]
    fn test_truncation_never_splits_a_doubled_quote() {
        // "ab'cd" escapes to "ab''cd"; a cap of 3 lands inside the pair
        let cell = sanitize_cell(&RawValue::Text("ab'cd".into()), 3);
        assert_eq!(cell, "ab");
        assert_eq!(unescape(&cell), "ab");

        // a cap just past the pair keeps it whole
        let cell = sanitize_cell(&RawValue::Text("ab'cd".into()), 4);
        assert_eq!(cell, "ab''");
        assert_eq!(unescape(&cell), "ab'");
    }

    #[test]
    fn test_scalar_values_render_as_text() {
        assert_eq!(sanitize_cell(&RawValue::Int(42), MAX_CELL_LEN), "42");
        assert_eq!(sanitize_cell(&RawValue::Bool(true), MAX_CELL_LEN), "true");
        assert_eq!(
            sanitize_cell(&RawValue::Bytes(vec![0xde, 0xad]), MAX_CELL_LEN),
            "dead"
        );
    }

    #[test]
    fn test_temporal_and_uuid_values_render_as_text() {
        assert_eq!(
            sanitize_cell(&RawValue::Uuid(uuid::Uuid::nil()), MAX_CELL_LEN),
            "00000000-0000-0000-0000-000000000000"
        );

        let day = chrono::NaiveDate::from_ymd_opt(2019, 4, 30).unwrap();
        assert_eq!(sanitize_cell(&RawValue::Date(day), MAX_CELL_LEN), "2019-04-30");
        assert_eq!(
            sanitize_cell(
                &RawValue::Timestamp(day.and_hms_opt(13, 5, 0).unwrap()),
                MAX_CELL_LEN
            ),
            "2019-04-30 13:05:00"
        );
    }

    #[test]
    fn test_sanitize_rows_preserves_shape() {
        use crate::catalog::ColumnDescriptor;
        use crate::source::TableSample;

        let sample = TableSample {
            columns: vec![
                ColumnDescriptor::new("Name", 1),
                ColumnDescriptor::new("Note", 2),
            ],
            rows: vec![
                vec![RawValue::Text("O'Brien".into()), RawValue::Null],
                vec![RawValue::Text("Smith".into()), RawValue::Text("a\nb".into())],
            ],
        };

        let clean = sanitize_rows(&sample, MAX_CELL_LEN);
        assert_eq!(
            clean,
            vec![
                vec!["O''Brien".to_string(), String::new()],
                vec!["Smith".to_string(), "a b".to_string()],
            ]
        );
    }
}
