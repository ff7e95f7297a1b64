use crate::normalize::canonical_key;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

/// Row-kind markers for dong totals, grand totals, subtotals, unknowns and
/// the header row. Merging these with leaf rows would double count.
pub const DEFAULT_EXCLUSIONS: [&str; 6] = ["동", "계", "합계", "소계", "미상", "행정동"];

/// Column layout of one statistics export.
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Non-data columns (e.g. 기간, 자치구) dropped before the name column.
    pub leading_columns: usize,
    /// Raw column index whose content decides whether the row is a summary row.
    pub kind_column: usize,
    /// Numeric columns kept after the name column.
    pub values: usize,
    pub exclusions: Vec<String>,
}

impl TableLayout {
    pub fn new(values: usize) -> Self {
        Self {
            leading_columns: 2,
            kind_column: 2,
            values,
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn is_summary(&self, record: &StringRecord) -> bool {
        record
            .get(self.kind_column)
            .map(|kind| self.exclusions.iter().any(|e| e == kind.trim()))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    pub key: String,
    pub values: Vec<f64>,
}

/// Parses comma-delimited text into keyed rows, in input order.
///
/// Summary rows are filtered out, leading columns dropped and the name
/// normalized. Numeric fields may use `,` as a thousands separator; a field
/// that is still not a number becomes NaN rather than failing the row.
pub fn parse_table(content: &str, layout: &TableLayout) -> Result<Vec<TabularRow>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let width = layout.leading_columns + 1 + layout.values;
    let mut rows = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read table row {}", line + 1))?;

        if layout.is_summary(&record) {
            continue;
        }
        if record.len() < width {
            debug!(
                line = line + 1,
                fields = record.len(),
                expected = width,
                "Dropping short row"
            );
            continue;
        }

        let mut fields = record.iter().skip(layout.leading_columns);
        let key = canonical_key(fields.next().unwrap_or(""));
        let values = fields.take(layout.values).map(parse_number).collect();

        rows.push(TabularRow { key, values });
    }

    Ok(rows)
}

/// Strips thousands separators and parses. Blank fields count as zero.
pub fn parse_number(field: &str) -> f64 {
    let cleaned = field.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One row per exclusion marker, plus two leaf rows.
    const YOUNG: &str = "\
기간,자치구,행정동,계,남자,여자
2020,합계,합계,\"1,234\",600,634
2020,종로구,계,\"1,170\",580,590
2020,종로구,소계,\"1,000\",500,500
2020,종로구,동,\"1,000\",500,500
2020,종로구,청운.효자동,120,60,60
2020,종로구,사직동,\"1,050\",520,530
2020,종로구,미상,3,1,2
";

    #[test]
    fn summary_rows_never_reach_the_output() {
        let rows = parse_table(YOUNG, &TableLayout::new(3)).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["청운·효자동", "사직동"]);
        for marker in DEFAULT_EXCLUSIONS {
            assert!(YOUNG.lines().any(|l| l.split(',').nth(2) == Some(marker)));
            assert!(!keys.contains(&marker));
        }
    }

    #[test]
    fn thousands_separators_are_removed() {
        let rows = parse_table(YOUNG, &TableLayout::new(3)).unwrap();
        assert_eq!(rows[1].values, vec![1050.0, 520.0, 530.0]);
    }

    #[test]
    fn single_leading_column_layout() {
        let layout = TableLayout {
            leading_columns: 1,
            kind_column: 1,
            ..TableLayout::new(1)
        };
        let rows = parse_table("2020,사직동,\"2,000\"\n2020,계,9\n", &layout).unwrap();
        assert_eq!(
            rows,
            vec![TabularRow {
                key: "사직동".into(),
                values: vec![2000.0]
            }]
        );
    }

    #[test]
    fn short_rows_are_dropped() {
        let content = "2020,종로구,사직동\n2020,종로구,청운동,5\n";
        let rows = parse_table(content, &TableLayout::new(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "청운동");
    }

    #[test]
    fn duplicate_keys_are_kept_in_order() {
        let rows = parse_table("a,b,사직동,1\na,b,사직동,2\n", &TableLayout::new(1)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values, vec![2.0]);
    }

    #[test]
    fn non_numeric_fields_become_nan() {
        assert!(parse_number("x").is_nan());
        assert!(parse_number("1,2a").is_nan());
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number(" 12,345 "), 12345.0);
    }
}
