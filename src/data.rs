//! Table model and CSV loading using Polars

use std::collections::{BTreeMap, HashMap};
use std::fs::File;

use anyhow::Context;
use polars::prelude::*;

/// An in-memory table of string cells with a resolved column index.
///
/// Every row has exactly `columns.len()` cells: short rows are padded with
/// empty strings and long rows are truncated when the table is built.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// A borrowed view of one row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    index: &'a HashMap<String, usize>,
    values: &'a [String],
}

impl Table {
    /// Build a table from a header and its rows.
    pub fn new<C, R, S>(columns: impl IntoIterator<Item = C>, rows: impl IntoIterator<Item = R>) -> Self
    where
        C: Into<String>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();

        // Duplicate header names resolve to their first occurrence
        let mut index = HashMap::with_capacity(width);
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row.into_iter().take(width).map(Into::into).collect();
                cells.resize(width, String::new());
                cells
            })
            .collect();

        Table {
            columns,
            index,
            rows,
        }
    }

    /// Column names in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `column`).
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows[row][column].as_str()
    }

    pub fn record(&self, row: usize) -> Record<'_> {
        Record {
            columns: &self.columns,
            index: &self.index,
            values: &self.rows[row],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.rows.len()).map(move |i| self.record(i))
    }
}

impl<'a> Record<'a> {
    /// Value of the named column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.index.get(column).map(|&i| self.values[i].as_str())
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }

    /// Copy the record into an owned column → value map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Load a CSV file into a [`Table`]
///
/// Every column is read as text (`infer_schema_length = 0`) so that field
/// roles are inferred from the raw strings, not from a guessed dtype.
/// Null cells become empty strings; cell text is kept as read. A file with
/// no content yields an empty table.
///
/// # Arguments
/// * `file_path` - Path to the CSV file (first line is the header)
pub fn load_table(file_path: &str) -> crate::Result<Table> {
    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.into()))
        .with_context(|| format!("opening CSV file {file_path}"))?;

    let df = match reader.finish() {
        Ok(df) => df,
        Err(PolarsError::NoData(_)) => {
            log::warn!("CSV file {} is empty", file_path);
            return Ok(Table::default());
        }
        Err(err) => return Err(err).with_context(|| format!("reading CSV file {file_path}")),
    };

    table_from_frame(&df)
}

/// Convert a Polars frame into a string table
fn table_from_frame(df: &DataFrame) -> crate::Result<Table> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); df.height()];
    for series in df.get_columns() {
        let text = series.cast(&DataType::String)?;
        let text = text.str()?;
        for (row, cell) in rows.iter_mut().zip(text.into_iter()) {
            row.push(cell.unwrap_or("").to_string());
        }
    }

    Ok(Table::new(columns, rows))
}

/// Write a [`Table`] to a CSV file with a header row
pub fn write_table(table: &Table, file_path: &str) -> crate::Result<()> {
    let series: Vec<Series> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<&str> = (0..table.len()).map(|row| table.value(row, col)).collect();
            Series::new(name.as_str(), values)
        })
        .collect();
    let mut df = DataFrame::new(series)?;

    let mut file =
        File::create(file_path).with_context(|| format!("creating CSV file {file_path}"))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing CSV file {file_path}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "email,total_spent,signup_date").unwrap();
        writeln!(file, "ann@example.com,120.50,2024-01-03").unwrap();
        writeln!(file, "bob@example.com,abc,2024-02-11").unwrap();
        writeln!(file, "\"cy, jr@example.com\", 80 ,").unwrap();
        file
    }

    #[test]
    fn test_new_pads_and_truncates_rows() {
        let table = Table::new(["a", "b"], vec![vec!["1"], vec!["1", "2", "3"]]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, 1), "");
        assert_eq!(table.record(1).values(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_record_lookup_by_name() {
        let table = Table::new(["email", "total"], vec![vec!["x@y.z", "10"]]);
        let record = table.record(0);

        assert_eq!(record.get("total"), Some("10"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.to_map().len(), 2);
        assert_eq!(table.column_index("email"), Some(0));
    }

    #[test]
    fn test_load_table_reads_all_columns_as_text() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let table = load_table(file_path).unwrap();
        assert_eq!(table.columns(), &["email", "total_spent", "signup_date"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(0, 1), "120.50");
        assert_eq!(table.value(1, 1), "abc");
        assert_eq!(table.value(2, 0), "cy, jr@example.com");
        assert_eq!(table.value(2, 1), " 80 ");
        assert_eq!(table.value(2, 2), "");
    }

    #[test]
    fn test_load_empty_file_gives_empty_table() {
        let test_file = NamedTempFile::new().unwrap();
        let file_path = test_file.path().to_str().unwrap();

        let table = load_table(file_path).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert_eq!(
            crate::analyze(&table, &crate::AnalysisConfig::default()),
            crate::Analysis::NoData
        );
    }

    #[test]
    fn test_load_header_only_file() {
        let mut test_file = NamedTempFile::new().unwrap();
        writeln!(test_file, "email,total_spent").unwrap();
        let file_path = test_file.path().to_str().unwrap();

        let table = load_table(file_path).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            crate::analyze(&table, &crate::AnalysisConfig::default()),
            crate::Analysis::NoData
        );
    }

    #[test]
    fn test_write_then_load() {
        let table = Table::new(
            ["name", "amount"],
            vec![vec!["a", "1.5"], vec!["b", "2"]],
        );
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap();

        write_table(&table, path).unwrap();
        let loaded = load_table(path).unwrap();

        assert_eq!(loaded.columns(), table.columns());
        assert_eq!(loaded.value(1, 1), "2");
    }
}
