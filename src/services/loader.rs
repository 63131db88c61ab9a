use calamine::{DataType as CellValue, Reader, Xlsx};
use log::info;
use polars::prelude::*;
use std::io::Cursor;

use crate::error::AnalysisError;
use crate::models::dataset::{ColumnSummary, DatasetFormat, SchemaSummary};

/// Rows embedded into a prompt as the data sample.
pub const SAMPLE_ROWS: usize = 10;
/// Distinct example values reported per column.
pub const EXAMPLE_VALUES: usize = 3;

/// Parses uploaded bytes into a `DataFrame` and derives the schema summary
/// and row sample used to ground prompts. Stateless; a new table is built
/// from the stored bytes on every question cycle.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Parse raw uploaded bytes. A malformed or empty file is a load failure;
    /// no partial recovery is attempted.
    pub fn parse(bytes: &[u8], format: DatasetFormat) -> Result<DataFrame, AnalysisError> {
        let df = match format {
            DatasetFormat::Csv => Self::parse_csv(bytes)?,
            DatasetFormat::Xlsx => Self::parse_xlsx(bytes)?,
        };

        if df.width() == 0 || df.height() == 0 {
            return Err(AnalysisError::Load(
                "file contains no tabular data".to_string(),
            ));
        }

        info!(
            "📊 Parsed dataset: {} rows, {} columns",
            df.height(),
            df.width()
        );
        Ok(df)
    }

    fn parse_csv(bytes: &[u8]) -> Result<DataFrame, AnalysisError> {
        CsvReader::new(Cursor::new(bytes))
            .infer_schema(Some(100))
            .has_header(true)
            .finish()
            .map_err(|e| AnalysisError::Load(format!("failed to parse CSV data: {}", e)))
    }

    fn parse_xlsx(bytes: &[u8]) -> Result<DataFrame, AnalysisError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| AnalysisError::Load(format!("failed to open workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AnalysisError::Load("workbook has no sheets".to_string()))?
            .map_err(|e| AnalysisError::Load(format!("failed to read sheet: {}", e)))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| AnalysisError::Load("sheet is empty".to_string()))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();
        if header.iter().all(|name| name.trim().is_empty()) {
            return Err(AnalysisError::Load("sheet has no header row".to_string()));
        }

        let data_rows: Vec<&[CellValue]> = rows.collect();
        let mut columns = Vec::with_capacity(header.len());
        for (idx, name) in header.iter().enumerate() {
            columns.push(Self::build_column(name, idx, &data_rows));
        }

        DataFrame::new(columns)
            .map_err(|e| AnalysisError::Load(format!("failed to build table: {}", e)))
    }

    /// Resolve one sheet column to a typed series: all-numeric cells become
    /// Float64, all-boolean become Boolean, anything else falls back to text.
    /// Empty cells are nulls in every case.
    fn build_column(name: &str, idx: usize, rows: &[&[CellValue]]) -> Series {
        let cells: Vec<&CellValue> = rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&CellValue::Empty))
            .collect();

        let mut any_value = false;
        let mut all_numeric = true;
        let mut all_bool = true;
        for cell in &cells {
            match cell {
                CellValue::Empty => {}
                CellValue::Int(_) | CellValue::Float(_) => {
                    any_value = true;
                    all_bool = false;
                }
                CellValue::Bool(_) => {
                    any_value = true;
                    all_numeric = false;
                }
                _ => {
                    any_value = true;
                    all_numeric = false;
                    all_bool = false;
                }
            }
        }

        if any_value && all_numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Int(v) => Some(*v as f64),
                    CellValue::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            return Series::new(name, values);
        }

        if any_value && all_bool {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            return Series::new(name, values);
        }

        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                CellValue::Empty => None,
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name, values)
    }

    /// Column names, coarse type labels, and up to three distinct non-missing
    /// example values per column.
    pub fn summarize(df: &DataFrame) -> Result<SchemaSummary, AnalysisError> {
        let mut columns = Vec::with_capacity(df.width());

        for series in df.get_columns() {
            let as_text = series
                .cast(&DataType::Utf8)
                .map_err(|e| AnalysisError::Load(format!("failed to summarize column: {}", e)))?;
            let text = as_text
                .utf8()
                .map_err(|e| AnalysisError::Load(format!("failed to summarize column: {}", e)))?;

            let mut examples: Vec<String> = Vec::with_capacity(EXAMPLE_VALUES);
            for value in text.into_iter().flatten() {
                if examples.iter().any(|seen| seen == value) {
                    continue;
                }
                examples.push(value.to_string());
                if examples.len() == EXAMPLE_VALUES {
                    break;
                }
            }

            columns.push(ColumnSummary {
                name: series.name().to_string(),
                data_type: Self::dtype_label(series.dtype()).to_string(),
                examples,
            });
        }

        Ok(SchemaSummary {
            row_count: df.height(),
            column_count: df.width(),
            columns,
        })
    }

    fn dtype_label(dtype: &DataType) -> &'static str {
        match dtype {
            DataType::Boolean => "boolean",
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                "unsigned integer"
            }
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => "integer",
            DataType::Float32 | DataType::Float64 => "float",
            DataType::Utf8 => "string",
            DataType::Date => "date",
            DataType::Datetime(_, _) => "datetime",
            DataType::Time => "time",
            _ => "unknown",
        }
    }

    /// First `limit` rows rendered as a comma-separated block (header
    /// included) for prompt embedding. Nulls render as empty fields.
    pub fn sample_rows(df: &DataFrame, limit: usize) -> Result<String, AnalysisError> {
        let head = df.head(Some(limit));
        let names = head.get_column_names();

        let mut text_columns = Vec::with_capacity(head.width());
        for series in head.get_columns() {
            let as_text = series
                .cast(&DataType::Utf8)
                .map_err(|e| AnalysisError::Load(format!("failed to sample rows: {}", e)))?;
            text_columns.push(as_text);
        }

        let mut lines = Vec::with_capacity(head.height() + 1);
        lines.push(names.join(","));
        for row in 0..head.height() {
            let mut fields = Vec::with_capacity(text_columns.len());
            for column in &text_columns {
                let chunked = column
                    .utf8()
                    .map_err(|e| AnalysisError::Load(format!("failed to sample rows: {}", e)))?;
                fields.push(chunked.get(row).unwrap_or("").to_string());
            }
            lines.push(fields.join(","));
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEOPLE_CSV: &[u8] =
        b"department,salary\nEng,100000\nEng,120000\nSales,90000\nEng,100000\n";

    #[test]
    fn parses_csv_with_inferred_types() {
        let df = DatasetLoader::parse(PEOPLE_CSV, DatasetFormat::Csv).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.get_column_names(), &["department", "salary"]);
        assert!(df.column("salary").unwrap().dtype().is_numeric());
    }

    #[test]
    fn rejects_unreadable_bytes() {
        let err = DatasetLoader::parse(b"", DatasetFormat::Csv);
        assert!(matches!(err, Err(AnalysisError::Load(_))));

        let err = DatasetLoader::parse(b"not a workbook", DatasetFormat::Xlsx);
        assert!(matches!(err, Err(AnalysisError::Load(_))));
    }

    #[test]
    fn summary_caps_examples_at_three_distinct_values() {
        let csv = b"city\nOslo\nParis\nOslo\nLima\nRome\n";
        let df = DatasetLoader::parse(csv, DatasetFormat::Csv).unwrap();
        let schema = DatasetLoader::summarize(&df).unwrap();

        assert_eq!(schema.row_count, 5);
        assert_eq!(schema.columns.len(), 1);
        let city = &schema.columns[0];
        assert_eq!(city.examples, vec!["Oslo", "Paris", "Lima"]);
    }

    #[test]
    fn sample_block_is_bounded_and_headed() {
        let mut csv = String::from("n\n");
        for i in 0..25 {
            csv.push_str(&format!("{}\n", i));
        }
        let df = DatasetLoader::parse(csv.as_bytes(), DatasetFormat::Csv).unwrap();
        let sample = DatasetLoader::sample_rows(&df, SAMPLE_ROWS).unwrap();

        let lines: Vec<&str> = sample.lines().collect();
        assert_eq!(lines.len(), SAMPLE_ROWS + 1);
        assert_eq!(lines[0], "n");
    }
}
