//! DataFrame loading helpers with column validation
//!
//! Provides safe, explicit patterns for pulling typed columns out of the CSV
//! tables so a renamed or missing column fails with a clear message instead
//! of a silent null.

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Read a CSV table with a header row.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load table: {}", path.display()))
}

/// Materialize a DataFrame with an explicit column list and validation
///
/// # Arguments
/// * `df` - Loaded table
/// * `columns` - Required column names
/// * `context` - Context for error messages (e.g., "disposition table")
///
/// # Returns
/// DataFrame with exactly the specified columns
///
/// # Errors
/// Returns error if any required column is missing
pub fn materialize_with_columns(df: &DataFrame, columns: &[&str], context: &str) -> Result<DataFrame> {
    let actual_cols: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for &expected in columns {
        if !actual_cols.contains(expected) {
            return Err(anyhow!(
                "{}: Missing expected column '{}'. Available columns: {:?}",
                context,
                expected,
                actual_cols
            ));
        }
    }

    let col_exprs: Vec<Expr> = columns.iter().map(|&name| col(name)).collect();
    df.clone()
        .lazy()
        .select(col_exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns {:?}", context, columns))
}

/// String column as trimmed values; empty strings become None.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", name))?;

    let values = column
        .str()
        .with_context(|| format!("Column '{}' is not string type", name))?
        .into_iter()
        .map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        })
        .collect();

    Ok(values)
}

/// Integer column (years, feature ids).
pub fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Int64)
        .with_context(|| format!("Column '{}' cannot be read as integer", name))?;

    let values = column
        .i64()
        .with_context(|| format!("Column '{}' is not integer type", name))?
        .into_iter()
        .collect();

    Ok(values)
}

/// Float column (recharge rates).
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' cannot be read as number", name))?;

    let values = column
        .f64()
        .with_context(|| format!("Column '{}' is not float type", name))?
        .into_iter()
        .collect();

    Ok(values)
}

/// Year column: integers narrowed to i32.
pub fn year_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    int_values(df, name)?
        .into_iter()
        .map(|opt| {
            opt.map(|v| i32::try_from(v).with_context(|| format!("Column '{}': {} is not a year", name, v)))
                .transpose()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_with_columns_success() {
        let df = df![
            "Site_ID" => &["216-A-1", "216-A-2"],
            "Date_Begin" => &[1950i64, 1955],
            "extra_col" => &["e1", "e2"],
        ]
        .unwrap();

        let result = materialize_with_columns(&df, &["Site_ID", "Date_Begin"], "test");

        assert!(result.is_ok());
        let materialized = result.unwrap();
        assert_eq!(materialized.width(), 2);
        assert_eq!(materialized.height(), 2);
    }

    #[test]
    fn test_materialize_with_columns_missing() {
        let df = df![
            "Site_ID" => &["216-A-1"],
        ]
        .unwrap();

        let result = materialize_with_columns(&df, &["Date_Begin"], "disposition");

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Date_Begin"));
        assert!(err_msg.contains("disposition"));
    }

    #[test]
    fn test_string_values_trims_and_drops_empty() {
        let df = df![
            "label" => &[Some(" Closed in Place "), Some(""), None],
        ]
        .unwrap();

        let values = string_values(&df, "label").unwrap();
        assert_eq!(values, vec![Some("Closed in Place".to_string()), None, None]);
    }

    #[test]
    fn test_int_values_keeps_nulls() {
        let df = df![
            "Date_End" => &[Some(1960i64), None],
        ]
        .unwrap();

        assert_eq!(int_values(&df, "Date_End").unwrap(), vec![Some(1960), None]);
        assert_eq!(year_values(&df, "Date_End").unwrap(), vec![Some(1960), None]);
    }

    #[test]
    fn test_numeric_column_read_as_text() {
        let df = df![
            "FACIL_NAME" => &[2704i64],
        ]
        .unwrap();

        assert_eq!(string_values(&df, "FACIL_NAME").unwrap(), vec![Some("2704".to_string())]);
    }
}
