//! Quantity tables over translation matrices.
//!
//! A quantity table is a DataFrame with one Float64 column per source zone
//! label, optionally keyed by an index column (hour-of-year, timestamp) that
//! passes through untouched. [`apply_translation`] remaps such a table onto
//! the target zones of a [`TranslationMatrix`]; the file helpers dispatch on
//! extension between CSV and (feature-gated) Parquet.

use std::{
    fs::{self, File},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
#[cfg(feature = "parquet")]
use polars::prelude::{ParquetReader, ParquetWriter};

use zonal_core::{Diagnostics, TranslationMatrix};

/// Remap a source-zone quantity table onto the matrix's target zones.
///
/// Every target column is the weighted sum of the source columns per the
/// matrix entries, so non-isolated quantity mass is conserved row by row.
/// Source zones with matrix weight but no table column are treated as zero
/// and flagged in the returned diagnostics, as are table columns that match
/// no source zone. Null cells count as zero.
pub fn apply_translation(
    matrix: &TranslationMatrix,
    quantities: &DataFrame,
    index_column: Option<&str>,
) -> Result<(DataFrame, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let height = quantities.height();

    let mut out: Vec<Vec<f64>> = vec![vec![0.0; height]; matrix.target_labels().len()];

    for (row, label) in matrix.source_labels().iter().enumerate() {
        let series = match quantities.column(label) {
            Ok(series) => series,
            Err(_) => {
                if matrix.row_has_weight(label) {
                    diagnostics.add_warning_with_entity(
                        "quantity",
                        &format!("no column for source zone '{label}'; assuming zero"),
                        label,
                    );
                }
                continue;
            }
        };
        let values = series
            .cast(&DataType::Float64)
            .with_context(|| format!("casting column '{label}' to Float64"))?;
        let values = values.f64()?;
        if values.null_count() > 0 {
            diagnostics.add_warning_with_entity(
                "quantity",
                &format!("column '{label}' has nulls; counted as zero"),
                label,
            );
        }

        let weights = matrix.row_entries(row);
        if weights.is_empty() {
            continue;
        }
        for (i, cell) in values.into_iter().enumerate() {
            let q = cell.unwrap_or(0.0);
            if q == 0.0 {
                continue;
            }
            for &(col, w) in &weights {
                out[col][i] += w * q;
            }
        }
    }

    for name in quantities.get_column_names() {
        if Some(name) == index_column {
            continue;
        }
        if !matrix.source_labels().iter().any(|l| l == name) {
            diagnostics.add_warning_with_entity(
                "quantity",
                &format!("column '{name}' matches no source zone; ignored"),
                name,
            );
        }
    }

    let mut columns = Vec::with_capacity(matrix.target_labels().len() + 1);
    if let Some(index) = index_column {
        let series = quantities
            .column(index)
            .with_context(|| format!("index column '{index}' not in quantity table"))?;
        columns.push(series.clone());
    }
    for (label, values) in matrix.target_labels().iter().zip(out) {
        columns.push(Series::new(label, values));
    }

    Ok((DataFrame::new(columns)?, diagnostics))
}

/// Render a matrix as a dense table: a `source` label column plus one
/// Float64 column per target zone. Zero entries come out as literal zeros.
pub fn matrix_to_dataframe(matrix: &TranslationMatrix) -> Result<DataFrame> {
    let (rows, cols) = matrix.shape();
    let mut columns = Vec::with_capacity(cols + 1);
    columns.push(Series::new("source", matrix.source_labels()));
    for (col, label) in matrix.target_labels().iter().enumerate() {
        let values: Vec<f64> = (0..rows).map(|row| matrix.entry(row, col)).collect();
        columns.push(Series::new(label, values));
    }
    DataFrame::new(columns).map_err(Into::into)
}

pub fn read_frame(path: &str) -> Result<DataFrame> {
    let path = Path::new(path);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match extension.as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => {
            let reader = ParquetReader::new(&mut file);
            reader.finish().context("reading Parquet file")
        }
        #[cfg(not(feature = "parquet"))]
        "parquet" => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
        "csv" => {
            let reader = CsvReader::new(&mut file);
            reader.has_header(true).finish().context("reading CSV file")
        }
        _ => Err(anyhow!(
            "unsupported file extension '{}'; use .csv or .parquet",
            extension
        )),
    }
}

pub fn write_frame(df: &mut DataFrame, path: &str) -> Result<()> {
    let output = Path::new(path);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    match output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
    {
        #[cfg(feature = "parquet")]
        Some(ext) if ext == "parquet" => ParquetWriter::new(&mut file)
            .finish(df)
            .map(|_| ())
            .context("writing Parquet file"),
        #[cfg(not(feature = "parquet"))]
        Some(ext) if ext == "parquet" => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
        Some(ext) if ext == "csv" => CsvWriter::new(&mut file)
            .finish(df)
            .context("writing CSV file"),
        _ => Err(anyhow!(
            "unsupported output extension for {}; use .csv or .parquet",
            output.display()
        )),
    }
}
