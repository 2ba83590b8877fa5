//! Tabular dataset loading and preparation.
//!
//! A [`TabularDataset`] holds a dense feature matrix together with a binary
//! target column, ready for model training. Datasets are usually built from
//! a CSV file where one column holds the 0/1 response and every other column
//! is treated as a numeric feature.

use crate::error::{Result, TreeTuneError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Read a CSV file into a DataFrame with header and schema inference.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path.as_ref())?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()?;

    Ok(df)
}

/// A dense numeric dataset split into features and a binary target.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    features: Array2<f64>,
    target: Array1<f64>,
    feature_names: Vec<String>,
}

impl TabularDataset {
    /// Load a dataset from a CSV file, using `target_column` as the label.
    pub fn from_csv<P: AsRef<Path>>(path: P, target_column: &str) -> Result<Self> {
        let df = read_csv(path)?;
        Self::from_dataframe(&df, target_column)
    }

    /// Build a dataset from an in-memory DataFrame.
    ///
    /// The target column is cast to `Float64` and must contain only 0 and 1.
    /// Every other column becomes a feature, in DataFrame column order.
    pub fn from_dataframe(df: &DataFrame, target_column: &str) -> Result<Self> {
        if df.height() == 0 {
            return Err(TreeTuneError::DataError("dataset is empty".to_string()));
        }

        let target_col = df
            .column(target_column)
            .map_err(|_| TreeTuneError::ColumnNotFound(target_column.to_string()))?;

        let target_f64 = target_col.cast(&DataType::Float64).map_err(|e| {
            TreeTuneError::DataError(format!(
                "target column '{target_column}' is not numeric: {e}"
            ))
        })?;
        let target_ca = target_f64.f64()?;

        let mut target = Vec::with_capacity(df.height());
        for (row, value) in target_ca.into_iter().enumerate() {
            match value {
                Some(v) if v == 0.0 || v == 1.0 => target.push(v),
                Some(v) => {
                    return Err(TreeTuneError::DataError(format!(
                        "target column '{target_column}' must be binary (0/1), found {v} at row {row}"
                    )))
                }
                None => {
                    return Err(TreeTuneError::DataError(format!(
                        "target column '{target_column}' has a missing value at row {row}"
                    )))
                }
            }
        }

        let feature_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.as_str().to_string())
            .filter(|name| name != target_column)
            .collect();

        if feature_names.is_empty() {
            return Err(TreeTuneError::DataError(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }

        // Missing feature cells are filled with 0.0.
        let mut feature_cols: Vec<Vec<f64>> = Vec::with_capacity(feature_names.len());
        for name in &feature_names {
            let col = df
                .column(name)?
                .cast(&DataType::Float64)
                .map_err(|e| {
                    TreeTuneError::DataError(format!("feature column '{name}' is not numeric: {e}"))
                })?;
            let values: Vec<f64> = col.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect();
            feature_cols.push(values);
        }

        let n_rows = df.height();
        let n_cols = feature_names.len();
        let features = Array2::from_shape_fn((n_rows, n_cols), |(r, c)| feature_cols[c][r]);

        Ok(Self {
            features,
            target: Array1::from_vec(target),
            feature_names,
        })
    }

    /// Feature matrix of shape `(n_samples, n_features)`.
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Target vector of length `n_samples`, values in {0, 1}.
    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Feature column names, in matrix column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Count of (negative, positive) samples in the target.
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.target.iter().filter(|&&y| y == 1.0).count();
        (self.target.len() - positives, positives)
    }
}
