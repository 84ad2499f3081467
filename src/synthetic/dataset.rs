//! Container adapter shared by feature and label matrices
//!
//! A [`Dataset`] is either a dense `ndarray` matrix or a polars `DataFrame`.
//! The balancing code only talks to this adapter: numeric view, row
//! sub-selection and row appending are implemented once per backend.

use std::borrow::Cow;
use std::fmt;

use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XrayError};

/// Container family of a [`Dataset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFamily {
    /// Dense row-major array
    Array,
    /// Columnar table
    Table,
}

impl fmt::Display for ContainerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFamily::Array => write!(f, "array"),
            ContainerFamily::Table => write!(f, "table"),
        }
    }
}

/// Feature or label matrix, array-backed or table-backed
#[derive(Debug, Clone)]
pub enum Dataset {
    Array(Array2<f64>),
    Table(DataFrame),
}

impl From<Array2<f64>> for Dataset {
    fn from(array: Array2<f64>) -> Self {
        Dataset::Array(array)
    }
}

impl From<DataFrame> for Dataset {
    fn from(df: DataFrame) -> Self {
        Dataset::Table(df)
    }
}

/// Column types the table backend can read as `f64`
fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
            | DataType::Float32 | DataType::Float64
    )
}

impl Dataset {
    pub fn family(&self) -> ContainerFamily {
        match self {
            Dataset::Array(_) => ContainerFamily::Array,
            Dataset::Table(_) => ContainerFamily::Table,
        }
    }

    /// Whether the container can be used as a numeric matrix.
    ///
    /// Arrays always qualify. Tables qualify only when every column is
    /// numeric or boolean.
    pub fn is_supported(&self) -> bool {
        match self {
            Dataset::Array(_) => true,
            Dataset::Table(df) => df.get_columns().iter().all(|col| is_numeric_dtype(col.dtype())),
        }
    }

    pub fn n_rows(&self) -> usize {
        match self {
            Dataset::Array(a) => a.nrows(),
            Dataset::Table(df) => df.height(),
        }
    }

    pub fn n_cols(&self) -> usize {
        match self {
            Dataset::Array(a) => a.ncols(),
            Dataset::Table(df) => df.width(),
        }
    }

    pub fn as_array(&self) -> Option<&Array2<f64>> {
        match self {
            Dataset::Array(a) => Some(a),
            Dataset::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&DataFrame> {
        match self {
            Dataset::Array(_) => None,
            Dataset::Table(df) => Some(df),
        }
    }

    /// Numeric view of the container. Borrowed for arrays, materialized for tables.
    pub fn to_array(&self) -> Result<Cow<'_, Array2<f64>>> {
        match self {
            Dataset::Array(a) => Ok(Cow::Borrowed(a)),
            Dataset::Table(df) => Ok(Cow::Owned(table_to_array(df)?)),
        }
    }

    /// Rows at `rows`, in that order, in the same container family.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Dataset> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_rows()) {
            return Err(XrayError::ValidationError(format!(
                "row index {} out of bounds for {} rows",
                bad,
                self.n_rows()
            )));
        }

        match self {
            Dataset::Array(a) => Ok(Dataset::Array(a.select(Axis(0), rows))),
            Dataset::Table(df) => {
                let idx: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
                let idx = IdxCa::from_vec("idx".into(), idx);
                Ok(Dataset::Table(df.take(&idx)?))
            }
        }
    }

    /// Append `rows` below the existing rows, keeping the container family.
    ///
    /// Table columns keep their dtype when every new value fits it: any value
    /// for float columns, 0 or 1 for boolean columns, integral values inside
    /// the type's range for integer columns. Otherwise the column is widened
    /// to `Float64`.
    pub fn append_rows(self, rows: &Array2<f64>) -> Result<Dataset> {
        if rows.nrows() == 0 {
            return Ok(self);
        }
        if rows.ncols() != self.n_cols() {
            return Err(XrayError::DataError(format!(
                "cannot append rows with {} columns to a matrix with {} columns",
                rows.ncols(),
                self.n_cols()
            )));
        }

        match self {
            Dataset::Array(a) => Ok(Dataset::Array(concatenate(Axis(0), &[a.view(), rows.view()])?)),
            Dataset::Table(df) => {
                let mut columns = Vec::with_capacity(df.width());
                for (j, col) in df.get_columns().iter().enumerate() {
                    let values = rows.column(j);
                    let appended = Series::new(col.name().clone(), values.to_vec());
                    let fitted = match col.dtype() {
                        DataType::Float32 | DataType::Float64 => Some(appended.cast(col.dtype())?),
                        DataType::Boolean if !values.iter().all(|&v| v == 0.0 || v == 1.0) => None,
                        // strict_cast fails instead of writing nulls for out-of-range values
                        dtype if is_numeric_dtype(dtype) && values.iter().all(|v| v.fract() == 0.0) => {
                            appended.strict_cast(dtype).ok()
                        }
                        _ => None,
                    };

                    let (mut merged, appended) = match fitted {
                        Some(fitted) => (col.as_materialized_series().clone(), fitted),
                        None => (col.as_materialized_series().cast(&DataType::Float64)?, appended),
                    };
                    merged.append(&appended)?;
                    columns.push(Column::from(merged));
                }
                Ok(Dataset::Table(DataFrame::new(columns)?))
            }
        }
    }
}

fn table_to_array(df: &DataFrame) -> Result<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((df.height(), df.width()));
    for (j, col) in df.get_columns().iter().enumerate() {
        if !is_numeric_dtype(col.dtype()) {
            return Err(XrayError::DataError(format!(
                "column '{}' has non-numeric type {:?}",
                col.name(),
                col.dtype()
            )));
        }
        let casted = col.cast(&DataType::Float64)?;
        for (i, value) in casted.as_materialized_series().f64()?.into_iter().enumerate() {
            out[[i, j]] = value.ok_or_else(|| {
                XrayError::DataError(format!("missing value in column '{}' at row {}", col.name(), i))
            })?;
        }
    }
    Ok(out)
}

/// Check that two containers can be processed together.
pub fn ensure_aligned(x: &Dataset, y: &Dataset) -> Result<()> {
    if x.n_rows() != y.n_rows() {
        return Err(XrayError::ShapeMismatch {
            x_rows: x.n_rows(),
            y_rows: y.n_rows(),
        });
    }
    if x.family() != y.family() {
        return Err(XrayError::TypeMismatch {
            x: x.family().to_string(),
            y: y.family().to_string(),
        });
    }
    Ok(())
}
