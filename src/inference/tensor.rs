//! Tensor containers passed across the engine boundary.

use crate::constants::DETECTION_ROW_MIN_COLS;
use crate::error::{Error, Result};

/// Normalized image ready for the engine: `[1, 3, size, size]`, values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct InputTensor {
    /// Name of the model input this tensor is bound to.
    pub name: String,
    /// Shape in NCHW order.
    pub shape: [usize; 4],
    /// Row-major tensor data.
    pub data: Vec<f32>,
}

/// Raw detection table returned by the engine, one row per candidate.
///
/// Each row holds at least `[center_x, center_y, width, height, confidence, class_id]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl RawOutput {
    /// Build a table from explicit rows.
    ///
    /// Rows shorter than the widest row are rejected.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(DETECTION_ROW_MIN_COLS);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(Error::UnusableOutput {
                reason: "rows have differing lengths".to_string(),
            });
        }
        let data = rows.iter().flatten().copied().collect();
        Self::new(rows.len(), cols, data)
    }

    /// Build a table from an engine tensor shape and its flat data.
    ///
    /// Leading batch dimensions of size 1 are dropped, so `[1, N, C]` and
    /// `[N, C]` are both accepted.
    pub fn from_shape(dims: &[i64], data: &[f32]) -> Result<Self> {
        let mut dims = dims;
        while dims.len() > 2 && dims[0] == 1 {
            dims = &dims[1..];
        }

        let [rows, cols] = dims else {
            return Err(Error::UnusableOutput {
                reason: format!("expected a 2D detection table, got shape {dims:?}"),
            });
        };

        let to_usize = |d: i64| {
            usize::try_from(d).map_err(|_| Error::UnusableOutput {
                reason: format!("negative dimension in shape {dims:?}"),
            })
        };

        Self::new(to_usize(*rows)?, to_usize(*cols)?, data.to_vec())
    }

    fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::UnusableOutput {
                reason: format!(
                    "shape {rows}x{cols} does not match {} elements",
                    data.len()
                ),
            });
        }

        if rows > 0 && cols < DETECTION_ROW_MIN_COLS {
            return Err(Error::UnusableOutput {
                reason: format!(
                    "detection rows need at least {DETECTION_ROW_MIN_COLS} columns, got {cols}"
                ),
            });
        }

        Ok(Self { rows, cols, data })
    }

    /// An output with no candidate rows.
    pub const fn empty() -> Self {
        Self {
            rows: 0,
            cols: DETECTION_ROW_MIN_COLS,
            data: Vec::new(),
        }
    }

    /// Number of candidate rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns per row.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Iterate over rows in tensor order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0; an empty table has no data anyway
        self.data.chunks_exact(self.cols.max(1))
    }
}
