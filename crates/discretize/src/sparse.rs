//! Sparse operator assembly.
//!
//! Operators are assembled from triplets and stored in CSR form, which gives
//! cheap matrix-vector products during residual evaluation.

use nalgebra::DVector;
use nalgebra_sparse::{coo::CooMatrix, csr::CsrMatrix};

use crate::DiscretizationError;

/// Builder for a sparse matrix from `(row, col, value)` triplets.
///
/// Duplicate entries are summed on conversion.
pub(crate) struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    pub(crate) fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    pub(crate) fn to_csr(self) -> Result<CsrMatrix<f64>, DiscretizationError> {
        let coo = CooMatrix::try_from_triplets(
            self.n_rows,
            self.n_cols,
            self.rows,
            self.cols,
            self.values,
        )
        .map_err(|err| DiscretizationError::Sparse(err.to_string()))?;
        Ok(CsrMatrix::from(&coo))
    }
}

/// Computes `a * x`.
pub(crate) fn matvec(a: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        a.nrows(),
        a.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&j, &v)| v * x[j])
                .sum::<f64>()
        }),
    )
}

/// Builds the block-diagonal `I_m ⊗ a`, one copy of `a` per secondary point.
pub(crate) fn block_diagonal(
    blocks: usize,
    a: &CsrMatrix<f64>,
) -> Result<CsrMatrix<f64>, DiscretizationError> {
    if blocks == 1 {
        return Ok(a.clone());
    }
    let (rows, cols) = (a.nrows(), a.ncols());
    let mut triplets = TripletMatrix::new(blocks * rows, blocks * cols);
    for block in 0..blocks {
        for (i, j, &v) in a.triplet_iter() {
            triplets.add(block * rows + i, block * cols + j, v);
        }
    }
    triplets.to_csr()
}

/// A `rows x 1` column of ones.
pub(crate) fn ones_column(rows: usize) -> Result<CsrMatrix<f64>, DiscretizationError> {
    let mut triplets = TripletMatrix::new(rows, 1);
    for i in 0..rows {
        triplets.add(i, 0, 1.0);
    }
    triplets.to_csr()
}

/// Selects `count` consecutive entries starting at `offset` from each block
/// of `block_len` entries.
pub(crate) fn selection(
    blocks: usize,
    block_len: usize,
    offset: usize,
    count: usize,
) -> Result<CsrMatrix<f64>, DiscretizationError> {
    let mut triplets = TripletMatrix::new(blocks * count, blocks * block_len);
    for block in 0..blocks {
        for k in 0..count {
            triplets.add(block * count + k, block * block_len + offset + k, 1.0);
        }
    }
    triplets.to_csr()
}
