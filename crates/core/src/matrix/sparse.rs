//! Thin helpers over `nalgebra_sparse`, shared by every matrix builder and
//! algorithm in this crate.

use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};
use std::collections::HashMap;

/// The sparse matrix type every `MatrixBuilder` output is expressed in.
pub type Sparse = CsrMatrix<f64>;

/// Finalize a triplet accumulator into CSR, summing duplicate entries.
pub fn coo_to_csr(coo: CooMatrix<f64>) -> Sparse {
    CsrMatrix::from(&coo)
}

/// Row sums (weighted out-degree per row).
pub fn row_sums(m: &Sparse) -> Vec<f64> {
    let mut sums = vec![0.0; m.nrows()];
    for (r, _c, v) in m.triplet_iter() {
        sums[r] += v;
    }
    sums
}

/// Column sums (weighted in-degree per column).
pub fn col_sums(m: &Sparse) -> Vec<f64> {
    let mut sums = vec![0.0; m.ncols()];
    for (_r, c, v) in m.triplet_iter() {
        sums[c] += v;
    }
    sums
}

/// Sum of every stored entry.
pub fn total_sum(m: &Sparse) -> f64 {
    m.triplet_iter().map(|(_, _, v)| v).sum()
}

/// Whether `m` equals its own transpose within `tol`, entrywise.
///
/// Used by Scenario F / invariant 8: supra-adjacency with no coupling must
/// be symmetric iff every layer is undirected.
pub fn is_symmetric(m: &Sparse, tol: f64) -> bool {
    let mut entries: HashMap<(usize, usize), f64> = HashMap::new();
    for (r, c, v) in m.triplet_iter() {
        *entries.entry((r, c)).or_insert(0.0) += v;
    }
    entries
        .iter()
        .all(|(&(r, c), &v)| (v - entries.get(&(c, r)).copied().unwrap_or(0.0)).abs() <= tol)
}

/// Divide each column by its sum, turning an adjacency matrix into a
/// column-stochastic random-walk transition matrix. Zero-sum columns are
/// replaced by a uniform distribution over all rows (LART/ACL edge case:
/// "duplicate rows ... must not produce NaNs").
pub fn normalize_columns(m: &Sparse) -> Sparse {
    let n = m.nrows();
    let sums = col_sums(m);
    let mut coo = CooMatrix::new(m.nrows(), m.ncols());
    for (r, c, v) in m.triplet_iter() {
        let s = sums[c];
        if s > 0.0 {
            coo.push(r, c, v / s);
        }
    }
    for (c, &s) in sums.iter().enumerate() {
        if s == 0.0 {
            let uniform = 1.0 / n as f64;
            for r in 0..n {
                coo.push(r, c, uniform);
            }
        }
    }
    coo_to_csr(coo)
}

/// Dense sparse-matrix * dense-vector product.
pub fn matvec(m: &Sparse, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; m.nrows()];
    for (r, c, v) in m.triplet_iter() {
        y[r] += v * x[c];
    }
    y
}

/// Dense vector * sparse matrix product (row vector times matrix).
pub fn vecmat(x: &[f64], m: &Sparse) -> Vec<f64> {
    let mut y = vec![0.0; m.ncols()];
    for (r, c, v) in m.triplet_iter() {
        y[c] += x[r] * v;
    }
    y
}

/// CSC view of `m`, for algorithms that need fast column access (ACL's
/// sweep cut needs both CSR and CSC views of `P`, §4.6).
pub fn to_csc(m: &Sparse) -> CscMatrix<f64> {
    CscMatrix::from(m)
}
