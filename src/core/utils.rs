//! Small matrix helpers for the single-qubit density-matrix backend.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Computes the trace of a matrix (sum of diagonal elements).
pub fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    matrix.diag().sum()
}

/// Conjugate transpose $M^\dagger$.
pub fn dagger(matrix: &Array2<Complex64>) -> Array2<Complex64> {
    matrix.t().mapv(|c| c.conj())
}

/// Computes the outer product of two vectors $|a\rangle\langle b|$.
pub fn outer_product(a: &Array1<Complex64>, b: &Array1<Complex64>) -> Array2<Complex64> {
    let n = a.len();
    let m = b.len();
    let mut res = Array2::zeros((n, m));

    for i in 0..n {
        for j in 0..m {
            res[[i, j]] = a[i] * b[j].conj();
        }
    }
    res
}

/// Checks $U U^\dagger = I$ within `tol`.
pub fn is_unitary(matrix: &Array2<Complex64>, tol: f64) -> bool {
    let (rows, _) = matrix.dim();
    let eye = Array2::<Complex64>::eye(rows);
    let product = matrix.dot(&dagger(matrix));

    product
        .iter()
        .zip(eye.iter())
        .all(|(a, b)| (*a - *b).norm() < tol)
}

/// Checks completeness $\sum_k P_k^\dagger P_k = I$ of projective measurement operators.
pub fn check_completeness(ops: &[Array2<Complex64>], dim: usize) -> bool {
    let eye = Array2::<Complex64>::eye(dim);
    let sum = ops
        .iter()
        .fold(Array2::<Complex64>::zeros((dim, dim)), |acc, op| {
            acc + dagger(op).dot(op)
        });
    sum.iter()
        .zip(eye.iter())
        .all(|(a, b)| (a - b).norm() < 1e-9)
}
