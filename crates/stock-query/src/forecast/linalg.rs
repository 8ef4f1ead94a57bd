//! Dense least squares for the model estimator

use crate::error::{Result, StockQueryError};

/// Relative ridge added to the normal equations' diagonal
const RIDGE: f64 = 1e-6;
/// Pivots below this fraction of the largest entry count as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Least-squares coefficients `b` minimising `|X b - y|`
///
/// Solves the normal equations `(XᵀX + λI) b = Xᵀy` with a small ridge
/// `λ` proportional to the mean diagonal of `XᵀX`, which keeps nearly
/// collinear designs solvable. Every row of `design` must have the same
/// length.
pub fn least_squares(design: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>> {
    let k = design.first().map_or(0, Vec::len);
    if k == 0 || design.len() != targets.len() {
        return Err(StockQueryError::ModelFit(
            "empty or mismatched regression design".to_string(),
        ));
    }

    let mut gram = vec![vec![0.0; k]; k];
    let mut moment = vec![0.0; k];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..k {
            moment[i] += row[i] * y;
            for j in i..k {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    let mean_diagonal = (0..k).map(|i| gram[i][i]).sum::<f64>() / k as f64;
    if !(mean_diagonal.is_finite() && mean_diagonal > 0.0) {
        return Err(StockQueryError::ModelFit(
            "regression design has no variation".to_string(),
        ));
    }
    let ridge = RIDGE * mean_diagonal;
    for (i, row) in gram.iter_mut().enumerate() {
        row[i] += ridge;
    }

    solve(gram, moment)
}

/// Solve the square system `a x = b` by Gaussian elimination with partial pivoting
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(StockQueryError::ModelFit("system is not square".to_string()));
    }

    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = PIVOT_TOLERANCE * scale;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        if !(a[pivot][col].abs() > tolerance) {
            return Err(StockQueryError::ModelFit(
                "singular system in coefficient estimation".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(StockQueryError::ModelFit(
            "coefficient estimates are not finite".to_string(),
        ))
    }
}
