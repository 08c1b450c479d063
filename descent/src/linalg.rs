//! Dense linear algebra behind the search directions.
use faer::{Mat, Side, linalg::svd::SvdError, prelude::Solve};

use crate::{
    SolveError,
    vector::{dot, norm},
};

/// Minimum-norm least-squares solution of `min ||A x - b||`.
#[derive(Debug)]
pub(crate) struct LeastSquaresSolution {
    pub x: Vec<f64>,
    /// Numerical rank of `A`. Zero means `x` is meaningless.
    pub rank: usize,
}

/// Solve `min ||A x - b||` through the SVD `A = UΣVᵀ`, so that over- and
/// under-determined or rank-deficient `A` all work without forming `AᵀA`.
/// Singular values below the rank cutoff are treated as zero, which picks the
/// minimum-norm solution among all minimizers.
pub(crate) fn min_norm_least_squares(
    a: &Mat<f64>,
    b: &[f64],
) -> Result<LeastSquaresSolution, SvdError> {
    let (m, n) = (a.nrows(), a.ncols());
    debug_assert_eq!(m, b.len(), "right-hand side must have one entry per row");
    if m == 0 || n == 0 {
        return Ok(LeastSquaresSolution {
            x: vec![0.0; n],
            rank: 0,
        });
    }

    let svd = a.svd()?;
    let sigma = svd.S().column_vector();
    let u = svd.U();
    let v = svd.V();

    // LAPACK's rank cutoff: machine epsilon, scaled by the matrix size
    // and the largest singular value.
    let largest = sigma.iter().copied().fold(0.0, libm::fmax);
    let cutoff = f64::EPSILON * (m.max(n) as f64) * largest;

    let mut x = vec![0.0; n];
    let mut rank = 0;
    for (k, &s) in sigma.iter().enumerate() {
        if s.is_nan() || s <= cutoff {
            continue;
        }
        rank += 1;
        // Component of b along the k-th left singular vector, over sigma_k.
        let coeff = (0..m).map(|i| u[(i, k)] * b[i]).sum::<f64>() / s;
        for (j, xj) in x.iter_mut().enumerate() {
            *xj += v[(j, k)] * coeff;
        }
    }
    Ok(LeastSquaresSolution { x, rank })
}

/// Solve `A x = b` for symmetric positive definite `A`.
/// Returns `None` if the Cholesky factorization breaks down, i.e. `A` isn't
/// numerically positive definite.
pub(crate) fn cholesky_solve(a: &Mat<f64>, b: &[f64]) -> Option<Vec<f64>> {
    let llt = a.llt(Side::Lower).ok()?;
    let rhs = Mat::from_fn(b.len(), 1, |i, _| b[i]);
    let solution = llt.solve(rhs.as_ref());
    let x: Vec<f64> = (0..b.len()).map(|i| solution[(i, 0)]).collect();
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Result of a truncated CG run.
#[derive(Debug)]
pub(crate) struct CgSolution {
    pub direction: Vec<f64>,
    pub iterations: usize,
    /// CG stopped because it found a direction of non-positive curvature.
    pub negative_curvature: bool,
}

/// Truncated conjugate gradient on `H p = -g`, using only products with `H`.
///
/// Stops when the residual is below `min(forcing, sqrt(|g|)) * |g|`, after
/// `max_iterations` steps, or when some search direction `d` has `dᵀHd <= 0`.
/// In the last case the iterate so far is returned, or `-g` if there isn't one yet.
pub(crate) fn truncated_cg<Hv>(
    mut hessian_times: Hv,
    g: &[f64],
    max_iterations: usize,
    forcing: f64,
) -> Result<CgSolution, SolveError>
where
    Hv: FnMut(&[f64]) -> Result<Vec<f64>, SolveError>,
{
    let n = g.len();
    let g_norm = norm(g);
    let tolerance = libm::fmin(forcing, g_norm.sqrt()) * g_norm;
    let steepest_descent = || g.iter().map(|gi| -gi).collect::<Vec<_>>();

    let mut z = vec![0.0; n];
    let mut r = g.to_vec();
    let mut d = steepest_descent();
    let mut r_dot_r = dot(&r, &r);

    for iteration in 0..max_iterations {
        let hd = hessian_times(&d)?;
        let curvature = dot(&d, &hd);
        if curvature <= 0.0 || !curvature.is_finite() {
            let direction = if iteration == 0 { steepest_descent() } else { z };
            return Ok(CgSolution {
                direction,
                iterations: iteration,
                negative_curvature: true,
            });
        }

        let step = r_dot_r / curvature;
        for ((zi, ri), (di, hdi)) in z.iter_mut().zip(r.iter_mut()).zip(d.iter().zip(&hd)) {
            *zi += step * di;
            *ri += step * hdi;
        }

        let next_r_dot_r = dot(&r, &r);
        if next_r_dot_r.sqrt() < tolerance {
            return Ok(CgSolution {
                direction: z,
                iterations: iteration + 1,
                negative_curvature: false,
            });
        }
        let beta = next_r_dot_r / r_dot_r;
        for (di, ri) in d.iter_mut().zip(&r) {
            *di = -ri + beta * *di;
        }
        r_dot_r = next_r_dot_r;
    }

    // Either the cap was hit or there were no iterations at all.
    let direction = if z.iter().all(|&v| v == 0.0) {
        steepest_descent()
    } else {
        z
    };
    Ok(CgSolution {
        direction,
        iterations: max_iterations,
        negative_curvature: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::mat_vec;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn overdetermined_least_squares() {
        // x + y = 3, x - y = 1, 2x + y = 5 has the exact solution (2, 1).
        let a = Mat::from_fn(3, 2, |i, j| [[1.0, 1.0], [1.0, -1.0], [2.0, 1.0]][i][j]);
        let solved = min_norm_least_squares(&a, &[3.0, 1.0, 5.0]).unwrap();
        assert_eq!(solved.rank, 2);
        assert_close(&solved.x, &[2.0, 1.0], 1e-12);
    }

    #[test]
    fn rank_deficient_picks_minimum_norm() {
        // Both columns are the same, so only x + y is determined.
        // The minimum-norm choice splits it evenly.
        let a = Mat::from_fn(2, 2, |_, _| 1.0);
        let solved = min_norm_least_squares(&a, &[2.0, 2.0]).unwrap();
        assert_eq!(solved.rank, 1);
        assert_close(&solved.x, &[1.0, 1.0], 1e-12);
    }

    #[test]
    fn underdetermined_least_squares() {
        // One equation, three unknowns: x + 2y + 2z = 9.
        let a = Mat::from_fn(1, 3, |_, j| [1.0, 2.0, 2.0][j]);
        let solved = min_norm_least_squares(&a, &[9.0]).unwrap();
        assert_eq!(solved.rank, 1);
        assert_close(&solved.x, &[1.0, 2.0, 2.0], 1e-12);
    }

    #[test]
    fn zero_matrix_has_rank_zero() {
        let a = Mat::<f64>::zeros(3, 2);
        let solved = min_norm_least_squares(&a, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(solved.rank, 0);
        assert_eq!(solved.x, vec![0.0, 0.0]);
    }

    #[test]
    fn cholesky_needs_positive_definite() {
        let spd = Mat::from_fn(2, 2, |i, j| [[4.0, 1.0], [1.0, 3.0]][i][j]);
        let x = cholesky_solve(&spd, &[1.0, 2.0]).unwrap();
        assert_close(&mat_vec(&spd, &x), &[1.0, 2.0], 1e-12);

        let indefinite = Mat::from_fn(2, 2, |i, j| [[1.0, 0.0], [0.0, -1.0]][i][j]);
        assert!(cholesky_solve(&indefinite, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn cg_solves_spd_system() {
        let h = Mat::from_fn(3, 3, |i, j| [[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]][i][j]);
        let g = [1.0, -2.0, 0.5];
        // Small forcing, so CG runs to completion, which takes at most n steps.
        let solved = truncated_cg(|d| Ok(mat_vec(&h, d)), &g, 10, 1e-10).unwrap();
        assert!(!solved.negative_curvature);
        assert!(solved.iterations <= 3);
        let hp = mat_vec(&h, &solved.direction);
        assert_close(&hp, &[-1.0, 2.0, -0.5], 1e-9);
    }

    #[test]
    fn cg_returns_steepest_descent_on_negative_curvature() {
        let h = Mat::from_fn(2, 2, |i, j| if i == j { -1.0 } else { 0.0 });
        let g = [1.0, 2.0];
        let solved = truncated_cg(|d| Ok(mat_vec(&h, d)), &g, 10, 0.5).unwrap();
        assert!(solved.negative_curvature);
        assert_eq!(solved.iterations, 0);
        assert_eq!(solved.direction, vec![-1.0, -2.0]);
    }
}
