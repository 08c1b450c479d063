//! Small synthetic problems with known minimizers, for tests and benchmarks.
//!
//! Every function carries its parameters as fields, so one instance can be shared
//! by any number of solves.
use faer::Mat;

use crate::{
    LeastSquares, Objective, Quantity, SolveError, TwiceDifferentiable,
    vector::{dot, norm_squared},
};

/// `f(x) = ||x||² + ||x||⁴`, written as least squares with `r(x) = [x; ||x||²]`
/// and `J(x) = [I; 2xᵀ]`. The unique minimizer is the origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormQuartic;

impl Objective for NormQuartic {
    fn value(&self, x: &[f64]) -> f64 {
        let s = norm_squared(x);
        s + s * s
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        let scale = 2.0 + 4.0 * norm_squared(x);
        x.iter().map(|xi| scale * xi).collect()
    }
}

impl LeastSquares for NormQuartic {
    fn residual(&self, x: &[f64]) -> Vec<f64> {
        let mut r = x.to_vec();
        r.push(norm_squared(x));
        r
    }

    fn jacobian(&self, x: &[f64]) -> Mat<f64> {
        let n = x.len();
        Mat::from_fn(n + 1, n, |row, col| {
            if row == n {
                2.0 * x[col]
            } else if row == col {
                1.0
            } else {
                0.0
            }
        })
    }
}

impl TwiceDifferentiable for NormQuartic {
    fn hessian(&self, x: &[f64]) -> Mat<f64> {
        let diagonal = 2.0 + 4.0 * norm_squared(x);
        Mat::from_fn(x.len(), x.len(), |i, j| {
            let outer = 8.0 * x[i] * x[j];
            if i == j { diagonal + outer } else { outer }
        })
    }

    fn hessian_vector_product(&self, x: &[f64], v: &[f64]) -> Vec<f64> {
        let diagonal = 2.0 + 4.0 * norm_squared(x);
        let xv = 8.0 * dot(x, v);
        x.iter().zip(v).map(|(xi, vi)| diagonal * vi + xv * xi).collect()
    }
}

/// `r(x) = x`, so `f(x) = ||x||²` with identity Jacobian.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearResidual;

impl Objective for LinearResidual {
    fn value(&self, x: &[f64]) -> f64 {
        norm_squared(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|xi| 2.0 * xi).collect()
    }
}

impl LeastSquares for LinearResidual {
    fn residual(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }

    fn jacobian(&self, x: &[f64]) -> Mat<f64> {
        Mat::from_fn(x.len(), x.len(), |i, j| if i == j { 1.0 } else { 0.0 })
    }
}

impl TwiceDifferentiable for LinearResidual {
    fn hessian(&self, x: &[f64]) -> Mat<f64> {
        Mat::from_fn(x.len(), x.len(), |i, j| if i == j { 2.0 } else { 0.0 })
    }

    fn hessian_vector_product(&self, _x: &[f64], v: &[f64]) -> Vec<f64> {
        v.iter().map(|vi| 2.0 * vi).collect()
    }
}

/// The extended Rosenbrock function
/// `f(x) = sum_i 100 (x[i+1] - x[i]²)² + (1 - x[i])²`,
/// minimized at `x = (1, ..., 1)`.
///
/// As least squares, each `i` contributes the residuals `10 (x[i+1] - x[i]²)` and `1 - x[i]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rosenbrock;

impl Objective for Rosenbrock {
    fn value(&self, x: &[f64]) -> f64 {
        x.windows(2)
            .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
            .sum()
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        let mut g = vec![0.0; x.len()];
        for i in 0..x.len().saturating_sub(1) {
            let valley = x[i + 1] - x[i] * x[i];
            g[i] += -400.0 * x[i] * valley - 2.0 * (1.0 - x[i]);
            g[i + 1] += 200.0 * valley;
        }
        g
    }
}

impl LeastSquares for Rosenbrock {
    fn residual(&self, x: &[f64]) -> Vec<f64> {
        x.windows(2)
            .flat_map(|w| [10.0 * (w[1] - w[0] * w[0]), 1.0 - w[0]])
            .collect()
    }

    fn jacobian(&self, x: &[f64]) -> Mat<f64> {
        let n = x.len();
        let mut j = Mat::zeros(2 * n.saturating_sub(1), n);
        for i in 0..n.saturating_sub(1) {
            j[(2 * i, i)] = -20.0 * x[i];
            j[(2 * i, i + 1)] = 10.0;
            j[(2 * i + 1, i)] = -1.0;
        }
        j
    }
}

impl TwiceDifferentiable for Rosenbrock {
    fn hessian(&self, x: &[f64]) -> Mat<f64> {
        let n = x.len();
        let mut h = Mat::zeros(n, n);
        for i in 0..n.saturating_sub(1) {
            h[(i, i)] += 1200.0 * x[i] * x[i] - 400.0 * x[i + 1] + 2.0;
            h[(i + 1, i + 1)] += 200.0;
            h[(i, i + 1)] = -400.0 * x[i];
            h[(i + 1, i)] = -400.0 * x[i];
        }
        h
    }
}

/// Shekel's foxholes, `f(x) = -sum_j 1 / (c[j] + ||x - a[j]||²)`.
/// Each center `a[j]` is a local minimum well of depth about `1 / c[j]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShekelFoxholes {
    centers: Vec<Vec<f64>>,
    widths: Vec<f64>,
}

impl ShekelFoxholes {
    /// Foxholes at `centers` with the given `widths` (the `c[j]`).
    /// Widths should be positive, or the function has poles.
    pub fn new(centers: Vec<Vec<f64>>, widths: Vec<f64>) -> Result<Self, SolveError> {
        if centers.is_empty() {
            return Err(SolveError::EmptyProblem);
        }
        if widths.len() != centers.len() {
            return Err(SolveError::DimensionMismatch {
                quantity: Quantity::Parameters,
                expected: centers.len(),
                actual: widths.len(),
            });
        }
        let dimension = centers[0].len();
        if let Some(bad) = centers.iter().find(|c| c.len() != dimension) {
            return Err(SolveError::DimensionMismatch {
                quantity: Quantity::Parameters,
                expected: dimension,
                actual: bad.len(),
            });
        }
        if widths.iter().chain(centers.iter().flatten()).any(|v| !v.is_finite()) {
            return Err(SolveError::NonFinite {
                quantity: Quantity::Parameters,
                iteration: 0,
            });
        }
        Ok(Self { centers, widths })
    }

    /// Five foxholes in the plane, the deepest at (4, 4).
    pub fn planar() -> Self {
        Self {
            centers: vec![
                vec![4.0, 4.0],
                vec![1.0, 1.0],
                vec![8.0, 8.0],
                vec![6.0, 6.0],
                vec![3.0, 7.0],
            ],
            widths: vec![0.1, 0.2, 0.2, 0.4, 0.4],
        }
    }

    /// Number of variables.
    pub fn dimension(&self) -> usize {
        self.centers[0].len()
    }

    /// The foxhole centers.
    pub fn centers(&self) -> &[Vec<f64>] {
        &self.centers
    }

    /// `(x - a[j], c[j] + ||x - a[j]||²)` for each foxhole.
    fn offsets<'a>(&'a self, x: &'a [f64]) -> impl Iterator<Item = (Vec<f64>, f64)> + 'a {
        self.centers.iter().zip(&self.widths).map(move |(center, &width)| {
            let offset: Vec<f64> = x.iter().zip(center).map(|(xi, ai)| xi - ai).collect();
            let denominator = width + norm_squared(&offset);
            (offset, denominator)
        })
    }
}

impl Objective for ShekelFoxholes {
    fn value(&self, x: &[f64]) -> f64 {
        -self.offsets(x).map(|(_, d)| 1.0 / d).sum::<f64>()
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        let mut g = vec![0.0; self.dimension()];
        for (offset, d) in self.offsets(x) {
            let scale = 2.0 / (d * d);
            for (gi, oi) in g.iter_mut().zip(&offset) {
                *gi += scale * oi;
            }
        }
        g
    }
}

impl TwiceDifferentiable for ShekelFoxholes {
    fn hessian(&self, x: &[f64]) -> Mat<f64> {
        let n = self.dimension();
        let mut h = Mat::zeros(n, n);
        for (offset, d) in self.offsets(x) {
            let diagonal = 2.0 / (d * d);
            let outer = 8.0 / (d * d * d);
            for i in 0..n {
                for j in 0..n {
                    h[(i, j)] -= outer * offset[i] * offset[j];
                }
                h[(i, i)] += diagonal;
            }
        }
        h
    }

    fn hessian_vector_product(&self, x: &[f64], v: &[f64]) -> Vec<f64> {
        let mut hv = vec![0.0; self.dimension()];
        for (offset, d) in self.offsets(x) {
            let diagonal = 2.0 / (d * d);
            let projected = 8.0 / (d * d * d) * dot(&offset, v);
            for ((out, vi), oi) in hv.iter_mut().zip(v).zip(&offset) {
                *out += diagonal * vi - projected * oi;
            }
        }
        hv
    }
}
