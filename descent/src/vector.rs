//! Dense vector helpers over plain `f64` slices.

#[inline(always)]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dot product of vectors with different lengths");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline(always)]
pub(crate) fn norm_squared(a: &[f64]) -> f64 {
    dot(a, a)
}

/// Euclidean norm.
#[inline(always)]
pub(crate) fn norm(a: &[f64]) -> f64 {
    norm_squared(a).sqrt()
}

/// Builds the new point `x + alpha * p`. The old point is left untouched.
#[inline]
pub(crate) fn step(x: &[f64], alpha: f64, p: &[f64]) -> Vec<f64> {
    x.iter().zip(p).map(|(xi, pi)| xi + alpha * pi).collect()
}

/// Writes `x + alpha * p` into `out`, reusing its allocation.
#[inline]
pub(crate) fn step_into(x: &[f64], alpha: f64, p: &[f64], out: &mut Vec<f64>) {
    out.clear();
    out.extend(x.iter().zip(p).map(|(xi, pi)| xi + alpha * pi));
}

pub(crate) fn all_finite(a: &[f64]) -> bool {
    a.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_does_not_mutate() {
        let x = vec![1.0, 2.0];
        let p = vec![-1.0, 0.5];
        let z = step(&x, 2.0, &p);
        assert_eq!(z, vec![-1.0, 3.0]);
        assert_eq!(x, vec![1.0, 2.0]);

        let mut out = Vec::with_capacity(2);
        step_into(&x, 0.5, &p, &mut out);
        assert_eq!(out, vec![0.5, 2.25]);
    }

    #[test]
    fn norms() {
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
        assert_eq!(norm_squared(&[1.0, 2.0, 2.0]), 9.0);
        assert_eq!(dot(&[1.0, -1.0], &[2.0, 2.0]), 0.0);
        assert!(!all_finite(&[1.0, f64::NAN]));
        assert!(all_finite(&[]));
    }
}
