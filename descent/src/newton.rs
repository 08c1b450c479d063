//! Newton and Newton-CG, globalized by the Wolfe line search.
use crate::{
    IterationStats, NewtonConfig, NewtonDirection, Quantity, SolveError, SolveOutcome,
    TwiceDifferentiable,
    line_search::{check_line_search, search},
    linalg::{cholesky_solve, truncated_cg},
    outcome::History,
    problem::{check_finite, check_len, check_matrix, evaluate, mat_vec},
    vector::{all_finite, dot, norm, step},
};

/// Forcing term used when exact Newton falls back to CG.
const FALLBACK_FORCING: f64 = 0.5;

/// Minimize `f` starting from `x0` with (truncated) Newton directions.
///
/// Same loop as [`crate::gauss_newton`], with the direction coming from
/// `H p = -g` instead of the linearized residual.
pub fn newton<P>(problem: &P, x0: &[f64], config: &NewtonConfig) -> Result<SolveOutcome, SolveError>
where
    P: TwiceDifferentiable + ?Sized,
{
    newton_cb(problem, x0, config, |_| {})
}

/// Like [`newton`], but calls `on_iter` after every outer iteration.
pub fn newton_cb<P, F>(
    problem: &P,
    x0: &[f64],
    config: &NewtonConfig,
    mut on_iter: F,
) -> Result<SolveOutcome, SolveError>
where
    P: TwiceDifferentiable + ?Sized,
    F: FnMut(&IterationStats),
{
    config.validate()?;
    if x0.is_empty() {
        return Err(SolveError::EmptyProblem);
    }
    check_finite(Quantity::Point, x0, 0)?;

    let mut x = x0.to_vec();
    let (mut fx, mut gx) = evaluate(problem, &x, 0)?;
    let mut converged = norm(&gx) <= config.tolerance;
    let mut history = History::with_capacity(config.max_iterations);
    let mut alpha = config.initial_step;
    let mut last_step = config.initial_step;

    let mut iteration = 0;
    while !converged && iteration < config.max_iterations {
        iteration += 1;

        let p = direction(problem, &x, &gx, config.direction, iteration)?;
        let line_search = search(problem, &x, fx, &gx, &p, alpha, &config.line_search)?;
        check_line_search(&line_search, config.step_acceptance, iteration)?;

        x = step(&x, line_search.alpha, &p);
        (fx, gx) = evaluate(problem, &x, iteration)?;
        let gradient_norm = norm(&gx);
        let stats = history.record(iteration, fx, gradient_norm, line_search);
        log::debug!(
            "Newton iteration {iteration}: f = {fx:e}, |g| = {gradient_norm:e}, alpha = {:e}",
            line_search.alpha
        );
        on_iter(&stats);

        last_step = line_search.alpha;
        alpha = config
            .step_restart
            .next_initial_step(config.initial_step, &line_search);
        converged = gradient_norm <= config.tolerance;
    }

    if !converged {
        log::debug!("Newton used all {iteration} iterations without converging");
    }
    Ok(history.finish(x, converged, last_step))
}

/// A descent direction from the Newton system `H p = -g`.
fn direction<P>(
    problem: &P,
    x: &[f64],
    g: &[f64],
    kind: NewtonDirection,
    iteration: usize,
) -> Result<Vec<f64>, SolveError>
where
    P: TwiceDifferentiable + ?Sized,
{
    let n = x.len();
    let p = match kind {
        NewtonDirection::Exact => {
            let hessian = problem.hessian(x);
            check_matrix(Quantity::Hessian, &hessian, (n, n), iteration)?;
            let neg_g: Vec<f64> = g.iter().map(|gi| -gi).collect();
            match cholesky_solve(&hessian, &neg_g) {
                Some(p) => p,
                None => {
                    log::debug!(
                        "Hessian is not positive definite at iteration {iteration}, using truncated CG"
                    );
                    truncated_cg(|d| Ok(mat_vec(&hessian, d)), g, n, FALLBACK_FORCING)?.direction
                }
            }
        }
        NewtonDirection::ConjugateGradient {
            max_iterations,
            forcing,
        } => {
            let hessian_times = |v: &[f64]| -> Result<Vec<f64>, SolveError> {
                let hv = problem.hessian_vector_product(x, v);
                check_len(Quantity::HessianVectorProduct, n, hv.len())?;
                check_finite(Quantity::HessianVectorProduct, &hv, iteration)?;
                Ok(hv)
            };
            let cg = truncated_cg(hessian_times, g, max_iterations.unwrap_or(n), forcing)?;
            if cg.negative_curvature {
                log::debug!(
                    "CG hit non-positive curvature after {} steps at iteration {iteration}",
                    cg.iterations
                );
            }
            cg.direction
        }
    };

    if all_finite(&p) && dot(g, &p) < 0.0 {
        Ok(p)
    } else {
        log::warn!("Newton direction at iteration {iteration} is not a descent direction, using -g");
        Ok(g.iter().map(|gi| -gi).collect())
    }
}

#[cfg(test)]
mod tests {
    use faer::Mat;

    use super::*;
    use crate::{
        FnTwiceDifferentiable, StepRestart,
        test_functions::{Rosenbrock, ShekelFoxholes},
    };

    /// `f(x) = x·Ax / 2 - b·x` with `A = [[4, 1], [1, 3]]`, `b = (1, 2)`.
    fn quadratic()
    -> FnTwiceDifferentiable<impl Fn(&[f64]) -> f64, impl Fn(&[f64]) -> Vec<f64>, impl Fn(&[f64]) -> Mat<f64>>
    {
        let a = [[4.0, 1.0], [1.0, 3.0]];
        let b = [1.0, 2.0];
        let ax = move |x: &[f64]| [a[0][0] * x[0] + a[0][1] * x[1], a[1][0] * x[0] + a[1][1] * x[1]];
        FnTwiceDifferentiable::new(
            move |x: &[f64]| {
                let ax = ax(x);
                0.5 * (x[0] * ax[0] + x[1] * ax[1]) - b[0] * x[0] - b[1] * x[1]
            },
            move |x: &[f64]| {
                let ax = ax(x);
                vec![ax[0] - b[0], ax[1] - b[1]]
            },
            move |_: &[f64]| Mat::from_fn(2, 2, |i, j| a[i][j]),
        )
    }

    #[test]
    fn quadratic_in_one_step() {
        let config = NewtonConfig::default().with_tolerance(1e-9);
        let outcome = newton(&quadratic(), &[5.0, 5.0], &config).unwrap();
        assert_eq!(outcome.iterations(), 1);
        assert!(outcome.converged());
        // A⁻¹ b = (1/11, 7/11)
        let x = outcome.final_point();
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
        assert_eq!(outcome.final_step_length(), 1.0);
    }

    #[test]
    fn rosenbrock_from_the_classic_start() {
        let config = NewtonConfig::default()
            .with_max_iterations(200)
            .with_tolerance(1e-8);
        let outcome = newton(&Rosenbrock, &[-1.2, 1.0], &config).unwrap();
        assert!(outcome.converged(), "{outcome:?}");
        for xi in outcome.final_point() {
            assert!((xi - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn newton_cg_on_rosenbrock() {
        let config = NewtonConfig::conjugate_gradient()
            .with_max_iterations(200)
            .with_tolerance(1e-8);
        let outcome = newton(&Rosenbrock, &[-1.2, 1.0, 1.0], &config).unwrap();
        assert!(outcome.converged(), "{outcome:?}");
        for xi in outcome.final_point() {
            assert!((xi - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn exact_newton_in_the_deepest_foxhole() {
        let shekel = ShekelFoxholes::planar();
        let outcome = newton(&shekel, &[4.1, 3.95], &NewtonConfig::default()).unwrap();
        assert!(outcome.converged());
        let x = outcome.final_point();
        assert!((x[0] - 4.0).abs() < 0.05 && (x[1] - 4.0).abs() < 0.05, "{x:?}");
        assert!(outcome.final_objective().unwrap() < -10.0);
    }

    #[test]
    fn indefinite_start_falls_back_and_still_converges() {
        // At this distance from (4, 4) the Hessian has a negative eigenvalue.
        let shekel = ShekelFoxholes::planar();
        let start = [4.3, 4.2];
        let h = shekel.hessian(&start);
        assert!(cholesky_solve(&h, &[1.0, 1.0]).is_none());

        for config in [NewtonConfig::default(), NewtonConfig::conjugate_gradient()] {
            let outcome = newton(&shekel, &start, &config).unwrap();
            assert!(outcome.converged(), "{config:?}: {outcome:?}");
            let x = outcome.final_point();
            assert!((x[0] - 4.0).abs() < 0.05 && (x[1] - 4.0).abs() < 0.05, "{x:?}");
        }
    }

    #[test]
    fn callback_sees_every_iteration() {
        let mut steps = Vec::new();
        let config = NewtonConfig::default()
            .with_max_iterations(5)
            .with_step_restart(StepRestart::WarmStart);
        let outcome = newton_cb(&Rosenbrock, &[-1.2, 1.0], &config, |stats| {
            steps.push(stats.step_length);
        })
        .unwrap();
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|&alpha| alpha > 0.0));
        assert_eq!(outcome.iterations(), 5);
        assert!(!outcome.converged());
    }

    #[test]
    fn hessian_shape_is_checked() {
        let bad = FnTwiceDifferentiable::new(
            |x: &[f64]| x[0] * x[0],
            |x: &[f64]| vec![2.0 * x[0]],
            |_: &[f64]| Mat::zeros(2, 2),
        );
        assert!(matches!(
            newton(&bad, &[1.0], &NewtonConfig::default()),
            Err(SolveError::MatrixShape {
                quantity: Quantity::Hessian,
                expected: (1, 1),
                actual: (2, 2)
            })
        ));
    }

    #[test]
    fn cg_reports_a_misshapen_hessian() {
        let bad = FnTwiceDifferentiable::new(
            |x: &[f64]| x[0] * x[0],
            |x: &[f64]| vec![2.0 * x[0]],
            |_: &[f64]| Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 }),
        );
        assert!(matches!(
            newton(&bad, &[1.0], &NewtonConfig::conjugate_gradient()),
            Err(SolveError::DimensionMismatch {
                quantity: Quantity::HessianVectorProduct,
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn bad_hessian_vector_product_is_an_error() {
        let bad = FnTwiceDifferentiable::new(
            |x: &[f64]| x[0] * x[0],
            |x: &[f64]| vec![2.0 * x[0]],
            |_: &[f64]| Mat::from_fn(1, 1, |_, _| f64::NAN),
        );
        let config = NewtonConfig::conjugate_gradient();
        assert!(matches!(
            newton(&bad, &[1.0], &config),
            Err(SolveError::NonFinite {
                quantity: Quantity::HessianVectorProduct,
                iteration: 1
            })
        ));
    }
}
