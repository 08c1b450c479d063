//! Gauss-Newton for nonlinear least squares, globalized by the Wolfe line search.
use crate::{
    Config, IterationStats, LeastSquares, Quantity, SolveError, SolveOutcome,
    line_search::{check_line_search, search},
    linalg::min_norm_least_squares,
    outcome::History,
    problem::{check_finite, check_len, check_matrix, evaluate},
    vector::{norm, step},
};

/// Minimize `f(x) = ||r(x)||²` starting from `x0`.
///
/// Each iteration solves the linearized problem `min ||J(x) p + r(x)||` for the
/// direction, line searches along it, and moves to `x + alpha p`. Stops once the
/// gradient norm is at most `config.tolerance`, or after `config.max_iterations`
/// iterations, whichever comes first.
pub fn gauss_newton<P>(problem: &P, x0: &[f64], config: &Config) -> Result<SolveOutcome, SolveError>
where
    P: LeastSquares + ?Sized,
{
    gauss_newton_cb(problem, x0, config, |_| {})
}

/// Like [`gauss_newton`], but calls `on_iter` after every outer iteration.
pub fn gauss_newton_cb<P, F>(
    problem: &P,
    x0: &[f64],
    config: &Config,
    mut on_iter: F,
) -> Result<SolveOutcome, SolveError>
where
    P: LeastSquares + ?Sized,
    F: FnMut(&IterationStats),
{
    config.validate()?;
    let n = x0.len();
    if n == 0 {
        return Err(SolveError::EmptyProblem);
    }
    check_finite(Quantity::Point, x0, 0)?;

    let mut x = x0.to_vec();
    let (mut fx, mut gx) = evaluate(problem, &x, 0)?;
    let mut converged = norm(&gx) <= config.tolerance;
    let mut history = History::with_capacity(config.max_iterations);
    // Number of residuals, fixed by the first evaluation.
    let mut m = None;
    let mut alpha = config.initial_step;
    let mut last_step = config.initial_step;

    let mut iteration = 0;
    while !converged && iteration < config.max_iterations {
        iteration += 1;

        let p = direction(problem, &x, &mut m, iteration)?;
        let line_search = search(problem, &x, fx, &gx, &p, alpha, &config.line_search)?;
        check_line_search(&line_search, config.step_acceptance, iteration)?;

        x = step(&x, line_search.alpha, &p);
        (fx, gx) = evaluate(problem, &x, iteration)?;
        let gradient_norm = norm(&gx);
        let stats = history.record(iteration, fx, gradient_norm, line_search);
        log::debug!(
            "Gauss-Newton iteration {iteration}: f = {fx:e}, |g| = {gradient_norm:e}, alpha = {:e}",
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
        log::debug!("Gauss-Newton used all {iteration} iterations without converging");
    }
    Ok(history.finish(x, converged, last_step))
}

/// The Gauss-Newton direction at `x`: the minimum-norm solution of `J p = -r`.
fn direction<P>(
    problem: &P,
    x: &[f64],
    m: &mut Option<usize>,
    iteration: usize,
) -> Result<Vec<f64>, SolveError>
where
    P: LeastSquares + ?Sized,
{
    let r = problem.residual(x);
    let m = *m.get_or_insert(r.len());
    check_len(Quantity::Residual, m, r.len())?;
    check_finite(Quantity::Residual, &r, iteration)?;

    let jacobian = problem.jacobian(x);
    check_matrix(Quantity::Jacobian, &jacobian, (m, x.len()), iteration)?;

    let neg_r: Vec<f64> = r.iter().map(|ri| -ri).collect();
    let solution = min_norm_least_squares(&jacobian, &neg_r).map_err(SolveError::FaerSvd)?;
    if solution.rank == 0 {
        return Err(SolveError::RankZeroJacobian { iteration });
    }
    Ok(solution.x)
}
