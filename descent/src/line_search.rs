//! Inexact line search on the (weak) Wolfe conditions.
//!
//! Starting from a guess `a`, the search keeps a bracket `[alpha_min, alpha_max]`
//! around the trial step. A trial that fails sufficient decrease becomes the new
//! upper end and the step bisects down. A trial whose slope is still too steep
//! doubles the step while there is no upper end yet, and bisects up afterwards.
use crate::{
    Objective, Quantity, SolveError, StepAcceptance, WolfeConfig,
    problem::{check_len, evaluate},
    vector::{dot, step_into},
};

/// Result of one line search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSearchOutcome {
    /// The step length the search ended on.
    pub alpha: f64,
    /// How many bracketing iterations ran (0 if the first trial was accepted).
    pub iterations: usize,
    /// Did `alpha` satisfy both Wolfe conditions?
    /// False means the search hit its iteration cap first.
    pub satisfied: bool,
    /// Lower end of the final bracket.
    pub alpha_min: f64,
    /// Upper end of the final bracket. Infinite if no trial ever failed sufficient decrease.
    pub alpha_max: f64,
}

/// The interval a step length is searched in.
/// `min <= alpha <= max` always holds; `min` never decreases and `max` never increases.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bracket {
    min: f64,
    alpha: f64,
    max: f64,
}

impl Bracket {
    fn new(alpha: f64) -> Self {
        Self {
            min: 0.0,
            alpha,
            max: f64::INFINITY,
        }
    }

    fn is_bounded(&self) -> bool {
        self.max.is_finite()
    }

    fn midpoint(&self) -> f64 {
        // Not (min + max) / 2, which overflows for huge finite brackets.
        self.min + 0.5 * (self.max - self.min)
    }

    /// The step was too long: it becomes the upper end.
    fn shrink(&mut self) {
        self.max = self.alpha;
        self.alpha = self.midpoint();
        self.debug_check();
    }

    /// The step was too short: double it, or bisect up once there's an upper end.
    fn grow(&mut self) {
        if self.is_bounded() {
            self.min = self.alpha;
            self.alpha = self.midpoint();
        } else {
            // Capped, or an inf alpha would survive every later shrink.
            self.alpha = (2.0 * self.alpha).min(f64::MAX);
        }
        self.debug_check();
    }

    #[mutants::skip]
    fn debug_check(&self) {
        debug_assert!(
            self.min <= self.alpha && self.alpha <= self.max,
            "bracket invariant broken: {} <= {} <= {}",
            self.min,
            self.alpha,
            self.max
        );
    }
}

/// Find a step length along `p` from `x` satisfying the Wolfe conditions
///
/// ```text
/// f(x + alpha p) <  f(x) + c1 alpha g(x)·p      (sufficient decrease)
/// g(x + alpha p)·p > c2 g(x)·p                  (curvature)
/// ```
///
/// starting from the guess `initial_step`. If `config.max_iterations` bracketing steps
/// aren't enough, the last trial is returned with `satisfied == false`.
pub fn wolfe_line_search<P>(
    problem: &P,
    x: &[f64],
    p: &[f64],
    initial_step: f64,
    config: &WolfeConfig,
) -> Result<LineSearchOutcome, SolveError>
where
    P: Objective + ?Sized,
{
    config.validate()?;
    if !(initial_step.is_finite() && initial_step > 0.0) {
        return Err(SolveError::InvalidInitialStep(initial_step));
    }
    check_len(Quantity::Direction, x.len(), p.len())?;
    let (fx, gx) = evaluate(problem, x, 0)?;
    search(problem, x, fx, &gx, p, initial_step, config)
}

/// The search itself, for callers that already know f(x) and g(x).
pub(crate) fn search<P>(
    problem: &P,
    x: &[f64],
    fx: f64,
    gx: &[f64],
    p: &[f64],
    initial_step: f64,
    config: &WolfeConfig,
) -> Result<LineSearchOutcome, SolveError>
where
    P: Objective + ?Sized,
{
    let slope = dot(gx, p);
    let armijo_bound = |alpha: f64| fx + alpha * config.c1 * slope;
    let curvature_bound = config.c2 * slope;

    let mut z = Vec::with_capacity(x.len());
    let mut trial = |alpha: f64| -> Result<(f64, f64), SolveError> {
        step_into(x, alpha, p, &mut z);
        let fz = problem.value(&z);
        let gz = problem.gradient(&z);
        check_len(Quantity::Gradient, x.len(), gz.len())?;
        Ok((fz, dot(&gz, p)))
    };

    let mut bracket = Bracket::new(initial_step);
    let (mut fz, mut hz) = trial(bracket.alpha)?;
    let mut iterations = 0;

    while !(fz < armijo_bound(bracket.alpha) && hz > curvature_bound)
        && iterations < config.max_iterations
    {
        if !fz.is_finite() || !hz.is_finite() || fz > armijo_bound(bracket.alpha) {
            bracket.shrink();
        } else if hz < curvature_bound {
            bracket.grow();
        }
        // Otherwise a condition holds with equality and the bracket doesn't move.
        log::trace!(
            "line search step {iterations}: f = {fz:e}, slope = {hz:e}, next alpha = {:e} in [{:e}, {:e}]",
            bracket.alpha,
            bracket.min,
            bracket.max
        );
        (fz, hz) = trial(bracket.alpha)?;
        iterations += 1;
    }

    let satisfied = fz < armijo_bound(bracket.alpha) && hz > curvature_bound;
    log::debug!(
        "line search finished: alpha = {:e}, {iterations} iterations, satisfied = {satisfied}",
        bracket.alpha
    );
    Ok(LineSearchOutcome {
        alpha: bracket.alpha,
        iterations,
        satisfied,
        alpha_min: bracket.min,
        alpha_max: bracket.max,
    })
}

/// Decide what to do about a line search that gave up.
pub(crate) fn check_line_search(
    line_search: &LineSearchOutcome,
    acceptance: StepAcceptance,
    iteration: usize,
) -> Result<(), SolveError> {
    if line_search.satisfied {
        return Ok(());
    }
    match acceptance {
        StepAcceptance::Always => {
            log::warn!(
                "Line search at iteration {iteration} did not satisfy the Wolfe conditions after {} steps, taking alpha = {:e} anyway",
                line_search.iterations,
                line_search.alpha
            );
            Ok(())
        }
        StepAcceptance::RequireWolfe => Err(SolveError::LineSearchFailed {
            iteration,
            alpha: line_search.alpha,
        }),
    }
}
