//! Knobs for the line search and the outer solvers.
use crate::{LineSearchOutcome, SolveError};

/// Constants for the Wolfe line search.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct WolfeConfig {
    /// Sufficient-decrease (Armijo) constant, in (0, 1).
    pub c1: f64,
    /// Curvature constant, in (c1, 1).
    pub c2: f64,
    /// Cap on bracketing iterations per search.
    pub max_iterations: usize,
}

impl Default for WolfeConfig {
    fn default() -> Self {
        Self {
            c1: 1e-3,
            c2: 0.5,
            max_iterations: 10,
        }
    }
}

impl WolfeConfig {
    /// Set both Wolfe constants.
    pub fn with_constants(mut self, c1: f64, c2: f64) -> Self {
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    /// Set the bracketing iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Checks `0 < c1 < c2 < 1`.
    pub fn validate(&self) -> Result<(), SolveError> {
        // Written so that NaN fails too.
        let ok = self.c1 > 0.0 && self.c1 < self.c2 && self.c2 < 1.0;
        if ok {
            Ok(())
        } else {
            Err(SolveError::InvalidWolfeConstants {
                c1: self.c1,
                c2: self.c2,
            })
        }
    }
}

/// What the outer solver does with a step whose line search gave up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum StepAcceptance {
    /// Take the step anyway and record the iteration in
    /// [`crate::SolveOutcome::unsatisfied_line_searches`].
    #[default]
    Always,
    /// Stop with [`SolveError::LineSearchFailed`].
    RequireWolfe,
}

/// Where each line search starts its step length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum StepRestart {
    /// Start from the step length the previous search accepted.
    WarmStart,
    /// Start every search from the configured initial step.
    Unit,
    /// Warm start, unless the previous search was unsatisfied.
    /// Then start again from the configured initial step.
    UnitAfterFailure,
}

impl StepRestart {
    /// Step length the next line search starts from, given how the last one ended.
    pub(crate) fn next_initial_step(self, initial_step: f64, last: &LineSearchOutcome) -> f64 {
        match self {
            StepRestart::WarmStart => last.alpha,
            StepRestart::Unit => initial_step,
            StepRestart::UnitAfterFailure if last.satisfied => last.alpha,
            StepRestart::UnitAfterFailure => initial_step,
        }
    }
}

/// How the Newton solver computes its direction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum NewtonDirection {
    /// Cholesky solve of `H p = -g`. Falls back to truncated CG
    /// when the Hessian is not positive definite.
    Exact,
    /// Hessian-free truncated conjugate gradient on `H p = -g`.
    ConjugateGradient {
        /// Cap on CG iterations. `None` means the number of variables.
        max_iterations: Option<usize>,
        /// CG stops once the residual is below `min(forcing, sqrt(|g|)) * |g|`.
        /// Must be positive and finite.
        forcing: f64,
    },
}

impl NewtonDirection {
    /// Truncated CG with the usual forcing term of 0.5.
    pub fn conjugate_gradient() -> Self {
        Self::ConjugateGradient {
            max_iterations: None,
            forcing: 0.5,
        }
    }
}

/// Configuration for the Gauss-Newton solver.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct Config {
    /// Outer iteration budget.
    pub max_iterations: usize,
    /// Stop once the gradient norm is at or below this.
    pub tolerance: f64,
    /// Line search constants.
    pub line_search: WolfeConfig,
    /// Step length the first line search starts from.
    pub initial_step: f64,
    /// What to do with unsatisfied line searches.
    pub step_acceptance: StepAcceptance,
    /// Where each line search starts.
    pub step_restart: StepRestart,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-10,
            line_search: WolfeConfig::default(),
            initial_step: 1.0,
            step_acceptance: StepAcceptance::default(),
            step_restart: StepRestart::WarmStart,
        }
    }
}

impl Config {
    /// Set the outer iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    /// Set the gradient-norm tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    /// Set the line search constants.
    pub fn with_line_search(mut self, line_search: WolfeConfig) -> Self {
        self.line_search = line_search;
        self
    }
    /// Set the first step length.
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
    /// Set the handling of unsatisfied line searches.
    pub fn with_step_acceptance(mut self, step_acceptance: StepAcceptance) -> Self {
        self.step_acceptance = step_acceptance;
        self
    }
    /// Set where each line search starts.
    pub fn with_step_restart(mut self, step_restart: StepRestart) -> Self {
        self.step_restart = step_restart;
        self
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<(), SolveError> {
        self.line_search.validate()?;
        validate_initial_step(self.initial_step)?;
        validate_tolerance(self.tolerance)
    }
}

/// Configuration for the Newton and Newton-CG solver.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct NewtonConfig {
    /// Outer iteration budget.
    pub max_iterations: usize,
    /// Stop once the gradient norm is at or below this.
    pub tolerance: f64,
    /// Line search constants.
    pub line_search: WolfeConfig,
    /// Step length the line search starts from (see [`StepRestart`]).
    pub initial_step: f64,
    /// What to do with unsatisfied line searches.
    pub step_acceptance: StepAcceptance,
    /// Where each line search starts.
    pub step_restart: StepRestart,
    /// Exact Newton or truncated CG.
    pub direction: NewtonDirection,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-10,
            line_search: WolfeConfig::default(),
            initial_step: 1.0,
            step_acceptance: StepAcceptance::default(),
            step_restart: StepRestart::Unit,
            direction: NewtonDirection::Exact,
        }
    }
}

impl NewtonConfig {
    /// Default configuration using truncated CG directions.
    pub fn conjugate_gradient() -> Self {
        Self {
            direction: NewtonDirection::conjugate_gradient(),
            ..Default::default()
        }
    }
    /// Set the outer iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    /// Set the gradient-norm tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    /// Set the line search constants.
    pub fn with_line_search(mut self, line_search: WolfeConfig) -> Self {
        self.line_search = line_search;
        self
    }
    /// Set the step length the line search restarts from.
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
    /// Set the handling of unsatisfied line searches.
    pub fn with_step_acceptance(mut self, step_acceptance: StepAcceptance) -> Self {
        self.step_acceptance = step_acceptance;
        self
    }
    /// Set where each line search starts.
    pub fn with_step_restart(mut self, step_restart: StepRestart) -> Self {
        self.step_restart = step_restart;
        self
    }
    /// Set how directions are computed.
    pub fn with_direction(mut self, direction: NewtonDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<(), SolveError> {
        self.line_search.validate()?;
        validate_initial_step(self.initial_step)?;
        validate_tolerance(self.tolerance)?;
        match self.direction {
            NewtonDirection::ConjugateGradient { forcing, .. }
                if !(forcing > 0.0 && forcing.is_finite()) =>
            {
                Err(SolveError::InvalidForcing(forcing))
            }
            _ => Ok(()),
        }
    }
}

fn validate_initial_step(initial_step: f64) -> Result<(), SolveError> {
    if initial_step.is_finite() && initial_step > 0.0 {
        Ok(())
    } else {
        Err(SolveError::InvalidInitialStep(initial_step))
    }
}

fn validate_tolerance(tolerance: f64) -> Result<(), SolveError> {
    if tolerance >= 0.0 {
        Ok(())
    } else {
        Err(SolveError::InvalidTolerance(tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(WolfeConfig::default().validate().is_ok());
        assert!(Config::default().validate().is_ok());
        assert!(NewtonConfig::default().validate().is_ok());
        assert!(NewtonConfig::conjugate_gradient().validate().is_ok());
    }

    #[test]
    fn rejects_bad_wolfe_constants() {
        for (c1, c2) in [(0.0, 0.5), (0.5, 0.5), (0.6, 0.5), (0.1, 1.0), (f64::NAN, 0.5)] {
            let cfg = WolfeConfig::default().with_constants(c1, c2);
            assert!(
                matches!(cfg.validate(), Err(SolveError::InvalidWolfeConstants { .. })),
                "c1 = {c1}, c2 = {c2} should be rejected"
            );
        }
    }

    #[test]
    fn restart_policies() {
        let mut last = LineSearchOutcome {
            alpha: 0.25,
            iterations: 3,
            satisfied: true,
            alpha_min: 0.0,
            alpha_max: 0.5,
        };
        assert_eq!(StepRestart::WarmStart.next_initial_step(1.0, &last), 0.25);
        assert_eq!(StepRestart::Unit.next_initial_step(1.0, &last), 1.0);
        assert_eq!(StepRestart::UnitAfterFailure.next_initial_step(1.0, &last), 0.25);
        last.satisfied = false;
        assert_eq!(StepRestart::WarmStart.next_initial_step(1.0, &last), 0.25);
        assert_eq!(StepRestart::UnitAfterFailure.next_initial_step(1.0, &last), 1.0);
    }

    #[test]
    fn rejects_bad_steps_and_tolerances() {
        let cfg = Config::default().with_initial_step(0.0);
        assert!(matches!(
            cfg.validate(),
            Err(SolveError::InvalidInitialStep(_))
        ));
        let cfg = NewtonConfig::default().with_initial_step(f64::INFINITY);
        assert!(matches!(
            cfg.validate(),
            Err(SolveError::InvalidInitialStep(_))
        ));
        let cfg = Config::default().with_tolerance(-1.0);
        assert!(matches!(cfg.validate(), Err(SolveError::InvalidTolerance(_))));
        let cfg = Config::default().with_tolerance(f64::NAN);
        assert!(matches!(cfg.validate(), Err(SolveError::InvalidTolerance(_))));
    }

    #[test]
    fn rejects_bad_forcing() {
        for forcing in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let cfg = NewtonConfig::default().with_direction(NewtonDirection::ConjugateGradient {
                max_iterations: None,
                forcing,
            });
            assert!(
                matches!(cfg.validate(), Err(SolveError::InvalidForcing(_))),
                "forcing = {forcing} should be rejected"
            );
        }
        // Exact Newton has no forcing term to check.
        assert!(NewtonConfig::default().validate().is_ok());
    }
}
