use crate::LineSearchOutcome;

/// What a finished solve produced.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub struct SolveOutcome {
    pub(crate) final_point: Vec<f64>,
    pub(crate) objective_history: Vec<f64>,
    pub(crate) gradient_norm_history: Vec<f64>,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
    pub(crate) unsatisfied_line_searches: Vec<usize>,
    pub(crate) final_step_length: f64,
}

impl SolveOutcome {
    /// The last iterate.
    pub fn final_point(&self) -> &[f64] {
        &self.final_point
    }

    /// Consume the outcome, keeping only the last iterate.
    pub fn into_final_point(self) -> Vec<f64> {
        self.final_point
    }

    /// f(x) after each outer iteration, oldest first.
    pub fn objective_history(&self) -> &[f64] {
        &self.objective_history
    }

    /// Gradient norm after each outer iteration, oldest first.
    pub fn gradient_norm_history(&self) -> &[f64] {
        &self.gradient_norm_history
    }

    /// Outer iterations actually executed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Did the gradient norm reach the tolerance?
    /// False means the iteration budget ran out first.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// 1-based outer iterations whose line search gave up without satisfying
    /// the Wolfe conditions (their step was still taken).
    pub fn unsatisfied_line_searches(&self) -> &[usize] {
        &self.unsatisfied_line_searches
    }

    /// Was every step a Wolfe step?
    pub fn all_line_searches_satisfied(&self) -> bool {
        self.unsatisfied_line_searches.is_empty()
    }

    /// The step length of the last accepted step.
    /// If no iteration ran, this is the configured initial step.
    pub fn final_step_length(&self) -> f64 {
        self.final_step_length
    }

    /// Objective value at the final point, if any iteration ran.
    pub fn final_objective(&self) -> Option<f64> {
        self.objective_history.last().copied()
    }

    /// Gradient norm at the final point, if any iteration ran.
    pub fn final_gradient_norm(&self) -> Option<f64> {
        self.gradient_norm_history.last().copied()
    }
}

/// Passed to the observer callback after every outer iteration.
#[derive(Clone, Copy, Debug)]
pub struct IterationStats {
    /// 1-based outer iteration that just finished.
    pub iteration: usize,
    /// f at the new point.
    pub objective: f64,
    /// Gradient norm at the new point.
    pub gradient_norm: f64,
    /// Step length that was taken.
    pub step_length: f64,
    /// How the line search for this step went.
    pub line_search: LineSearchOutcome,
}

/// Budgets bigger than this grow the histories on demand.
const MAX_PREALLOCATED: usize = 1024;

/// State shared by the Gauss-Newton and Newton outer loops.
pub(crate) struct History {
    objective: Vec<f64>,
    gradient_norm: Vec<f64>,
    unsatisfied: Vec<usize>,
}

impl History {
    pub fn with_capacity(max_iterations: usize) -> Self {
        let capacity = max_iterations.min(MAX_PREALLOCATED);
        Self {
            objective: Vec::with_capacity(capacity),
            gradient_norm: Vec::with_capacity(capacity),
            unsatisfied: Vec::new(),
        }
    }

    /// Record one finished outer iteration and return its stats.
    pub fn record(
        &mut self,
        iteration: usize,
        objective: f64,
        gradient_norm: f64,
        line_search: LineSearchOutcome,
    ) -> IterationStats {
        self.objective.push(objective);
        self.gradient_norm.push(gradient_norm);
        if !line_search.satisfied {
            self.unsatisfied.push(iteration);
        }
        IterationStats {
            iteration,
            objective,
            gradient_norm,
            step_length: line_search.alpha,
            line_search,
        }
    }

    pub fn finish(
        self,
        final_point: Vec<f64>,
        converged: bool,
        final_step_length: f64,
    ) -> SolveOutcome {
        SolveOutcome {
            final_point,
            iterations: self.objective.len(),
            objective_history: self.objective,
            gradient_norm_history: self.gradient_norm,
            converged,
            unsatisfied_line_searches: self.unsatisfied,
            final_step_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(alpha: f64, satisfied: bool) -> LineSearchOutcome {
        LineSearchOutcome {
            alpha,
            iterations: 0,
            satisfied,
            alpha_min: 0.0,
            alpha_max: f64::INFINITY,
        }
    }

    #[test]
    fn history_counts_iterations_and_failures() {
        let mut history = History::with_capacity(3);
        let stats = history.record(1, 4.0, 2.0, search(1.0, true));
        assert_eq!(stats.step_length, 1.0);
        history.record(2, 1.0, 0.5, search(0.5, false));
        let outcome = history.finish(vec![0.1], false, 0.5);
        assert_eq!(outcome.iterations(), 2);
        assert_eq!(outcome.objective_history(), &[4.0, 1.0]);
        assert_eq!(outcome.unsatisfied_line_searches(), &[2]);
        assert!(!outcome.all_line_searches_satisfied());
        assert_eq!(outcome.final_gradient_norm(), Some(0.5));
    }
}
