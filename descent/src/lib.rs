//! Descent methods for smooth unconstrained minimization.
//!
//! Three pieces, each usable on its own:
//! - [`wolfe_line_search`] picks a step length along a descent direction.
//! - [`gauss_newton`] minimizes a sum of squares `||r(x)||²`.
//! - [`newton`] minimizes a twice-differentiable objective, with exact or
//!   truncated-CG directions.
//!
//! Problems are described by implementing [`Objective`], [`LeastSquares`] or
//! [`TwiceDifferentiable`], or by wrapping closures in the `Fn*` adapters.
//!
//! ```
//! use descent::{Config, gauss_newton, test_functions::NormQuartic};
//!
//! let outcome = gauss_newton(&NormQuartic, &[1.0, -2.0, 0.5], &Config::default()).unwrap();
//! assert!(outcome.converged());
//! assert!(outcome.final_point().iter().all(|x| x.abs() < 1e-10));
//! ```

pub use crate::config::{
    Config, NewtonConfig, NewtonDirection, StepAcceptance, StepRestart, WolfeConfig,
};
pub use crate::error::{Quantity, SolveError};
pub use crate::gauss_newton::{gauss_newton, gauss_newton_cb};
pub use crate::line_search::{LineSearchOutcome, wolfe_line_search};
pub use crate::newton::{newton, newton_cb};
pub use crate::outcome::{IterationStats, SolveOutcome};
pub use crate::problem::{
    FnLeastSquares, FnObjective, FnTwiceDifferentiable, LeastSquares, Objective,
    TwiceDifferentiable,
};

/// Solver and line search settings.
mod config;
mod error;
/// Gauss-Newton driver.
mod gauss_newton;
/// Wolfe line search.
mod line_search;
mod linalg;
/// Newton and Newton-CG driver.
mod newton;
mod outcome;
/// Traits describing a problem, and closure adapters.
mod problem;
/// Problems with known answers.
pub mod test_functions;
mod vector;
