use faer::linalg::svd::SvdError;

/// Which value a dimension or finiteness check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// The current point.
    Point,
    /// The objective value f(x).
    Objective,
    /// The gradient of f.
    Gradient,
    /// The residual vector r(x).
    Residual,
    /// The Jacobian of r.
    Jacobian,
    /// The Hessian of f.
    Hessian,
    /// A Hessian-vector product.
    HessianVectorProduct,
    /// The search direction.
    Direction,
    /// Parameters of a test function.
    Parameters,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Quantity::Point => "point",
            Quantity::Objective => "objective",
            Quantity::Gradient => "gradient",
            Quantity::Residual => "residual",
            Quantity::Jacobian => "Jacobian",
            Quantity::Hessian => "Hessian",
            Quantity::HessianVectorProduct => "Hessian-vector product",
            Quantity::Direction => "search direction",
            Quantity::Parameters => "parameter list",
        };
        f.write_str(name)
    }
}

/// Errors that stop a line search or an outer solve.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum SolveError {
    /// The starting point had no variables.
    #[error("Cannot solve a problem with zero variables")]
    EmptyProblem,
    /// A vector had the wrong number of entries.
    #[error("The {quantity} has {actual} entries but {expected} were expected")]
    DimensionMismatch {
        /// Which vector was wrong.
        quantity: Quantity,
        /// Length implied by the problem.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// A matrix had the wrong shape.
    #[error("The {quantity} is {}x{} but {}x{} was expected", .actual.0, .actual.1, .expected.0, .expected.1)]
    MatrixShape {
        /// Which matrix was wrong.
        quantity: Quantity,
        /// (rows, columns) implied by the problem.
        expected: (usize, usize),
        /// (rows, columns) actually supplied.
        actual: (usize, usize),
    },
    /// Wolfe constants must satisfy `0 < c1 < c2 < 1`.
    #[error("Invalid Wolfe constants c1 = {c1}, c2 = {c2}, they must satisfy 0 < c1 < c2 < 1")]
    InvalidWolfeConstants {
        /// Sufficient-decrease constant.
        c1: f64,
        /// Curvature constant.
        c2: f64,
    },
    /// The initial step length must be positive and finite.
    #[error("Initial step length must be positive and finite, got {0}")]
    InvalidInitialStep(f64),
    /// The convergence tolerance must be non-negative and not NaN.
    #[error("Convergence tolerance must be non-negative, got {0}")]
    InvalidTolerance(f64),
    /// The CG forcing term must be positive and finite.
    #[error("CG forcing term must be positive and finite, got {0}")]
    InvalidForcing(f64),
    /// Some callable returned NaN or infinity.
    #[error("The {quantity} became non-finite at iteration {iteration}")]
    NonFinite {
        /// Which value was non-finite.
        quantity: Quantity,
        /// Outer iteration where it was seen (0 means the starting point).
        iteration: usize,
    },
    /// The Jacobian was numerically zero, so there is no Gauss-Newton direction.
    #[error("The Jacobian has rank zero at iteration {iteration}, no Gauss-Newton direction exists")]
    RankZeroJacobian {
        /// Outer iteration where it happened.
        iteration: usize,
    },
    /// Faer: could not decompose the Jacobian.
    #[error("Something went wrong doing SVD in faer")]
    FaerSvd(SvdError),
    /// The line search gave up, and the solver was configured to refuse such steps.
    #[error(
        "The line search could not satisfy the Wolfe conditions at iteration {iteration} (last step length {alpha})"
    )]
    LineSearchFailed {
        /// Outer iteration where it happened.
        iteration: usize,
        /// The step length the search ended on.
        alpha: f64,
    },
}
