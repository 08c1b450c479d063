#![no_main]

use arbitrary::Arbitrary;
use descent::{
    Config, NewtonConfig, NewtonDirection, gauss_newton, newton,
    test_functions::{LinearResidual, NormQuartic, Rosenbrock, ShekelFoxholes},
};
use libfuzzer_sys::fuzz_target;

/// Keeps each run short; the solvers themselves have no wall-clock limit.
const MAX_OUTER: usize = 50;
const MAX_INNER: usize = 30;
const MAX_VARS: usize = 16;

fuzz_target!(|setup: Setup| {
    let mut start = setup.start;
    start.truncate(MAX_VARS);

    let mut config = setup.config;
    config.max_iterations = config.max_iterations.min(MAX_OUTER);
    config.line_search.max_iterations = config.line_search.max_iterations.min(MAX_INNER);

    let mut newton_config = setup.newton_config;
    newton_config.max_iterations = newton_config.max_iterations.min(MAX_OUTER);
    newton_config.line_search.max_iterations =
        newton_config.line_search.max_iterations.min(MAX_INNER);
    if let NewtonDirection::ConjugateGradient { max_iterations, .. } = &mut newton_config.direction {
        *max_iterations = max_iterations.map(|m| m.min(MAX_INNER));
    }

    // Errors are fine, panics are not.
    let _ = match setup.problem {
        Problem::Quartic => gauss_newton(&NormQuartic, &start, &config),
        Problem::Linear => gauss_newton(&LinearResidual, &start, &config),
        Problem::RosenbrockLeastSquares => gauss_newton(&Rosenbrock, &start, &config),
        Problem::RosenbrockNewton => newton(&Rosenbrock, &start, &newton_config),
        Problem::QuarticNewton => newton(&NormQuartic, &start, &newton_config),
        Problem::Shekel => {
            start.resize(2, 4.0);
            newton(&ShekelFoxholes::planar(), &start, &newton_config)
        }
    };
});

#[derive(Debug, Arbitrary)]
enum Problem {
    Quartic,
    Linear,
    RosenbrockLeastSquares,
    RosenbrockNewton,
    QuarticNewton,
    Shekel,
}

#[derive(Debug, Arbitrary)]
struct Setup {
    problem: Problem,
    start: Vec<f64>,
    config: Config,
    newton_config: NewtonConfig,
}
