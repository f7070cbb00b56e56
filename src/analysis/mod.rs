//! Analysis options and the linear-solve driver

use log::{info, warn};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};
use crate::math::{solve_gmres, solve_pcg, IterativeSolution, Vec as FEVec};

/// Iterative method used for the constrained system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Restarted GMRES, robust for the nonsymmetric round-off of penalty systems
    #[default]
    Gmres,
    /// Conjugate gradient, for symmetric positive definite systems
    Pcg,
}

/// Options for the linear static solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub solver: SolverMethod,
    /// Relative residual target `||f - K u|| / ||f||`
    pub tolerance: f64,
    pub max_iterations: usize,
    /// GMRES restart length
    pub restart: usize,
    /// Jacobi (diagonal) preconditioning
    pub preconditioner: bool,
    /// Penalty factor applied to constrained diagonals
    pub penalty: f64,
    /// Manhattan tolerance for merging coincident nodes
    pub node_tolerance: f64,
    /// Log progress at info level
    pub log: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            solver: SolverMethod::Gmres,
            tolerance: 1e-10,
            max_iterations: 2000,
            restart: 30,
            preconditioner: true,
            penalty: 1e10,
            node_tolerance: 1e-6,
            log: false,
        }
    }
}

impl AnalysisOptions {
    pub fn linear() -> Self {
        Self::default()
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> FEAResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_solver(mut self, solver: SolverMethod) -> Self {
        self.solver = solver;
        self
    }

    /// Reject option values the solver cannot work with
    pub fn validate(&self) -> FEAResult<()> {
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(FEAError::InvalidInput(format!(
                "solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.penalty.is_nan() || self.penalty <= 0.0 {
            return Err(FEAError::InvalidInput(format!(
                "penalty factor must be positive, got {}",
                self.penalty
            )));
        }
        if self.max_iterations == 0 || self.restart == 0 {
            return Err(FEAError::InvalidInput(
                "iteration limit and restart length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Solve `k_bar u = f_bar`, failing unless the true residual meets the tolerance
pub fn solve_constrained(
    k_bar: &CsrMatrix<f64>,
    f_bar: &FEVec,
    options: &AnalysisOptions,
) -> FEAResult<IterativeSolution> {
    options.validate()?;

    let solution = match options.solver {
        SolverMethod::Gmres => solve_gmres(
            k_bar,
            f_bar,
            options.tolerance,
            options.max_iterations,
            options.restart,
            options.preconditioner,
        ),
        SolverMethod::Pcg => solve_pcg(
            k_bar,
            f_bar,
            options.tolerance,
            options.max_iterations,
            options.preconditioner,
        ),
    };

    if !solution.converged {
        warn!(
            "{:?} did not converge: {} iterations, residual {:.3e} (target {:.3e})",
            options.solver,
            solution.iterations,
            solution.residual_norm,
            options.tolerance * f_bar.norm()
        );
        return Err(FEAError::ConvergenceFailed {
            iterations: solution.iterations,
            residual: solution.residual_norm,
        });
    }

    if options.log {
        info!(
            "{:?} converged in {} iterations, residual {:.3e}",
            options.solver, solution.iterations, solution.residual_norm
        );
    }
    Ok(solution)
}
