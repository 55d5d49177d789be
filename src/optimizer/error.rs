use thiserror::Error;

/// Failures of a single optimization call.
///
/// A call either returns a fully solved, verified schedule or one of these.
/// Nothing is retried or relaxed internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizerError {
    /// Rejected before any constraint was built.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The constraint set admits no feasible schedule.
    #[error("Infeasible schedule: {0}")]
    InfeasibleSchedule(String),

    /// The solver returned no definite optimum (unbounded, numerical failure, ...).
    #[error("Solver error: {0}")]
    Solver(String),
}

impl OptimizerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        OptimizerError::InvalidInput(msg.into())
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, OptimizerError::InfeasibleSchedule(_))
    }
}

impl From<validator::ValidationErrors> for OptimizerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        OptimizerError::InvalidInput(errors.to_string())
    }
}

impl From<good_lp::ResolutionError> for OptimizerError {
    fn from(error: good_lp::ResolutionError) -> Self {
        match error {
            good_lp::ResolutionError::Infeasible => {
                OptimizerError::InfeasibleSchedule(
                    "solver proved the problem infeasible".to_string(),
                )
            }
            good_lp::ResolutionError::Unbounded => {
                OptimizerError::Solver("problem is unbounded".to_string())
            }
            other => OptimizerError::Solver(other.to_string()),
        }
    }
}
