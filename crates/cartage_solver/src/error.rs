use thiserror::Error;

/// Error taxonomy of the solver. Infeasibility of a request is not an error:
/// the driver returns a best-effort solution with violations enumerated.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Schema, range or cross-reference violation detected before search.
    #[error("input error: {0}")]
    Input(String),

    /// A matrix provider could not produce its matrices; surfaced verbatim.
    #[error("routing error: {0}")]
    Routing(String),

    /// Invariant breach during search. A correct build never raises this.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SolverError {
    pub fn input(msg: impl Into<String>) -> Self {
        SolverError::Input(msg.into())
    }
}
