use thiserror::Error;

/// Configuration errors, detected before the first iteration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MinimizeError {
    #[error("at least one of the function tolerance or the gradient tolerance must be set")]
    NoTolerance,
    #[error("the minimisation algorithm '{0}' is unknown")]
    UnknownAlgorithm(String),
    #[error("the minimisation option '{0}' is unknown")]
    UnknownOption(String),
    #[error("invalid options for {algorithm}: {reason}")]
    InvalidOptions {
        algorithm: &'static str,
        reason: String,
    },
    #[error("the {algorithm} algorithm requires the {oracle}")]
    MissingOracle {
        algorithm: &'static str,
        oracle: &'static str,
    },
    #[error("{0} requires a constraint set")]
    MissingConstraints(&'static str),
    #[error("{0} requires lower and upper bounds")]
    MissingBounds(&'static str),
    #[error("{0} requires an inner minimisation algorithm")]
    MissingInnerAlgorithm(&'static str),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("invalid grid: {0}")]
    Grid(String),
}

/// Abnormal termination of a run.
///
/// A run that ends with a warning still returns the best point found.
/// The `Display` text is meant for direct display to users.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("Maximum number of iterations reached")]
    MaxIterations,
    #[error("Infinite function value encountered, can no longer perform optimisation.")]
    InfiniteFunction,
    #[error("NaN function value encountered, can no longer perform optimisation.")]
    NanFunction,
    #[error("No optimisation")]
    NoOptimisation,
    /// A factorisation or linear solve failed in a way no retry can fix.
    #[error("LinAlgError: {0} (fatal minimisation error).")]
    LinAlg(String),
    /// Any other condition under which no further progress is possible.
    #[error("{0} (fatal minimisation error).")]
    Fatal(String),
    #[error("Mu too small.")]
    MuTooSmall,
    #[error("Maximum cooling iterations reached")]
    MaxCooling,
    #[error("Maximum accepted query locations reached")]
    MaxAccepted,
}

impl Warning {
    pub(crate) fn not_positive_definite() -> Self {
        Warning::LinAlg("Matrix is not positive definite".into())
    }

    pub(crate) fn singular() -> Self {
        Warning::LinAlg("Singular matrix".into())
    }
}
