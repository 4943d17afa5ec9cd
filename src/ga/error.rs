//! Error type shared by the engine and its operators.

use super::types::ProcessState;

/// Errors raised by [`GaEngine`](super::GaEngine) and the operators it drives.
///
/// Configuration problems are reported by [`GaEngine::new`](super::GaEngine::new)
/// before any individual is allocated; runtime errors abort the current run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("InvalidConfiguration: {0}")]
    InvalidConfiguration(String),

    #[error("UnsupportedConfiguration: {0}")]
    UnsupportedConfiguration(String),

    #[error(
        "DegenerateCrossing: crossing probability is 0 but {new_population_size} children are required per generation"
    )]
    DegenerateCrossing { new_population_size: usize },

    #[error("NotReady: result data is not available in state {state:?}")]
    NotReady { state: ProcessState },

    #[error("InvalidState: impossible to start process in state {state:?}")]
    InvalidState { state: ProcessState },

    #[error("EvaluationError: {0}")]
    Evaluation(#[from] anyhow::Error),

    #[error("InvalidFitness: fitness function returned {value}")]
    InvalidFitness { value: f32 },
}

impl EvolutionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration(message.into())
    }
}
