//! Error taxonomy for the risk pipeline.

use thiserror::Error;

/// Failures a trip query can surface. Collaborator errors bubble up to the
/// query boundary whole; the only values ever defaulted are the documented
/// fallbacks (missing speed annotations, unresolved timezones).
#[derive(Debug, Error)]
pub enum RiskError {
    /// Bad caller input, rejected before any external call is made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A data provider failed or returned an unexpected shape.
    #[error("{provider} provider error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// The engineered feature table does not match the trained model.
    #[error("model schema mismatch: {0}")]
    ModelSchema(String),
}

impl RiskError {
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}
