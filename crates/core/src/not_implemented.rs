use thiserror::Error;

/// A valid request that has not been built.
///
/// Kept distinct from option and model errors so callers can tell "wrong"
/// apart from "not yet supported".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not implemented: {feature}")]
pub struct NotImplementedError {
    feature: String,
}

impl NotImplementedError {
    #[must_use]
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
        }
    }

    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }
}
