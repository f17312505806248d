/// Convenience result type used across the crate.
pub type AccordionResult<T> = Result<T, AccordionError>;

/// Error taxonomy for geometry, projection and rasterization APIs.
///
/// None of these are fatal: callers keep their previous fold state and composite when an
/// operation fails.
#[derive(thiserror::Error, Debug)]
pub enum AccordionError {
    /// Non-positive size, fold count below one, negative distance and similar input errors.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested configuration cannot produce a usable fold (e.g. zero-width panels).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The content surface could not be read or sampled.
    #[error("rasterization failure: {0}")]
    Rasterization(String),

    /// Errors when serializing or deserializing options or fold state.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AccordionError {
    /// Build a [`AccordionError::InvalidParameter`] value.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Build a [`AccordionError::DegenerateGeometry`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Build a [`AccordionError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Build a [`AccordionError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Make a shareable copy of this error for host reporting.
    ///
    /// `Other` keeps only its rendered message since `anyhow::Error` is not `Clone`.
    pub fn to_report(&self) -> Self {
        match self {
            Self::InvalidParameter(m) => Self::InvalidParameter(m.clone()),
            Self::DegenerateGeometry(m) => Self::DegenerateGeometry(m.clone()),
            Self::Rasterization(m) => Self::Rasterization(m.clone()),
            Self::Serde(m) => Self::Serde(m.clone()),
            Self::Other(e) => Self::Other(anyhow::anyhow!("{e:#}")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
