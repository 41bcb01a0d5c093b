use strife_core::ErrorCode;

/// Analyzer-level failures. The engine captures these per report section.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown entity id `{id}`")]
    UnknownNode { id: String },

    #[error("no entity is assigned to domain `{domain}`")]
    UnknownDomain { domain: String },

    #[error("power iteration did not converge after {iterations} iterations (last delta {delta:e})")]
    NonConvergence { iterations: usize, delta: f64 },

    #[error("section `{section}` panicked: {message}")]
    Panicked {
        section: &'static str,
        message: String,
    },
}

impl AnalysisError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownNode { .. } => ErrorCode::UnknownNode,
            Self::UnknownDomain { .. } => ErrorCode::UnknownDomain,
            Self::NonConvergence { .. } => ErrorCode::NonConvergence,
            Self::Panicked { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map() {
        let err = AnalysisError::UnknownNode { id: "zed".into() };
        assert_eq!(err.code(), ErrorCode::UnknownNode);
        assert!(err.to_string().contains("zed"));
        let err = AnalysisError::NonConvergence {
            iterations: 3,
            delta: 0.5,
        };
        assert_eq!(err.code().code(), "E3001");
    }
}
