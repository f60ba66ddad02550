//! Error taxonomy of the generation pipeline.
//!
//! Errors fall into four classes:
//! - **Validation**: bad input (dimensions, seed, layer parameter). Never
//!   retried; reported with the offending value and the valid range.
//! - **Domain rule**: legal input but a generation-time conflict (footprint
//!   collision, unsuitable terrain, confluence outside the river area).
//!   Placement code may retry a bounded number of times with an adjusted
//!   position before giving up.
//! - **Deterministic**: an internal reproducibility invariant broke. Always
//!   fatal; it indicates a pipeline bug, not bad input.
//! - **Infrastructure**: resource exhaustion during a stage. Retryable with
//!   bounded attempts by the caller.

use thiserror::Error;

/// An error raised by map generation.
///
/// Every variant carries a machine-readable `code`, the `component` that
/// raised it and a human-readable explanation, so the surrounding transport
/// layer can surface it without parsing message text.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{component}: {message} (got {value}, valid range {valid_range}) [{code}]")]
    Validation {
        code: &'static str,
        component: &'static str,
        message: &'static str,
        value: String,
        valid_range: String,
    },

    #[error("{component}: {message} [{code}]")]
    DomainRule {
        code: &'static str,
        component: &'static str,
        message: String,
    },

    #[error("{component}: reproducibility invariant broken: {message} [{code}]")]
    Deterministic {
        code: &'static str,
        component: &'static str,
        message: String,
    },

    #[error("{component}: {message} [{code}]")]
    Infrastructure {
        code: &'static str,
        component: &'static str,
        message: String,
    },
}

impl GenerationError {
    pub fn validation(
        code: &'static str,
        component: &'static str,
        message: &'static str,
        value: impl Into<String>,
        valid_range: impl Into<String>,
    ) -> Self {
        Self::Validation {
            code,
            component,
            message,
            value: value.into(),
            valid_range: valid_range.into(),
        }
    }

    pub fn domain_rule(
        code: &'static str,
        component: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::DomainRule {
            code,
            component,
            message: message.into(),
        }
    }

    pub fn deterministic(
        code: &'static str,
        component: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Deterministic {
            code,
            component,
            message: message.into(),
        }
    }

    pub fn infrastructure(
        code: &'static str,
        component: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Infrastructure {
            code,
            component,
            message: message.into(),
        }
    }

    /// The machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. }
            | Self::DomainRule { code, .. }
            | Self::Deterministic { code, .. }
            | Self::Infrastructure { code, .. } => code,
        }
    }

    /// The component that raised the error.
    pub fn component(&self) -> &'static str {
        match self {
            Self::Validation { component, .. }
            | Self::DomainRule { component, .. }
            | Self::Deterministic { component, .. }
            | Self::Infrastructure { component, .. } => component,
        }
    }

    /// Whether a retry with adjusted input or backoff is permitted.
    ///
    /// Validation and deterministic errors are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DomainRule { .. } | Self::Infrastructure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::GenerationError;

    #[test]
    fn codes_and_components_are_machine_readable() {
        let error = GenerationError::validation(
            "MAP_INVALID_DIMENSIONS",
            "map_parameters",
            "width is outside the valid range",
            "250",
            "10..=200",
        );
        assert_eq!(error.code(), "MAP_INVALID_DIMENSIONS");
        assert_eq!(error.component(), "map_parameters");
        assert!(!error.is_retryable());

        let collision =
            GenerationError::domain_rule("BUILDING_FOOTPRINT_OVERLAP", "structures", "overlap");
        assert!(collision.is_retryable());

        let divergence =
            GenerationError::deterministic("STAGE_DEPENDENCY_MISSING", "pipeline", "bad order");
        assert!(!divergence.is_retryable());
    }
}
