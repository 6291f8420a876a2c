//! Error types for draft finalization and handle access.

/// Validation failure reported by `finalize`.
///
/// There is no partial success: when one of these is returned, no resource
/// was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field '{field}'")]
    MissingRequiredField { field: &'static str },

    #[error("invalid field combination: {rule}")]
    InvalidFieldCombination { rule: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingRequiredField { field }
    }

    pub fn combination(rule: impl Into<String>) -> Self {
        Self::InvalidFieldCombination { rule: rule.into() }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Misuse of the write-once materialized handle slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("handle for {resource} is already materialized")]
    DoubleMaterialization { resource: String },

    #[error("handle for {resource} read before materialization")]
    UseBeforeMaterialization { resource: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let err = ValidationError::missing("name");
        assert_eq!(err.to_string(), "missing required field 'name'");

        let err = ValidationError::invalid("retries", "must be at most 10");
        assert!(err.to_string().contains("retries"));
        assert!(err.to_string().contains("at most 10"));
    }

    #[test]
    fn test_handle_messages_name_the_resource() {
        let err = HandleError::UseBeforeMaterialization {
            resource: "queue/orders".to_string(),
        };
        assert!(err.to_string().contains("queue/orders"));
    }
}
