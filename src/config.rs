//! Engine configuration.
//!
//! Limits applied when rules are accepted. The host may ship them as a JSON
//! document; every field falls back to its default when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InjectorError, InjectorResult, ValidationError};

/// Limits enforced by the engine when configuration is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rules a single combinator may hold.
    pub max_rules_per_combinator: usize,
    /// Maximum conditions in a single rule.
    pub max_conditions_per_rule: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rules_per_combinator: 32,
            max_conditions_per_rule: 16,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_rules_per_combinator == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_rules_per_combinator must be > 0".to_string(),
            });
        }
        if self.max_conditions_per_rule == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_conditions_per_rule must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> InjectorResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("invalid engine config: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> InjectorResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InjectorError::internal(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut c = EngineConfig::default();
        c.max_rules_per_combinator = 0;
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.max_conditions_per_rule = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"max_conditions_per_rule": 4}"#).unwrap();
        assert_eq!(cfg.max_conditions_per_rule, 4);
        assert_eq!(cfg.max_rules_per_combinator, 32);
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(err.is_validation());

        let err = EngineConfig::from_json_str(r#"{"max_rules_per_combinator": 0}"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_rules_per_combinator": 8}}"#).unwrap();
        let cfg = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.max_rules_per_combinator, 8);

        let missing = EngineConfig::from_json_file(file.path().with_extension("missing"));
        assert!(missing.unwrap_err().is_internal());
    }
}
