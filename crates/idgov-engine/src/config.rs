//! Engine configuration.

use std::collections::HashSet;

use thiserror::Error;

/// Environment variable naming this process instance.
pub const INSTANCE_ID_VAR: &str = "IDGOV_INSTANCE_ID";
/// Environment variable toggling per-processor checkpoints.
pub const CHECKPOINT_VAR: &str = "IDGOV_CHECKPOINT_EACH_PROCESSOR";
/// Environment variable listing disabled processor ids, comma separated.
pub const DISABLED_PROCESSORS_VAR: &str = "IDGOV_DISABLED_PROCESSORS";

/// Instance id used when none is configured.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Configuration errors (permanent, no retry).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required configuration variable is missing.
    #[error("configuration missing: {var}")]
    Missing {
        /// Variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("configuration invalid for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: String,
        /// What is wrong with the value.
        reason: String,
    },
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Process instance owning the events this engine publishes. The
    /// recovery sweep only cancels events of its own instance.
    pub instance_id: String,
    /// Persist the processor cursor after every completed processor, so a
    /// concurrent cancel is observed before the next processor starts.
    pub checkpoint_each_processor: bool,
    /// Processor ids excluded from every chain.
    pub disabled_processors: HashSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID.to_owned(),
            checkpoint_each_processor: true,
            disabled_processors: HashSet::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `IDGOV_INSTANCE_ID`: process instance id (default: "default")
    /// - `IDGOV_CHECKPOINT_EACH_PROCESSOR`: `true` (default) or `false`
    /// - `IDGOV_DISABLED_PROCESSORS`: comma separated processor ids
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let instance_id = match lookup(INSTANCE_ID_VAR) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    var: INSTANCE_ID_VAR.to_owned(),
                    reason: "must not be blank".to_owned(),
                });
            }
            Some(value) => value.trim().to_owned(),
            None => DEFAULT_INSTANCE_ID.to_owned(),
        };

        let checkpoint_each_processor = match lookup(CHECKPOINT_VAR) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: CHECKPOINT_VAR.to_owned(),
                reason: format!("expected true or false, got {value}"),
            })?,
            None => true,
        };

        let disabled_processors = lookup(DISABLED_PROCESSORS_VAR)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            instance_id,
            checkpoint_each_processor,
            disabled_processors,
        })
    }

    /// Sets the instance id.
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Disables the processor with `id`.
    #[must_use]
    pub fn with_disabled_processor(mut self, id: impl Into<String>) -> Self {
        self.disabled_processors.insert(id.into());
        self
    }

    /// Persists only at suspension and terminal transitions.
    #[must_use]
    pub fn without_checkpoints(mut self) -> Self {
        self.checkpoint_each_processor = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.instance_id, "default");
        assert!(config.checkpoint_each_processor);
        assert!(config.disabled_processors.is_empty());
    }

    #[test]
    fn test_parses_all_variables() {
        let config = EngineConfig::from_lookup(lookup(&[
            (INSTANCE_ID_VAR, "node-1"),
            (CHECKPOINT_VAR, "false"),
            (DISABLED_PROCESSORS_VAR, " account-approval, ,identity-validate "),
        ]))
        .unwrap();

        assert_eq!(config.instance_id, "node-1");
        assert!(!config.checkpoint_each_processor);
        assert_eq!(config.disabled_processors.len(), 2);
        assert!(config.disabled_processors.contains("account-approval"));
        assert!(config.disabled_processors.contains("identity-validate"));
    }

    #[test]
    fn test_rejects_malformed_checkpoint_flag() {
        let result = EngineConfig::from_lookup(lookup(&[(CHECKPOINT_VAR, "sometimes")]));

        match result {
            Err(ConfigError::Invalid { var, .. }) => assert_eq!(var, CHECKPOINT_VAR),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_blank_instance_id() {
        let result = EngineConfig::from_lookup(lookup(&[(INSTANCE_ID_VAR, "  ")]));

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
