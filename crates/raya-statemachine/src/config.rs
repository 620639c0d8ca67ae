//! Lowering configuration, loaded from `[statemachine]` in `raya.toml`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading [`StateMachineOptions`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid [statemachine] configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid unique name template '{0}': it must contain {{name}} and {{n}}")]
    Template(String),
}

/// Names and templates used for the members the lowering synthesizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateMachineOptions {
    /// Base name of the back-reference field and its constructor parameter
    pub self_field_name: String,
    /// Base name of the state field
    pub state_field_name: String,
    /// Prefix of ensure-method names; the slot number is appended
    pub ensure_method_prefix: String,
    /// Suffix appended to the source method name to name the synthetic type
    pub type_name_suffix: String,
    /// Name of the driver method
    pub driver_name: String,
    /// Template of the unique-name allocator, with `{name}` and `{n}` placeholders.
    /// Names are drawn from the [`Compilation`](crate::Compilation)'s allocator,
    /// so the compilation must be created with
    /// [`Compilation::with_name_template`](crate::Compilation::with_name_template)
    /// for this key to take effect.
    pub unique_name_template: String,
}

impl Default for StateMachineOptions {
    fn default() -> Self {
        Self {
            self_field_name: "self_".to_string(),
            state_field_name: "state".to_string(),
            ensure_method_prefix: "$ensure".to_string(),
            type_name_suffix: "$generator".to_string(),
            driver_name: "MoveNext".to_string(),
            unique_name_template: "${name}${n}".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    statemachine: Option<StateMachineOptions>,
}

impl StateMachineOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `[statemachine]` table of a manifest; other tables are ignored
    /// and a missing table yields the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(source)?;
        let options = manifest.statemachine.unwrap_or_default();
        options.validate()?;
        Ok(options)
    }

    /// Load options from a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_template(&self.unique_name_template)
    }
}

/// Check that a unique-name template carries both placeholders
pub(crate) fn validate_template(template: &str) -> Result<(), ConfigError> {
    if !template.contains("{name}") || !template.contains("{n}") {
        return Err(ConfigError::Template(template.to_string()));
    }
    Ok(())
}
