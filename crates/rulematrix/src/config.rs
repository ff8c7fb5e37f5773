//! Engine configuration.
//!
//! Every setting has a default, so an empty document is a valid
//! configuration:
//!
//! ```yaml
//! codec:
//!   numeric_field: Experience
//!   query_marker: "query:"
//! relations:
//!   attribute_prefix: metadata.
//!   entity_prefix: employee.
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Options for the persisted text format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// The one field whose parsed values become numbers. All other parsed
    /// values stay text.
    pub numeric_field: String,
    /// Marker that may precede the serialized matrix in stored text.
    pub query_marker: String,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            numeric_field: "Experience".to_string(),
            query_marker: "query:".to_string(),
        }
    }
}

/// Field prefixes understood by the relational processors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationConventions {
    /// Prefix routing a condition to a linked attribute, e.g.
    /// `metadata.expense_limit`.
    pub attribute_prefix: String,
    /// Prefix routing a condition from an attribute to its owning entity,
    /// e.g. `employee.Department`.
    pub entity_prefix: String,
}

impl Default for RelationConventions {
    fn default() -> Self {
        RelationConventions {
            attribute_prefix: "metadata.".to_string(),
            entity_prefix: "employee.".to_string(),
        }
    }
}

impl RelationConventions {
    /// Returns the attribute key named by `field`, if it carries the
    /// attribute prefix.
    pub fn attribute_key<'a>(&self, field: &'a str) -> Option<&'a str> {
        strip(field, &self.attribute_prefix)
    }

    /// Returns the owner field named by `field`, if it carries the entity
    /// prefix.
    pub fn entity_field<'a>(&self, field: &'a str) -> Option<&'a str> {
        strip(field, &self.entity_prefix)
    }
}

// An empty prefix routes nothing.
fn strip<'a>(field: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        None
    } else {
        field.strip_prefix(prefix)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub codec: CodecOptions,
    pub relations: RelationConventions,
}

impl EngineConfig {
    /// Loads a configuration from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// - `Config` if the document is not valid YAML for this shape
    /// - `InvalidArgument` if a setting is blank where a value is required
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = if yaml.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that deserialization cannot.
    pub fn validate(&self) -> Result<()> {
        if self.codec.query_marker.is_empty() {
            return Err(QueryError::InvalidArgument(
                "codec.query_marker must not be empty".into(),
            ));
        }
        if self.codec.numeric_field.contains(['_', '[', ']']) {
            return Err(QueryError::InvalidArgument(format!(
                "codec.numeric_field '{}' cannot appear in a serialized condition",
                self.codec.numeric_field
            )));
        }
        Ok(())
    }
}
