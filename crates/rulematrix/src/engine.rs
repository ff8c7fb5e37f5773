use crate::codec::Codec;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::flat::FlatProcessor;
use crate::relational::{AttributeProcessor, EntityProcessor};

/// Hands out a codec and processors configured from one [`EngineConfig`].
///
/// # Example
///
/// ```
/// use rulematrix::Engine;
///
/// let engine = Engine::from_yaml("codec:\n  numeric_field: Tenure\n")?;
/// let matrix = engine.codec().parse("[_and][Tenure_gte_2]")?;
/// assert_eq!(engine.codec().serialize(&matrix), "[_and][Tenure_gte_2]");
/// # Ok::<(), rulematrix::QueryError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    /// Builds an engine from a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Engine::new(EngineConfig::from_yaml(yaml)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn codec(&self) -> Codec {
        Codec::new(self.config.codec.clone())
    }

    pub fn flat(&self) -> FlatProcessor {
        FlatProcessor::new()
    }

    pub fn entities(&self) -> EntityProcessor {
        EntityProcessor::new(self.config.relations.clone())
    }

    pub fn attributes(&self) -> AttributeProcessor {
        AttributeProcessor::new(self.config.relations.clone())
    }
}
