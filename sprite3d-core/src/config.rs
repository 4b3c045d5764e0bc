use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graphics::MAX_CAPACITY;

/// Default number of quads buffered before a flush is forced.
/// 2000 is a nice balance between mobile and desktop.
pub const DEFAULT_CAPACITY: usize = 2000;

/// Tunables for the sprite renderer.
///
/// ```toml
/// capacity = 2000
/// round_pixels = false
/// clear_color = [0.0, 0.0, 0.0, 1.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Maximum number of quads per flush cycle.
    pub capacity: usize,
    /// Truncate packed vertex positions toward zero.
    pub round_pixels: bool,
    /// Clear color used by hosts that own the render pass.
    pub clear_color: [f64; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            round_pixels: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RendererConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_round_pixels(mut self, round_pixels: bool) -> Self {
        self.round_pixels = round_pixels;
        self
    }

    /// Checks the values a renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: format!("{} is outside 1..={MAX_CAPACITY}", self.capacity),
            });
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "clear_color",
                reason: format!("{:?} contains a non-finite channel", self.clear_color),
            });
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RendererConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert!(!config.round_pixels);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RendererConfig::from_toml_str("round_pixels = true").unwrap();
        assert!(config.round_pixels);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn rejects_capacity_out_of_range() {
        assert!(matches!(
            RendererConfig::from_toml_str("capacity = 0"),
            Err(ConfigError::Invalid { field: "capacity", .. })
        ));
        let too_big = format!("capacity = {}", MAX_CAPACITY + 1);
        assert!(RendererConfig::from_toml_str(&too_big).is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            RendererConfig::from_toml_str("capacity = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = RendererConfig::default().with_capacity(64).with_round_pixels(true);
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(RendererConfig::from_toml_str(&text).unwrap(), config);
    }
}
