//! Configuration for object wrappers
//!
//! The defaults match what the editor uses. A TOML file can override any subset:
//!
//! ```toml
//! render_layer_mask = 1
//! fallback_half_extents = 0.25
//! outline_color = { r = 0.0, g = 1.0, b = 0.0, a = 1.0 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec::Color;
use crate::error::{IgdeError, Result};

/// Tunables used by [`ObjectWrapper`](crate::wrapper::ObjectWrapper)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// Layer mask assigned to rendered sub-objects
    pub render_layer_mask: u32,
    /// Layer mask added when a sub-object renders into environment maps
    pub render_env_map_mask: u32,
    /// Layer mask added when a sub-object affects audio
    pub audio_layer_mask: u32,
    /// Half extents of the fallback collider box used when nothing has extents
    pub fallback_half_extents: f32,
    /// Mass of the fallback collider
    pub fallback_mass: f32,
    /// Combined extents thinner than this along an axis get padded
    pub degenerate_extent: f32,
    /// Padding applied to each side of a degenerate axis
    pub extent_padding: f32,
    /// Scaling components are clamped away from zero to this magnitude
    pub min_scaling: f32,
    /// Color of the selection outline
    pub outline_color: Color,
    /// Thickness of the selection outline
    pub outline_thickness: f32,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            render_layer_mask: 0x1,
            render_env_map_mask: 0x2,
            audio_layer_mask: 0x4,
            fallback_half_extents: 0.1,
            fallback_mass: 5.0,
            degenerate_extent: 0.001,
            extent_padding: 0.0005,
            min_scaling: 1e-5,
            outline_color: Color::rgb(1.0, 0.0, 0.0),
            outline_thickness: 0.005,
        }
    }
}

impl WrapperConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| IgdeError::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
