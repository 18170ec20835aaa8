//! Import Settings
//!
//! Knobs for asset import. The defaults reproduce the behaviour the game was
//! tuned against, so most callers use `ImportSettings::default()`.
//!
//! ```rust,ignore
//! use umbra::ImportSettings;
//!
//! let settings = ImportSettings {
//!     load_textures: false,
//!     ..Default::default()
//! };
//! ```
//!
//! Settings can also be read from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

/// Maximum number of bones influencing a single vertex.
pub const MAX_BONE_INFLUENCE: usize = 4;

/// Bone palette capacity of the stock skinning shader.
pub const DEFAULT_MAX_SHADER_BONES: usize = 200;

/// Playback rate used when an animation does not declare one.
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Bone weights at or below this value are treated as noise and dropped.
    pub weight_epsilon: f32,
    /// Rate substituted when an animation declares 0 ticks per second.
    pub default_ticks_per_second: f32,
    /// Deepest node nesting accepted when copying a scene hierarchy.
    pub max_hierarchy_depth: usize,
    /// When `false`, materials are ignored and meshes carry no textures.
    pub load_textures: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            weight_epsilon: 1e-6,
            default_ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            max_hierarchy_depth: 512,
            load_textures: true,
        }
    }
}

impl ImportSettings {
    /// Parses settings from a JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
