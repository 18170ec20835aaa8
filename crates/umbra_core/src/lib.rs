//! # Umbra Core
//!
//! Foundational types shared by the Umbra crates:
//!
//! - [`errors`]: the [`UmbraError`] type and [`Result`] alias
//! - [`math`]: the single importer-to-engine matrix conversion
//! - [`settings`]: [`ImportSettings`] and skinning constants
//! - [`import`]: the importer-neutral [`ImportedScene`] description

pub mod errors;
pub mod import;
pub mod math;
pub mod settings;

pub use errors::{Result, UmbraError};
pub use import::{
    IMPORT_IDENTITY, ImportedAnimation, ImportedBone, ImportedChannel, ImportedInterpolation,
    ImportedKey, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, ImportedWeight,
    TextureKind, TextureSource,
};
pub use math::{ImportMatrix, inverse_or_identity, mat4_from_import, mat4_to_import};
pub use settings::{
    DEFAULT_MAX_SHADER_BONES, DEFAULT_TICKS_PER_SECOND, ImportSettings, MAX_BONE_INFLUENCE,
};
