//! Error Types
//!
//! This module defines the error type shared by every Umbra crate.
//!
//! # Overview
//!
//! The main error type [`UmbraError`] covers all failure modes of the
//! skeletal pipeline:
//! - Import failures (unparseable scene, missing root, no animation tracks,
//!   malformed hierarchy or keyframes). These abort the load of that asset.
//! - Texture failures. These never reach the caller of `load_model`; the
//!   loader logs them and substitutes the null texture.
//! - Binding mismatches between a clip and the model it is played against.
//!
//! Irregular skinning data (near-zero weights, too many influences, vertices
//! without weights) is repaired during import and is not an error.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, UmbraError>`.

use thiserror::Error;

/// The main error type for Umbra.
#[derive(Error, Debug)]
pub enum UmbraError {
    // ========================================================================
    // Import Errors
    // ========================================================================
    /// The scene file could not be parsed.
    #[error("Failed to parse scene '{path}': {reason}")]
    SceneParse {
        /// Path (or label) of the asset
        path: String,
        /// Parser diagnostic
        reason: String,
    },

    /// The scene has no root node to build a hierarchy from.
    #[error("Scene '{0}' has no root node")]
    MissingRoot(String),

    /// An animation was requested from a scene that declares none.
    #[error("Scene '{0}' declares no animation tracks")]
    NoAnimations(String),

    /// The node graph is not a tree or nests deeper than allowed.
    #[error("Invalid node hierarchy: {0}")]
    InvalidHierarchy(String),

    /// A keyframe sequence violates the ordering invariants.
    #[error("Invalid keyframes in channel '{channel}': {reason}")]
    InvalidKeyframes {
        /// Name of the bone channel
        channel: String,
        /// What was wrong
        reason: String,
    },

    /// glTF parsing or loading error.
    #[error("glTF error: {0}")]
    GltfError(String),

    // ========================================================================
    // Texture Errors
    // ========================================================================
    /// The texture file could not be read.
    #[error("Texture '{path}' could not be loaded: {reason}")]
    TextureLoad {
        /// Texture path as referenced by the material
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// The decoded image has a channel layout the renderer cannot upload.
    #[error("Texture '{path}' has unsupported layout {layout}")]
    UnsupportedTextureLayout {
        /// Texture path as referenced by the material
        path: String,
        /// Human readable description of the layout
        layout: String,
    },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    // ========================================================================
    // Binding Errors
    // ========================================================================
    /// A clip was paired with a model whose bone ids it does not share.
    #[error("Animation clip '{clip}' was not built against this model's rig: {reason}")]
    BindingMismatch {
        /// Name of the clip
        clip: String,
        /// First detected difference
        reason: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl UmbraError {
    /// Returns `true` for errors that abort an asset load.
    #[must_use]
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self,
            UmbraError::SceneParse { .. }
                | UmbraError::MissingRoot(_)
                | UmbraError::NoAnimations(_)
                | UmbraError::InvalidHierarchy(_)
                | UmbraError::InvalidKeyframes { .. }
                | UmbraError::GltfError(_)
                | UmbraError::IoError(_)
        )
    }

    /// Returns `true` for errors that only affect a single texture.
    #[must_use]
    pub fn is_texture_failure(&self) -> bool {
        matches!(
            self,
            UmbraError::TextureLoad { .. }
                | UmbraError::UnsupportedTextureLayout { .. }
                | UmbraError::ImageDecodeError(_)
        )
    }
}

/// Alias for `Result<T, UmbraError>`.
pub type Result<T> = std::result::Result<T, UmbraError>;
