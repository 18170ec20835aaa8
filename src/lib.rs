#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Umbra
//!
//! Skeletal animation core of a small first-person horror game.
//!
//! Load a rigged model, load a clip built against that model's bones, and
//! feed the animator's palette to the skinning shader every frame:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use umbra::prelude::*;
//!
//! let settings = ImportSettings::default();
//! let mut backend = HeadlessBackend::new();
//!
//! let mut model = load_model(Path::new("assets/crawler.glb"), &mut backend, &settings)?;
//! let clip = Arc::new(load_animation(Path::new("assets/crawler.glb"), &model, &settings)?);
//! let mut animator = Animator::new(clip);
//!
//! // Every frame:
//! animator.update(dt);
//! let palette = animator.palette(DEFAULT_MAX_SHADER_BONES);
//! model.draw(&mut shader);
//!
//! // Teardown:
//! model.release(&mut backend);
//! ```

pub use umbra_animation as animation;
pub use umbra_assets as assets;
pub use umbra_core as core;

pub use umbra_core::{
    DEFAULT_MAX_SHADER_BONES, ImportSettings, MAX_BONE_INFLUENCE, Result, UmbraError,
    mat4_from_import,
};

pub use umbra_animation::{
    AnimationClip, AnimationLibrary, Animator, BoneChannel, BoneId, BoneInfo, BoneMap, Hierarchy,
    LocalPose,
};

pub use umbra_assets::{
    GpuBackend, HeadlessBackend, Model, ShaderBinding, SkinnedVertex, TextureId, load_animation,
    load_animation_from_slice, load_animations, load_model, load_model_from_slice,
};

pub mod prelude {
    pub use std::path::Path;

    pub use crate::{
        AnimationClip, AnimationLibrary, Animator, BoneMap, DEFAULT_MAX_SHADER_BONES,
        GpuBackend, HeadlessBackend, ImportSettings, Model, ShaderBinding, TextureId,
        UmbraError, load_animation, load_animations, load_model,
    };
}
