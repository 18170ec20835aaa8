//! Entry points used by the render loop.
//!
//! Formats are picked by file extension. Every load either returns a fully
//! built value or an error; failures are also logged here so that callers
//! which only check `is_err()` still leave a diagnostic behind.

use std::path::Path;

use umbra_animation::{AnimationClip, AnimationLibrary};
use umbra_core::{ImportSettings, ImportedScene, Result, UmbraError};

use crate::gpu::GpuBackend;
use crate::model::Model;

#[cfg(feature = "gltf")]
pub mod gltf;

/// Parses the scene at `path` into the importer-neutral description.
pub fn import_scene(path: &Path) -> Result<ImportedScene> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        #[cfg(feature = "gltf")]
        "gltf" | "glb" => gltf::import_gltf_file(path),
        _ => Err(UmbraError::SceneParse {
            path: path.display().to_string(),
            reason: format!("no importer for '.{ext}' files"),
        }),
    }
}

/// Parses an in-memory scene. `directory` resolves external files.
pub fn import_scene_from_slice(bytes: &[u8], label: &str, directory: &Path) -> Result<ImportedScene> {
    #[cfg(feature = "gltf")]
    {
        gltf::import_gltf_slice(bytes, label, directory)
    }
    #[cfg(not(feature = "gltf"))]
    {
        let _ = (bytes, directory);
        Err(UmbraError::SceneParse {
            path: label.to_string(),
            reason: "built without an importer".to_string(),
        })
    }
}

fn report<T>(what: &str, source: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        log::error!("Failed to load {what} from '{source}': {err}");
    }
    result
}

/// Loads a skinned model and uploads it through `backend`.
pub fn load_model(
    path: &Path,
    backend: &mut dyn GpuBackend,
    settings: &ImportSettings,
) -> Result<Model> {
    let result = import_scene(path).and_then(|scene| {
        let directory = path.parent().unwrap_or_else(|| Path::new("./"));
        Model::from_imported(&scene, directory, backend, settings)
    });
    report("model", &path.display().to_string(), result)
}

pub fn load_model_from_slice(
    bytes: &[u8],
    label: &str,
    directory: &Path,
    backend: &mut dyn GpuBackend,
    settings: &ImportSettings,
) -> Result<Model> {
    let result = import_scene_from_slice(bytes, label, directory)
        .and_then(|scene| Model::from_imported(&scene, directory, backend, settings));
    report("model", label, result)
}

/// Loads the first animation of the asset at `path`, bound to `model`.
///
/// The clip must only be played on `model`; see
/// [`AnimationClip::validate_against`].
pub fn load_animation(path: &Path, model: &Model, settings: &ImportSettings) -> Result<AnimationClip> {
    let result = import_scene(path)
        .and_then(|scene| AnimationClip::from_imported(&scene, model.bone_map(), settings));
    report("animation", &path.display().to_string(), result)
}

pub fn load_animation_from_slice(
    bytes: &[u8],
    label: &str,
    directory: &Path,
    model: &Model,
    settings: &ImportSettings,
) -> Result<AnimationClip> {
    let result = import_scene_from_slice(bytes, label, directory)
        .and_then(|scene| AnimationClip::from_imported(&scene, model.bone_map(), settings));
    report("animation", label, result)
}

/// Loads every animation of the asset at `path`, bound to `model`.
pub fn load_animations(
    path: &Path,
    model: &Model,
    settings: &ImportSettings,
) -> Result<AnimationLibrary> {
    let result = import_scene(path)
        .and_then(|scene| AnimationLibrary::from_imported(&scene, model.bone_map(), settings));
    report("animations", &path.display().to_string(), result)
}

pub fn load_animations_from_slice(
    bytes: &[u8],
    label: &str,
    directory: &Path,
    model: &Model,
    settings: &ImportSettings,
) -> Result<AnimationLibrary> {
    let result = import_scene_from_slice(bytes, label, directory)
        .and_then(|scene| AnimationLibrary::from_imported(&scene, model.bone_map(), settings));
    report("animations", label, result)
}
