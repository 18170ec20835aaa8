//! # Umbra Assets
//!
//! Turns rigged asset files into skinned [`Model`]s and animation clips.
//!
//! - [`skinning`]: the vertex layout and bone-weight extraction
//! - [`texture`]: decoding and de-duplicating material textures
//! - [`gpu`]: the upload and draw seams towards the renderer
//! - [`model`]: meshes, textures and the model's bone map
//! - [`loaders`]: `load_model` / `load_animation` and the glTF front-end

pub mod gpu;
pub mod loaders;
pub mod model;
pub mod skinning;
pub mod texture;

pub use gpu::{GpuBackend, HeadlessBackend, MeshBufferId, ShaderBinding};
pub use loaders::{
    import_scene, import_scene_from_slice, load_animation, load_animation_from_slice,
    load_animations, load_animations_from_slice, load_model, load_model_from_slice,
};
pub use model::{Model, SkinnedMesh, TextureSlot};
pub use skinning::{BoneInfluences, NO_BONE, SkinnedVertex, extract_bone_weights};
pub use texture::{DecodedTexture, PixelFormat, TextureCache, TextureId, decode_texture};
