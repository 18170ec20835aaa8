//! Seams between asset data and the renderer.
//!
//! Import uploads through [`GpuBackend`] and drawing goes through
//! [`ShaderBinding`]; neither knows which graphics API sits behind it.
//! [`HeadlessBackend`] hands out ids without touching a GPU and tracks which
//! of them are still alive.

use rustc_hash::FxHashSet;

use crate::skinning::SkinnedVertex;
use crate::texture::{DecodedTexture, TextureId};

/// Backend handle of an uploaded vertex/index buffer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshBufferId(pub u32);

/// Creates and destroys GPU resources during import and teardown.
pub trait GpuBackend {
    /// Uploads a texture. Returning [`TextureId::NULL`] marks the upload as
    /// failed; the mesh is then drawn without that texture.
    fn create_texture(&mut self, texture: &DecodedTexture) -> TextureId;

    fn release_texture(&mut self, id: TextureId);

    fn create_mesh(&mut self, vertices: &[SkinnedVertex], indices: &[u32]) -> MeshBufferId;

    fn release_mesh(&mut self, id: MeshBufferId);
}

/// Receives the calls a model makes while drawing.
///
/// The caller has already bound the shader and uploaded the bone palette and
/// camera uniforms.
pub trait ShaderBinding {
    fn bind_texture(&mut self, unit: u32, uniform: &str, texture: TextureId);

    fn draw_indexed(&mut self, mesh: MeshBufferId, index_count: u32);
}

/// A backend without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    live_textures: FxHashSet<TextureId>,
    live_meshes: FxHashSet<MeshBufferId>,
    uploaded_bytes: usize,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        // Ids start at 1 so that 0 stays the null texture
        self.next_id += 1;
        self.next_id
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    #[must_use]
    pub fn live_meshes(&self) -> usize {
        self.live_meshes.len()
    }

    /// Total vertex, index and pixel bytes uploaded so far.
    #[must_use]
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_texture(&mut self, texture: &DecodedTexture) -> TextureId {
        let id = TextureId(self.allocate());
        self.uploaded_bytes += texture.pixels.len();
        self.live_textures.insert(id);
        id
    }

    fn release_texture(&mut self, id: TextureId) {
        if !self.live_textures.remove(&id) {
            log::warn!("Release of unknown texture {id:?}");
        }
    }

    fn create_mesh(&mut self, vertices: &[SkinnedVertex], indices: &[u32]) -> MeshBufferId {
        let id = MeshBufferId(self.allocate());
        self.uploaded_bytes += std::mem::size_of_val(vertices) + std::mem::size_of_val(indices);
        self.live_meshes.insert(id);
        id
    }

    fn release_mesh(&mut self, id: MeshBufferId) {
        if !self.live_meshes.remove(&id) {
            log::warn!("Release of unknown mesh buffer {id:?}");
        }
    }
}
