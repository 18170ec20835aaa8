use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use umbra_animation::BoneMap;
use umbra_core::{
    ImportSettings, ImportedMesh, ImportedScene, Result, TextureKind, UmbraError,
};

use crate::gpu::{GpuBackend, MeshBufferId, ShaderBinding};
use crate::skinning::{SkinnedVertex, extract_bone_weights};
use crate::texture::{TextureCache, TextureId};

/// A texture bound to a sampler uniform of the skinning shader.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    pub kind: TextureKind,
    pub unit: u32,
    /// `texture_diffuse1`, `texture_specular1`, ...
    pub uniform: String,
    pub texture: TextureId,
}

#[derive(Debug)]
pub struct SkinnedMesh {
    pub name: String,
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub textures: SmallVec<[TextureSlot; 4]>,
    buffer: Option<MeshBufferId>,
}

impl SkinnedMesh {
    /// `None` once the model has been released.
    #[must_use]
    pub fn buffer(&self) -> Option<MeshBufferId> {
        self.buffer
    }

    fn from_imported(mesh: &ImportedMesh, bone_map: &mut BoneMap, settings: &ImportSettings) -> Self {
        let vertices = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let attr3 = |data: &[[f32; 3]]| data.get(i).map_or(Vec3::ZERO, |&v| Vec3::from_array(v));
                let mut vertex = SkinnedVertex::new(
                    Vec3::from_array(position),
                    attr3(&mesh.normals),
                    mesh.tex_coords.get(i).map_or(Vec2::ZERO, |&uv| Vec2::from_array(uv)),
                );
                vertex.tangent = attr3(&mesh.tangents);
                vertex.bitangent = attr3(&mesh.bitangents);
                vertex
            })
            .collect::<Vec<_>>();

        let mut mesh_out = Self {
            name: mesh.name.clone(),
            vertices,
            indices: mesh.indices.clone(),
            textures: SmallVec::new(),
            buffer: None,
        };
        extract_bone_weights(&mut mesh_out.vertices, &mesh.bones, bone_map, settings);
        mesh_out
    }

    /// Binds the mesh's textures and issues one indexed draw.
    pub fn draw(&self, binding: &mut dyn ShaderBinding) {
        let Some(buffer) = self.buffer else {
            return;
        };
        for slot in &self.textures {
            binding.bind_texture(slot.unit, &slot.uniform, slot.texture);
        }
        binding.draw_indexed(buffer, self.indices.len() as u32);
    }
}

/// Numbers texture slots per kind from 1, in material order.
fn texture_slots(textures: &[(TextureKind, TextureId)]) -> SmallVec<[TextureSlot; 4]> {
    let mut counters = [0u32; 4];
    textures
        .iter()
        .enumerate()
        .map(|(unit, &(kind, texture))| {
            let counter = &mut counters[kind as usize];
            *counter += 1;
            TextureSlot {
                kind,
                unit: unit as u32,
                uniform: format!("{}{}", kind.uniform_prefix(), counter),
                texture,
            }
        })
        .collect()
}

/// A skinned model: its meshes, their GPU buffers and textures, and the bone
/// map that every clip played on it must be built from.
///
/// GPU handles are released explicitly with [`Model::release`].
#[derive(Debug)]
pub struct Model {
    meshes: Vec<SkinnedMesh>,
    bone_map: BoneMap,
    directory: PathBuf,
    textures: Vec<TextureId>,
}

impl Model {
    /// Builds a model from an imported scene and uploads it through `backend`.
    ///
    /// Meshes are collected depth-first from the root node; a mesh referenced
    /// by two nodes is built twice. `directory` resolves relative texture
    /// paths.
    pub fn from_imported(
        scene: &ImportedScene,
        directory: &Path,
        backend: &mut dyn GpuBackend,
        settings: &ImportSettings,
    ) -> Result<Self> {
        let mesh_order = mesh_order(scene, settings.max_hierarchy_depth)?;
        // Nothing is uploaded until every reference resolves
        if let Some(&bad) = mesh_order.iter().find(|&&idx| idx >= scene.meshes.len()) {
            return Err(UmbraError::SceneParse {
                path: scene.label.clone(),
                reason: format!("node references mesh {bad} of {}", scene.meshes.len()),
            });
        }

        let mut bone_map = BoneMap::new();
        let mut cache = TextureCache::new();
        let mut meshes = Vec::with_capacity(mesh_order.len());

        for mesh_idx in mesh_order {
            let Some(imported) = scene.meshes.get(mesh_idx) else {
                continue;
            };

            let mut mesh = SkinnedMesh::from_imported(imported, &mut bone_map, settings);

            if settings.load_textures {
                if let Some(material) = imported.material.and_then(|m| scene.materials.get(m)) {
                    let ids: Vec<(TextureKind, TextureId)> = material
                        .textures
                        .iter()
                        .map(|(kind, source)| (*kind, cache.get_or_load(source, directory, backend)))
                        .collect();
                    mesh.textures = texture_slots(&ids);
                }
            }

            mesh.buffer = Some(backend.create_mesh(&mesh.vertices, &mesh.indices));
            meshes.push(mesh);
        }

        if meshes.is_empty() {
            log::warn!("'{}' contains no meshes", scene.label);
        }
        if cache.failures() > 0 {
            log::warn!(
                "'{}': {} texture(s) could not be loaded",
                scene.label,
                cache.failures()
            );
        }
        log::info!(
            "Loaded model '{}': {} meshes, {} bones, {} textures",
            scene.label,
            meshes.len(),
            bone_map.len(),
            cache.textures().count()
        );

        Ok(Self {
            meshes,
            bone_map,
            directory: directory.to_path_buf(),
            textures: cache.textures().collect(),
        })
    }

    #[must_use]
    pub fn meshes(&self) -> &[SkinnedMesh] {
        &self.meshes
    }

    #[must_use]
    pub fn bone_map(&self) -> &BoneMap {
        &self.bone_map
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bone_map.len()
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Distinct textures owned by this model.
    #[must_use]
    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// Draws every mesh. The bone palette must already be bound.
    pub fn draw(&self, binding: &mut dyn ShaderBinding) {
        for mesh in &self.meshes {
            mesh.draw(binding);
        }
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.textures.is_empty() && self.meshes.iter().all(|m| m.buffer.is_none())
    }

    /// Releases every mesh buffer and texture. Drawing afterwards is a no-op.
    pub fn release(&mut self, backend: &mut dyn GpuBackend) {
        for mesh in &mut self.meshes {
            if let Some(buffer) = mesh.buffer.take() {
                backend.release_mesh(buffer);
            }
            for slot in &mut mesh.textures {
                slot.texture = TextureId::NULL;
            }
        }
        for texture in self.textures.drain(..) {
            backend.release_texture(texture);
        }
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if !self.is_released() {
            log::warn!(
                "Model from '{}' dropped without release; its GPU buffers leak",
                self.directory.display()
            );
        }
    }
}

/// Mesh indices in depth-first node order from the scene root.
fn mesh_order(scene: &ImportedScene, max_depth: usize) -> Result<Vec<usize>> {
    let root = scene
        .root
        .filter(|&idx| idx < scene.nodes.len())
        .ok_or_else(|| UmbraError::MissingRoot(scene.label.clone()))?;

    let mut visited = vec![false; scene.nodes.len()];
    let mut order = Vec::new();
    let mut stack = vec![(root, 0usize)];

    while let Some((idx, depth)) = stack.pop() {
        let node = scene.nodes.get(idx).ok_or_else(|| {
            UmbraError::InvalidHierarchy(format!("node index {idx} out of range"))
        })?;
        if std::mem::replace(&mut visited[idx], true) {
            return Err(UmbraError::InvalidHierarchy(format!(
                "node '{}' is reachable more than once",
                node.name
            )));
        }
        if depth > max_depth {
            return Err(UmbraError::InvalidHierarchy(format!(
                "node '{}' nests deeper than {max_depth}",
                node.name
            )));
        }

        order.extend_from_slice(&node.meshes);
        stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::ImportedNode;

    #[test]
    fn slots_are_numbered_per_kind() {
        let slots = texture_slots(&[
            (TextureKind::Diffuse, TextureId(4)),
            (TextureKind::Specular, TextureId(5)),
            (TextureKind::Diffuse, TextureId(6)),
        ]);
        let uniforms: Vec<_> = slots.iter().map(|s| (s.unit, s.uniform.as_str())).collect();
        assert_eq!(
            uniforms,
            [(0, "texture_diffuse1"), (1, "texture_specular1"), (2, "texture_diffuse2")]
        );
    }

    #[test]
    fn meshes_follow_node_order() {
        let mut root = ImportedNode::new("root");
        root.children = vec![1, 2];
        root.meshes = vec![2];
        let mut a = ImportedNode::new("a");
        a.meshes = vec![0];
        let mut b = ImportedNode::new("b");
        b.meshes = vec![1, 0];
        let scene = ImportedScene {
            nodes: vec![root, a, b],
            root: Some(0),
            ..Default::default()
        };
        assert_eq!(mesh_order(&scene, 8).unwrap(), [2, 0, 1, 0]);
    }

    #[test]
    fn missing_attributes_are_zero() {
        let mesh = ImportedMesh {
            positions: vec![[1.0, 2.0, 3.0]],
            ..Default::default()
        };
        let mut map = BoneMap::new();
        let built = SkinnedMesh::from_imported(&mesh, &mut map, &ImportSettings::default());
        let v = built.vertices[0];
        assert_eq!(v.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.normal, Vec3::ZERO);
        assert_eq!(v.tex_coords, Vec2::ZERO);
        assert_eq!(v.weights[0], 1.0);
    }
}
