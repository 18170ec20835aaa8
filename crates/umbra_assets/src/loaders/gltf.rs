//! glTF 2.0 front-end.
//!
//! Converts a `.gltf`/`.glb` document into an [`ImportedScene`]. Everything
//! downstream (bone weights, clips, textures) works on that description, so
//! this is the only place that knows about the `gltf` crate.

use std::path::{Path, PathBuf};

use glam::Vec3;
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use rustc_hash::FxHashMap;

use umbra_core::{
    IMPORT_IDENTITY, ImportedAnimation, ImportedBone, ImportedChannel, ImportedInterpolation,
    ImportedKey, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, ImportedWeight,
    Result, TextureKind, TextureSource, UmbraError,
};

use crate::texture::decode_data_uri;

/// Parses a glTF document held in memory.
///
/// `directory` resolves external buffers and images; `label` names the asset
/// in diagnostics.
pub fn import_gltf_slice(bytes: &[u8], label: &str, directory: &Path) -> Result<ImportedScene> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| UmbraError::SceneParse {
        path: label.to_string(),
        reason: e.to_string(),
    })?;
    let buffers = load_buffers(&gltf, directory)?;

    let mut importer = GltfImporter {
        document: &gltf.document,
        buffers: &buffers,
        scene: ImportedScene {
            label: label.to_string(),
            ..Default::default()
        },
        mesh_cache: FxHashMap::default(),
    };
    importer.import_nodes()?;
    importer.import_materials();
    importer.import_animations()?;

    let scene = importer.scene;
    log::debug!(
        "Imported '{label}': {} nodes, {} meshes, {} materials, {} animations",
        scene.nodes.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.animations.len()
    );
    Ok(scene)
}

/// Reads and parses a glTF file.
pub fn import_gltf_file(path: &Path) -> Result<ImportedScene> {
    let bytes = std::fs::read(path).map_err(|e| UmbraError::SceneParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let directory = path.parent().unwrap_or_else(|| Path::new("./"));
    import_gltf_slice(&bytes, &path.display().to_string(), directory)
}

fn load_buffers(gltf: &gltf::Gltf, directory: &Path) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| UmbraError::GltfError("missing GLB binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)
                .ok_or_else(|| {
                    UmbraError::GltfError(format!("malformed data URI in buffer {}", buffer.index()))
                })?,
            gltf::buffer::Source::Uri(uri) => {
                let buffer_path = directory.join(uri);
                std::fs::read(&buffer_path).map_err(|e| {
                    UmbraError::GltfError(format!(
                        "failed to read buffer file {}: {e}",
                        buffer_path.display()
                    ))
                })?
            }
        };
        if data.len() < buffer.length() {
            return Err(UmbraError::GltfError(format!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffer_data.push(data);
    }
    Ok(buffer_data)
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("node_{}", node.index()), str::to_string)
}

struct GltfImporter<'a> {
    document: &'a gltf::Document,
    buffers: &'a [Vec<u8>],
    scene: ImportedScene,
    // (glTF mesh, skin) -> imported mesh indices, one per primitive
    mesh_cache: FxHashMap<(usize, Option<usize>), Vec<usize>>,
}

impl GltfImporter<'_> {
    // --- Nodes ---

    fn import_nodes(&mut self) -> Result<()> {
        let document = self.document;
        for node in document.nodes() {
            let mut imported = ImportedNode::new(node_name(&node));
            imported.transform = node.transform().matrix();
            imported.children = node.children().map(|c| c.index()).collect();
            if let Some(mesh) = node.mesh() {
                imported.meshes = self.import_mesh(&mesh, node.skin().as_ref())?;
            }
            self.scene.nodes.push(imported);
        }

        let scene = document.default_scene().or_else(|| document.scenes().next());
        let (roots, scene_name): (Vec<usize>, Option<String>) = match &scene {
            Some(s) => (s.nodes().map(|n| n.index()).collect(), s.name().map(str::to_string)),
            None => {
                // No scene list: every node nobody points at is a root
                let mut is_child = vec![false; self.scene.nodes.len()];
                for node in &self.scene.nodes {
                    for &c in &node.children {
                        if let Some(flag) = is_child.get_mut(c) {
                            *flag = true;
                        }
                    }
                }
                let roots = (0..is_child.len()).filter(|&i| !is_child[i]).collect();
                (roots, None)
            }
        };

        self.scene.root = match roots.as_slice() {
            [] => None,
            [single] => Some(*single),
            several => {
                let mut root = ImportedNode::new(scene_name.unwrap_or_else(|| "Scene".to_string()));
                root.transform = IMPORT_IDENTITY;
                root.children = several.to_vec();
                self.scene.nodes.push(root);
                Some(self.scene.nodes.len() - 1)
            }
        };

        if self.scene.root.is_none() {
            return Err(UmbraError::MissingRoot(self.scene.label.clone()));
        }
        Ok(())
    }

    // --- Meshes ---

    fn import_mesh(&mut self, mesh: &gltf::Mesh, skin: Option<&gltf::Skin>) -> Result<Vec<usize>> {
        let key = (mesh.index(), skin.map(gltf::Skin::index));
        if let Some(indices) = self.mesh_cache.get(&key) {
            return Ok(indices.clone());
        }

        let base_name = mesh
            .name()
            .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);

        let split = mesh.primitives().count() > 1;
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Mesh '{base_name}' primitive {} is {:?}, not triangles; skipped",
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let name = if split {
                format!("{base_name}_{}", primitive.index())
            } else {
                base_name.clone()
            };
            let Some(imported) = self.import_primitive(&primitive, name, skin) else {
                continue;
            };
            self.scene.meshes.push(imported);
            indices.push(self.scene.meshes.len() - 1);
        }

        self.mesh_cache.insert(key, indices.clone());
        Ok(indices)
    }

    fn import_primitive(
        &self,
        primitive: &gltf::Primitive,
        name: String,
        skin: Option<&gltf::Skin>,
    ) -> Option<ImportedMesh> {
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let Some(positions) = reader.read_positions() else {
            log::warn!("Mesh '{name}' has a primitive without positions; skipped");
            return None;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let vertex_count = positions.len();

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(Iterator::collect)
            .unwrap_or_default();
        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|r| r.into_f32().collect())
            .unwrap_or_default();

        // glTF stores handedness in w; the bitangent is derived from it
        let mut tangents = Vec::new();
        let mut bitangents = Vec::new();
        if let Some(iter) = reader.read_tangents() {
            for (i, t) in iter.enumerate() {
                let tangent = Vec3::new(t[0], t[1], t[2]);
                let normal = normals.get(i).map_or(Vec3::ZERO, |&n| Vec3::from_array(n));
                tangents.push(tangent.to_array());
                bitangents.push((normal.cross(tangent) * t[3]).to_array());
            }
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..vertex_count as u32).collect(),
        };

        let bones = match skin {
            Some(skin) => {
                let mut sets: Vec<(Vec<[u16; 4]>, Vec<[f32; 4]>)> = Vec::new();
                let mut set = 0;
                while let (Some(joints), Some(weights)) =
                    (reader.read_joints(set), reader.read_weights(set))
                {
                    sets.push((joints.into_u16().collect(), weights.into_f32().collect()));
                    set += 1;
                }
                self.import_skin_weights(skin, &sets, vertex_count, &name)
            }
            None => Vec::new(),
        };

        Some(ImportedMesh {
            name,
            positions,
            normals,
            tex_coords,
            tangents,
            bitangents,
            indices,
            material: primitive.material().index(),
            bones,
        })
    }

    /// One bone per skin joint, in joint order, with the inverse bind matrix
    /// as its offset and every JOINTS_n/WEIGHTS_n set applied.
    fn import_skin_weights(
        &self,
        skin: &gltf::Skin,
        sets: &[(Vec<[u16; 4]>, Vec<[f32; 4]>)],
        vertex_count: usize,
        mesh_name: &str,
    ) -> Vec<ImportedBone> {
        let buffers = self.buffers;
        let skin_reader = skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let inverse_binds: Vec<[[f32; 4]; 4]> = skin_reader
            .read_inverse_bind_matrices()
            .map(Iterator::collect)
            .unwrap_or_default();

        let mut bones: Vec<ImportedBone> = skin
            .joints()
            .enumerate()
            .map(|(j, joint)| ImportedBone {
                name: node_name(&joint),
                offset: inverse_binds.get(j).copied().unwrap_or(IMPORT_IDENTITY),
                weights: Vec::new(),
            })
            .collect();

        let mut out_of_range = 0usize;
        for (joints, weights) in sets {
            for (vertex, (joint_ids, joint_weights)) in
                joints.iter().zip(weights).enumerate().take(vertex_count)
            {
                for (&joint, &weight) in joint_ids.iter().zip(joint_weights) {
                    if weight <= 0.0 {
                        continue;
                    }
                    match bones.get_mut(usize::from(joint)) {
                        Some(bone) => bone.weights.push(ImportedWeight {
                            vertex: vertex as u32,
                            weight,
                        }),
                        None => out_of_range += 1,
                    }
                }
            }
        }

        if out_of_range > 0 {
            log::warn!("Mesh '{mesh_name}': {out_of_range} weights name joints outside the skin");
        }
        bones
    }

    // --- Materials ---

    fn import_materials(&mut self) {
        let document = self.document;
        for material in document.materials() {
            let name = material
                .name()
                .map_or_else(|| format!("material_{}", material.index().unwrap_or(0)), str::to_string);
            let pbr = material.pbr_metallic_roughness();

            let slots = [
                (TextureKind::Diffuse, pbr.base_color_texture().map(|i| i.texture())),
                (TextureKind::Specular, pbr.metallic_roughness_texture().map(|i| i.texture())),
                (TextureKind::Normal, material.normal_texture().map(|i| i.texture())),
                (TextureKind::Height, material.occlusion_texture().map(|i| i.texture())),
            ];
            let textures = slots
                .into_iter()
                .filter_map(|(kind, texture)| {
                    let source = self.texture_source(&texture?.source())?;
                    Some((kind, source))
                })
                .collect();

            self.scene.materials.push(ImportedMaterial { name, textures });
        }
    }

    fn texture_source(&self, image: &gltf::Image) -> Option<TextureSource> {
        let key = format!("{}#image{}", self.scene.label, image.index());
        match image.source() {
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                match decode_data_uri(uri) {
                    Some(bytes) => Some(TextureSource::Embedded { key, bytes }),
                    None => {
                        log::warn!("Image {} has a malformed data URI", image.index());
                        None
                    }
                }
            }
            gltf::image::Source::Uri { uri, .. } => Some(TextureSource::File(PathBuf::from(uri))),
            gltf::image::Source::View { view, .. } => {
                let start = view.offset();
                let end = start + view.length();
                let bytes = self.buffers.get(view.buffer().index())?.get(start..end)?;
                Some(TextureSource::Embedded {
                    key,
                    bytes: bytes.to_vec(),
                })
            }
        }
    }

    // --- Animations ---

    fn import_animations(&mut self) -> Result<()> {
        let document = self.document;
        for animation in document.animations() {
            let imported = self.import_animation(&animation)?;
            self.scene.animations.push(imported);
        }
        Ok(())
    }

    fn import_animation(&self, animation: &gltf::Animation) -> Result<ImportedAnimation> {
        let anim_name = animation
            .name()
            .map_or_else(|| format!("animation_{}", animation.index()), str::to_string);

        let mut channels: Vec<ImportedChannel> = Vec::new();
        let mut by_node: FxHashMap<usize, usize> = FxHashMap::default();
        let mut duration = 0.0f32;

        for channel in animation.channels() {
            let target = channel.target();
            let node = target.node();
            let buffers = self.buffers;
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
                log::warn!(
                    "Animation '{anim_name}': channel for node {} has no data; skipped",
                    node.index()
                );
                continue;
            };
            let times: Vec<f32> = inputs.collect();

            let interpolation = match channel.sampler().interpolation() {
                Interpolation::Linear => ImportedInterpolation::Linear,
                Interpolation::Step => ImportedInterpolation::Step,
                Interpolation::CubicSpline => ImportedInterpolation::CubicSpline,
            };
            let cubic = interpolation == ImportedInterpolation::CubicSpline;

            if let ReadOutputs::MorphTargetWeights(_) = outputs {
                log::debug!("Animation '{anim_name}': morph weights ignored");
                continue;
            }
            let slot = *by_node.entry(node.index()).or_insert_with(|| {
                channels.push(ImportedChannel::new(node_name(&node)));
                channels.len() - 1
            });
            let out = &mut channels[slot];

            match outputs {
                ReadOutputs::Translations(values) => {
                    out.positions = keys(&anim_name, &times, values.collect(), cubic)?;
                    out.position_interpolation = interpolation;
                }
                ReadOutputs::Rotations(values) => {
                    out.rotations = keys(&anim_name, &times, values.into_f32().collect(), cubic)?;
                    out.rotation_interpolation = interpolation;
                }
                ReadOutputs::Scales(values) => {
                    out.scales = keys(&anim_name, &times, values.collect(), cubic)?;
                    out.scale_interpolation = interpolation;
                }
                ReadOutputs::MorphTargetWeights(_) => {}
            }

            if let Some(&last) = times.last() {
                duration = duration.max(last);
            }
        }

        Ok(ImportedAnimation {
            name: animation.name().map(str::to_string),
            duration,
            // glTF keys are in seconds
            ticks_per_second: 1.0,
            channels,
        })
    }
}

/// Pairs key times with output values.
///
/// Cubic-spline outputs come as (in-tangent, value, out-tangent) triples;
/// only the value is kept.
fn keys<T: Copy>(
    animation: &str,
    times: &[f32],
    values: Vec<T>,
    cubic: bool,
) -> Result<Vec<ImportedKey<T>>> {
    let values: Vec<T> = if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    };
    if values.len() != times.len() {
        return Err(UmbraError::GltfError(format!(
            "animation '{animation}': {} key times but {} values",
            times.len(),
            values.len()
        )));
    }
    Ok(times
        .iter()
        .zip(values)
        .map(|(&time, value)| ImportedKey { time, value })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_outputs_keep_the_middle_value() {
        let k = keys("a", &[0.0, 1.0], vec![9, 1, 9, 9, 2, 9], true).unwrap();
        assert_eq!(k.iter().map(|k| k.value).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn count_mismatch_is_an_error() {
        assert!(matches!(
            keys("a", &[0.0, 1.0], vec![1], false),
            Err(UmbraError::GltfError(_))
        ));
    }

    #[test]
    fn garbage_is_a_parse_failure() {
        let err = import_gltf_slice(b"not gltf", "junk", Path::new(".")).unwrap_err();
        assert!(matches!(err, UmbraError::SceneParse { .. }));
        assert!(err.is_import_failure());
    }
}
