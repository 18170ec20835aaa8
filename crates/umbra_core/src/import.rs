//! Importer-neutral scene description.
//!
//! Front-ends (currently glTF) translate their documents into an
//! [`ImportedScene`]; model and clip construction only ever read this form.
//! Matrices stay in importer layout ([`ImportMatrix`]) until they are
//! converted with [`crate::math::mat4_from_import`].

use std::path::PathBuf;

use crate::math::ImportMatrix;

/// Identity in importer layout.
pub const IMPORT_IDENTITY: ImportMatrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    /// Label used in diagnostics, usually the source path.
    pub label: String,
    /// Node arena; `children` and `root` index into it.
    pub nodes: Vec<ImportedNode>,
    pub root: Option<usize>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub animations: Vec<ImportedAnimation>,
}

impl ImportedScene {
    #[must_use]
    pub fn root_node(&self) -> Option<&ImportedNode> {
        self.root.and_then(|idx| self.nodes.get(idx))
    }
}

#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    /// Local transform relative to the parent node.
    pub transform: ImportMatrix,
    pub children: Vec<usize>,
    /// Meshes drawn at this node, as indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
}

impl ImportedNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: IMPORT_IDENTITY,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
    pub bones: Vec<ImportedBone>,
}

/// A bone attachment: which vertices of the mesh the bone pulls, and how hard.
#[derive(Debug, Clone)]
pub struct ImportedBone {
    pub name: String,
    /// Bind-pose inverse: mesh space to bone space.
    pub offset: ImportMatrix,
    pub weights: Vec<ImportedWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedWeight {
    pub vertex: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    /// Sampler uniform prefix expected by the skinning shader.
    #[must_use]
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Path relative to the asset directory, or a `data:` URI.
    File(PathBuf),
    /// Image bytes stored inside the asset.
    Embedded { key: String, bytes: Vec<u8> },
}

impl TextureSource {
    /// Key used to share one texture between materials.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            TextureSource::File(path) => path.to_string_lossy().into_owned(),
            TextureSource::Embedded { key, .. } => key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMaterial {
    pub name: String,
    pub textures: Vec<(TextureKind, TextureSource)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportedInterpolation {
    #[default]
    Linear,
    Step,
    /// Value keys only; tangents are dropped by the front-end.
    CubicSpline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedKey<T> {
    pub time: f32,
    pub value: T,
}

/// Keyframes targeting one node. Rotations are `[x, y, z, w]`.
#[derive(Debug, Clone, Default)]
pub struct ImportedChannel {
    pub node_name: String,
    pub positions: Vec<ImportedKey<[f32; 3]>>,
    pub rotations: Vec<ImportedKey<[f32; 4]>>,
    pub scales: Vec<ImportedKey<[f32; 3]>>,
    pub position_interpolation: ImportedInterpolation,
    pub rotation_interpolation: ImportedInterpolation,
    pub scale_interpolation: ImportedInterpolation,
}

impl ImportedChannel {
    #[must_use]
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedAnimation {
    pub name: Option<String>,
    /// Length in ticks.
    pub duration: f32,
    /// Declared playback rate; 0 means unspecified.
    pub ticks_per_second: f32,
    pub channels: Vec<ImportedChannel>,
}
