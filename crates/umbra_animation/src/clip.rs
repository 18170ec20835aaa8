use std::sync::Arc;

use glam::Mat4;

use umbra_core::{
    ImportSettings, ImportedAnimation, ImportedScene, Result, UmbraError, inverse_or_identity,
};

use crate::bones::{BoneId, BoneMap};
use crate::channel::BoneChannel;
use crate::hierarchy::Hierarchy;

/// One playable animation bound to a rig.
///
/// A clip owns its own copy of the bone map it was built against. Bones that
/// only appear in the clip's channels are appended to that copy with an
/// identity offset, so every animated node has a palette slot. Per-node
/// channel and bone lookups are resolved once here rather than by name every
/// frame.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    ticks_per_second: f32,
    hierarchy: Arc<Hierarchy>,
    channels: Vec<BoneChannel>,
    bone_map: BoneMap,
    global_inverse_transform: Mat4,

    node_channels: Vec<Option<u32>>,
    node_bones: Vec<Option<BoneId>>,
}

impl AnimationClip {
    /// Builds a clip from the first animation of `scene`.
    ///
    /// Fails when the scene has no root node or no animations. Any further
    /// animations are ignored; use [`AnimationLibrary`](crate::AnimationLibrary)
    /// to keep them.
    pub fn from_imported(
        scene: &ImportedScene,
        model_bones: &BoneMap,
        settings: &ImportSettings,
    ) -> Result<Self> {
        let hierarchy = Arc::new(Hierarchy::from_imported(scene, settings.max_hierarchy_depth)?);
        let Some(animation) = scene.animations.first() else {
            return Err(UmbraError::NoAnimations(scene.label.clone()));
        };
        if scene.animations.len() > 1 {
            log::warn!(
                "'{}' contains {} animations; only the first is used, {} discarded",
                scene.label,
                scene.animations.len(),
                scene.animations.len() - 1
            );
        }

        let name = animation
            .name
            .clone()
            .unwrap_or_else(|| "animation_0".to_string());
        Self::from_imported_animation(scene, animation, name, hierarchy, model_bones, settings)
    }

    pub(crate) fn from_imported_animation(
        scene: &ImportedScene,
        animation: &ImportedAnimation,
        name: String,
        hierarchy: Arc<Hierarchy>,
        model_bones: &BoneMap,
        settings: &ImportSettings,
    ) -> Result<Self> {
        // The scene's own root, not the model's
        let global_inverse_transform = inverse_or_identity(&hierarchy.root().transform);

        let ticks_per_second = if animation.ticks_per_second.is_finite()
            && animation.ticks_per_second > 0.0
        {
            animation.ticks_per_second
        } else {
            settings.default_ticks_per_second
        };

        let mut bone_map = model_bones.clone();
        let mut channels = Vec::with_capacity(animation.channels.len());
        for imported in &animation.channels {
            let id = bone_map.get_or_insert(&imported.node_name, Mat4::IDENTITY);
            channels.push(BoneChannel::from_imported(imported, id)?);
        }

        log::debug!(
            "Clip '{name}' from '{}': {} channels, {} bones ({} from the model)",
            scene.label,
            channels.len(),
            bone_map.len(),
            model_bones.len()
        );

        Ok(Self::assemble(
            name,
            animation.duration,
            ticks_per_second,
            hierarchy,
            channels,
            bone_map,
            global_inverse_transform,
        ))
    }

    /// Builds a clip from already constructed parts.
    ///
    /// Channel bone ids are (re)assigned from `bone_map`, appending any bone
    /// the map does not know with an identity offset.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        duration: f32,
        ticks_per_second: f32,
        hierarchy: Hierarchy,
        mut channels: Vec<BoneChannel>,
        mut bone_map: BoneMap,
        global_inverse_transform: Mat4,
    ) -> Self {
        for channel in &mut channels {
            let id = bone_map.get_or_insert(channel.name(), Mat4::IDENTITY);
            channel.set_bone_id(id);
        }
        Self::assemble(
            name.into(),
            duration,
            ticks_per_second,
            Arc::new(hierarchy),
            channels,
            bone_map,
            global_inverse_transform,
        )
    }

    fn assemble(
        name: String,
        duration: f32,
        ticks_per_second: f32,
        hierarchy: Arc<Hierarchy>,
        channels: Vec<BoneChannel>,
        bone_map: BoneMap,
        global_inverse_transform: Mat4,
    ) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };

        let node_channels = hierarchy
            .nodes()
            .iter()
            .map(|node| {
                let mut matches = channels
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.name() == node.name)
                    .map(|(i, _)| i as u32);
                let first = matches.next();
                if matches.next().is_some() {
                    log::warn!(
                        "Clip '{name}' has several channels for node '{}'; using the first",
                        node.name
                    );
                }
                first
            })
            .collect();

        let node_bones = hierarchy
            .nodes()
            .iter()
            .map(|node| bone_map.id_of(&node.name))
            .collect();

        Self {
            name,
            duration,
            ticks_per_second,
            hierarchy,
            channels,
            bone_map,
            global_inverse_transform,
            node_channels,
            node_bones,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in ticks.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[must_use]
    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    #[must_use]
    pub fn find_channel(&self, name: &str) -> Option<&BoneChannel> {
        self.channels.iter().find(|c| c.name() == name)
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
    pub fn global_inverse_transform(&self) -> Mat4 {
        self.global_inverse_transform
    }

    /// Index into [`channels`](Self::channels) of the channel driving the
    /// hierarchy node at `node` (pre-order index).
    #[inline]
    pub(crate) fn node_channel(&self, node: usize) -> Option<usize> {
        self.node_channels[node].map(|i| i as usize)
    }

    /// Palette slot and offset of the hierarchy node at `node`, if it is a bone.
    #[inline]
    pub(crate) fn node_bone(&self, node: usize) -> Option<(BoneId, Mat4)> {
        let id = self.node_bones[node]?;
        self.bone_map.by_id(id).map(|info| (id, info.offset))
    }

    /// Checks that this clip was built against `model_bones`.
    ///
    /// A clip is only valid for the model whose bone map it copied: the ids
    /// must agree, otherwise the palette would deform the wrong vertices.
    pub fn validate_against(&self, model_bones: &BoneMap) -> Result<()> {
        self.bone_map
            .check_extends(model_bones)
            .map_err(|err| match err {
                UmbraError::BindingMismatch { reason, .. } => UmbraError::BindingMismatch {
                    clip: self.name.clone(),
                    reason,
                },
                other => other,
            })
    }

    #[must_use]
    pub fn is_compatible_with(&self, model_bones: &BoneMap) -> bool {
        self.validate_against(model_bones).is_ok()
    }
}
