use std::sync::Arc;

use rustc_hash::FxHashMap;

use umbra_core::{ImportSettings, ImportedScene, Result, UmbraError};

use crate::bones::BoneMap;
use crate::clip::AnimationClip;
use crate::hierarchy::Hierarchy;

/// Every animation of one asset, keyed by name.
///
/// Clips keep the order the asset declares them in. All clips of a library
/// share one hierarchy.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    clips: Vec<Arc<AnimationClip>>,
    by_name: FxHashMap<String, usize>,
}

impl AnimationLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a clip for every animation in `scene`.
    ///
    /// Unnamed animations are called `animation_<index>`; a name that is
    /// already taken gets a numeric suffix.
    pub fn from_imported(
        scene: &ImportedScene,
        model_bones: &BoneMap,
        settings: &ImportSettings,
    ) -> Result<Self> {
        let hierarchy = Arc::new(Hierarchy::from_imported(scene, settings.max_hierarchy_depth)?);
        if scene.animations.is_empty() {
            return Err(UmbraError::NoAnimations(scene.label.clone()));
        }

        let mut library = Self::new();
        for (index, animation) in scene.animations.iter().enumerate() {
            let base = animation
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("animation_{index}"));
            let name = library.unique_name(base);
            let clip = AnimationClip::from_imported_animation(
                scene,
                animation,
                name,
                Arc::clone(&hierarchy),
                model_bones,
                settings,
            )?;
            library.insert(Arc::new(clip));
        }

        log::info!(
            "Loaded {} animation(s) from '{}'",
            library.len(),
            scene.label
        );
        Ok(library)
    }

    fn unique_name(&self, base: String) -> String {
        if !self.by_name.contains_key(&base) {
            return base;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.by_name.contains_key(&candidate) {
                log::warn!("Duplicate animation name '{base}', stored as '{candidate}'");
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Adds a clip, replacing any clip of the same name.
    pub fn insert(&mut self, clip: Arc<AnimationClip>) {
        if let Some(&idx) = self.by_name.get(clip.name()) {
            self.clips[idx] = clip;
        } else {
            self.by_name.insert(clip.name().to_string(), self.clips.len());
            self.clips.push(clip);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.by_name.get(name).map(|&idx| &self.clips[idx])
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Arc<AnimationClip>> {
        self.clips.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&Arc<AnimationClip>> {
        self.clips.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|c| c.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnimationClip>> {
        self.clips.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
