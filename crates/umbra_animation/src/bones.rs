use glam::Mat4;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use umbra_core::{Result, UmbraError};

/// Stable id of a bone; indexes the final bone palette.
pub type BoneId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    pub name: String,
    pub id: BoneId,
    /// Bind-pose inverse: transforms a vertex from mesh space into bone space.
    pub offset: Mat4,
}

/// Append-only name → bone mapping.
///
/// Ids are handed out sequentially on first encounter and never change. A map
/// carries the id of the rig it was started for; clones (the copy an
/// [`AnimationClip`](crate::AnimationClip) takes of its model's map) keep that
/// id, so a clip can later be checked against the model it is drawn with.
#[derive(Debug, Clone)]
pub struct BoneMap {
    rig_id: Uuid,
    by_name: FxHashMap<String, BoneId>,
    bones: Vec<BoneInfo>,
}

impl Default for BoneMap {
    fn default() -> Self {
        Self::new()
    }
}

impl BoneMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rig_id: Uuid::new_v4(),
            by_name: FxHashMap::default(),
            bones: Vec::new(),
        }
    }

    #[must_use]
    pub fn rig_id(&self) -> Uuid {
        self.rig_id
    }

    /// Returns the id of `name`, registering it with `offset` if it is new.
    ///
    /// The offset of an already known bone is left untouched.
    pub fn get_or_insert(&mut self, name: &str, offset: Mat4) -> BoneId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.bones.len() as BoneId;
        self.by_name.insert(name.to_string(), id);
        self.bones.push(BoneInfo {
            name: name.to_string(),
            id,
            offset,
        });
        id
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoneInfo> {
        self.by_name
            .get(name)
            .and_then(|&id| self.bones.get(id as usize))
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn by_id(&self, id: BoneId) -> Option<&BoneInfo> {
        self.bones.get(id as usize)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of bones, which is also the next id to be assigned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bones in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BoneInfo> {
        self.bones.iter()
    }

    /// Checks that `self` is `base` plus zero or more appended bones.
    pub fn check_extends(&self, base: &BoneMap) -> Result<()> {
        let mismatch = |reason: String| UmbraError::BindingMismatch {
            clip: String::new(),
            reason,
        };

        if self.rig_id != base.rig_id {
            return Err(mismatch(format!(
                "rig {} does not match rig {}",
                self.rig_id, base.rig_id
            )));
        }
        if self.len() < base.len() {
            return Err(mismatch(format!(
                "{} bones cannot cover a rig of {}",
                self.len(),
                base.len()
            )));
        }
        for bone in base.iter() {
            if self.id_of(&bone.name) != Some(bone.id) {
                return Err(mismatch(format!("bone '{}' changed id", bone.name)));
            }
        }
        Ok(())
    }
}
