//! Skinned vertices and bone-weight extraction.
//!
//! Every vertex carries [`MAX_BONE_INFLUENCE`] influence slots. Extraction
//! fills them from the importer's per-bone weight lists and then repairs
//! whatever the asset got wrong: noise weights are dropped, excess influences
//! keep the strongest, and the result is sorted and normalized. A vertex that
//! ends up with nothing is bound fully to bone 0.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use umbra_animation::BoneMap;
use umbra_core::{ImportSettings, ImportedBone, MAX_BONE_INFLUENCE, mat4_from_import};

/// Marks an unused influence slot.
pub const NO_BONE: i32 = -1;

/// GPU vertex layout of a skinned mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for SkinnedVertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            tex_coords: Vec2::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
            bone_ids: [NO_BONE; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl SkinnedVertex {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn influences(&self) -> BoneInfluences {
        BoneInfluences {
            bone_ids: self.bone_ids,
            weights: self.weights,
        }
    }

    pub fn set_influences(&mut self, influences: &BoneInfluences) {
        self.bone_ids = influences.bone_ids;
        self.weights = influences.weights;
    }
}

/// The influence slots of one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfluences {
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for BoneInfluences {
    fn default() -> Self {
        Self {
            bone_ids: [NO_BONE; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl BoneInfluences {
    /// Offers one (bone, weight) pair to the slots.
    ///
    /// Weights at or below `epsilon` are dropped. A bone never occupies two
    /// slots; a repeat keeps the larger weight. Otherwise the first free slot
    /// is used, and when all are taken the weakest slot is replaced only by a
    /// strictly stronger weight. Returns whether the slots changed.
    pub fn insert(&mut self, bone: i32, weight: f32, epsilon: f32) -> bool {
        if !weight.is_finite() || weight <= epsilon || bone < 0 {
            return false;
        }

        if let Some(slot) = self.bone_ids.iter().position(|&id| id == bone) {
            if weight > self.weights[slot] {
                self.weights[slot] = weight;
                return true;
            }
            return false;
        }

        if let Some(slot) = self.bone_ids.iter().position(|&id| id == NO_BONE) {
            self.bone_ids[slot] = bone;
            self.weights[slot] = weight;
            return true;
        }

        let mut weakest = 0;
        for slot in 1..MAX_BONE_INFLUENCE {
            if self.weights[slot] < self.weights[weakest] {
                weakest = slot;
            }
        }
        if weight > self.weights[weakest] {
            self.bone_ids[weakest] = bone;
            self.weights[weakest] = weight;
            return true;
        }
        false
    }

    /// Sorts the slots by descending weight and normalizes them to sum to 1.
    ///
    /// The sort is stable, so equal weights keep their slot order. With no
    /// usable weight left the vertex is bound fully to bone 0.
    pub fn finalize(&mut self) {
        let mut slots: [(i32, f32); MAX_BONE_INFLUENCE] =
            std::array::from_fn(|i| (self.bone_ids[i], self.weights[i]));
        slots.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total: f32 = slots
            .iter()
            .filter(|(id, _)| *id != NO_BONE)
            .map(|(_, w)| *w)
            .sum();

        if total <= 0.0 || !total.is_finite() {
            *self = Self::default();
            self.bone_ids[0] = 0;
            self.weights[0] = 1.0;
            return;
        }

        for (i, (id, weight)) in slots.into_iter().enumerate() {
            if id == NO_BONE {
                self.bone_ids[i] = NO_BONE;
                self.weights[i] = 0.0;
            } else {
                self.bone_ids[i] = id;
                self.weights[i] = weight / total;
            }
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bone_ids.iter().filter(|&&id| id != NO_BONE).count()
    }
}

/// Applies every bone's weights to `vertices` and finalizes each vertex.
///
/// Bones are resolved through `bone_map`; a bone seen for the first time is
/// registered with its bind-pose offset. Weights pointing past the end of
/// `vertices` are skipped.
pub fn extract_bone_weights(
    vertices: &mut [SkinnedVertex],
    bones: &[ImportedBone],
    bone_map: &mut BoneMap,
    settings: &ImportSettings,
) {
    let mut influences: Vec<BoneInfluences> =
        vertices.iter().map(SkinnedVertex::influences).collect();
    let mut skipped = 0usize;

    for bone in bones {
        let id = bone_map.get_or_insert(&bone.name, mat4_from_import(&bone.offset)) as i32;
        for w in &bone.weights {
            match influences.get_mut(w.vertex as usize) {
                Some(slots) => {
                    slots.insert(id, w.weight, settings.weight_epsilon);
                }
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        log::debug!(
            "Skipped {skipped} bone weights referencing vertices beyond {}",
            vertices.len()
        );
    }

    for (vertex, mut slots) in vertices.iter_mut().zip(influences) {
        slots.finalize();
        vertex.set_influences(&slots);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::{IMPORT_IDENTITY, ImportedWeight};

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 88);
        let v = [SkinnedVertex::default()];
        assert_eq!(bytemuck::cast_slice::<_, u8>(&v).len(), 88);
    }

    #[test]
    fn repeated_bone_keeps_the_larger_weight() {
        let mut slots = BoneInfluences::default();
        assert!(slots.insert(2, 0.3, 1e-6));
        assert!(slots.insert(2, 0.6, 1e-6));
        assert!(!slots.insert(2, 0.1, 1e-6));
        assert_eq!(slots.count(), 1);
        assert_eq!(slots.weights[0], 0.6);
    }

    #[test]
    fn full_slots_replace_only_a_weaker_weight() {
        let mut slots = BoneInfluences::default();
        for (bone, w) in [(0, 0.4), (1, 0.1), (2, 0.3), (3, 0.2)] {
            slots.insert(bone, w, 1e-6);
        }
        // Equal to the weakest: rejected
        assert!(!slots.insert(4, 0.1, 1e-6));
        assert!(slots.insert(5, 0.25, 1e-6));
        assert_eq!(slots.bone_ids, [0, 5, 2, 3]);
    }

    #[test]
    fn noise_weights_are_dropped() {
        let mut slots = BoneInfluences::default();
        assert!(!slots.insert(1, 1e-7, 1e-6));
        assert!(!slots.insert(1, f32::NAN, 1e-6));
        assert_eq!(slots.count(), 0);
    }

    #[test]
    fn finalize_sorts_stably_and_normalizes() {
        let mut slots = BoneInfluences::default();
        slots.insert(7, 1.0, 1e-6);
        slots.insert(3, 2.0, 1e-6);
        slots.insert(9, 1.0, 1e-6);
        slots.finalize();
        assert_eq!(slots.bone_ids, [3, 7, 9, NO_BONE]);
        assert!((slots.weights[0] - 0.5).abs() < 1e-6);
        assert!((slots.weights[1] - 0.25).abs() < 1e-6);
        assert_eq!(slots.weights[3], 0.0);
    }

    #[test]
    fn extraction_registers_bones_and_skips_bad_vertices() {
        let mut vertices = vec![SkinnedVertex::default(); 2];
        let bones = vec![ImportedBone {
            name: "jaw".into(),
            offset: IMPORT_IDENTITY,
            weights: vec![
                ImportedWeight { vertex: 0, weight: 0.5 },
                ImportedWeight { vertex: 9, weight: 1.0 },
            ],
        }];
        let mut map = BoneMap::new();
        extract_bone_weights(&mut vertices, &bones, &mut map, &ImportSettings::default());

        assert_eq!(map.id_of("jaw"), Some(0));
        assert_eq!(vertices[0].bone_ids[0], 0);
        assert_eq!(vertices[0].weights[0], 1.0);
        // Untouched vertex falls back to bone 0
        assert_eq!(vertices[1].bone_ids, [0, NO_BONE, NO_BONE, NO_BONE]);
        assert_eq!(vertices[1].weights, [1.0, 0.0, 0.0, 0.0]);
    }
}
