//! Skinning Tests
//!
//! Tests for per-vertex bone influences:
//! - Normalization and descending order after extraction
//! - The four-slot cap and weakest-slot replacement
//! - Fallback binding for vertices without usable weights

use umbra::assets::{BoneInfluences, NO_BONE, extract_bone_weights};
use umbra::core::{ImportedBone, ImportedWeight, mat4_to_import};
use umbra::{BoneMap, ImportSettings, MAX_BONE_INFLUENCE, SkinnedVertex};

use glam::{Mat4, Vec2, Vec3};

// ============================================================================
// Helpers
// ============================================================================

fn vertices(count: usize) -> Vec<SkinnedVertex> {
    (0..count)
        .map(|i| SkinnedVertex::new(Vec3::new(i as f32, 0.0, 0.0), Vec3::Z, Vec2::ZERO))
        .collect()
}

fn bone(name: &str, weights: Vec<(u32, f32)>) -> ImportedBone {
    ImportedBone {
        name: name.to_string(),
        offset: mat4_to_import(&Mat4::IDENTITY),
        weights: weights
            .into_iter()
            .map(|(vertex, weight)| ImportedWeight { vertex, weight })
            .collect(),
    }
}

/// Small deterministic generator so the weight soup is reproducible.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }

    fn unit(&mut self) -> f32 {
        (self.next() % 10_000) as f32 / 10_000.0
    }
}

fn assert_well_formed(v: &SkinnedVertex) {
    let occupied = v.bone_ids.iter().filter(|&&id| id != NO_BONE).count();
    assert!(occupied >= 1, "vertex has no influence: {v:?}");

    let sum: f32 = v.weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "weights sum to {sum}: {v:?}");

    for pair in v.weights.windows(2) {
        assert!(pair[0] >= pair[1], "weights not descending: {v:?}");
    }
    for (id, w) in v.bone_ids.iter().zip(v.weights) {
        if *id == NO_BONE {
            assert_eq!(w, 0.0);
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn random_weight_soup_is_always_well_formed() {
    let mut rng = Lcg(7);
    let mut verts = vertices(64);

    let bones: Vec<ImportedBone> = (0..9)
        .map(|b| {
            let weights = (0..40)
                .map(|_| ((rng.next() % 64), rng.unit() * 2.0))
                .collect();
            bone(&format!("bone_{b}"), weights)
        })
        .collect();

    let mut map = BoneMap::new();
    extract_bone_weights(&mut verts, &bones, &mut map, &ImportSettings::default());

    assert_eq!(map.len(), 9);
    for v in &verts {
        assert_well_formed(v);
    }
}

#[test]
fn unweighted_vertex_falls_back_to_bone_zero() {
    let mut verts = vertices(2);
    let bones = vec![bone("root", vec![(0, 1.0)])];

    let mut map = BoneMap::new();
    extract_bone_weights(&mut verts, &bones, &mut map, &ImportSettings::default());

    assert_eq!(verts[1].bone_ids, [0, NO_BONE, NO_BONE, NO_BONE]);
    assert_eq!(verts[1].weights, [1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn only_the_four_strongest_survive() {
    let mut verts = vertices(1);
    let bones: Vec<ImportedBone> = [0.1, 0.5, 0.2, 0.4, 0.3, 0.05]
        .iter()
        .enumerate()
        .map(|(i, &w)| bone(&format!("b{i}"), vec![(0, w)]))
        .collect();

    let mut map = BoneMap::new();
    extract_bone_weights(&mut verts, &bones, &mut map, &ImportSettings::default());

    let v = verts[0];
    assert_eq!(v.bone_ids, [1, 3, 4, 2]);
    let total = 0.5 + 0.4 + 0.3 + 0.2;
    assert!((v.weights[0] - 0.5 / total).abs() < 1e-6);
    assert!((v.weights[3] - 0.2 / total).abs() < 1e-6);
    assert_well_formed(&v);
}

#[test]
fn noise_weights_are_dropped_before_normalizing() {
    let mut verts = vertices(1);
    let bones = vec![
        bone("a", vec![(0, 0.6)]),
        bone("b", vec![(0, 1e-9)]),
        bone("c", vec![(0, 0.2)]),
    ];

    let mut map = BoneMap::new();
    extract_bone_weights(&mut verts, &bones, &mut map, &ImportSettings::default());

    let v = verts[0];
    assert_eq!(v.bone_ids, [0, 2, NO_BONE, NO_BONE]);
    assert!((v.weights[0] - 0.75).abs() < 1e-6);
    assert!((v.weights[1] - 0.25).abs() < 1e-6);
}

#[test]
fn existing_map_ids_are_reused() {
    let mut map = BoneMap::new();
    map.get_or_insert("pelvis", Mat4::IDENTITY);

    let mut verts = vertices(1);
    let bones = vec![bone("thigh", vec![(0, 1.0)]), bone("pelvis", vec![(0, 1.0)])];
    extract_bone_weights(&mut verts, &bones, &mut map, &ImportSettings::default());

    assert_eq!(map.id_of("thigh"), Some(1));
    // Equal weights keep insertion order: thigh was offered first
    assert_eq!(&verts[0].bone_ids[..2], &[1, 0]);
}

// ============================================================================
// Slot Policy
// ============================================================================

#[test]
fn weakest_slot_is_replaced_only_by_a_stronger_weight() {
    let mut slots = BoneInfluences::default();
    for (bone, weight) in [(0, 0.4), (1, 0.3), (2, 0.2), (3, 0.1)] {
        assert!(slots.insert(bone, weight, 1e-6));
    }
    assert_eq!(slots.count(), MAX_BONE_INFLUENCE);

    assert!(!slots.insert(4, 0.1, 1e-6));
    assert!(slots.insert(5, 0.15, 1e-6));
    assert_eq!(slots.bone_ids, [0, 1, 2, 5]);
}
