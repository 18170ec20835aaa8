use std::sync::Arc;

use glam::Mat4;

use crate::channel::ChannelCursor;
use crate::clip::AnimationClip;

/// Plays one clip and produces the skinning palette.
///
/// The palette is owned by the animator and indexed by bone id. Its length
/// always equals the bound clip's bone count after [`play`](Self::play) or
/// [`update`](Self::update); the renderer adapts it to its own capacity with
/// [`write_palette`](Self::write_palette).
#[derive(Debug, Clone, Default)]
pub struct Animator {
    clip: Option<Arc<AnimationClip>>,
    /// Playback position in ticks.
    time: f32,
    final_bone_matrices: Vec<Mat4>,

    // Per-frame scratch, sized to the clip and reused
    globals: Vec<Mat4>,
    cursors: Vec<ChannelCursor>,
}

impl Animator {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let mut animator = Self::default();
        animator.play(clip);
        animator
    }

    /// Binds `clip` and rewinds to its start.
    ///
    /// The previous pose is discarded: the palette is reset to identity at the
    /// new clip's bone count until the next update.
    pub fn play(&mut self, clip: Arc<AnimationClip>) {
        self.time = 0.0;

        self.final_bone_matrices.clear();
        self.final_bone_matrices
            .resize(clip.bone_count(), Mat4::IDENTITY);
        self.globals.clear();
        self.globals.resize(clip.hierarchy().len(), Mat4::IDENTITY);
        self.cursors.clear();
        self.cursors
            .resize(clip.channels().len(), ChannelCursor::default());

        self.clip = Some(clip);
    }

    #[must_use]
    pub fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    /// Current playback position in ticks.
    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Advances playback by `dt` seconds and recomputes the palette.
    ///
    /// Does nothing while no clip is bound.
    pub fn update(&mut self, dt: f32) {
        let Some(clip) = self.clip.clone() else {
            return;
        };

        let step = dt * clip.ticks_per_second();
        if step.is_finite() {
            self.time = wrap_time(self.time + step, clip.duration());
        }

        self.evaluate(&clip);
    }

    /// Jumps to `time` ticks (wrapped into the clip) and recomputes the palette.
    pub fn set_time(&mut self, time: f32) {
        let Some(clip) = self.clip.clone() else {
            return;
        };
        if time.is_finite() {
            self.time = wrap_time(time, clip.duration());
        }
        self.evaluate(&clip);
    }

    fn evaluate(&mut self, clip: &AnimationClip) {
        let bone_count = clip.bone_count();
        if self.final_bone_matrices.len() != bone_count {
            self.final_bone_matrices.resize(bone_count, Mat4::IDENTITY);
        }
        let hierarchy = clip.hierarchy();
        if self.globals.len() != hierarchy.len() {
            self.globals.resize(hierarchy.len(), Mat4::IDENTITY);
        }
        if self.cursors.len() != clip.channels().len() {
            self.cursors
                .resize(clip.channels().len(), ChannelCursor::default());
        }

        let global_inverse = clip.global_inverse_transform();
        let channels = clip.channels();

        // Pre-order: a parent's global transform is always ready before its children
        for (idx, node) in hierarchy.nodes().iter().enumerate() {
            let local = match clip.node_channel(idx) {
                Some(ci) => channels[ci].local_transform_with_cursor(self.time, &mut self.cursors[ci]),
                None => node.transform,
            };

            let global = match node.parent {
                Some(parent) => self.globals[parent.index()] * local,
                None => local,
            };
            self.globals[idx] = global;

            if let Some((bone_id, offset)) = clip.node_bone(idx) {
                self.final_bone_matrices[bone_id as usize] = global_inverse * global * offset;
            }
        }
    }

    /// Palette indexed by bone id; length equals the clip's bone count.
    #[must_use]
    pub fn final_bone_matrices(&self) -> &[Mat4] {
        &self.final_bone_matrices
    }

    /// Copies the palette into `out`, padding with identity or truncating to
    /// `out.len()`. Returns the number of bones that did not fit.
    pub fn write_palette(&self, out: &mut [Mat4]) -> usize {
        let n = self.final_bone_matrices.len().min(out.len());
        out[..n].copy_from_slice(&self.final_bone_matrices[..n]);
        out[n..].fill(Mat4::IDENTITY);
        self.final_bone_matrices.len() - n
    }

    /// Palette sized to a shader array of `capacity` entries.
    #[must_use]
    pub fn palette(&self, capacity: usize) -> Vec<Mat4> {
        let mut out = vec![Mat4::IDENTITY; capacity];
        let dropped = self.write_palette(&mut out);
        if dropped > 0 {
            log::warn!(
                "Palette capacity {capacity} drops {dropped} of {} bones",
                self.final_bone_matrices.len()
            );
        }
        out
    }
}

/// Wraps `time` into `[0, duration)`; a clip without length stays at 0.
fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    let wrapped = time.rem_euclid(duration);
    // rem_euclid can round up to `duration` for tiny negative inputs
    if wrapped >= duration { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::bones::BoneMap;
    use crate::channel::BoneChannel;
    use crate::hierarchy::Hierarchy;
    use crate::tracks::{InterpolationMode, KeyframeTrack};
    use umbra_core::{ImportedNode, ImportedScene};

    fn chain(names: &[&str]) -> Hierarchy {
        let nodes = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut node = ImportedNode::new(*name);
                if i + 1 < names.len() {
                    node.children = vec![i + 1];
                }
                node
            })
            .collect();
        let scene = ImportedScene {
            nodes,
            root: Some(0),
            ..Default::default()
        };
        Hierarchy::from_imported(&scene, 64).unwrap()
    }

    fn slide(name: &str, from: Vec3, to: Vec3, end: f32) -> BoneChannel {
        let positions =
            KeyframeTrack::from_keys(name, [(0.0, from), (end, to)], InterpolationMode::Linear)
                .unwrap();
        BoneChannel::new(name, 0, positions, KeyframeTrack::default(), KeyframeTrack::default())
    }

    fn clip(duration: f32, bones: &[&str]) -> Arc<AnimationClip> {
        let mut map = BoneMap::new();
        for bone in bones {
            map.get_or_insert(bone, Mat4::IDENTITY);
        }
        Arc::new(AnimationClip::from_parts(
            "slide",
            duration,
            1.0,
            chain(&["root", "a", "b"]),
            vec![slide("a", Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 10.0)],
            map,
            Mat4::IDENTITY,
        ))
    }

    #[test]
    fn update_without_clip_is_a_noop() {
        let mut animator = Animator::default();
        animator.update(1.0);
        assert!(animator.final_bone_matrices().is_empty());
        assert_eq!(animator.current_time(), 0.0);
    }

    #[test]
    fn time_wraps_into_duration() {
        let mut animator = Animator::new(clip(10.0, &["a"]));
        animator.update(23.5);
        assert!((animator.current_time() - 3.5).abs() < 1e-4);
        animator.set_time(-1.0);
        assert!((animator.current_time() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn zero_length_clip_holds_first_pose() {
        let mut animator = Animator::new(clip(0.0, &["a"]));
        animator.update(5.0);
        assert_eq!(animator.current_time(), 0.0);
        assert_eq!(animator.final_bone_matrices()[0], Mat4::IDENTITY);
    }

    #[test]
    fn palette_pads_and_truncates() {
        let mut animator = Animator::new(clip(10.0, &["a", "b"]));
        animator.set_time(5.0);

        let padded = animator.palette(4);
        assert_eq!(padded.len(), 4);
        assert_eq!(padded[2], Mat4::IDENTITY);
        assert_eq!(padded[3], Mat4::IDENTITY);

        let mut small = [Mat4::ZERO; 1];
        assert_eq!(animator.write_palette(&mut small), 1);
        assert_eq!(small[0], Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn play_rewinds_and_resets_the_pose() {
        let mut animator = Animator::new(clip(10.0, &["a"]));
        animator.update(4.0);
        assert_ne!(animator.final_bone_matrices()[0], Mat4::IDENTITY);

        animator.play(clip(10.0, &["a", "b", "x"]));
        assert_eq!(animator.current_time(), 0.0);
        assert_eq!(animator.final_bone_matrices().len(), 3);
        assert!(animator.final_bone_matrices().iter().all(|m| *m == Mat4::IDENTITY));
    }

    #[test]
    fn wrap_never_returns_duration() {
        assert_eq!(wrap_time(-f32::EPSILON * 0.25, 10.0), 0.0);
        assert_eq!(wrap_time(10.0, 10.0), 0.0);
        assert_eq!(wrap_time(3.0, -1.0), 0.0);
    }
}
