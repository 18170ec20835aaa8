use glam::{Mat4, Quat, Vec3};

use umbra_core::{ImportedChannel, ImportedInterpolation, Result};

use crate::bones::BoneId;
use crate::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};

/// Translation, rotation and scale of a bone relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalPose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl LocalPose {
    /// `T * R * S`: scale first, then rotate, then translate.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Per-channel sampling cursors, owned by whoever plays the channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelCursor {
    pub position: KeyframeCursor,
    pub rotation: KeyframeCursor,
    pub scale: KeyframeCursor,
}

/// Keyframe tracks of one animated bone.
#[derive(Debug, Clone)]
pub struct BoneChannel {
    name: String,
    bone_id: BoneId,
    positions: KeyframeTrack<Vec3>,
    rotations: KeyframeTrack<Quat>,
    scales: KeyframeTrack<Vec3>,
}

impl BoneChannel {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bone_id: BoneId,
        positions: KeyframeTrack<Vec3>,
        rotations: KeyframeTrack<Quat>,
        scales: KeyframeTrack<Vec3>,
    ) -> Self {
        Self {
            name: name.into(),
            bone_id,
            positions,
            rotations,
            scales,
        }
    }

    /// Builds a channel from importer keys.
    pub fn from_imported(channel: &ImportedChannel, bone_id: BoneId) -> Result<Self> {
        let name = channel.node_name.as_str();

        let positions = KeyframeTrack::from_keys(
            name,
            channel
                .positions
                .iter()
                .map(|k| (k.time, Vec3::from_array(k.value))),
            interpolation_mode(name, channel.position_interpolation),
        )?;
        let rotations = KeyframeTrack::from_keys(
            name,
            channel
                .rotations
                .iter()
                .map(|k| (k.time, quat_from_xyzw(k.value))),
            interpolation_mode(name, channel.rotation_interpolation),
        )?;
        let scales = KeyframeTrack::from_keys(
            name,
            channel
                .scales
                .iter()
                .map(|k| (k.time, Vec3::from_array(k.value))),
            interpolation_mode(name, channel.scale_interpolation),
        )?;

        Ok(Self::new(name, bone_id, positions, rotations, scales))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bone_id(&self) -> BoneId {
        self.bone_id
    }

    pub(crate) fn set_bone_id(&mut self, bone_id: BoneId) {
        self.bone_id = bone_id;
    }

    #[must_use]
    pub fn positions(&self) -> &KeyframeTrack<Vec3> {
        &self.positions
    }

    #[must_use]
    pub fn rotations(&self) -> &KeyframeTrack<Quat> {
        &self.rotations
    }

    #[must_use]
    pub fn scales(&self) -> &KeyframeTrack<Vec3> {
        &self.scales
    }

    /// Time of the latest key across all three tracks.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.positions
            .end_time()
            .max(self.rotations.end_time())
            .max(self.scales.end_time())
    }

    /// Samples each component independently; missing tracks are identity.
    #[must_use]
    pub fn local_pose(&self, time: f32) -> LocalPose {
        LocalPose {
            translation: self.positions.sample(time).unwrap_or(Vec3::ZERO),
            rotation: self.rotations.sample(time).unwrap_or(Quat::IDENTITY),
            scale: self.scales.sample(time).unwrap_or(Vec3::ONE),
        }
    }

    #[must_use]
    pub fn local_transform(&self, time: f32) -> Mat4 {
        self.local_pose(time).to_mat4()
    }

    pub fn local_transform_with_cursor(&self, time: f32, cursor: &mut ChannelCursor) -> Mat4 {
        LocalPose {
            translation: self
                .positions
                .sample_with_cursor(time, &mut cursor.position)
                .unwrap_or(Vec3::ZERO),
            rotation: self
                .rotations
                .sample_with_cursor(time, &mut cursor.rotation)
                .unwrap_or(Quat::IDENTITY),
            scale: self
                .scales
                .sample_with_cursor(time, &mut cursor.scale)
                .unwrap_or(Vec3::ONE),
        }
        .to_mat4()
    }
}

fn interpolation_mode(channel: &str, interpolation: ImportedInterpolation) -> InterpolationMode {
    match interpolation {
        ImportedInterpolation::Linear => InterpolationMode::Linear,
        ImportedInterpolation::Step => InterpolationMode::Step,
        ImportedInterpolation::CubicSpline => {
            log::warn!("Channel '{channel}' uses cubic-spline keys; sampling them linearly");
            InterpolationMode::Linear
        }
    }
}

fn quat_from_xyzw(v: [f32; 4]) -> Quat {
    let q = Quat::from_array(v);
    if q.length_squared() > 0.0 {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}
