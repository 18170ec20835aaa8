//! # Umbra Animation
//!
//! Skeletal animation: bone maps, the node hierarchy, keyframe tracks, clips
//! and the [`Animator`] that turns a clip into a bone palette each frame.
//!
//! A clip is built against the [`BoneMap`] of the model it will be drawn with
//! and shared as an `Arc`; each animator owns its own palette and cursors.

mod values;

pub mod animator;
pub mod bones;
pub mod channel;
pub mod clip;
pub mod hierarchy;
pub mod library;
pub mod tracks;

pub use animator::Animator;
pub use bones::{BoneId, BoneInfo, BoneMap};
pub use channel::{BoneChannel, ChannelCursor, LocalPose};
pub use clip::AnimationClip;
pub use hierarchy::{Hierarchy, HierarchyNode, NodeIndex};
pub use library::AnimationLibrary;
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
