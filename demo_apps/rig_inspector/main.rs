//! Loads a rigged glTF asset without a window, plays its first animation for
//! a few frames and prints what the skinning shader would receive.
//!
//! ```text
//! RUST_LOG=info cargo run -p rig_inspector -- assets/crawler.glb [frames]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use glam::Vec3;
use umbra::prelude::*;

const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(args.next().context("usage: rig_inspector <asset.glb> [frames]")?);
    let frames: usize = match args.next() {
        Some(arg) => arg.parse().context("frame count must be a positive integer")?,
        None => 30,
    };

    let settings = ImportSettings::default();
    let mut backend = HeadlessBackend::new();

    let mut model = load_model(&path, &mut backend, &settings)?;
    println!(
        "Model: {} meshes, {} bones, {} textures ({} bytes uploaded)",
        model.meshes().len(),
        model.bone_count(),
        model.textures().len(),
        backend.uploaded_bytes()
    );

    let library = load_animations(&path, &model, &settings)?;
    for clip in library.iter() {
        println!(
            "Clip '{}': {:.2} ticks @ {:.1} tps, {} channels, {} bones",
            clip.name(),
            clip.duration(),
            clip.ticks_per_second(),
            clip.channels().len(),
            clip.bone_count()
        );
    }

    let clip = Arc::clone(library.first().context("asset has no animations")?);
    // Clips may only be played on the model whose bone map they were built from
    if let Err(err) = clip.validate_against(model.bone_map()) {
        model.release(&mut backend);
        return Err(err.into());
    }
    let mut animator = Animator::new(clip);

    for frame in 0..frames {
        animator.update(FRAME_DT);
        log::debug!("frame {frame}: t = {:.3}", animator.current_time());
    }

    let palette = animator.palette(DEFAULT_MAX_SHADER_BONES);
    println!("Palette after {frames} frames (t = {:.3}):", animator.current_time());
    for bone in model.bone_map().iter() {
        let Some(matrix) = palette.get(bone.id as usize) else {
            break;
        };
        let moved = matrix.transform_point3(Vec3::ZERO);
        println!(
            "  [{:>3}] {:<24} origin -> ({:.3}, {:.3}, {:.3})",
            bone.id, bone.name, moved.x, moved.y, moved.z
        );
    }

    model.release(&mut backend);
    Ok(())
}
