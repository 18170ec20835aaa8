//! Matrix layout conversion between importers and the engine.
//!
//! The engine uses glam's convention: column vectors, `M * v`, with the
//! translation stored in `w_axis`. Importers hand us nested `[[f32; 4]; 4]`
//! arrays where every inner array is one column (glTF and the importer-neutral
//! scene share this layout). [`mat4_from_import`] is the only place that
//! interpretation happens; node transforms, bone offsets and the root inverse
//! all go through it.

use glam::Mat4;

/// Raw 4×4 matrix as produced by an importer: four columns of four floats.
pub type ImportMatrix = [[f32; 4]; 4];

/// Converts an importer matrix into the engine's [`Mat4`].
#[inline]
#[must_use]
pub fn mat4_from_import(m: &ImportMatrix) -> Mat4 {
    Mat4::from_cols_array_2d(m)
}

/// Converts an engine matrix back into importer layout.
#[inline]
#[must_use]
pub fn mat4_to_import(m: &Mat4) -> ImportMatrix {
    m.to_cols_array_2d()
}

/// Inverse of `m`, or identity when `m` is singular or not finite.
#[must_use]
pub fn inverse_or_identity(m: &Mat4) -> Mat4 {
    let det = m.determinant();
    if det.is_finite() && det.abs() > f32::MIN_POSITIVE {
        m.inverse()
    } else {
        log::warn!("Root transform is not invertible (det = {det}); using identity");
        Mat4::IDENTITY
    }
}
