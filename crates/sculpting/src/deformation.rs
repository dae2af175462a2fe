//! Vertex deformation kernels for sculpting.
//!
//! Every kernel works in two passes: targets are computed from the buffer as
//! it was before the dab, then written back. A vertex's result therefore never
//! depends on the order in which its neighbours were visited.

use glam::Vec3;

use crate::types::BrushOperation;

/// Fraction of the brush radius searched for smoothing neighbours
pub const SMOOTH_RADIUS_FACTOR: f32 = 0.3;

/// Distances below this are treated as coincident
const EPSILON: f32 = 1e-6;

/// Brush falloff: `(1 - d/r)^exponent` inside the radius, 0 outside.
pub fn falloff(distance: f32, radius: f32, exponent: f32) -> f32 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    (1.0 - distance / radius).max(0.0).powf(exponent)
}

/// Information about a dab for deformation functions (mesh-local space).
#[derive(Debug, Clone, Copy)]
pub struct DabInfo {
    /// Brush center on the surface
    pub position: Vec3,
    /// Unit face normal at the hit, facing the incoming ray
    pub normal: Vec3,
    pub radius: f32,
    pub strength: f32,
    /// Falloff exponent
    pub falloff: f32,
    /// +1 for add, -1 for subtract
    pub sign: f32,
}

impl DabInfo {
    /// Influence at a vertex, `None` outside the radius.
    ///
    /// `influence = strength * falloff(d, r, exponent)`.
    pub fn influence(&self, vertex: Vec3) -> Option<f32> {
        let distance = vertex.distance(self.position);
        (distance <= self.radius)
            .then(|| self.strength * falloff(distance, self.radius, self.falloff))
    }
}

/// Result of applying a dab.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeformationResult {
    /// Indices of vertices whose position changed
    pub modified_vertices: Vec<usize>,
}

impl DeformationResult {
    pub fn modified(&self) -> bool {
        !self.modified_vertices.is_empty()
    }
}

/// Apply one dab of `operation` to the position buffer.
///
/// `normals` must be parallel to `positions`. Only vertices whose position
/// actually changes are reported.
pub fn apply_deformation(
    positions: &mut [Vec3],
    normals: &[Vec3],
    dab: &DabInfo,
    operation: BrushOperation,
) -> DeformationResult {
    let targets = match operation {
        BrushOperation::Sculpt => apply_sculpt(positions, dab),
        BrushOperation::Inflate => apply_inflate(positions, normals, dab),
        BrushOperation::Pinch => apply_pinch(positions, dab),
        BrushOperation::Flatten => apply_flatten(positions, dab),
        BrushOperation::Remove => apply_remove(positions, normals, dab),
        BrushOperation::Smooth => apply_smooth(positions, dab),
    };

    let mut result = DeformationResult::default();
    for (index, target) in targets {
        if target != positions[index] && target.is_finite() {
            positions[index] = target;
            result.modified_vertices.push(index);
        }
    }
    result
}

/// Vertices inside the dab with their influence.
fn affected<'a>(
    positions: &'a [Vec3],
    dab: &'a DabInfo,
) -> impl Iterator<Item = (usize, Vec3, f32)> + 'a {
    positions
        .iter()
        .enumerate()
        .filter_map(|(i, &p)| dab.influence(p).map(|w| (i, p, w)))
}

/// Move along the hit face's normal, signed by mode.
pub fn apply_sculpt(positions: &[Vec3], dab: &DabInfo) -> Vec<(usize, Vec3)> {
    affected(positions, dab)
        .map(|(i, p, w)| (i, p + dab.normal * w * dab.sign))
        .collect()
}

/// Move along each vertex's own normal, signed by mode.
pub fn apply_inflate(
    positions: &[Vec3],
    normals: &[Vec3],
    dab: &DabInfo,
) -> Vec<(usize, Vec3)> {
    affected(positions, dab)
        .map(|(i, p, w)| (i, p + normals[i].normalize_or_zero() * w * dab.sign))
        .collect()
}

/// Move toward the brush center (add) or away from it (subtract).
///
/// Adding never carries a vertex past the center.
pub fn apply_pinch(positions: &[Vec3], dab: &DabInfo) -> Vec<(usize, Vec3)> {
    affected(positions, dab)
        .filter_map(|(i, p, w)| {
            let to_center = dab.position - p;
            let distance = to_center.length();
            if distance < EPSILON {
                return None;
            }
            let step = if dab.sign > 0.0 { w.min(distance) } else { -w };
            Some((i, p + to_center / distance * step))
        })
        .collect()
}

/// Pull vertices onto the plane through the brush center.
pub fn apply_flatten(positions: &[Vec3], dab: &DabInfo) -> Vec<(usize, Vec3)> {
    affected(positions, dab)
        .map(|(i, p, w)| {
            let plane_distance = dab.normal.dot(p - dab.position);
            (i, p - dab.normal * plane_distance * w.min(1.0))
        })
        .collect()
}

/// Carve inward along vertex normals; ignores mode.
pub fn apply_remove(positions: &[Vec3], normals: &[Vec3], dab: &DabInfo) -> Vec<(usize, Vec3)> {
    affected(positions, dab)
        .map(|(i, p, w)| (i, p - normals[i].normalize_or_zero() * w))
        .collect()
}

/// Blend each vertex toward the mean of the vertices near it; ignores mode.
///
/// The neighbour search is a full scan, so this is quadratic in the vertex
/// count and only meant for low-resolution restoration meshes.
pub fn apply_smooth(positions: &[Vec3], dab: &DabInfo) -> Vec<(usize, Vec3)> {
    let search_radius = dab.radius * SMOOTH_RADIUS_FACTOR;

    affected(positions, dab)
        .filter_map(|(i, p, w)| {
            let mut sum = Vec3::ZERO;
            let mut count = 0u32;
            for (j, &other) in positions.iter().enumerate() {
                if j != i && other.distance(p) < search_radius {
                    sum += other;
                    count += 1;
                }
            }
            (count > 0).then(|| (i, p.lerp(sum / count as f32, w.min(1.0))))
        })
        .collect()
}
