//! Procedural occlusal pad generation.
//!
//! The pad is a tapered elliptical cylinder sized from the arches and the
//! measured clearance at the anchor, with a wavy occlusal surface and a
//! narrowed base.

use geometry::primitives::{CylinderSpec, tapered_cylinder};
use geometry::{Mesh, MeshRole, MeshSlot, MeshStore, Transform, bounding_box, raycast};
use glam::{Quat, Vec2, Vec3};
use occlusal_config::{
    DEFAULT_BORDER_THICKNESS, DEFAULT_CEMENT_GAP, DEFAULT_INSERTION_ANGLE, DEFAULT_RAY_LIFT,
    RestorationConfig, WaveConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RestorationError;

/// Largest accepted insertion-path angle in degrees
pub const MAX_INSERTION_ANGLE: f32 = 45.0;

/// Operator-facing restoration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationParameters {
    /// Cement gap in mm
    pub cement_gap: f32,
    /// Insertion-path angle in degrees, [0, 45]
    pub insertion_angle: f32,
    /// Border thickness in mm
    pub border_thickness: f32,
}

impl Default for RestorationParameters {
    fn default() -> Self {
        Self {
            cement_gap: DEFAULT_CEMENT_GAP,
            insertion_angle: DEFAULT_INSERTION_ANGLE,
            border_thickness: DEFAULT_BORDER_THICKNESS,
        }
    }
}

impl From<&RestorationConfig> for RestorationParameters {
    fn from(config: &RestorationConfig) -> Self {
        Self {
            cement_gap: config.cement_gap,
            insertion_angle: config.insertion_angle,
            border_thickness: config.border_thickness,
        }
    }
}

impl RestorationParameters {
    pub fn validate(&self) -> Result<(), RestorationError> {
        if !(self.cement_gap >= 0.0 && self.cement_gap.is_finite()) {
            return Err(RestorationError::InvalidParameters(format!(
                "cement gap must not be negative, got {}",
                self.cement_gap
            )));
        }
        if !(0.0..=MAX_INSERTION_ANGLE).contains(&self.insertion_angle) {
            return Err(RestorationError::InvalidParameters(format!(
                "insertion angle must lie in [0, {MAX_INSERTION_ANGLE}], got {}",
                self.insertion_angle
            )));
        }
        if !(self.border_thickness > 0.0 && self.border_thickness.is_finite()) {
            return Err(RestorationError::InvalidParameters(format!(
                "border thickness must be positive, got {}",
                self.border_thickness
            )));
        }
        Ok(())
    }
}

/// Size of a generated pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestorationDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

/// Everything known about a generated pad besides its mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorationInfo {
    pub parameters: RestorationParameters,
    pub dimensions: RestorationDimensions,
    /// Gap anchor the pad was placed at
    pub anchor: Vec3,
    /// Clearance measured by the refinement ray, if it hit both arches
    pub clearance: Option<f32>,
    /// Positions as generated, for reset
    pub rest_positions: Vec<Vec3>,
    pub rest_transform: Transform,
}

/// A freshly generated pad.
#[derive(Debug, Clone)]
pub struct GeneratedRestoration {
    pub mesh: Mesh,
    pub info: RestorationInfo,
}

/// Builds occlusal pads between two assembled arches.
#[derive(Debug, Clone)]
pub struct RestorationGenerator {
    config: RestorationConfig,
    ray_lift: f32,
}

impl Default for RestorationGenerator {
    fn default() -> Self {
        Self::new(RestorationConfig::default(), DEFAULT_RAY_LIFT)
    }
}

impl RestorationGenerator {
    /// `ray_lift` is how far above the upper arch the refinement ray starts.
    pub fn new(config: RestorationConfig, ray_lift: f32) -> Self {
        Self { config, ray_lift }
    }

    pub fn config(&self) -> &RestorationConfig {
        &self.config
    }

    /// Generate a pad at `anchor` between the arches held by `store`.
    pub fn generate_in_store(
        &self,
        store: &MeshStore,
        anchor: Vec3,
        parameters: &RestorationParameters,
    ) -> Result<GeneratedRestoration, RestorationError> {
        let upper = store
            .get(MeshSlot::UpperArch)
            .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::UpperArch))?;
        let lower = store
            .get(MeshSlot::LowerArch)
            .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::LowerArch))?;
        self.generate(upper, lower, anchor, parameters)
    }

    /// Generate a pad at `anchor` between `upper` and `lower`.
    pub fn generate(
        &self,
        upper: &Mesh,
        lower: &Mesh,
        anchor: Vec3,
        parameters: &RestorationParameters,
    ) -> Result<GeneratedRestoration, RestorationError> {
        parameters.validate()?;
        if !anchor.is_finite() {
            return Err(RestorationError::InvalidParameters(format!(
                "anchor {anchor:?} is not finite"
            )));
        }
        let vertex_count = self.config.pad_vertex_count();
        if vertex_count > self.config.max_vertices {
            return Err(RestorationError::InvalidParameters(format!(
                "pad would have {vertex_count} vertices, limit is {}",
                self.config.max_vertices
            )));
        }

        let upper_box = bounding_box(upper);
        let lower_box = bounding_box(lower);

        let (height, center, clearance) = self.measure(upper, lower, upper_box.max.y, anchor);

        let upper_size = upper_box.size();
        let lower_size = lower_box.size();
        let width = upper_size.x.min(lower_size.x) * self.config.width_fraction;
        let depth = upper_size.z.min(lower_size.z) * self.config.depth_fraction;
        if !(width > 0.0 && depth > 0.0) {
            return Err(RestorationError::InvalidParameters(format!(
                "arches are too thin to size a pad ({width:.3} x {depth:.3})"
            )));
        }
        let dimensions = RestorationDimensions {
            width,
            height,
            depth,
        };

        let mut mesh = Mesh::from_data(
            MeshSlot::Restoration.label(),
            MeshRole::Restoration,
            self.pad_shape(&dimensions),
        )?;
        mesh.transform = Transform {
            translation: center,
            rotation: Quat::from_rotation_x(-parameters.insertion_angle.to_radians()),
            scale: Vec3::ONE,
        };
        mesh.editable = true;

        info!(
            "Generated pad {:.2} x {:.2} x {:.2} at ({:.2}, {:.2}, {:.2})",
            width, height, depth, center.x, center.y, center.z
        );

        let info = RestorationInfo {
            parameters: *parameters,
            dimensions,
            anchor,
            clearance,
            rest_positions: mesh.positions().to_vec(),
            rest_transform: mesh.transform,
        };
        Ok(GeneratedRestoration { mesh, info })
    }

    /// Pad height, pad center and measured clearance at the anchor.
    fn measure(
        &self,
        upper: &Mesh,
        lower: &Mesh,
        upper_top: f32,
        anchor: Vec3,
    ) -> (f32, Vec3, Option<f32>) {
        let origin = Vec3::new(anchor.x, upper_top + self.ray_lift, anchor.z);
        let upper_hit = raycast(origin, Vec3::NEG_Y, upper);
        let lower_hit = raycast(origin, Vec3::NEG_Y, lower);

        let (Some(top), Some(bottom)) = (upper_hit, lower_hit) else {
            warn!("Refinement ray missed an arch, using default pad height");
            return (self.config.default_height, anchor, None);
        };

        let clearance = (top.point.y - bottom.point.y).abs();
        let height = clearance * self.config.height_ratio;
        debug!(
            "Refinement: upper {:.3}, lower {:.3}, clearance {:.3}",
            top.point.y, bottom.point.y, clearance
        );
        let center = Vec3::new(
            anchor.x,
            bottom.point.y + height * self.config.lift_ratio,
            anchor.z,
        );
        (height, center, Some(clearance))
    }

    /// Local-space pad geometry centered on the origin.
    fn pad_shape(&self, dimensions: &RestorationDimensions) -> geometry::MeshData {
        let config = &self.config;
        let top_radius = Vec2::new(dimensions.width, dimensions.depth) * 0.5;
        let mut data = tapered_cylinder(&CylinderSpec {
            top_radius,
            bottom_radius: top_radius / config.base_taper,
            height: dimensions.height,
            radial_segments: config.radial_segments,
            height_segments: config.height_segments,
            cap_rings: config.cap_rings,
        });

        let half = dimensions.height * 0.5;
        let band = config.surface_band.min(dimensions.height * 0.25);
        for p in &mut data.positions {
            if p.y > half - band {
                p.y -= wave(&config.primary_wave, p.x, p.z, f32::sin)
                    + wave(&config.secondary_wave, p.x, p.z, f32::cos);
            }
            if p.y < -half + band {
                p.x *= config.base_contraction;
                p.z *= config.base_contraction;
            }
        }
        data
    }
}

/// `amplitude * sin(fx * x) * g(fz * z)`
fn wave(wave: &WaveConfig, x: f32, z: f32, g: fn(f32) -> f32) -> f32 {
    let [fx, fz] = wave.frequency;
    wave.amplitude * (fx * x).sin() * g(fz * z)
}

/// Put a pad back to the shape and placement it was generated with.
pub fn reset_to_rest(mesh: &mut Mesh, info: &RestorationInfo) -> Result<(), RestorationError> {
    mesh.set_positions(&info.rest_positions)?;
    mesh.recompute_normals();
    mesh.transform = info.rest_transform;
    debug!("Reset {} to its generated shape", mesh.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geometry::primitives::cuboid;

    fn arches(gap: f32) -> (Mesh, Mesh) {
        let upper = Mesh::from_data(
            "upper",
            MeshRole::UpperArch,
            cuboid(Vec3::new(-20.0, gap, -15.0), Vec3::new(20.0, gap + 4.0, 15.0)),
        )
        .unwrap();
        let lower = Mesh::from_data(
            "lower",
            MeshRole::LowerArch,
            cuboid(Vec3::new(-25.0, -4.0, -10.0), Vec3::new(25.0, 0.0, 10.0)),
        )
        .unwrap();
        (upper, lower)
    }

    #[test]
    fn test_pad_sits_between_contacts() {
        let (upper, lower) = arches(6.0);
        let generated = RestorationGenerator::default()
            .generate(
                &upper,
                &lower,
                Vec3::new(1.0, 5.0, 2.0),
                &RestorationParameters::default(),
            )
            .unwrap();

        // nearest upper hit is the top face at 10, lower top at 0
        let info = &generated.info;
        assert_relative_eq!(info.clearance.unwrap(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(info.dimensions.height, 7.0, epsilon = 1e-4);
        assert_relative_eq!(info.dimensions.width, 40.0 * 0.07, epsilon = 1e-4);
        assert_relative_eq!(info.dimensions.depth, 20.0 * 0.09, epsilon = 1e-4);

        let mesh = &generated.mesh;
        assert_eq!(mesh.vertex_count(), 114);
        assert_eq!(mesh.triangle_count(), 224);
        assert_eq!(mesh.role(), MeshRole::Restoration);
        assert!(mesh.editable);
        assert_relative_eq!(mesh.transform.translation.y, 4.2, epsilon = 1e-4);

        let bounds = bounding_box(mesh);
        assert!(bounds.min.y > 0.0);
        assert!(bounds.max.y < 10.0);
        assert!((bounds.center().x - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_narrow_gap_pad_stays_between_contacts() {
        let (_, lower) = arches(6.0);
        let upper = Mesh::from_data(
            "upper",
            MeshRole::UpperArch,
            cuboid(Vec3::new(-20.0, 0.6, -15.0), Vec3::new(20.0, 0.65, 15.0)),
        )
        .unwrap();
        let generated = RestorationGenerator::default()
            .generate(
                &upper,
                &lower,
                Vec3::new(1.0, 0.3, 2.0),
                &RestorationParameters::default(),
            )
            .unwrap();

        let info = &generated.info;
        assert_relative_eq!(info.clearance.unwrap(), 0.65, epsilon = 1e-4);
        assert_relative_eq!(info.dimensions.height, 0.65 * 0.7, epsilon = 1e-4);
        let bounds = bounding_box(&generated.mesh);
        assert!(bounds.min.y > 0.0 && bounds.max.y < 0.65, "pad {bounds:?}");
    }

    #[test]
    fn test_base_is_narrower_than_top() {
        let (upper, lower) = arches(6.0);
        let generated = RestorationGenerator::default()
            .generate(&upper, &lower, Vec3::ZERO, &RestorationParameters::default())
            .unwrap();
        let positions = generated.mesh.positions();
        let half = generated.info.dimensions.height * 0.5;
        let widest = |near: f32| {
            positions
                .iter()
                .filter(|p| (p.y - near).abs() < 0.2)
                .map(|p| p.x.abs())
                .fold(0.0f32, f32::max)
        };
        let top = widest(half);
        let base = widest(-half);
        assert_relative_eq!(base, top / 1.25 * 0.8, epsilon = 1e-4);
    }

    #[test]
    fn test_missed_refinement_uses_default_height() {
        let (upper, lower) = arches(6.0);
        let anchor = Vec3::new(100.0, 3.0, 0.0);
        let generated = RestorationGenerator::default()
            .generate(&upper, &lower, anchor, &RestorationParameters::default())
            .unwrap();
        assert_eq!(generated.info.clearance, None);
        assert_relative_eq!(generated.info.dimensions.height, 8.0);
        assert_eq!(generated.mesh.transform.translation, anchor);
    }

    #[test]
    fn test_insertion_angle_tilts_about_x() {
        let (upper, lower) = arches(6.0);
        let parameters = RestorationParameters {
            insertion_angle: 30.0,
            ..RestorationParameters::default()
        };
        let generated = RestorationGenerator::default()
            .generate(&upper, &lower, Vec3::ZERO, &parameters)
            .unwrap();
        let up = generated.mesh.transform.rotation * Vec3::Y;
        assert_relative_eq!(up.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.y, 30f32.to_radians().cos(), epsilon = 1e-5);
        assert!(up.z < 0.0);
    }

    #[test]
    fn test_parameter_validation() {
        let (upper, lower) = arches(6.0);
        let generator = RestorationGenerator::default();
        for parameters in [
            RestorationParameters {
                cement_gap: -0.1,
                ..Default::default()
            },
            RestorationParameters {
                insertion_angle: 50.0,
                ..Default::default()
            },
            RestorationParameters {
                border_thickness: 0.0,
                ..Default::default()
            },
        ] {
            let err = generator
                .generate(&upper, &lower, Vec3::ZERO, &parameters)
                .unwrap_err();
            assert_eq!(err.code(), "invalid_parameters");
        }
    }

    #[test]
    fn test_vertex_budget_is_enforced() {
        let (upper, lower) = arches(6.0);
        let generator = RestorationGenerator::new(
            RestorationConfig {
                radial_segments: 64,
                height_segments: 8,
                ..RestorationConfig::default()
            },
            DEFAULT_RAY_LIFT,
        );
        assert!(matches!(
            generator.generate(&upper, &lower, Vec3::ZERO, &RestorationParameters::default()),
            Err(RestorationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_reset_restores_rest_shape() {
        let (upper, lower) = arches(6.0);
        let GeneratedRestoration { mut mesh, info } = RestorationGenerator::default()
            .generate(&upper, &lower, Vec3::ZERO, &RestorationParameters::default())
            .unwrap();
        mesh.positions_mut()[0] += Vec3::splat(0.5);
        mesh.transform.translation.x += 3.0;

        reset_to_rest(&mut mesh, &info).unwrap();
        assert_eq!(mesh.positions(), info.rest_positions.as_slice());
        assert_eq!(mesh.transform, info.rest_transform);
    }
}
