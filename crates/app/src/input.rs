//! Viewport pointer to world ray conversion.

use glam::{Mat4, Vec2, Vec3, Vec4};
use occlusal_ipc::CameraState;

use crate::error::EngineError;

/// A world-space ray with unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `from` through `to`.
    pub fn between(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }
}

/// Perspective camera with a cached inverse view-projection.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    viewport: Vec2,
    inverse_view_projection: Mat4,
}

impl Camera {
    pub fn from_state(state: &CameraState) -> Result<Self, EngineError> {
        let eye = Vec3::from_array(state.eye);
        let target = Vec3::from_array(state.target);
        let up = Vec3::from_array(state.up);
        let viewport = Vec2::from_array(state.viewport);

        if !(viewport.x > 0.0 && viewport.y > 0.0) {
            return Err(EngineError::Camera(format!("viewport {viewport} is empty")));
        }
        if !(state.fov_y_degrees > 0.0 && state.fov_y_degrees < 180.0) {
            return Err(EngineError::Camera(format!(
                "field of view {} is outside (0, 180)",
                state.fov_y_degrees
            )));
        }
        if !(state.near > 0.0 && state.far > state.near) {
            return Err(EngineError::Camera(format!(
                "clip range {}..{} is invalid",
                state.near, state.far
            )));
        }
        let forward = (target - eye).normalize_or_zero();
        if forward == Vec3::ZERO || forward.cross(up).length_squared() < 1e-12 {
            return Err(EngineError::Camera(
                "eye, target and up do not define an orientation".into(),
            ));
        }

        let view = Mat4::look_at_rh(eye, target, up);
        let projection = Mat4::perspective_rh(
            state.fov_y_degrees.to_radians(),
            viewport.x / viewport.y,
            state.near,
            state.far,
        );
        Ok(Self {
            viewport,
            inverse_view_projection: (projection * view).inverse(),
        })
    }

    /// Ray through a viewport pixel (origin top-left), starting on the near plane.
    pub fn ray(&self, x: f32, y: f32) -> Ray {
        let ndc_x = 2.0 * x / self.viewport.x - 1.0;
        let ndc_y = 1.0 - 2.0 * y / self.viewport.y;
        let near = self.unproject(Vec4::new(ndc_x, ndc_y, 0.0, 1.0));
        let far = self.unproject(Vec4::new(ndc_x, ndc_y, 1.0, 1.0));
        Ray::new(near, far - near)
    }

    fn unproject(&self, clip: Vec4) -> Vec3 {
        let world = self.inverse_view_projection * clip;
        world.truncate() / world.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn looking_down_z() -> CameraState {
        CameraState {
            eye: [0.0, 0.0, 10.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            viewport: [800.0, 600.0],
            ..CameraState::default()
        }
    }

    #[test]
    fn test_center_pixel_looks_at_target() {
        let camera = Camera::from_state(&looking_down_z()).unwrap();
        let ray = camera.ray(400.0, 300.0);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.origin.z, 10.0 - 0.1, epsilon = 1e-3);
    }

    #[test]
    fn test_pixel_axes() {
        let camera = Camera::from_state(&looking_down_z()).unwrap();
        let right = camera.ray(700.0, 300.0);
        assert!(right.direction.x > 0.0);
        let top = camera.ray(400.0, 50.0);
        assert!(top.direction.y > 0.0);
    }

    #[test]
    fn test_rejects_degenerate_cameras() {
        let mut state = looking_down_z();
        state.viewport = [0.0, 600.0];
        assert!(Camera::from_state(&state).is_err());

        let mut state = looking_down_z();
        state.up = [0.0, 0.0, 1.0];
        assert!(Camera::from_state(&state).is_err());

        let mut state = looking_down_z();
        state.far = state.near;
        assert!(Camera::from_state(&state).is_err());
    }
}
