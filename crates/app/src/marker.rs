//! Temporary sphere shown at a detected anchor.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorMarker {
    pub position: Vec3,
    pub radius: f32,
    remaining: f32,
}

impl AnchorMarker {
    pub fn new(position: Vec3, radius: f32, seconds: f32) -> Self {
        Self {
            position,
            radius,
            remaining: seconds.max(0.0),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Advance by `seconds`; true once the marker has expired.
    pub fn tick(&mut self, seconds: f32) -> bool {
        if seconds > 0.0 {
            self.remaining = (self.remaining - seconds).max(0.0);
        }
        self.remaining <= 0.0
    }
}
