//! Axis-aligned bounding boxes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any included point replaces
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.include_point(point);
        }
        aabb
    }

    /// True when no point has been included
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Overlap with positive volume; touching faces do not count
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && other.min.cmplt(self.max).all()
    }

    /// Overlapping region, `None` unless [`Aabb::intersects`] holds
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        self.intersects(other)
            .then(|| Aabb::new(self.min.max(other.min), self.max.min(other.max)))
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// Shrink the X and Z extents by `inset` on every side.
    ///
    /// An axis narrower than twice the inset collapses onto its center.
    pub fn inset_horizontal(&self, inset: f32) -> Aabb {
        let center = self.center();
        let shrink = |min: f32, max: f32, mid: f32| {
            if max - min > 2.0 * inset {
                (min + inset, max - inset)
            } else {
                (mid, mid)
            }
        };
        let (min_x, max_x) = shrink(self.min.x, self.max.x, center.x);
        let (min_z, max_z) = shrink(self.min.z, self.max.z, center.z);
        Aabb::new(
            Vec3::new(min_x, self.min.y, min_z),
            Vec3::new(max_x, self.max.y, max_z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points([Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 4.0, 0.0)]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 3.0));
        assert_eq!(aabb.center(), Vec3::new(0.0, 1.0, 1.5));
        assert!(Aabb::from_points(Vec::<Vec3>::new()).is_empty());
        assert!(!aabb.is_empty());
    }

    #[test]
    fn test_intersection_excludes_touching() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(2.0));
        let c = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.min, Vec3::splat(0.5));
        assert_eq!(overlap.max, Vec3::ONE);
        assert!(!a.intersects(&c));
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_inset_horizontal() {
        let aabb = Aabb::new(Vec3::new(-20.0, 0.0, -4.0), Vec3::new(20.0, 5.0, 4.0));
        let inset = aabb.inset_horizontal(5.0);
        assert_eq!(inset.min, Vec3::new(-15.0, 0.0, 0.0));
        assert_eq!(inset.max, Vec3::new(15.0, 5.0, 0.0));
    }

    #[test]
    fn test_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::new(0.5, 1.5, 0.5)));
    }
}
