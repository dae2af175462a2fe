//! Missing-tooth gap detection.
//!
//! A grid of vertical rays is cast over the region between the arches. A
//! column whose upper and lower contacts are far apart is a gap candidate, as
//! is a column that hits neither arch at all. Candidates are merged greedily
//! into clusters and the cluster with the largest mean clearance wins.
//!
//! The detector never fails once both arches exist: with no candidates it
//! falls back to the center of the scan region.

use geometry::{Aabb, Mesh, MeshSlot, MeshStore, bounding_box, raycast};
use glam::Vec3;
use occlusal_config::GapScanConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RestorationError;

/// One scan column classified as a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapCandidate {
    pub position: Vec3,
    /// Vertical distance between the upper and lower contact
    pub clearance: f32,
    /// Surface intersections observed in the column
    pub contributing_points: u32,
}

/// Candidates merged around a running centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCluster {
    pub centroid: Vec3,
    pub mean_clearance: f32,
    pub members: u32,
    pub contributing_points: u32,
}

impl GapCluster {
    fn new(candidate: &GapCandidate) -> Self {
        Self {
            centroid: candidate.position,
            mean_clearance: candidate.clearance,
            members: 1,
            contributing_points: candidate.contributing_points,
        }
    }

    fn absorb(&mut self, candidate: &GapCandidate) {
        self.members += 1;
        let n = self.members as f32;
        self.centroid += (candidate.position - self.centroid) / n;
        self.mean_clearance += (candidate.clearance - self.mean_clearance) / n;
        self.contributing_points += candidate.contributing_points;
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    /// Where the restoration should go
    pub anchor: Vec3,
    /// Horizontal scan rectangle with the vertical band on Y
    pub region: Aabb,
    /// Clusters ranked by mean clearance, best first
    pub clusters: Vec<GapCluster>,
    pub candidate_count: usize,
    /// True when no candidate was found and the anchor is the region center
    pub fallback: bool,
}

impl GapReport {
    /// Mean clearance of the winning cluster
    pub fn best_clearance(&self) -> Option<f32> {
        self.clusters.first().map(|cluster| cluster.mean_clearance)
    }
}

/// Scan-grid gap finder.
#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    config: GapScanConfig,
}

impl GapDetector {
    pub fn new(config: GapScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GapScanConfig {
        &self.config
    }

    /// Scan the arches held by `store`.
    pub fn detect_in_store(&self, store: &MeshStore) -> Result<GapReport, RestorationError> {
        let upper = store
            .get(MeshSlot::UpperArch)
            .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::UpperArch))?;
        let lower = store
            .get(MeshSlot::LowerArch)
            .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::LowerArch))?;
        Ok(self.detect(upper, lower))
    }

    /// Scan between two arch meshes.
    pub fn detect(&self, upper: &Mesh, lower: &Mesh) -> GapReport {
        let config = &self.config;
        let upper_box = bounding_box(upper);
        let lower_box = bounding_box(lower);

        let mid_y = (upper_box.min.y + lower_box.max.y) * 0.5;
        let horizontal = upper_box.union(&lower_box).inset_horizontal(config.edge_inset);
        let region = Aabb::new(
            Vec3::new(horizontal.min.x, mid_y - config.band_half_height, horizontal.min.z),
            Vec3::new(horizontal.max.x, mid_y + config.band_half_height, horizontal.max.z),
        );
        let ray_y = upper_box.max.y + config.ray_lift;

        let mut candidates = Vec::new();
        for i in 0..config.columns_x {
            for j in 0..config.columns_z {
                let x = grid_coordinate(region.min.x, region.max.x, i, config.columns_x);
                let z = grid_coordinate(region.min.z, region.max.z, j, config.columns_z);
                let origin = Vec3::new(x, ray_y, z);
                if let Some(candidate) = self.classify_column(origin, mid_y, upper, lower) {
                    candidates.push(candidate);
                }
            }
        }
        debug!(
            "Gap scan: {} of {} columns are candidates",
            candidates.len(),
            config.columns_x * config.columns_z
        );

        let clusters = cluster(&candidates, config.merge_radius);
        let candidate_count = candidates.len();

        match clusters.first() {
            Some(best) => {
                info!(
                    "Gap anchor at ({:.2}, {:.2}, {:.2}), clearance {:.2} over {} columns",
                    best.centroid.x,
                    best.centroid.y,
                    best.centroid.z,
                    best.mean_clearance,
                    best.members
                );
                GapReport {
                    anchor: best.centroid,
                    region,
                    clusters,
                    candidate_count,
                    fallback: false,
                }
            }
            None => {
                let anchor = region.center();
                warn!("No gap candidates found, using scan center {anchor:?}");
                GapReport {
                    anchor,
                    region,
                    clusters,
                    candidate_count,
                    fallback: true,
                }
            }
        }
    }

    fn classify_column(
        &self,
        origin: Vec3,
        mid_y: f32,
        upper: &Mesh,
        lower: &Mesh,
    ) -> Option<GapCandidate> {
        let upper_hit = raycast(origin, Vec3::NEG_Y, upper);
        let lower_hit = raycast(origin, Vec3::NEG_Y, lower);

        match (upper_hit, lower_hit) {
            (Some(top), Some(bottom)) => {
                let clearance = (top.point.y - bottom.point.y).abs();
                (clearance > self.config.clearance_threshold).then(|| GapCandidate {
                    position: Vec3::new(origin.x, (top.point.y + bottom.point.y) * 0.5, origin.z),
                    clearance,
                    contributing_points: 2,
                })
            }
            (None, None) => Some(GapCandidate {
                position: Vec3::new(origin.x, mid_y, origin.z),
                clearance: self.config.nominal_clearance,
                contributing_points: 0,
            }),
            _ => None,
        }
    }
}

/// Evenly spaced coordinate `index` of `count` across `min..=max`.
fn grid_coordinate(min: f32, max: f32, index: u32, count: u32) -> f32 {
    if count <= 1 {
        return (min + max) * 0.5;
    }
    min + (max - min) * index as f32 / (count - 1) as f32
}

/// Greedy merge: each candidate joins the first cluster whose centroid is
/// within `merge_radius`, otherwise it starts a new one.
///
/// The result is sorted by mean clearance, descending; ties keep the order in
/// which clusters formed.
pub fn cluster(candidates: &[GapCandidate], merge_radius: f32) -> Vec<GapCluster> {
    let mut clusters: Vec<GapCluster> = Vec::new();
    for candidate in candidates {
        match clusters
            .iter_mut()
            .find(|cluster| cluster.centroid.distance(candidate.position) < merge_radius)
        {
            Some(cluster) => cluster.absorb(candidate),
            None => clusters.push(GapCluster::new(candidate)),
        }
    }
    clusters.sort_by(|a, b| b.mean_clearance.total_cmp(&a.mean_clearance));
    clusters
}
