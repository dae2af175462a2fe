//! Narrow service seams the engine drives.
//!
//! Each trait covers one stage of the workflow and returns `Result`, so a
//! shell or test can swap an implementation without touching the engine.

use geometry::{Mesh, MeshHit, MeshSlot, MeshStore};
use glam::Vec3;
use occlusal_config::EngineConfig;
use restoration::{
    AssemblyReport, CollisionReport, GapDetector, GapReport, GeneratedRestoration,
    RestorationError, RestorationGenerator, RestorationParameters,
};
use sculpting::{BrushConfig, BrushConfigError, apply_at_hit};

/// Aligns the arches.
pub trait AssemblyService {
    fn assemble(&self, store: &mut MeshStore) -> Result<AssemblyReport, RestorationError>;
}

/// Finds the gap, builds the pad and keeps restorations apart.
pub trait RestorationService {
    fn detect_gap(&self, store: &MeshStore) -> Result<GapReport, RestorationError>;

    fn generate(
        &self,
        store: &MeshStore,
        anchor: Vec3,
        parameters: &RestorationParameters,
    ) -> Result<GeneratedRestoration, RestorationError>;

    fn resolve_collisions(
        &self,
        store: &mut MeshStore,
        target: MeshSlot,
    ) -> Result<CollisionReport, RestorationError>;
}

/// Owns the live brush and applies dabs.
pub trait BrushService {
    fn config(&self) -> &BrushConfig;

    /// Install new settings; invalid settings leave the current brush in place.
    fn set_config(&mut self, config: BrushConfig) -> Result<(), BrushConfigError>;

    /// Apply one dab at `hit`; true when any vertex moved.
    fn apply(&self, mesh: &mut Mesh, hit: &MeshHit, ray_dir: Vec3) -> bool;
}

/// Bounding-box mid-plane fitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidplaneAssembly;

impl AssemblyService for MidplaneAssembly {
    fn assemble(&self, store: &mut MeshStore) -> Result<AssemblyReport, RestorationError> {
        restoration::assemble(store)
    }
}

/// Scan-grid detection plus parametric pad generation.
#[derive(Debug, Clone, Default)]
pub struct PadWorkshop {
    detector: GapDetector,
    generator: RestorationGenerator,
}

impl PadWorkshop {
    pub fn new(detector: GapDetector, generator: RestorationGenerator) -> Self {
        Self {
            detector,
            generator,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            GapDetector::new(config.gap.clone()),
            RestorationGenerator::new(config.restoration.clone(), config.gap.ray_lift),
        )
    }
}

impl RestorationService for PadWorkshop {
    fn detect_gap(&self, store: &MeshStore) -> Result<GapReport, RestorationError> {
        self.detector.detect_in_store(store)
    }

    fn generate(
        &self,
        store: &MeshStore,
        anchor: Vec3,
        parameters: &RestorationParameters,
    ) -> Result<GeneratedRestoration, RestorationError> {
        self.generator.generate_in_store(store, anchor, parameters)
    }

    fn resolve_collisions(
        &self,
        store: &mut MeshStore,
        target: MeshSlot,
    ) -> Result<CollisionReport, RestorationError> {
        restoration::resolve(store, target)
    }
}

/// Brush backed by the sculpting kernels.
#[derive(Debug, Clone, Default)]
pub struct KernelBrush {
    config: BrushConfig,
}

impl BrushService for KernelBrush {
    fn config(&self) -> &BrushConfig {
        &self.config
    }

    fn set_config(&mut self, config: BrushConfig) -> Result<(), BrushConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn apply(&self, mesh: &mut Mesh, hit: &MeshHit, ray_dir: Vec3) -> bool {
        apply_at_hit(mesh, hit, ray_dir, &self.config).modified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_brush_keeps_previous() {
        let mut brush = KernelBrush::default();
        let good = BrushConfig {
            radius: 2.0,
            ..BrushConfig::default()
        };
        brush.set_config(good).unwrap();

        let bad = BrushConfig {
            strength: 3.0,
            ..BrushConfig::default()
        };
        assert!(brush.set_config(bad).is_err());
        assert_eq!(*brush.config(), good);
    }

    #[test]
    fn test_workshop_needs_arches() {
        let workshop = PadWorkshop::default();
        let store = MeshStore::default();
        let err = workshop.detect_gap(&store).unwrap_err();
        assert_eq!(err.code(), "missing_input");
    }
}
