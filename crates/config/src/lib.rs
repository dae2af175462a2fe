//! Shared configuration for Occlusal
//!
//! This crate is the single source of truth for the tunable constants used by
//! the mesh store, the gap scan, the restoration generator, the undo history
//! and the interaction controller. Every section deserializes with defaults,
//! so a partial JSON file only needs to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "OCCLUSAL_CONFIG";

/// Default offset of a freshly loaded upper arch
pub const DEFAULT_UPPER_ARCH_OFFSET: [f32; 3] = [0.0, 15.0, 0.0];
/// Default offset of a freshly loaded lower arch
pub const DEFAULT_LOWER_ARCH_OFFSET: [f32; 3] = [0.0, -15.0, 0.0];
/// Default offset of the first bite registration
pub const DEFAULT_FIRST_BITE_OFFSET: [f32; 3] = [0.0, 0.0, -10.0];
/// Default offset of the second bite registration
pub const DEFAULT_SECOND_BITE_OFFSET: [f32; 3] = [0.0, 0.0, 10.0];

/// Scan grid resolution along X
pub const DEFAULT_SCAN_COLUMNS_X: u32 = 30;
/// Scan grid resolution along Z
pub const DEFAULT_SCAN_COLUMNS_Z: u32 = 15;
/// Inset of the scan rectangle from the union of both arch bounds
pub const DEFAULT_EDGE_INSET: f32 = 5.0;
/// Half height of the vertical scan band around the mid-gap plane
pub const DEFAULT_BAND_HALF_HEIGHT: f32 = 3.0;
/// Height above the upper arch at which scan rays start
pub const DEFAULT_RAY_LIFT: f32 = 10.0;
/// Minimum vertical separation for a column to count as a gap
pub const DEFAULT_CLEARANCE_THRESHOLD: f32 = 5.0;
/// Clearance assigned to columns where neither arch is hit
pub const DEFAULT_NOMINAL_CLEARANCE: f32 = 10.0;
/// Radius within which candidates merge into one cluster
pub const DEFAULT_MERGE_RADIUS: f32 = 3.0;

/// Pad height as a fraction of the measured clearance
pub const DEFAULT_HEIGHT_RATIO: f32 = 0.7;
/// Pad center height as a fraction of the pad height above the lower contact
pub const DEFAULT_LIFT_RATIO: f32 = 0.6;
/// Pad width as a fraction of the smaller arch X extent
pub const DEFAULT_WIDTH_FRACTION: f32 = 0.07;
/// Pad depth as a fraction of the smaller arch Z extent
pub const DEFAULT_DEPTH_FRACTION: f32 = 0.09;
/// Ratio of top radius to base radius
pub const DEFAULT_BASE_TAPER: f32 = 1.25;
/// Lateral scale applied to base-band vertices
pub const DEFAULT_BASE_CONTRACTION: f32 = 0.8;
/// Radial segments of the pad primitive
pub const DEFAULT_RADIAL_SEGMENTS: u32 = 16;
/// Height segments of the pad primitive
pub const DEFAULT_HEIGHT_SEGMENTS: u32 = 4;
/// Concentric rings on the pad's top cap
pub const DEFAULT_CAP_RINGS: u32 = 2;
/// Thickness of the top and base bands that receive surface detail
pub const DEFAULT_SURFACE_BAND: f32 = 1.0;
/// Pad height used when the clearance cannot be measured
pub const DEFAULT_PAD_HEIGHT: f32 = 8.0;
/// Upper bound on pad vertices, keeps quadratic brush kernels cheap
pub const DEFAULT_MAX_PAD_VERTICES: usize = 400;
/// Default cement gap in millimetres
pub const DEFAULT_CEMENT_GAP: f32 = 0.1;
/// Default insertion path angle in degrees
pub const DEFAULT_INSERTION_ANGLE: f32 = 0.0;
/// Default border thickness in millimetres
pub const DEFAULT_BORDER_THICKNESS: f32 = 0.5;

/// Maximum number of undo snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Minimum pointer travel (world units) between brush applications
pub const DEFAULT_MIN_MOVE_DISTANCE: f32 = 0.5;
/// Radius of the anchor marker sphere
pub const DEFAULT_MARKER_RADIUS: f32 = 1.5;
/// Lifetime of the anchor marker in seconds
pub const DEFAULT_MARKER_SECONDS: f32 = 3.0;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default placement of each mesh slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub upper_arch_offset: [f32; 3],
    pub lower_arch_offset: [f32; 3],
    pub first_bite_offset: [f32; 3],
    pub second_bite_offset: [f32; 3],
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            upper_arch_offset: DEFAULT_UPPER_ARCH_OFFSET,
            lower_arch_offset: DEFAULT_LOWER_ARCH_OFFSET,
            first_bite_offset: DEFAULT_FIRST_BITE_OFFSET,
            second_bite_offset: DEFAULT_SECOND_BITE_OFFSET,
        }
    }
}

/// Scan grid used to locate the missing-tooth cavity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapScanConfig {
    /// Rays along X (at least 1)
    pub columns_x: u32,
    /// Rays along Z (at least 1)
    pub columns_z: u32,
    pub edge_inset: f32,
    pub band_half_height: f32,
    pub ray_lift: f32,
    pub clearance_threshold: f32,
    pub nominal_clearance: f32,
    pub merge_radius: f32,
}

impl Default for GapScanConfig {
    fn default() -> Self {
        Self {
            columns_x: DEFAULT_SCAN_COLUMNS_X,
            columns_z: DEFAULT_SCAN_COLUMNS_Z,
            edge_inset: DEFAULT_EDGE_INSET,
            band_half_height: DEFAULT_BAND_HALF_HEIGHT,
            ray_lift: DEFAULT_RAY_LIFT,
            clearance_threshold: DEFAULT_CLEARANCE_THRESHOLD,
            nominal_clearance: DEFAULT_NOMINAL_CLEARANCE,
            merge_radius: DEFAULT_MERGE_RADIUS,
        }
    }
}

/// One sine term of the occlusal surface relief
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub amplitude: f32,
    /// Angular frequency along X and Z
    pub frequency: [f32; 2],
}

/// Shape and sizing of the generated occlusal pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationConfig {
    pub height_ratio: f32,
    pub lift_ratio: f32,
    pub width_fraction: f32,
    pub depth_fraction: f32,
    pub base_taper: f32,
    pub base_contraction: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub cap_rings: u32,
    pub surface_band: f32,
    pub default_height: f32,
    pub max_vertices: usize,
    /// `sin(fx * x) * sin(fz * z)` term
    pub primary_wave: WaveConfig,
    /// `sin(fx * x) * cos(fz * z)` term
    pub secondary_wave: WaveConfig,
    pub cement_gap: f32,
    pub insertion_angle: f32,
    pub border_thickness: f32,
}

impl Default for RestorationConfig {
    fn default() -> Self {
        Self {
            height_ratio: DEFAULT_HEIGHT_RATIO,
            lift_ratio: DEFAULT_LIFT_RATIO,
            width_fraction: DEFAULT_WIDTH_FRACTION,
            depth_fraction: DEFAULT_DEPTH_FRACTION,
            base_taper: DEFAULT_BASE_TAPER,
            base_contraction: DEFAULT_BASE_CONTRACTION,
            radial_segments: DEFAULT_RADIAL_SEGMENTS,
            height_segments: DEFAULT_HEIGHT_SEGMENTS,
            cap_rings: DEFAULT_CAP_RINGS,
            surface_band: DEFAULT_SURFACE_BAND,
            default_height: DEFAULT_PAD_HEIGHT,
            max_vertices: DEFAULT_MAX_PAD_VERTICES,
            primary_wave: WaveConfig {
                amplitude: 0.1,
                frequency: [8.0, 6.0],
            },
            secondary_wave: WaveConfig {
                amplitude: 0.05,
                frequency: [12.0, 8.0],
            },
            cement_gap: DEFAULT_CEMENT_GAP,
            insertion_angle: DEFAULT_INSERTION_ANGLE,
            border_thickness: DEFAULT_BORDER_THICKNESS,
        }
    }
}

impl RestorationConfig {
    /// Vertex count of the pad primitive built from these settings
    pub fn pad_vertex_count(&self) -> usize {
        let radial = self.radial_segments as usize;
        radial * (self.height_segments as usize + 1) + radial * self.cap_rings as usize + 2
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Pointer stroke and operator feedback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub min_move_distance: f32,
    /// Run the collision resolver when a stroke ends
    pub resolve_on_release: bool,
    pub marker_radius: f32,
    pub marker_seconds: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_move_distance: DEFAULT_MIN_MOVE_DISTANCE,
            resolve_on_release: true,
            marker_radius: DEFAULT_MARKER_RADIUS,
            marker_seconds: DEFAULT_MARKER_SECONDS,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub gap: GapScanConfig,
    pub restoration: RestorationConfig,
    pub history: HistoryConfig,
    pub interaction: InteractionConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file named by `OCCLUSAL_CONFIG`, or defaults when it is unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => {
                debug!("{} not set, using default configuration", CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every range constraint the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gap = &self.gap;
        if gap.columns_x == 0 || gap.columns_z == 0 {
            return Err(invalid("gap scan needs at least one column per axis"));
        }
        if gap.merge_radius <= 0.0 {
            return Err(invalid("gap merge radius must be positive"));
        }
        if gap.edge_inset < 0.0 || gap.band_half_height < 0.0 || gap.ray_lift <= 0.0 {
            return Err(invalid("gap scan distances must not be negative"));
        }

        let r = &self.restoration;
        for (name, ratio) in [
            ("height_ratio", r.height_ratio),
            ("lift_ratio", r.lift_ratio),
            ("width_fraction", r.width_fraction),
            ("depth_fraction", r.depth_fraction),
            ("base_contraction", r.base_contraction),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(invalid(&format!("restoration {name} must lie in (0, 1]")));
            }
        }
        if r.base_taper < 1.0 {
            return Err(invalid("restoration base taper must be at least 1"));
        }
        if r.radial_segments < 3 || r.height_segments == 0 {
            return Err(invalid("restoration primitive needs 3 radial and 1 height segment"));
        }
        if r.default_height <= 0.0 {
            return Err(invalid("restoration default height must be positive"));
        }
        if r.pad_vertex_count() > r.max_vertices {
            return Err(invalid(&format!(
                "restoration primitive has {} vertices, limit is {}",
                r.pad_vertex_count(),
                r.max_vertices
            )));
        }

        if self.history.capacity == 0 {
            return Err(invalid("history capacity must be at least 1"));
        }
        if self.interaction.min_move_distance < 0.0 || self.interaction.marker_seconds < 0.0 {
            return Err(invalid("interaction distances and durations must not be negative"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
