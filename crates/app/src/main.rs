//! Occlusal - command-line front end for the restoration engine

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use geometry::primitives::{CylinderSpec, cuboid, tapered_cylinder};
use geometry::{
    Aabb, ExportFormat, ExportSpace, Mesh, MeshFormat, MeshRole, MeshSlot, Transform, io,
};
use glam::{Vec2, Vec3};
use occlusal::Engine;
use occlusal_config::EngineConfig;
use occlusal_ipc::ExportReference;
use restoration::RestorationParameters;
use tracing::{info, warn};

/// Dental arch assembly and occlusal restoration tool
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// JSON configuration file (falls back to $OCCLUSAL_CONFIG, then defaults)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble two arches, place a restoration in the gap and export it
    Pipeline {
        /// Upper arch mesh (STL or OBJ)
        #[clap(long)]
        upper: PathBuf,

        /// Lower arch mesh (STL or OBJ)
        #[clap(long)]
        lower: PathBuf,

        /// Restoration file to write
        #[clap(short, long)]
        out: PathBuf,

        #[clap(short, long, value_enum, default_value_t = OutputFormat::StlBinary)]
        format: OutputFormat,

        /// Write local-space vertices instead of placing the pad in the scene
        #[clap(long)]
        local: bool,

        #[clap(flatten)]
        parameters: ParameterArgs,

        /// Write a restoration record (JSON) for this patient
        #[clap(long, requires = "record")]
        patient: Option<String>,

        /// Restoration record file
        #[clap(long, requires = "patient")]
        record: Option<PathBuf>,
    },

    /// Print format, counts and bounds of a mesh file
    Inspect {
        /// Mesh file (STL or OBJ)
        input: PathBuf,
    },

    /// Write a synthetic arch pair for trying the pipeline
    Demo {
        /// Output directory
        #[clap(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    StlBinary,
    StlAscii,
    Obj,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::StlBinary => ExportFormat::StlBinary,
            OutputFormat::StlAscii => ExportFormat::StlAscii,
            OutputFormat::Obj => ExportFormat::Obj,
        }
    }
}

/// Restoration parameters; unset values come from the configuration
#[derive(Parser)]
struct ParameterArgs {
    /// Cement gap in mm
    #[clap(long)]
    cement_gap: Option<f32>,

    /// Insertion-path angle in degrees (0 to 45)
    #[clap(long)]
    insertion_angle: Option<f32>,

    /// Border thickness in mm
    #[clap(long)]
    border_thickness: Option<f32>,
}

impl ParameterArgs {
    fn resolve(&self, config: &EngineConfig) -> RestorationParameters {
        let defaults = RestorationParameters::from(&config.restoration);
        RestorationParameters {
            cement_gap: self.cement_gap.unwrap_or(defaults.cement_gap),
            insertion_angle: self.insertion_angle.unwrap_or(defaults.insertion_angle),
            border_thickness: self.border_thickness.unwrap_or(defaults.border_thickness),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

fn load(engine: &mut Engine, slot: MeshSlot, path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    engine
        .load_mesh(slot, &bytes, MeshFormat::from_path(path))
        .with_context(|| format!("failed to load {} as {}", path.display(), slot.label()))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline(
    config: EngineConfig,
    upper: &Path,
    lower: &Path,
    out: &Path,
    format: ExportFormat,
    space: ExportSpace,
    parameters: RestorationParameters,
    record: Option<(&str, &Path)>,
) -> Result<()> {
    let mut engine = Engine::new(config)?;
    load(&mut engine, MeshSlot::UpperArch, upper)?;
    load(&mut engine, MeshSlot::LowerArch, lower)?;

    let assembly = engine.assemble()?;
    info!("Arches meet at y = {:.3}", assembly.plane_y);

    let gap = engine.detect_gap()?;
    if gap.fallback {
        warn!("No gap found, placing the restoration at the scan center");
    } else {
        info!(
            "Gap at {:?} from {} clusters ({} candidates)",
            gap.anchor,
            gap.clusters.len(),
            gap.candidate_count
        );
    }

    let generated = engine
        .generate_restoration(Some(parameters))
        .context("failed to generate restoration")?;
    let dims = generated.dimensions;
    println!(
        "restoration {:.3} x {:.3} x {:.3} at {:?}",
        dims.width, dims.height, dims.depth, generated.anchor
    );

    let exported = engine.export_mesh(MeshSlot::Restoration, format, space)?;
    fs::write(out, &exported.bytes).with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {} ({} bytes)", out.display(), exported.bytes.len());

    if let Some((patient, path)) = record {
        let (mut record, _) = engine.describe_restoration(patient, None)?;
        record.export = Some(ExportReference {
            file_name: out
                .file_name()
                .map_or_else(|| out.display().to_string(), |n| n.to_string_lossy().into_owned()),
            ..exported.reference
        });
        fs::write(path, record.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote record {}", path.display());
    }
    Ok(())
}

fn run_inspect(input: &Path) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let hint = MeshFormat::from_path(input);
    let data = io::import(&bytes, hint)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    let bounds = Aabb::from_points(data.positions.iter().copied());

    println!("file:      {}", input.display());
    match hint {
        Some(format) => println!("format:    {format:?}"),
        None => println!("format:    detected from content"),
    }
    println!("vertices:  {}", data.positions.len());
    println!("triangles: {}", data.triangle_count());
    println!("bounds:    {} .. {}", bounds.min, bounds.max);
    println!("size:      {}", bounds.size());
    for group in &data.groups {
        println!("group:     {} ({} triangles)", group.name, group.triangle_count);
    }
    Ok(())
}

fn run_demo(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut upper = Mesh::from_data(
        "demo_upper_arch",
        MeshRole::UpperArch,
        tapered_cylinder(&CylinderSpec {
            top_radius: Vec2::splat(6.0),
            bottom_radius: Vec2::splat(12.0),
            height: 10.0,
            radial_segments: 32,
            height_segments: 4,
            cap_rings: 3,
        }),
    )?;
    upper.transform = Transform::from_translation(Vec3::new(0.0, 20.0, 0.0));

    let lower = Mesh::from_data(
        "demo_lower_arch",
        MeshRole::LowerArch,
        cuboid(Vec3::new(-20.0, -5.0, -15.0), Vec3::new(20.0, 5.0, 15.0)),
    )?;

    for (mesh, file) in [(&upper, "upper_arch.stl"), (&lower, "lower_arch.stl")] {
        let path = out_dir.join(file);
        let bytes = io::export(mesh, ExportFormat::StlBinary, ExportSpace::World)?;
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => EngineConfig::from_env().context("failed to load configuration")?,
    };

    match args.cmd {
        Command::Pipeline {
            upper,
            lower,
            out,
            format,
            local,
            parameters,
            patient,
            record,
        } => {
            let parameters = parameters.resolve(&config);
            let space = if local { ExportSpace::Local } else { ExportSpace::World };
            let record = patient.as_deref().zip(record.as_deref());
            run_pipeline(
                config,
                &upper,
                &lower,
                &out,
                format.into(),
                space,
                parameters,
                record,
            )
        }
        Command::Inspect { input } => run_inspect(&input),
        Command::Demo { out_dir } => run_demo(&out_dir),
    }
}
