//! Mapping between protocol messages and domain types.

use geometry::{Aabb, ExportFormat, ExportSpace, Mesh, MeshFormat, MeshId, MeshSlot, bounding_box};
use glam::Vec3;
use occlusal_ipc::{
    BrushDirection, BrushKind, BrushSettings, ExportFileFormat, ExportSpaceName, MeshFileFormat,
    MeshSummary, RestorationDims, RestorationParams, SlotName,
};
use restoration::{RestorationDimensions, RestorationParameters};
use sculpting::{BrushConfig, BrushMode, BrushOperation};

pub fn slot_from_ipc(slot: SlotName) -> MeshSlot {
    match slot {
        SlotName::UpperArch => MeshSlot::UpperArch,
        SlotName::LowerArch => MeshSlot::LowerArch,
        SlotName::FirstBite => MeshSlot::FirstBite,
        SlotName::SecondBite => MeshSlot::SecondBite,
        SlotName::OcclusionPad => MeshSlot::OcclusionPad,
        SlotName::Restoration => MeshSlot::Restoration,
    }
}

pub fn slot_to_ipc(slot: MeshSlot) -> SlotName {
    match slot {
        MeshSlot::UpperArch => SlotName::UpperArch,
        MeshSlot::LowerArch => SlotName::LowerArch,
        MeshSlot::FirstBite => SlotName::FirstBite,
        MeshSlot::SecondBite => SlotName::SecondBite,
        MeshSlot::OcclusionPad => SlotName::OcclusionPad,
        MeshSlot::Restoration => SlotName::Restoration,
    }
}

pub fn mesh_format(format: MeshFileFormat) -> MeshFormat {
    match format {
        MeshFileFormat::Stl => MeshFormat::Stl,
        MeshFileFormat::Obj => MeshFormat::Obj,
    }
}

pub fn export_format(format: ExportFileFormat) -> ExportFormat {
    match format {
        ExportFileFormat::StlBinary => ExportFormat::StlBinary,
        ExportFileFormat::StlAscii => ExportFormat::StlAscii,
        ExportFileFormat::Obj => ExportFormat::Obj,
    }
}

pub fn export_space(space: ExportSpaceName) -> ExportSpace {
    match space {
        ExportSpaceName::World => ExportSpace::World,
        ExportSpaceName::Local => ExportSpace::Local,
    }
}

pub fn brush_config(settings: &BrushSettings) -> BrushConfig {
    let operation = match settings.kind {
        BrushKind::Sculpt => BrushOperation::Sculpt,
        BrushKind::Smooth => BrushOperation::Smooth,
        BrushKind::Inflate => BrushOperation::Inflate,
        BrushKind::Pinch => BrushOperation::Pinch,
        BrushKind::Flatten => BrushOperation::Flatten,
        BrushKind::Remove => BrushOperation::Remove,
    };
    let mode = match settings.direction {
        BrushDirection::Add => BrushMode::Add,
        BrushDirection::Subtract => BrushMode::Subtract,
    };
    BrushConfig {
        radius: settings.radius,
        strength: settings.strength,
        operation,
        mode,
        falloff: settings.falloff,
    }
}

pub fn parameters_from_ipc(params: &RestorationParams) -> RestorationParameters {
    RestorationParameters {
        cement_gap: params.cement_gap,
        insertion_angle: params.insertion_angle,
        border_thickness: params.border_thickness,
    }
}

pub fn parameters_to_ipc(params: &RestorationParameters) -> RestorationParams {
    RestorationParams {
        cement_gap: params.cement_gap,
        insertion_angle: params.insertion_angle,
        border_thickness: params.border_thickness,
    }
}

pub fn dimensions_to_ipc(dims: &RestorationDimensions) -> RestorationDims {
    RestorationDims {
        width: dims.width,
        height: dims.height,
        depth: dims.depth,
    }
}

pub fn summarize(slot: MeshSlot, id: MeshId, mesh: &Mesh) -> MeshSummary {
    let Aabb { min, max } = bounding_box(mesh);
    MeshSummary {
        slot: slot_to_ipc(slot),
        id: id.raw(),
        name: mesh.name().to_string(),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        visible: mesh.visible,
        editable: mesh.editable,
        bounds_min: min.to_array(),
        bounds_max: max.to_array(),
    }
}

pub fn vec3_to_ipc(v: Vec3) -> [f32; 3] {
    v.to_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_map_both_ways() {
        for slot in MeshSlot::ALL {
            assert_eq!(slot_from_ipc(slot_to_ipc(slot)), slot);
        }
    }

    #[test]
    fn test_default_brush_settings_match_engine_defaults() {
        assert_eq!(brush_config(&BrushSettings::default()), BrushConfig::default());
    }

    #[test]
    fn test_subtract_pinch() {
        let settings = BrushSettings {
            kind: BrushKind::Pinch,
            direction: BrushDirection::Subtract,
            ..BrushSettings::default()
        };
        let config = brush_config(&settings);
        assert_eq!(config.operation, BrushOperation::Pinch);
        assert_eq!(config.mode, BrushMode::Subtract);
    }

    #[test]
    fn test_default_parameters_match() {
        let params = parameters_from_ipc(&RestorationParams::default());
        assert_eq!(params, RestorationParameters::default());
    }
}
