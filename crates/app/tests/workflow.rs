//! End-to-end session: load, assemble, detect, generate, sculpt, undo.

use approx::assert_relative_eq;
use geometry::primitives::{CylinderSpec, cuboid, tapered_cylinder};
use geometry::{ExportFormat, ExportSpace, Mesh, MeshRole, MeshSlot, Transform, bounding_box, io};
use glam::{Vec2, Vec3};
use occlusal::Engine;
use occlusal_config::EngineConfig;
use occlusal_ipc::{
    BrushDirection, BrushKind, BrushSettings, CameraState, EngineToShell, PointerEvent,
    PointerPhase, ShellToEngine, SlotName, ToolMode,
};

fn stl(mesh: &Mesh) -> Vec<u8> {
    io::export(mesh, ExportFormat::StlBinary, ExportSpace::World).unwrap()
}

/// Tapered cylinder standing at y = 20 over a flat box centered on the origin.
fn arches() -> (Vec<u8>, Vec<u8>) {
    let mut upper = Mesh::from_data(
        "upper",
        MeshRole::UpperArch,
        tapered_cylinder(&CylinderSpec {
            top_radius: Vec2::splat(6.0),
            bottom_radius: Vec2::splat(12.0),
            height: 10.0,
            radial_segments: 32,
            height_segments: 4,
            cap_rings: 3,
        }),
    )
    .unwrap();
    upper.transform = Transform::from_translation(Vec3::new(0.0, 20.0, 0.0));

    let lower = Mesh::from_data(
        "lower",
        MeshRole::LowerArch,
        cuboid(Vec3::new(-20.0, -5.0, -15.0), Vec3::new(20.0, 5.0, 15.0)),
    )
    .unwrap();

    (stl(&upper), stl(&lower))
}

fn no_errors(events: &[EngineToShell]) {
    for event in events {
        assert!(!event.is_error(), "unexpected error event {event:?}");
    }
}

fn restoration(engine: &Engine) -> &Mesh {
    engine.store().get(MeshSlot::Restoration).unwrap()
}

#[test]
fn test_restoration_session() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let (upper, lower) = arches();

    engine.handle(ShellToEngine::LoadMesh {
        slot: SlotName::UpperArch,
        bytes: upper,
        file_name: Some("upper.stl".into()),
        format: None,
    });
    engine.handle(ShellToEngine::LoadMesh {
        slot: SlotName::LowerArch,
        bytes: lower,
        file_name: Some("lower.stl".into()),
        format: None,
    });
    no_errors(&engine.take_events());

    // Assembly brings the arches into contact
    engine.handle(ShellToEngine::Assemble);
    let events = engine.take_events();
    no_errors(&events);
    let plane_y = events
        .iter()
        .find_map(|event| match event {
            EngineToShell::Assembled { plane_y, .. } => Some(*plane_y),
            _ => None,
        })
        .unwrap();
    assert_relative_eq!(plane_y, 10.0, epsilon = 1e-3);
    let upper_box = bounding_box(engine.store().get(MeshSlot::UpperArch).unwrap());
    let lower_box = bounding_box(engine.store().get(MeshSlot::LowerArch).unwrap());
    assert_relative_eq!(upper_box.min.y, 10.0, epsilon = 1e-3);
    assert_relative_eq!(lower_box.max.y, 10.0, epsilon = 1e-3);

    // The gap is found under the cylinder's flat top
    engine.handle(ShellToEngine::DetectGap);
    let events = engine.take_events();
    no_errors(&events);
    let (anchor, clearance, fallback) = events
        .iter()
        .find_map(|event| match event {
            EngineToShell::GapDetected {
                anchor,
                clearance,
                fallback,
                ..
            } => Some((Vec3::from_array(*anchor), *clearance, *fallback)),
            _ => None,
        })
        .unwrap();
    assert!(!fallback);
    assert!(Vec2::new(anchor.x, anchor.z).length() < 6.0, "anchor {anchor:?}");
    assert!(clearance.unwrap() > engine.config().gap.clearance_threshold);

    // Generated pad is 0.7 of the clearance and sits between the contacts
    engine.handle(ShellToEngine::GenerateRestoration { parameters: None });
    no_errors(&engine.take_events());
    let info = engine.restoration_info().unwrap();
    assert_relative_eq!(info.clearance.unwrap(), 10.0, epsilon = 1e-3);
    assert_relative_eq!(info.dimensions.height, 7.0, epsilon = 1e-3);
    let pad_box = bounding_box(restoration(&engine));
    assert!(pad_box.min.y > 10.0 && pad_box.max.y < 20.0, "pad {pad_box:?}");

    // The pad's top center vertex
    let center = restoration(&engine).transform.translation;
    let top = info.dimensions.height * 0.5;
    let (apex, _) = restoration(&engine)
        .positions()
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(Vec3::new(0.0, top, 0.0))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    let before = restoration(&engine).positions().to_vec();

    // One sculpt/add dab straight down onto the apex
    engine.handle(ShellToEngine::SetToolMode {
        mode: ToolMode::Sculpt,
    });
    engine.handle(ShellToEngine::SetBrush {
        settings: BrushSettings {
            radius: 2.0,
            strength: 1.0,
            kind: BrushKind::Sculpt,
            direction: BrushDirection::Add,
            ..BrushSettings::default()
        },
    });
    let aim = center + Vec3::new(0.01, 0.0, 0.0);
    engine.handle(ShellToEngine::SetCamera(CameraState {
        eye: (aim + Vec3::new(0.0, 60.0, 0.0)).to_array(),
        target: aim.to_array(),
        up: [0.0, 0.0, -1.0],
        viewport: [800.0, 600.0],
        ..CameraState::default()
    }));
    for phase in [PointerPhase::Down, PointerPhase::Up] {
        engine.handle(ShellToEngine::Pointer(PointerEvent {
            phase,
            x: 400.0,
            y: 300.0,
        }));
    }
    let events = engine.take_events();
    no_errors(&events);
    assert!(events.iter().any(|event| matches!(
        event,
        EngineToShell::StrokeFinished {
            slot: SlotName::Restoration,
            applied_dabs: 1,
            moved: false,
            ..
        }
    )));
    assert!(matches!(
        events.last(),
        Some(EngineToShell::HistoryChanged {
            can_undo: true,
            can_redo: false
        })
    ));

    let after = restoration(&engine).positions().to_vec();
    assert!(after[apex].y > before[apex].y);
    assert!(after[apex].length() > before[apex].length());

    // Undo restores the buffer exactly, redo brings the stroke back
    engine.handle(ShellToEngine::Undo);
    no_errors(&engine.take_events());
    assert_eq!(restoration(&engine).positions(), &before[..]);

    engine.handle(ShellToEngine::Redo);
    no_errors(&engine.take_events());
    assert_eq!(restoration(&engine).positions(), &after[..]);

    // Nothing left to redo
    engine.handle(ShellToEngine::Redo);
    let events = engine.take_events();
    assert!(matches!(
        events.as_slice(),
        [EngineToShell::HistoryChanged {
            can_undo: true,
            can_redo: false
        }]
    ));
}
