//! End-to-end: rooms to summary, suggestions to circuits, dimension, save, reload.

use std::env::temp_dir;
use std::fs;
use std::path::PathBuf;

use quadro_core::calculations::aggregate::SuggestedCircuitKind;
use quadro_core::calculations::circuit::CircuitStatus;
use quadro_core::calculations::dimensioning::DesignPolicy;
use quadro_core::calculations::room_load::{RoomCategory, RoomInput};
use quadro_core::file_io::{load_project, save_project, update_project, FileLock};
use quadro_core::{ErrorKind, Project};

fn temp_path(name: &str) -> PathBuf {
    temp_dir().join(format!("quadro_workflow_{}_{}.qdr", name, std::process::id()))
}

fn room(name: &str, area_m2: f64, perimeter_m: f64, category: RoomCategory, appliance_va: f64) -> RoomInput {
    RoomInput {
        name: name.into(),
        area_m2,
        perimeter_m,
        category,
        appliance_va,
    }
}

fn small_house() -> Project {
    let mut project = Project::new("Ana Souza", "26-014", "Residencial Ipê");
    project.add_room(room("Sala", 16.0, 16.0, RoomCategory::General, 0.0)).unwrap();
    project.add_room(room("Quarto", 10.0, 13.0, RoomCategory::General, 1500.0)).unwrap();
    project.add_room(room("Banheiro", 3.5, 7.6, RoomCategory::Wet, 5400.0)).unwrap();
    project.add_room(room("Cozinha", 9.0, 12.0, RoomCategory::Wet, 0.0)).unwrap();
    project
}

#[test]
fn summary_orders_dedicated_before_shared_circuits() {
    let project = small_house();
    let summary = project.summary().unwrap();

    let kinds: Vec<_> = summary.suggested_circuits.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SuggestedCircuitKind::DedicatedEquipment,
            SuggestedCircuitKind::DedicatedEquipment,
            SuggestedCircuitKind::Lighting,
            SuggestedCircuitKind::GeneralOutlet,
        ]
    );
    assert_eq!(summary.total_dedicated_va, 6900.0);
    assert!((summary.total_current_a - summary.total_installed_va / 220.0).abs() < 1e-12);
}

#[test]
fn suggestions_dimension_and_survive_a_save() {
    let path = temp_path("suggestions");
    let mut project = small_house();
    project.settings.policy = DesignPolicy::conservative();

    for input in project.suggested_circuit_inputs().unwrap() {
        project.add_circuit(input);
    }
    assert!(project
        .circuits
        .iter()
        .all(|c| matches!(c.status(), CircuitStatus::Pending)));

    assert_eq!(project.dimension_circuits(), 0);
    // Conservative policy enforces 2.5 mm² on the shower circuit
    let shower = project.circuits[1].result().unwrap();
    assert!(shower.conductor_section_mm2 >= 2.5);

    save_project(&project, &path).unwrap();
    let loaded = load_project(&path).unwrap();
    assert_eq!(loaded.circuits, project.circuits);
    assert_eq!(loaded.settings.policy, DesignPolicy::conservative());

    let _ = fs::remove_file(&path);
}

#[test]
fn locked_project_rejects_concurrent_update() {
    let path = temp_path("locked");
    save_project(&small_house(), &path).unwrap();

    let lock = FileLock::acquire(&path, "first@example.com").unwrap();
    let err = update_project(&path, "second@example.com", |p| Ok(p.dimension_circuits())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    drop(lock);

    let removed = update_project(&path, "second@example.com", |p| {
        let id = p.rooms[0].id;
        Ok(p.remove_room(&id).map(|r| r.input.name))
    })
    .unwrap();
    assert_eq!(removed.as_deref(), Some("Sala"));
    assert_eq!(load_project(&path).unwrap().rooms.len(), 3);

    let _ = fs::remove_file(&path);
}
