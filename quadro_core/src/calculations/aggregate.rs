//! # Dwelling Load Aggregation
//!
//! Sums room loads into dwelling totals and proposes a naive circuit
//! division: one dedicated circuit per appliance load, then a single lighting
//! circuit and a single general-outlet circuit.
//!
//! The division is coarse. Lighting and outlet loads are not split into
//! breaker-sized sub-circuits, so the suggestions are a starting point for
//! design, not a compliant final layout.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::calculations::aggregate::aggregate_dwelling;
//! use quadro_core::calculations::room_load::{Room, RoomCategory, RoomInput};
//!
//! let rooms = vec![Room::new(RoomInput {
//!     name: "Bathroom".into(),
//!     area_m2: 4.0,
//!     perimeter_m: 8.0,
//!     category: RoomCategory::Wet,
//!     appliance_va: 5400.0,
//! })];
//!
//! let summary = aggregate_dwelling(&rooms, 220.0).unwrap();
//! assert_eq!(summary.suggested_circuits.len(), 3);
//! assert_eq!(summary.suggested_circuits[0].id, "C1");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::tables::{nbr_ref, InstallationMethod};

use super::dimensioning::{CircuitCategory, CircuitInput, DesignPolicy};
use super::room_load::Room;

/// Kind of load a suggested circuit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedCircuitKind {
    /// One appliance load (TUE)
    DedicatedEquipment,
    /// All lighting loads
    Lighting,
    /// All general-outlet loads (TUG)
    GeneralOutlet,
}

impl SuggestedCircuitKind {
    /// Dimensioning category for this kind
    pub fn category(&self) -> CircuitCategory {
        match self {
            SuggestedCircuitKind::DedicatedEquipment => CircuitCategory::DedicatedEquipment,
            SuggestedCircuitKind::Lighting => CircuitCategory::Lighting,
            SuggestedCircuitKind::GeneralOutlet => CircuitCategory::GeneralOutlet,
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        self.category().display_name()
    }
}

impl std::fmt::Display for SuggestedCircuitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One room's share of a suggested circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadContribution {
    /// Room the load comes from
    pub room_id: Uuid,
    /// Room name at aggregation time
    pub room_name: String,
    /// Lighting, outlets or appliance
    pub kind: SuggestedCircuitKind,
    /// Load in VA
    pub va: f64,
    /// Point count, for lighting and outlet loads
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub points: Option<u32>,
}

/// Installation parameters applied when a suggestion becomes a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstallationDefaults {
    /// Reference installation method
    pub installation_method: InstallationMethod,
    /// Loaded conductors (2 or 3)
    pub loaded_conductors: u8,
    /// Ambient temperature in °C
    pub ambient_temperature_c: f64,
    /// Circuits sharing the raceway
    pub grouped_circuits: u32,
}

impl Default for InstallationDefaults {
    fn default() -> Self {
        InstallationDefaults {
            installation_method: InstallationMethod::B1,
            loaded_conductors: 2,
            ambient_temperature_c: 30.0,
            grouped_circuits: 1,
        }
    }
}

/// A proposed circuit grouping one or more room loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedCircuit {
    /// "C1", "C2", ... in emission order
    pub id: String,
    /// What the circuit carries
    pub kind: SuggestedCircuitKind,
    /// Contributing room loads, in room order
    pub loads: Vec<LoadContribution>,
    /// Sum of contributions (VA)
    pub total_va: f64,
}

impl SuggestedCircuit {
    /// Total points across contributions, if any contribution counts points
    pub fn points(&self) -> Option<u32> {
        self.loads
            .iter()
            .filter_map(|load| load.points)
            .fold(None, |acc, p| Some(acc.unwrap_or(0) + p))
    }

    /// Build a dimensioning input from this suggestion.
    ///
    /// Power is the apparent load times the policy's power factor, so the
    /// resulting operating current equals `total_va / voltage_v`.
    pub fn to_circuit_input(
        &self,
        voltage_v: f64,
        defaults: &InstallationDefaults,
        policy: &DesignPolicy,
    ) -> CircuitInput {
        let name = match self.loads.as_slice() {
            [single] if self.kind == SuggestedCircuitKind::DedicatedEquipment => {
                format!("{} - {}", self.id, single.room_name)
            }
            _ => format!("{} - {}", self.id, self.kind.display_name()),
        };
        CircuitInput {
            name: Some(name),
            category: self.kind.category(),
            power_w: self.total_va * policy.power_factor,
            voltage_v,
            installation_method: defaults.installation_method,
            loaded_conductors: defaults.loaded_conductors,
            ambient_temperature_c: defaults.ambient_temperature_c,
            grouped_circuits: defaults.grouped_circuits,
            points: self.points(),
        }
    }
}

/// Dwelling totals and suggested circuits. Always recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellingSummary {
    /// Minimum lighting load over all rooms (VA)
    pub total_lighting_va: f64,
    /// Minimum general-outlet load over all rooms (VA)
    pub total_outlet_va: f64,
    /// Appliance loads over all rooms (VA)
    pub total_dedicated_va: f64,
    /// lighting + outlets + dedicated (VA)
    pub total_installed_va: f64,
    /// Installed load over supply voltage (A)
    pub total_current_a: f64,
    /// Dedicated circuits first, then lighting, then outlets
    pub suggested_circuits: Vec<SuggestedCircuit>,
}

impl DwellingSummary {
    /// Generate a plain-text summary.
    pub fn format_report(&self) -> String {
        let mut lines = vec![
            "DWELLING LOAD SUMMARY".to_string(),
            "=====================".to_string(),
            format!(
                "Lighting:           {:>10.0} VA  {}",
                self.total_lighting_va,
                nbr_ref::LIGHTING_LOAD
            ),
            format!(
                "General outlets:    {:>10.0} VA  {}",
                self.total_outlet_va,
                nbr_ref::OUTLET_LOAD
            ),
            format!("Dedicated:          {:>10.0} VA", self.total_dedicated_va),
            format!("Total installed:    {:>10.0} VA", self.total_installed_va),
            format!("Total current:      {:>10.2} A", self.total_current_a),
            String::new(),
            "Suggested circuits:".to_string(),
        ];
        for circuit in &self.suggested_circuits {
            let rooms: Vec<&str> = circuit.loads.iter().map(|l| l.room_name.as_str()).collect();
            lines.push(format!(
                "  {:<4} {:<22} {:>8.0} VA  ({})",
                circuit.id,
                circuit.kind.display_name(),
                circuit.total_va,
                rooms.join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// Aggregate room loads at a supply voltage.
///
/// # Returns
///
/// * `Ok(DwellingSummary)` - Totals and suggested circuits
/// * `Err(CalcError::ValidationFailed)` - No rooms, a non-positive voltage,
///   or an invalid room
pub fn aggregate_dwelling(rooms: &[Room], supply_voltage_v: f64) -> CalcResult<DwellingSummary> {
    if rooms.is_empty() {
        return Err(CalcError::field("rooms", "At least one room is required"));
    }
    if !supply_voltage_v.is_finite() || supply_voltage_v <= 0.0 {
        return Err(CalcError::field(
            "supply_voltage_v",
            "Supply voltage must be a positive number",
        ));
    }

    let mut suggested = Vec::new();
    let mut lighting = Vec::new();
    let mut outlets = Vec::new();
    let mut total_lighting_va = 0.0;
    let mut total_outlet_va = 0.0;
    let mut total_dedicated_va = 0.0;

    for room in rooms {
        let load = room.load()?;

        if load.appliance_va > 0.0 {
            total_dedicated_va += load.appliance_va;
            suggested.push((
                SuggestedCircuitKind::DedicatedEquipment,
                vec![LoadContribution {
                    room_id: room.id,
                    room_name: room.name().to_string(),
                    kind: SuggestedCircuitKind::DedicatedEquipment,
                    va: load.appliance_va,
                    points: None,
                }],
            ));
        }

        total_lighting_va += load.lighting_va;
        lighting.push(LoadContribution {
            room_id: room.id,
            room_name: room.name().to_string(),
            kind: SuggestedCircuitKind::Lighting,
            va: load.lighting_va,
            points: Some(load.lighting_points),
        });

        total_outlet_va += load.outlet_va;
        outlets.push(LoadContribution {
            room_id: room.id,
            room_name: room.name().to_string(),
            kind: SuggestedCircuitKind::GeneralOutlet,
            va: load.outlet_va,
            points: Some(load.outlet_points),
        });
    }

    if total_lighting_va > 0.0 {
        suggested.push((SuggestedCircuitKind::Lighting, lighting));
    }
    if total_outlet_va > 0.0 {
        suggested.push((SuggestedCircuitKind::GeneralOutlet, outlets));
    }

    let suggested_circuits: Vec<SuggestedCircuit> = suggested
        .into_iter()
        .enumerate()
        .map(|(i, (kind, loads))| SuggestedCircuit {
            id: format!("C{}", i + 1),
            kind,
            total_va: loads.iter().map(|l| l.va).sum(),
            loads,
        })
        .collect();

    let total_installed_va = total_lighting_va + total_outlet_va + total_dedicated_va;
    let total_current_a = total_installed_va / supply_voltage_v;
    debug!(
        rooms = rooms.len(),
        total_installed_va,
        total_current_a,
        circuits = suggested_circuits.len(),
        "dwelling aggregated"
    );

    Ok(DwellingSummary {
        total_lighting_va,
        total_outlet_va,
        total_dedicated_va,
        total_installed_va,
        total_current_a,
        suggested_circuits,
    })
}
