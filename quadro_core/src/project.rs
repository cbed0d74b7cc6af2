//! # Project Data Structures
//!
//! The `Project` struct is the root container for one dwelling's rooms and
//! circuits. Projects serialize to `.qdr` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: ProjectSettings (supply voltage, design policy, defaults)
//! ├── rooms: Vec<Room>
//! └── circuits: Vec<Circuit>
//! ```
//!
//! Rooms and circuits are kept in insertion order, which is also the order of
//! suggested circuits and reports. The dwelling summary is derived on demand
//! and never stored.
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::project::Project;
//! use quadro_core::calculations::room_load::{RoomCategory, RoomInput};
//!
//! let mut project = Project::new("Jane Engineer", "25-042", "ACME Corp");
//! project.add_room(RoomInput {
//!     name: "Living".into(),
//!     area_m2: 18.0,
//!     perimeter_m: 17.0,
//!     category: RoomCategory::General,
//!     appliance_va: 0.0,
//! }).unwrap();
//!
//! let summary = project.summary().unwrap();
//! assert_eq!(summary.suggested_circuits.len(), 2);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculations::aggregate::{aggregate_dwelling, DwellingSummary, InstallationDefaults};
use crate::calculations::circuit::{Circuit, CircuitStatus};
use crate::calculations::dimensioning::{CircuitInput, DesignPolicy};
use crate::calculations::room_load::{Room, RoomInput};
use crate::errors::CalcResult;

/// Current schema version for .qdr files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, engineer, job info)
    pub meta: ProjectMetadata,

    /// Supply voltage and design defaults
    pub settings: ProjectSettings,

    /// Rooms in insertion order
    #[serde(default)]
    pub rooms: Vec<Room>,

    /// Circuits in insertion order
    #[serde(default)]
    pub circuits: Vec<Circuit>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `engineer` - Name of the responsible engineer
    /// * `job_id` - Job/project number (e.g., "25-001")
    /// * `client` - Client name
    ///
    /// # Example
    ///
    /// ```rust
    /// use quadro_core::project::Project;
    ///
    /// let project = Project::new("John Doe", "25-001", "Client Corp");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// assert_eq!(project.settings.supply_voltage_v, 220.0);
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            rooms: Vec::new(),
            circuits: Vec::new(),
        }
    }

    /// Validate and add a room. Returns its UUID.
    pub fn add_room(&mut self, input: RoomInput) -> CalcResult<Uuid> {
        input.validate()?;
        let room = Room::new(input);
        let id = room.id;
        self.rooms.push(room);
        self.touch();
        Ok(id)
    }

    /// Remove a room by UUID.
    pub fn remove_room(&mut self, id: &Uuid) -> Option<Room> {
        let index = self.rooms.iter().position(|r| &r.id == id)?;
        self.touch();
        Some(self.rooms.remove(index))
    }

    /// Get a room by UUID.
    pub fn get_room(&self, id: &Uuid) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Add a pending circuit. Returns its UUID.
    ///
    /// The input is not validated here; validation happens when the circuit
    /// is dimensioned, so a draft can be stored and fixed later.
    pub fn add_circuit(&mut self, input: CircuitInput) -> Uuid {
        let circuit = Circuit::new(input);
        let id = circuit.id;
        self.circuits.push(circuit);
        self.touch();
        id
    }

    /// Remove a circuit by UUID.
    pub fn remove_circuit(&mut self, id: &Uuid) -> Option<Circuit> {
        let index = self.circuits.iter().position(|c| &c.id == id)?;
        self.touch();
        Some(self.circuits.remove(index))
    }

    /// Get a circuit by UUID.
    pub fn get_circuit(&self, id: &Uuid) -> Option<&Circuit> {
        self.circuits.iter().find(|c| &c.id == id)
    }

    /// Get a mutable circuit by UUID.
    ///
    /// Marks the project as modified when the circuit is found.
    pub fn get_circuit_mut(&mut self, id: &Uuid) -> Option<&mut Circuit> {
        let index = self.circuits.iter().position(|c| &c.id == id)?;
        self.touch();
        self.circuits.get_mut(index)
    }

    /// Dimension every circuit with the project policy.
    ///
    /// Failures are stored on the failing circuit and do not stop the pass.
    /// Returns the number of circuits that failed.
    pub fn dimension_circuits(&mut self) -> usize {
        let policy = self.settings.policy;
        self.dimension_circuits_with(&policy)
    }

    /// Dimension every circuit with an explicit policy, leaving settings untouched.
    pub fn dimension_circuits_with(&mut self, policy: &DesignPolicy) -> usize {
        let mut failed = 0;
        for circuit in &mut self.circuits {
            let id = circuit.id;
            if let CircuitStatus::Failed(err) = circuit.dimension(policy) {
                debug!(circuit = %id, code = err.error_code(), "circuit failed to dimension");
                failed += 1;
            }
        }
        self.touch();
        failed
    }

    /// Aggregate rooms at the project supply voltage.
    pub fn summary(&self) -> CalcResult<DwellingSummary> {
        aggregate_dwelling(&self.rooms, self.settings.supply_voltage_v)
    }

    /// Circuit inputs for every suggestion in the current summary.
    pub fn suggested_circuit_inputs(&self) -> CalcResult<Vec<CircuitInput>> {
        let summary = self.summary()?;
        Ok(summary
            .suggested_circuits
            .iter()
            .map(|s| {
                s.to_circuit_input(
                    self.settings.supply_voltage_v,
                    &self.settings.default_installation,
                    &self.settings.policy,
                )
            })
            .collect())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Project-wide design settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Supply voltage used for the dwelling summary (V)
    pub supply_voltage_v: f64,

    /// Design policy applied when dimensioning
    #[serde(default)]
    pub policy: DesignPolicy,

    /// Installation parameters for circuits built from suggestions
    #[serde(default)]
    pub default_installation: InstallationDefaults,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            supply_voltage_v: 220.0,
            policy: DesignPolicy::default(),
            default_installation: InstallationDefaults::default(),
        }
    }
}
