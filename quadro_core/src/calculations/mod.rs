//! # Electrical Calculations
//!
//! Each calculation follows the same shape:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` / `*Load` / `*Summary` - Derived values (JSON-serializable)
//! - a pure function from input to `CalcResult<...>`
//!
//! Nothing here retains state between calls; callers own their room and
//! circuit collections.
//!
//! ## Available Calculations
//!
//! - [`room_load`] - Minimum lighting and outlet loads per room
//! - [`dimensioning`] - Breaker and conductor selection for one circuit
//! - [`circuit`] - Circuit records with a tracked dimensioning outcome
//! - [`aggregate`] - Dwelling totals and suggested circuit division

pub mod aggregate;
pub mod circuit;
pub mod dimensioning;
pub mod room_load;

pub use aggregate::{
    aggregate_dwelling, DwellingSummary, InstallationDefaults, LoadContribution, SuggestedCircuit,
    SuggestedCircuitKind,
};
pub use circuit::{Circuit, CircuitDraft, CircuitStatus};
pub use dimensioning::{
    dimension_batch, dimension_circuit, CircuitCategory, CircuitInput, DesignPolicy, DimensioningResult,
};
pub use room_load::{compute_room_load, Room, RoomCategory, RoomInput, RoomLoad};
