//! # NBR 5410 Reference Tables
//!
//! Static lookup data used by the dimensioning engine. Every table is a
//! `const` slice: lookups are bounded scans with no allocation and no state.
//!
//! | Table                       | Module                      | Source               |
//! |-----------------------------|-----------------------------|----------------------|
//! | Standard breaker ratings    | [`breakers`]                | IEC 60898 series     |
//! | Conduction capacity (Iz)    | [`conductors`]              | NBR 5410 Table 36    |
//! | Temperature correction (FCT)| [`correction`]              | NBR 5410 Table 40    |
//! | Grouping correction (FCA)   | [`correction`]              | NBR 5410 Table 42    |
//! | Minimum conductor sections  | [`conductors`]              | NBR 5410 6.2.6.1.1   |
//!
//! All capacities assume copper conductors with PVC insulation (70 °C) at
//! a 30 °C reference ambient.

pub mod breakers;
pub mod conductors;
pub mod correction;

pub use breakers::{select_breaker, STANDARD_BREAKER_RATINGS_A};
pub use conductors::{base_capacity_a, InstallationMethod, CONDUCTOR_SECTIONS_MM2};
pub use correction::{
    grouping_factor, temperature_factor, CorrectionTable, GroupingOverflow, ResolvedFactor,
    GROUPING_FACTORS, TEMPERATURE_FACTORS,
};

// ============================================================================
// NBR 5410 Clause References
// ============================================================================

/// NBR 5410 clause references for the tables and checks used in reports.
pub mod nbr_ref {
    /// Conduction capacity, methods A1 to D, PVC 70 °C
    pub const CONDUCTION_CAPACITY: &str = "NBR 5410 Tabela 36";
    /// Ambient temperature correction factors
    pub const TEMPERATURE_FACTOR: &str = "NBR 5410 Tabela 40";
    /// Grouping correction factors, bundled circuits
    pub const GROUPING_FACTOR: &str = "NBR 5410 Tabela 42";
    /// Overload coordination Ib <= In <= Iz
    pub const OVERLOAD_PROTECTION: &str = "NBR 5410 5.3.4.1";
    /// Minimum lighting loads
    pub const LIGHTING_LOAD: &str = "NBR 5410 9.5.2.1.2";
    /// Minimum general-outlet count and loads
    pub const OUTLET_LOAD: &str = "NBR 5410 9.5.2.2";
}
