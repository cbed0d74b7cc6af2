use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quadro_core::calculations::circuit::CircuitDraft;
use quadro_core::calculations::dimensioning::DesignPolicy;
use quadro_core::calculations::room_load::{RoomCategory, RoomInput};
use quadro_core::tables::GroupingOverflow;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "quadro", author, version, about = "NBR 5410 load estimation and circuit dimensioning")]
pub struct Cli {
    /// Set the logging level (logs go to stderr)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// Print results and errors as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Minimum lighting and outlet loads for one room
    Room(RoomArgs),
    /// Select breaker and conductor section for one circuit
    Circuit {
        #[command(flatten)]
        circuit: CircuitArgs,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Manage a .qdr project file
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create an empty project file
    New {
        path: PathBuf,
        #[arg(long)]
        engineer: String,
        #[arg(long)]
        job: String,
        #[arg(long)]
        client: String,
        /// Supply voltage used for the dwelling summary
        #[arg(long, default_value_t = 220.0)]
        supply_voltage: f64,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Add a room to a project
    AddRoom {
        path: PathBuf,
        #[command(flatten)]
        room: RoomArgs,
    },
    /// Add a pending circuit to a project
    AddCircuit {
        path: PathBuf,
        #[command(flatten)]
        circuit: CircuitArgs,
    },
    /// Remove a room by id
    RemoveRoom { path: PathBuf, id: Uuid },
    /// Remove a circuit by id
    RemoveCircuit { path: PathBuf, id: Uuid },
    /// Dimension every circuit in a project and save the outcomes
    Dimension {
        path: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Dwelling totals and suggested circuits
    Summary {
        path: PathBuf,
        /// Also dimension each suggested circuit
        #[arg(long)]
        dimension_suggestions: bool,
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RoomArgs {
    #[arg(long, default_value = "Room")]
    pub name: String,
    /// Floor area in m²
    #[arg(long)]
    pub area: f64,
    /// Perimeter in m
    #[arg(long)]
    pub perimeter: f64,
    /// general or wet (geral / molhado accepted)
    #[arg(long, default_value = "general")]
    pub category: RoomCategory,
    /// Dedicated equipment load in VA
    #[arg(long, default_value_t = 0.0)]
    pub appliance_va: f64,
}

impl RoomArgs {
    pub fn to_input(&self) -> RoomInput {
        RoomInput {
            name: self.name.clone(),
            area_m2: self.area,
            perimeter_m: self.perimeter,
            category: self.category,
            appliance_va: self.appliance_va,
        }
    }
}

/// Circuit fields are taken as text so every bad field is reported at once.
#[derive(Args, Debug, Clone)]
pub struct CircuitArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    /// lighting, general-outlet or dedicated-equipment
    #[arg(long, default_value = "general-outlet")]
    pub category: String,
    /// Declared power in W
    #[arg(long, default_value = "")]
    pub power: String,
    /// Nominal voltage: 127, 220 or 380
    #[arg(long, default_value = "")]
    pub voltage: String,
    /// Installation method: A1, A2, B1, B2, C or D
    #[arg(long, default_value = "B1")]
    pub method: String,
    /// Loaded conductors: 2 or 3
    #[arg(long, default_value = "2")]
    pub conductors: String,
    /// Ambient temperature in °C
    #[arg(long, default_value = "30")]
    pub temperature: String,
    /// Circuits sharing the raceway
    #[arg(long, default_value = "1")]
    pub grouping: String,
    #[arg(long, default_value = "")]
    pub points: String,
}

impl CircuitArgs {
    pub fn to_draft(&self) -> CircuitDraft {
        CircuitDraft {
            name: self.name.clone(),
            category: self.category.clone(),
            power: self.power.clone(),
            voltage: self.voltage.clone(),
            installation_method: self.method.clone(),
            loaded_conductors: self.conductors.clone(),
            ambient_temperature: self.temperature.clone(),
            grouped_circuits: self.grouping.clone(),
            points: self.points.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowArg {
    Fail,
    Clamp,
}

impl From<OverflowArg> for GroupingOverflow {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Fail => GroupingOverflow::Fail,
            OverflowArg::Clamp => GroupingOverflow::ClampToWorstCase,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Start from the conservative preset (pf 0.92, margin 1.25, clamp, minimum sections)
    #[arg(long)]
    pub conservative: bool,
    #[arg(long)]
    pub power_factor: Option<f64>,
    /// Design current multiplier (≥ 1)
    #[arg(long)]
    pub margin: Option<f64>,
    #[arg(long, value_enum)]
    pub grouping_overflow: Option<OverflowArg>,
    /// Reject sections below the category minimum
    #[arg(long)]
    pub enforce_minimum_sections: bool,
}

impl PolicyArgs {
    /// Apply flags on top of `base`.
    pub fn resolve(&self, base: DesignPolicy) -> DesignPolicy {
        let mut policy = if self.conservative { DesignPolicy::conservative() } else { base };
        if let Some(pf) = self.power_factor {
            policy = policy.with_power_factor(pf);
        }
        if let Some(margin) = self.margin {
            policy = policy.with_design_margin(margin);
        }
        if let Some(overflow) = self.grouping_overflow {
            policy = policy.with_grouping_overflow(overflow.into());
        }
        if self.enforce_minimum_sections {
            policy = policy.with_minimum_sections(true);
        }
        policy
    }
}
