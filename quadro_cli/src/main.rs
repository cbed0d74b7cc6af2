//! # Quadro CLI
//!
//! Command-line front end for `quadro_core`: room loads, single-circuit
//! dimensioning, and `.qdr` project files. Text output by default, `--json`
//! for machine consumption. Logs go to stderr.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use quadro_core::calculations::circuit::{Circuit, CircuitStatus};
use quadro_core::calculations::dimensioning::{dimension_circuit, CircuitInput, DesignPolicy, DimensioningResult};
use quadro_core::calculations::room_load::{RoomInput, RoomLoad};
use quadro_core::errors::CalcError;
use quadro_core::file_io::{load_project_with_lock_check, save_project, update_project, PROJECT_EXTENSION};
use quadro_core::project::Project;

use cli::{Cli, Commands, PolicyArgs, ProjectCommands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Room(room) => {
            let input = room.to_input();
            let load = input.load()?;
            if cli.json {
                print_json(&json!({ "room": input, "load": load }))
            } else {
                print_room(&input, &load);
                Ok(())
            }
        }
        Commands::Circuit { circuit, policy } => {
            let input = circuit.to_draft().parse()?;
            let policy = policy.resolve(DesignPolicy::default());
            let result = dimension_circuit(&input, &policy)?;
            if cli.json {
                print_json(&json!({ "input": input, "policy": policy, "result": result }))
            } else {
                print_circuit(&input, &result);
                Ok(())
            }
        }
        Commands::Project { command } => run_project(command, cli.json),
    }
}

fn run_project(command: &ProjectCommands, as_json: bool) -> anyhow::Result<()> {
    match command {
        ProjectCommands::New {
            path,
            engineer,
            job,
            client,
            supply_voltage,
            force,
        } => {
            if path.exists() && !*force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if path.extension().map_or(true, |ext| ext != PROJECT_EXTENSION) {
                warn!(path = %path.display(), "project files normally use the .{} extension", PROJECT_EXTENSION);
            }
            let mut project = Project::new(engineer.as_str(), job.as_str(), client.as_str());
            project.settings.supply_voltage_v = *supply_voltage;
            save_project(&project, path)?;
            if as_json {
                print_json(&project)
            } else {
                println!("Created {} ({} / {})", path.display(), project.meta.job_id, project.meta.client);
                Ok(())
            }
        }
        ProjectCommands::AddRoom { path, room } => {
            let input = room.to_input();
            let (id, load) = update_project(path, user_id(), |project| {
                let load = input.load()?;
                Ok((project.add_room(input.clone())?, load))
            })
            .with_context(|| format!("adding room to {}", path.display()))?;
            if as_json {
                print_json(&json!({ "id": id, "room": input, "load": load }))
            } else {
                println!("Added room {} ({})", input.name, id);
                print_room(&input, &load);
                Ok(())
            }
        }
        ProjectCommands::AddCircuit { path, circuit } => {
            let input = circuit.to_draft().parse()?;
            let id = update_project(path, user_id(), |project| Ok(project.add_circuit(input.clone())))
                .with_context(|| format!("adding circuit to {}", path.display()))?;
            if as_json {
                print_json(&json!({ "id": id, "input": input }))
            } else {
                println!("Added circuit {} ({}), pending dimensioning", id, input.category);
                Ok(())
            }
        }
        ProjectCommands::Dimension { path, policy } => {
            let (failed, circuits) = update_project(path, user_id(), |project| {
                let policy = policy.resolve(project.settings.policy);
                let failed = project.dimension_circuits_with(&policy);
                Ok((failed, project.circuits.clone()))
            })
            .with_context(|| format!("dimensioning {}", path.display()))?;
            info!(circuits = circuits.len(), failed, "project dimensioned");
            if as_json {
                print_json(&json!({ "failed": failed, "circuits": circuits }))
            } else {
                print_circuit_table(&circuits);
                Ok(())
            }
        }
        ProjectCommands::RemoveRoom { path, id } => {
            let room = update_project(path, user_id(), |project| {
                project
                    .remove_room(id)
                    .ok_or_else(|| CalcError::invalid_input("id", id.to_string(), "no room with this id"))
            })?;
            if as_json {
                print_json(&room)
            } else {
                println!("Removed room {} ({})", room.name(), room.id);
                Ok(())
            }
        }
        ProjectCommands::RemoveCircuit { path, id } => {
            let circuit = update_project(path, user_id(), |project| {
                project
                    .remove_circuit(id)
                    .ok_or_else(|| CalcError::invalid_input("id", id.to_string(), "no circuit with this id"))
            })?;
            if as_json {
                print_json(&circuit)
            } else {
                println!("Removed circuit {} ({})", circuit.label(), circuit.id);
                Ok(())
            }
        }
        ProjectCommands::Summary {
            path,
            dimension_suggestions,
            policy,
        } => summarize(path, *dimension_suggestions, policy, as_json),
    }
}

#[derive(Serialize)]
struct DimensionedSuggestion {
    id: String,
    input: CircuitInput,
    #[serde(flatten)]
    outcome: CircuitStatus,
}

fn summarize(path: &Path, dimension: bool, policy_args: &PolicyArgs, as_json: bool) -> anyhow::Result<()> {
    let (project, holder) = load_project_with_lock_check(path)?;
    if let Some(holder) = holder {
        warn!(holder = %holder.holder(), "project is open elsewhere; summary may be out of date");
    }
    let summary = project.summary()?;

    let mut dimensioned = Vec::new();
    if dimension {
        let policy = policy_args.resolve(project.settings.policy);
        for suggestion in &summary.suggested_circuits {
            let input = suggestion.to_circuit_input(
                project.settings.supply_voltage_v,
                &project.settings.default_installation,
                &policy,
            );
            let outcome = match dimension_circuit(&input, &policy) {
                Ok(result) => CircuitStatus::Dimensioned(result),
                Err(err) => CircuitStatus::Failed(err),
            };
            dimensioned.push(DimensionedSuggestion {
                id: suggestion.id.clone(),
                input,
                outcome,
            });
        }
    }

    if as_json {
        return print_json(&json!({ "summary": summary, "dimensioned": dimensioned }));
    }

    println!("{}", summary.format_report());
    if !dimensioned.is_empty() {
        println!();
        println!("{:<4} {:>9} {:>8} {:>9}  Notes", "Id", "Ib (A)", "In (A)", "S (mm²)");
        for entry in &dimensioned {
            match &entry.outcome {
                CircuitStatus::Dimensioned(r) => println!(
                    "{:<4} {:>9.2} {:>8.0} {:>9}",
                    entry.id, r.operating_current_a, r.breaker_rating_a, r.conductor_section_mm2
                ),
                CircuitStatus::Failed(err) => println!("{:<4} {:>9} {:>8} {:>9}  {}", entry.id, "-", "-", "-", err),
                CircuitStatus::Pending => {}
            }
        }
    }
    Ok(())
}

fn user_id() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "quadro".to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_room(input: &RoomInput, load: &RoomLoad) {
    println!("═══════════════════════════════════════");
    println!("  ROOM LOAD: {}", input.name);
    println!("═══════════════════════════════════════");
    println!("  Area:       {:.2} m²   Perimeter: {:.2} m", input.area_m2, input.perimeter_m);
    println!("  Category:   {}", input.category);
    println!();
    println!("  Lighting:   {:>7.0} VA  ({} point)", load.lighting_va, load.lighting_points);
    println!("  Outlets:    {:>7.0} VA  ({} points)", load.outlet_va, load.outlet_points);
    println!("  Appliance:  {:>7.0} VA", load.appliance_va);
    println!("  Total:      {:>7.0} VA", load.total_va);
}

fn print_circuit(input: &CircuitInput, result: &DimensioningResult) {
    let label = input.name.as_deref().unwrap_or("Circuit");
    println!(
        "{label}: {} W at {} V, {} ({} loaded conductors)",
        input.power_w, input.voltage_v, input.installation_method, input.loaded_conductors
    );
    println!();
    println!("{}", result.format_report());
}

fn print_circuit_table(circuits: &[Circuit]) {
    println!("{:<36} {:<24} {:>8} {:>9}  Status", "Id", "Circuit", "In (A)", "S (mm²)");
    for circuit in circuits {
        match circuit.status() {
            CircuitStatus::Dimensioned(r) => println!(
                "{:<36} {:<24} {:>8.0} {:>9}  ok",
                circuit.id,
                circuit.label(),
                r.breaker_rating_a,
                r.conductor_section_mm2
            ),
            CircuitStatus::Failed(err) => {
                println!("{:<36} {:<24} {:>8} {:>9}  {}", circuit.id, circuit.label(), "-", "-", err.error_code());
                for (field, message) in circuit.field_errors() {
                    println!("{:>38}{field}: {message}", "");
                }
            }
            CircuitStatus::Pending => {
                println!("{:<36} {:<24} {:>8} {:>9}  pending", circuit.id, circuit.label(), "-", "-")
            }
        }
    }
}

/// The structured error behind `error`, or an `Internal` one wrapping its message.
fn as_calc_error(error: &anyhow::Error) -> CalcError {
    match error.downcast_ref::<CalcError>() {
        Some(err) => err.clone(),
        None => CalcError::internal(format!("{error:#}")),
    }
}

fn report_error(error: &anyhow::Error, as_json: bool) {
    let calc = as_calc_error(error);
    if as_json {
        println!("{:#}", json!({ "code": calc.error_code(), "error": calc }));
        return;
    }

    eprintln!("error: {error:#}");
    if let Some(fields) = calc.field_errors() {
        for (field, message) in fields {
            eprintln!("  {field}: {message}");
        }
    }
    if calc.is_recoverable() {
        eprintln!("  try again once the other user closes the project");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadro_core::ErrorKind;

    #[test]
    fn test_calc_errors_survive_context() {
        let err = anyhow::Error::new(CalcError::file_locked("a.qdr", "ana", "now")).context("adding room to a.qdr");
        let calc = as_calc_error(&err);
        assert_eq!(calc.error_code(), "FILE_LOCKED");
        assert!(calc.is_recoverable());
    }

    #[test]
    fn test_other_errors_become_internal() {
        let err = anyhow::anyhow!("a.qdr already exists");
        let calc = as_calc_error(&err);
        assert_eq!(calc.kind(), ErrorKind::Internal);
        assert!(calc.to_string().contains("already exists"));
    }
}
