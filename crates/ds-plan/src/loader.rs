//! CSV flight-plan loader.
//!
//! # CSV format
//!
//! A header row (its names are not interpreted), then one row per drone:
//!
//! ```csv
//! id,x,y,z,instructions
//! 1,0,0,0,UP;FORWARD;FORWARD;RIGHT
//! 2,5,5,0,LEFT;LEFT;SHAKE;DOWN
//! 3,2,2,2,
//! ```
//!
//! **`instructions`** is a `;`-separated list of `UP`, `DOWN`, `LEFT`,
//! `RIGHT`, `FORWARD`, `BACKWARD`, `SHAKE`, `ROTATE`.  Tokens are trimmed;
//! empty tokens (e.g. a trailing `;`) are ignored.  An empty or missing
//! column is an empty plan: the drone finishes in step 1 without moving.
//!
//! Limits from [`SimConfig`] are enforced here, not silently truncated:
//! too many rows or too many instructions in one row fail the whole load, as
//! does a plan whose path would leave the `i32` grid.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use ds_core::{DroneId, GridPos, Instruction, SimConfig};

use crate::{FlightPlan, PlanError, PlanResult};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate every drone's [`FlightPlan`] from a CSV file.
///
/// Plans are returned in file order.
pub fn load_plans_csv(path: &Path, config: &SimConfig) -> PlanResult<Vec<FlightPlan>> {
    let file = std::fs::File::open(path)?;
    let plans = load_plans_reader(file, config)?;
    tracing::info!(path = %path.display(), drones = plans.len(), "loaded flight plans");
    Ok(plans)
}

/// Like [`load_plans_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or for plans embedded in a
/// binary.
pub fn load_plans_reader<R: Read>(reader: R, config: &SimConfig) -> PlanResult<Vec<FlightPlan>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut plans: Vec<FlightPlan> = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        if plans.len() == config.max_drones {
            return Err(PlanError::TooManyDrones {
                max: config.max_drones,
                got: plans.len() + 1,
            });
        }
        plans.push(parse_record(&record, config)?);
    }

    validate_plans(&plans, config)?;
    Ok(plans)
}

/// Check a set of plans against the run limits.
///
/// Applied by the loader, and again by the simulator builder for plans that
/// were constructed in code (e.g. by [`generate_plans`][crate::generate_plans]).
pub fn validate_plans(plans: &[FlightPlan], config: &SimConfig) -> PlanResult<()> {
    if plans.len() > config.max_drones {
        return Err(PlanError::TooManyDrones { max: config.max_drones, got: plans.len() });
    }
    let mut seen: HashSet<DroneId> = HashSet::with_capacity(plans.len());
    for plan in plans {
        if !seen.insert(plan.id) {
            return Err(PlanError::DuplicateId(plan.id));
        }
        if plan.len() > config.max_instructions {
            return Err(PlanError::TooManyInstructions {
                drone: plan.id,
                max:   config.max_instructions,
                got:   plan.len(),
            });
        }
        if let Some(index) = plan.first_out_of_range() {
            return Err(PlanError::OutOfRange { drone: plan.id, index });
        }
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_record(record: &StringRecord, config: &SimConfig) -> PlanResult<FlightPlan> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    if !(4..=5).contains(&record.len()) {
        return Err(PlanError::Parse {
            line,
            msg: format!("expected 4 or 5 fields (id,x,y,z,instructions), found {}", record.len()),
        });
    }

    let id = DroneId(parse_field(record, 0, "id", line)?);
    let start = GridPos::new(
        parse_field(record, 1, "x", line)?,
        parse_field(record, 2, "y", line)?,
        parse_field(record, 3, "z", line)?,
    );

    let instructions = parse_instructions(id, record.get(4).unwrap_or(""))?;
    if instructions.len() > config.max_instructions {
        return Err(PlanError::TooManyInstructions {
            drone: id,
            max:   config.max_instructions,
            got:   instructions.len(),
        });
    }

    Ok(FlightPlan::new(id, start, instructions))
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    index:  usize,
    name:   &str,
    line:   u64,
) -> PlanResult<T> {
    let raw = record.get(index).unwrap_or("");
    raw.parse::<T>().map_err(|_| PlanError::Parse {
        line,
        msg: format!("invalid {name} {raw:?}: expected an integer"),
    })
}

fn parse_instructions(drone: DroneId, field: &str) -> PlanResult<Vec<Instruction>> {
    field
        .split(';')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<Instruction>().map_err(|_| PlanError::UnknownInstruction {
                drone,
                token: tok.to_owned(),
            })
        })
        .collect()
}
