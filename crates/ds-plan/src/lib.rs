//! `ds-plan`: drone flight plans, CSV loading and plan generation.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`plan`]      | `FlightPlan` (immutable per-drone configuration)          |
//! | [`loader`]    | `load_plans_csv`, `load_plans_reader`, `validate_plans`   |
//! | [`generator`] | `RandomPlanSpec`, `generate_plans` (seeded swarms)        |
//! | [`error`]     | `PlanError`, `PlanResult<T>`                              |
//!
//! Plans are validated against the run's [`SimConfig`][ds_core::SimConfig]
//! limits at load time.  Anything that gets past the loader is guaranteed to
//! be executable by the simulator: no worker ever sees an unknown instruction.

pub mod error;
pub mod generator;
pub mod loader;
pub mod plan;


pub use error::{PlanError, PlanResult};
pub use generator::{RandomPlanSpec, generate_plans};
pub use loader::{load_plans_csv, load_plans_reader, validate_plans};
pub use plan::FlightPlan;
