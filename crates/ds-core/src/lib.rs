//! `ds-core`: foundational types for the `rust_drone` lock-step simulator.
//!
//! This crate is a dependency of every other `ds-*` crate.  It intentionally
//! has no `ds-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `DroneId`                                             |
//! | [`grid`]        | `GridPos` (integer x, y, z cell)                      |
//! | [`instruction`] | `Instruction` enum and its movement deltas            |
//! | [`time`]        | `Step`, `SimConfig`                                   |
//! | [`status`]      | `RunStatus` (final outcome of a run)                  |
//! | [`rng`]         | `PlanRng` (per-drone deterministic RNG)               |
//! | [`error`]       | `DsError`, `DsResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types        |
//! |         | (needed to load `SimConfig` from a TOML file).             |

pub mod error;
pub mod grid;
pub mod ids;
pub mod instruction;
pub mod rng;
pub mod status;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DsError, DsResult};
pub use grid::GridPos;
pub use ids::DroneId;
pub use instruction::Instruction;
pub use rng::PlanRng;
pub use status::RunStatus;
pub use time::{SimConfig, Step};
