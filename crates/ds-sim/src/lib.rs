//! `ds-sim`: lock-step engine for the rust_drone simulator.
//!
//! # Step loop
//!
//! ```text
//! for step in 1..=config.max_steps while running:
//!   ① Release:  coordinator sends Go(step) to every active drone.
//!   ② Execute:  each worker thread applies one instruction and publishes
//!               its new position to SharedState in one write.
//!   ③ Await:    coordinator collects one WorkerReport per released drone
//!               (bounded by worker_timeout_ms; silent drones are lost).
//!   ④ Detect:   detector thread compares every pair of participants,
//!               emits a StepRecord plus one CollisionEvent per pair and
//!               may stop the run (threshold).
//!   ⑤ Advance:  observer hook, optional pause, step + 1.
//! ```
//!
//! No worker starts step `t + 1` before the detector has examined step `t`.
//!
//! # Threads
//!
//! | Thread               | Owns                                              |
//! |----------------------|---------------------------------------------------|
//! | caller (`Sim::run`)  | coordinator loop, observer                        |
//! | `drone-{id}` × N     | instruction cursor, local position                |
//! | `collision-detector` | event sender, notice senders                      |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ds_core::SimConfig;
//! use ds_sim::{NoopObserver, SimBuilder};
//!
//! let plans = ds_plan::load_plans_csv(path, &config)?;
//! let mut sim = SimBuilder::new(config, plans).build()?;
//! let outcome = sim.run(&mut NoopObserver)?;
//! std::process::exit(outcome.status.exit_code());
//! ```

pub mod builder;
pub mod control;
pub mod detector;
pub mod error;
pub mod observer;
pub mod shared;
pub mod sim;
pub mod worker;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use control::{SimControl, StopReason};
pub use detector::{CollisionDetector, CollisionEvent, SimEvent, StepRecord, StepVerdict};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use shared::{DroneLive, DroneSnapshot, SharedState};
pub use sim::{CoordinatorPhase, RunOutcome, Sim};
pub use worker::{CollisionNotice, ExitReason, NOTICE_CAPACITY, WorkerExit};
