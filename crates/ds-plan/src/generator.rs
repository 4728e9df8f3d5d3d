//! Seeded random swarms for stress runs and demos.
//!
//! Each drone draws its start cell and instructions from its own
//! [`PlanRng`], so the same seed always yields the same swarm and growing the
//! swarm leaves existing drones' plans untouched.

use ds_core::{DroneId, GridPos, Instruction, PlanRng};

use crate::FlightPlan;

/// Shape of a generated swarm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomPlanSpec {
    /// Number of drones; ids are `0..drones`.
    pub drones:       usize,
    /// Instructions per drone.
    pub instructions: usize,
    /// Start cells are drawn from `0..extent` on x and y, and `0..=1` on z.
    pub extent:       i32,
    pub seed:         u64,
}

impl Default for RandomPlanSpec {
    fn default() -> Self {
        Self { drones: 8, instructions: 20, extent: 10, seed: 42 }
    }
}

/// Generate one plan per drone.
pub fn generate_plans(spec: &RandomPlanSpec) -> Vec<FlightPlan> {
    let extent = spec.extent.max(1);
    (0..spec.drones as u32)
        .map(|i| {
            let id = DroneId(i);
            let mut rng = PlanRng::new(spec.seed, id);
            let start = GridPos::new(
                rng.gen_range(0..extent),
                rng.gen_range(0..extent),
                rng.gen_range(0..=1),
            );
            let instructions = (0..spec.instructions)
                .filter_map(|_| rng.choose(&Instruction::ALL).copied())
                .collect();
            FlightPlan::new(id, start, instructions)
        })
        .collect()
}
