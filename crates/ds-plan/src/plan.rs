//! The immutable per-drone flight plan.

use ds_core::{DroneId, GridPos, Instruction};

/// A drone's identity, start cell and scripted instruction sequence.
///
/// Created once at load time and never mutated; the simulator shares it
/// read-only with the drone's worker thread.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightPlan {
    pub id:           DroneId,
    pub start:        GridPos,
    pub instructions: Vec<Instruction>,
}

impl FlightPlan {
    pub fn new(id: DroneId, start: GridPos, instructions: Vec<Instruction>) -> Self {
        Self { id, start, instructions }
    }

    /// Total number of instructions (equals the steps needed to finish).
    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`, if the plan is that long.
    #[inline]
    pub fn instruction(&self, index: usize) -> Option<Instruction> {
        self.instructions.get(index).copied()
    }

    /// Where the drone ends up after executing the first `n` instructions.
    pub fn position_after(&self, n: usize) -> GridPos {
        self.start + self.instructions.iter().take(n).map(|i| i.delta()).sum::<GridPos>()
    }

    /// Index of the first instruction that would take the drone off the
    /// `i32` grid, if any.
    pub fn first_out_of_range(&self) -> Option<usize> {
        let mut position = self.start;
        for (index, instruction) in self.instructions.iter().enumerate() {
            position = match position.checked_add(instruction.delta()) {
                Some(next) => next,
                None => return Some(index),
            };
        }
        None
    }

    /// Where the drone ends up after executing the whole plan.
    pub fn final_position(&self) -> GridPos {
        self.position_after(self.len())
    }
}
