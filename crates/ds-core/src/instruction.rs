//! Flight-plan instruction enum shared by the loader, the workers and the
//! report writers.
//!
//! Parsing is strict: only the eight upper-case tokens are accepted.  An
//! unknown token is a load-time error and never reaches a worker.

use std::str::FromStr;

use crate::{DsError, GridPos};

/// One step of a drone's scripted flight plan.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Backward,
    /// Hover in place.
    Shake,
    /// Turn in place.
    Rotate,
}

impl Instruction {
    /// Every instruction, in declaration order.
    pub const ALL: [Instruction; 8] = [
        Instruction::Up,
        Instruction::Down,
        Instruction::Left,
        Instruction::Right,
        Instruction::Forward,
        Instruction::Backward,
        Instruction::Shake,
        Instruction::Rotate,
    ];

    /// Displacement applied by this instruction.
    ///
    /// UP/DOWN move along z, LEFT/RIGHT along x, FORWARD/BACKWARD along y.
    #[inline]
    pub fn delta(self) -> GridPos {
        match self {
            Instruction::Up       => GridPos::new(0, 0, 1),
            Instruction::Down     => GridPos::new(0, 0, -1),
            Instruction::Left     => GridPos::new(-1, 0, 0),
            Instruction::Right    => GridPos::new(1, 0, 0),
            Instruction::Forward  => GridPos::new(0, 1, 0),
            Instruction::Backward => GridPos::new(0, -1, 0),
            Instruction::Shake | Instruction::Rotate => GridPos::ORIGIN,
        }
    }

    /// The flight-plan token, e.g. `"FORWARD"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Instruction::Up       => "UP",
            Instruction::Down     => "DOWN",
            Instruction::Left     => "LEFT",
            Instruction::Right    => "RIGHT",
            Instruction::Forward  => "FORWARD",
            Instruction::Backward => "BACKWARD",
            Instruction::Shake    => "SHAKE",
            Instruction::Rotate   => "ROTATE",
        }
    }
}

impl FromStr for Instruction {
    type Err = DsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instruction::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DsError::UnknownInstruction(s.to_owned()))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
