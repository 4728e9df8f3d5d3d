//! Strongly typed drone identifier.
//!
//! Drone ids come from the flight plan, so unlike a storage index they are
//! not dense: `DroneId(7)` may be the first drone loaded.  The simulator keeps
//! its own slot index next to the id wherever it needs `Vec` indexing.

use std::fmt;

/// Stable, unique identifier of one drone as written in its flight plan.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroneId(pub u32);

impl DroneId {
    /// The raw integer id.
    #[inline(always)]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DroneId({})", self.0)
    }
}

