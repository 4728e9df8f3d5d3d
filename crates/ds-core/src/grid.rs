//! Integer 3-D grid coordinates.
//!
//! Drones live on an unbounded integer lattice.  `GridPos` doubles as a
//! displacement vector (see [`Instruction::delta`][crate::Instruction::delta]),
//! so `Add` is the only arithmetic it needs.

/// A cell on the shared 3-D grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub const ORIGIN: GridPos = GridPos { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// `self + rhs`, or `None` if any coordinate leaves the `i32` range.
    #[inline]
    pub fn checked_add(self, rhs: GridPos) -> Option<GridPos> {
        Some(GridPos::new(
            self.x.checked_add(rhs.x)?,
            self.y.checked_add(rhs.y)?,
            self.z.checked_add(rhs.z)?,
        ))
    }
}

impl std::ops::Add for GridPos {
    type Output = GridPos;
    #[inline]
    fn add(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::iter::Sum for GridPos {
    fn sum<I: Iterator<Item = GridPos>>(iter: I) -> GridPos {
        iter.fold(GridPos::ORIGIN, |acc, d| acc + d)
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
