//! The shared state store: one live record per drone.
//!
//! # Ownership discipline
//!
//! Every slot is written by exactly one party per field:
//!
//! | Field                 | Writer                                          |
//! |-----------------------|-------------------------------------------------|
//! | `DroneLive` (all)     | the drone's own worker thread                   |
//! | `terminate_requested` | the step coordinator                            |
//!
//! The one exception is [`SharedState::mark_lost`]: the coordinator clears
//! `active` for a worker that stopped answering.  It also sets the terminate
//! flag first, and `publish` refuses to write once that flag is set.
//!
//! Each `DroneLive` sits behind its own `RwLock` and is replaced as a whole,
//! so readers (collision detector, display) always see a consistent record and
//! never a half-applied instruction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use ds_core::{DroneId, GridPos};
use ds_plan::FlightPlan;

/// The mutable part of a drone's state, published once per step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DroneLive {
    pub position:      GridPos,
    /// Still eligible to be released for another step.
    pub active:        bool,
    /// The whole plan has been executed.
    pub finished:      bool,
    /// Index of the instruction applied most recently; `None` before the
    /// first one.
    pub last_executed: Option<usize>,
}

impl DroneLive {
    fn initial(start: GridPos) -> Self {
        Self { position: start, active: true, finished: false, last_executed: None }
    }
}

/// Read-only view of one drone, handed to observers and display adapters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DroneSnapshot {
    pub id:            DroneId,
    pub position:      GridPos,
    pub active:        bool,
    pub finished:      bool,
    pub last_executed: Option<usize>,
}

struct DroneSlot {
    id:        DroneId,
    live:      RwLock<DroneLive>,
    terminate: AtomicBool,
}

/// Live state of every drone, indexed by slot (the drone's position in the
/// plan list, not its id).
pub struct SharedState {
    slots: Vec<DroneSlot>,
}

impl SharedState {
    /// One slot per plan, each starting at the plan's start cell.
    pub fn new(plans: &[FlightPlan]) -> Self {
        let slots = plans
            .iter()
            .map(|p| DroneSlot {
                id:        p.id,
                live:      RwLock::new(DroneLive::initial(p.start)),
                terminate: AtomicBool::new(false),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The drone id stored in `slot`.
    #[inline]
    pub fn id(&self, slot: usize) -> DroneId {
        self.slots[slot].id
    }

    /// Consistent copy of one drone's live record.
    pub fn read(&self, slot: usize) -> DroneLive {
        *self.slots[slot]
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace a drone's live record in one critical section.
    ///
    /// Only the owning worker calls this.  Returns `false` without writing
    /// once termination has been requested for the slot, so a worker that
    /// was given up on cannot reactivate itself.
    pub(crate) fn publish(&self, slot: usize, live: DroneLive) -> bool {
        let slot = &self.slots[slot];
        let mut current = slot.live.write().unwrap_or_else(PoisonError::into_inner);
        if slot.terminate.load(Ordering::SeqCst) {
            return false;
        }
        *current = live;
        true
    }

    /// Stop an unresponsive drone: request termination, then deactivate it.
    /// Its position is left untouched.
    pub(crate) fn mark_lost(&self, slot: usize) {
        self.request_terminate(slot);
        self.slots[slot]
            .live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = false;
    }

    /// Ask the drone's worker to exit at its next suspension point.
    pub(crate) fn request_terminate(&self, slot: usize) {
        self.slots[slot].terminate.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn terminate_requested(&self, slot: usize) -> bool {
        self.slots[slot].terminate.load(Ordering::SeqCst)
    }

    /// Snapshot of one drone.
    pub fn snapshot_of(&self, slot: usize) -> DroneSnapshot {
        let live = self.read(slot);
        DroneSnapshot {
            id:            self.id(slot),
            position:      live.position,
            active:        live.active,
            finished:      live.finished,
            last_executed: live.last_executed,
        }
    }

    /// Snapshot of every drone, in slot order.
    pub fn snapshot(&self) -> Vec<DroneSnapshot> {
        (0..self.len()).map(|slot| self.snapshot_of(slot)).collect()
    }
}
