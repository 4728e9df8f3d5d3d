//! Collision detection, run once per completed step on its own thread.
//!
//! The coordinator sends `StepFinal { step, participants }` once every
//! released worker has published step `step`.  The detector scans every pair
//! of participants in ascending id order, counts and reports each pair that
//! shares a cell, and answers with a [`StepVerdict`].  It is the only
//! component besides the coordinator that may end the run (threshold).
//!
//! With an event channel attached, every examined step puts a
//! [`SimEvent::Step`] record on it, followed by one [`SimEvent::Collision`]
//! per colliding pair, so a single consumer sees each step's movements before
//! its collisions.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};

use ds_core::{DroneId, GridPos, Step};

use crate::control::{SimControl, StopReason};
use crate::shared::{DroneSnapshot, SharedState};
use crate::worker::{CollisionNotice, notify};

// ── Public types ──────────────────────────────────────────────────────────────

/// Two drones observed in the same cell at the end of a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollisionEvent {
    pub step:      Step,
    /// Wall-clock detection time.
    pub timestamp: DateTime<Local>,
    /// The lower of the two ids.
    pub first:     DroneId,
    pub second:    DroneId,
    pub position:  GridPos,
}

/// The published state of every drone that took part in a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRecord {
    pub step:   Step,
    /// Participants in slot order.
    pub drones: Vec<DroneSnapshot>,
}

/// What the detector puts on the event channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    Step(StepRecord),
    Collision(CollisionEvent),
}

/// The detector's answer for one step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepVerdict {
    pub step:              Step,
    /// Collisions found in this step (0 for a step that was already checked).
    pub collisions:        u64,
    /// Running total after this step.
    pub total:             u64,
    pub threshold_reached: bool,
}

// ── Detector ──────────────────────────────────────────────────────────────────

/// Pairwise collision scanner over the shared state.
///
/// Usable directly (single-threaded tests) or on its own thread via the
/// coordinator.
pub struct CollisionDetector {
    shared:       Arc<SharedState>,
    control:      Arc<SimControl>,
    events:       Option<Sender<SimEvent>>,
    notices:      Vec<Sender<CollisionNotice>>,
    last_checked: Step,
    emitted:      u64,
}

impl CollisionDetector {
    pub fn new(
        shared:  Arc<SharedState>,
        control: Arc<SimControl>,
        events:  Option<Sender<SimEvent>>,
        notices: Vec<Sender<CollisionNotice>>,
    ) -> Self {
        Self { shared, control, events, notices, last_checked: Step(0), emitted: 0 }
    }

    /// Collision events successfully handed to the event channel so far.
    pub fn events_emitted(&self) -> u64 {
        self.emitted
    }

    /// Scan the final positions of `step` for collisions between
    /// `participants` (slot indices).
    ///
    /// A step is examined at most once: asking again for a step at or before
    /// the last one examined changes nothing and reports zero collisions.
    pub fn check_step(&mut self, step: Step, participants: &[usize]) -> StepVerdict {
        if step <= self.last_checked {
            tracing::warn!(%step, last = %self.last_checked, "ignoring repeated collision check");
            return self.verdict(step, 0);
        }
        self.last_checked = step;

        if let Some(tx) = &self.events {
            let drones = participants.iter().map(|&slot| self.shared.snapshot_of(slot)).collect();
            if tx.send(SimEvent::Step(StepRecord { step, drones })).is_err() {
                tracing::warn!(%step, "event reporter gone, step record dropped");
            }
        }

        let mut drones: Vec<(DroneId, usize, GridPos)> = participants
            .iter()
            .map(|&slot| (self.shared.id(slot), slot, self.shared.read(slot).position))
            .collect();
        drones.sort_unstable_by_key(|&(id, _, _)| id);

        let mut found = 0;
        for (i, &(id_a, slot_a, pos_a)) in drones.iter().enumerate() {
            for &(id_b, slot_b, pos_b) in &drones[i + 1..] {
                if pos_a == pos_b {
                    found += 1;
                    self.record(step, (id_a, slot_a), (id_b, slot_b), pos_a);
                }
            }
        }

        if self.control.threshold_reached() && self.control.stop(StopReason::ThresholdExceeded) {
            tracing::warn!(
                %step,
                collisions = self.control.collisions(),
                threshold  = self.control.threshold(),
                "collision threshold reached, stopping simulation",
            );
        }

        self.verdict(step, found)
    }

    fn record(&mut self, step: Step, a: (DroneId, usize), b: (DroneId, usize), position: GridPos) {
        let total = self.control.record_collision();
        let event = CollisionEvent {
            step,
            timestamp: Local::now(),
            first:     a.0,
            second:    b.0,
            position,
        };
        tracing::info!(
            %step,
            first  = a.0.get(),
            second = b.0.get(),
            %position,
            total,
            "collision",
        );

        if let Some(tx) = &self.events {
            if tx.send(SimEvent::Collision(event)).is_ok() {
                self.emitted += 1;
            } else {
                tracing::warn!(%step, "event reporter gone, collision event dropped");
            }
        }

        for (me, other) in [(a, b.0), (b, a.0)] {
            let delivered = self
                .notices
                .get(me.1)
                .is_some_and(|tx| notify(tx, CollisionNotice { step, other, position }));
            if !delivered {
                tracing::trace!(drone = me.0.get(), %step, "collision notice not delivered");
            }
        }
    }

    fn verdict(&self, step: Step, collisions: u64) -> StepVerdict {
        StepVerdict {
            step,
            collisions,
            total:             self.control.collisions(),
            threshold_reached: self.control.threshold_reached(),
        }
    }
}

// ── Thread wrapper ────────────────────────────────────────────────────────────

/// Coordinator → detector.
pub(crate) enum DetectorCommand {
    StepFinal { step: Step, participants: Vec<usize> },
    Shutdown,
}

/// The coordinator's end of the detector thread.
pub(crate) struct DetectorHandle {
    cmd_tx:     Sender<DetectorCommand>,
    verdict_rx: Receiver<StepVerdict>,
    thread:     JoinHandle<u64>,
}

impl DetectorHandle {
    /// Hand a finished step to the detector and block for its verdict.
    /// `None` if the detector thread is gone.
    pub fn check(&self, step: Step, participants: Vec<usize>) -> Option<StepVerdict> {
        self.cmd_tx.send(DetectorCommand::StepFinal { step, participants }).ok()?;
        self.verdict_rx.recv().ok()
    }

    /// Stop the thread and return the number of events it emitted.
    ///
    /// Dropping the detector also drops its event sender, which lets the
    /// reporter drain and exit.
    pub fn shutdown(self) -> thread::Result<u64> {
        let _ = self.cmd_tx.send(DetectorCommand::Shutdown);
        self.thread.join()
    }
}

pub(crate) fn spawn_detector(detector: CollisionDetector) -> io::Result<DetectorHandle> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<DetectorCommand>();
    let (verdict_tx, verdict_rx) = crossbeam_channel::bounded(1);

    let thread = thread::Builder::new()
        .name("collision-detector".into())
        .spawn(move || detector_main(detector, cmd_rx, verdict_tx))?;

    Ok(DetectorHandle { cmd_tx, verdict_rx, thread })
}

fn detector_main(
    mut detector: CollisionDetector,
    cmd_rx:       Receiver<DetectorCommand>,
    verdict_tx:   Sender<StepVerdict>,
) -> u64 {
    for cmd in cmd_rx {
        match cmd {
            DetectorCommand::StepFinal { step, participants } => {
                let verdict = detector.check_step(step, &participants);
                if verdict_tx.send(verdict).is_err() {
                    break;
                }
            }
            DetectorCommand::Shutdown => break,
        }
    }
    detector.events_emitted()
}
