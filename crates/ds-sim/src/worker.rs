//! Drone workers: one OS thread per drone.
//!
//! A worker owns its instruction cursor and a private copy of its position.
//! It blocks on its command channel; every `Go(step)` makes it apply exactly
//! one instruction, publish the result to [`SharedState`] in one critical
//! section, and report back to the coordinator.
//!
//! ```text
//!   coordinator ──Go(t)/Terminate──▶ worker ──WorkerReport──▶ coordinator
//!   detector    ──CollisionNotice (advisory, try_send)──▶ worker
//! ```

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use ds_core::{DroneId, GridPos, Step};
use ds_plan::FlightPlan;

use crate::shared::{DroneLive, SharedState};

/// Capacity of each worker's advisory notice queue.  Notices beyond this are
/// dropped; they carry no information the run depends on.
pub const NOTICE_CAPACITY: usize = 16;

// ── Messages ──────────────────────────────────────────────────────────────────

/// Coordinator → worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Execute the next instruction as part of this step.
    Go(Step),
    /// Exit without executing anything further.
    Terminate,
}

/// Worker → coordinator: "done with this step".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub slot:     usize,
    pub step:     Step,
    pub finished: bool,
}

/// Detector → worker: "you were part of a collision".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollisionNotice {
    pub step:     Step,
    pub other:    DroneId,
    pub position: GridPos,
}

/// Why a worker thread returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Executed its whole plan.
    Finished,
    /// Told to stop by the coordinator.
    Terminated,
    /// Its command or report channel closed.
    Disconnected,
}

/// Returned through the worker's join handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkerExit {
    pub drone:                DroneId,
    pub reason:               ExitReason,
    /// Instructions actually applied.
    pub steps_executed:       u64,
    pub notices_acknowledged: u64,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// The coordinator's end of one worker.
pub(crate) struct WorkerHandle {
    pub drone:     DroneId,
    cmd_tx:        Sender<WorkerCommand>,
    thread:        JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    /// Send a command; `false` if the worker is gone.
    pub fn send(&self, cmd: WorkerCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    pub fn join(self) -> thread::Result<WorkerExit> {
        self.thread.join()
    }
}

/// Spawn the worker for `plans[slot]`.
///
/// Returns the handle plus the sender half of the worker's notice queue, which
/// the caller hands to the collision detector.
pub(crate) fn spawn_worker(
    slot:      usize,
    plans:     Arc<[FlightPlan]>,
    shared:    Arc<SharedState>,
    report_tx: Sender<WorkerReport>,
) -> io::Result<(WorkerHandle, Sender<CollisionNotice>)> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (notice_tx, notice_rx) = crossbeam_channel::bounded(NOTICE_CAPACITY);
    let drone = plans[slot].id;
    let position = plans[slot].start;

    let worker = DroneWorker {
        slot,
        drone,
        plans,
        shared,
        cursor: 0,
        position,
        steps_executed: 0,
        notices_acknowledged: 0,
    };

    let thread = thread::Builder::new()
        .name(format!("drone-{}", drone.get()))
        .spawn(move || worker.run(cmd_rx, notice_rx, report_tx))?;

    Ok((WorkerHandle { drone, cmd_tx, thread }, notice_tx))
}

// ── Worker loop ───────────────────────────────────────────────────────────────

struct DroneWorker {
    slot:                 usize,
    drone:                DroneId,
    plans:                Arc<[FlightPlan]>,
    shared:               Arc<SharedState>,
    cursor:               usize,
    position:             GridPos,
    steps_executed:       u64,
    notices_acknowledged: u64,
}

impl DroneWorker {
    fn run(
        mut self,
        cmd_rx:    Receiver<WorkerCommand>,
        notice_rx: Receiver<CollisionNotice>,
        report_tx: Sender<WorkerReport>,
    ) -> WorkerExit {
        loop {
            let Ok(cmd) = cmd_rx.recv() else {
                return self.exit(ExitReason::Disconnected);
            };
            self.acknowledge_notices(&notice_rx);

            let step = match cmd {
                WorkerCommand::Go(step) => step,
                WorkerCommand::Terminate => return self.exit(ExitReason::Terminated),
            };
            if self.shared.terminate_requested(self.slot) {
                return self.exit(ExitReason::Terminated);
            }

            let live = self.execute_one();
            if !self.shared.publish(self.slot, live) {
                return self.exit(ExitReason::Terminated);
            }
            tracing::debug!(
                drone    = self.drone.get(),
                %step,
                position = %live.position,
                finished = live.finished,
                "published position",
            );

            let report = WorkerReport { slot: self.slot, step, finished: live.finished };
            if report_tx.send(report).is_err() {
                return self.exit(ExitReason::Disconnected);
            }
            if live.finished {
                return self.exit(ExitReason::Finished);
            }
        }
    }

    /// Apply the instruction under the cursor to the local position and build
    /// the record to publish.  An exhausted (empty) plan finishes in place.
    fn execute_one(&mut self) -> DroneLive {
        let plan = &self.plans[self.slot];
        match plan.instruction(self.cursor) {
            None => DroneLive {
                position:      self.position,
                active:        false,
                finished:      true,
                last_executed: self.cursor.checked_sub(1),
            },
            Some(instruction) => {
                self.position = self.position + instruction.delta();
                let executed = self.cursor;
                self.cursor += 1;
                self.steps_executed += 1;
                let finished = self.cursor == plan.len();
                DroneLive {
                    position:      self.position,
                    active:        !finished,
                    finished,
                    last_executed: Some(executed),
                }
            }
        }
    }

    /// Drain pending collision notices.  Purely observational: neither the
    /// position nor the cursor changes.
    fn acknowledge_notices(&mut self, notice_rx: &Receiver<CollisionNotice>) {
        for notice in notice_rx.try_iter() {
            self.notices_acknowledged += 1;
            tracing::debug!(
                drone    = self.drone.get(),
                other    = notice.other.get(),
                step     = %notice.step,
                position = %notice.position,
                "acknowledged collision notice",
            );
        }
    }

    fn exit(self, reason: ExitReason) -> WorkerExit {
        tracing::debug!(drone = self.drone.get(), ?reason, "worker exiting");
        WorkerExit {
            drone:                self.drone,
            reason,
            steps_executed:       self.steps_executed,
            notices_acknowledged: self.notices_acknowledged,
        }
    }
}

/// Deliver an advisory notice without ever blocking.  Returns `false` if the
/// notice was dropped (queue full or worker already gone).
pub(crate) fn notify(tx: &Sender<CollisionNotice>, notice: CollisionNotice) -> bool {
    match tx.try_send(notice) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
    }
}
