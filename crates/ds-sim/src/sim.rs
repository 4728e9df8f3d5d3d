//! The `Sim` struct and its step loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use ds_core::{DroneId, RunStatus, SimConfig, Step};
use ds_plan::FlightPlan;

use crate::control::{SimControl, StopReason};
use crate::detector::{CollisionDetector, DetectorHandle, SimEvent, spawn_detector};
use crate::shared::{DroneSnapshot, SharedState};
use crate::worker::{WorkerCommand, WorkerExit, WorkerHandle, WorkerReport, spawn_worker};
use crate::{SimError, SimObserver, SimResult};

// ── Coordinator state ─────────────────────────────────────────────────────────

/// Where the step coordinator is in its cycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum CoordinatorPhase {
    /// Built, not yet run.
    Idle,
    /// Sending `Go(step)` to every active drone.
    Releasing,
    /// Waiting for every released drone to report the step.
    AwaitingWorkers,
    /// Waiting for the collision detector's verdict.
    AwaitingCollisionCheck,
    /// Run over; threads are being (or have been) joined.
    Done,
}

/// Everything a finished run reports back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub status:         RunStatus,
    pub stop_reason:    StopReason,
    /// Steps in which at least one drone was released.
    pub steps_executed: u64,
    pub collisions:     u64,
    /// Collision events handed to the event channel.
    pub events_emitted: u64,
    /// Drones whose worker stopped responding or panicked.
    pub lost_drones:    Vec<DroneId>,
    /// Exit summaries of the workers that returned normally, in slot order.
    pub exits:          Vec<WorkerExit>,
}

impl RunOutcome {
    /// Map the way a run stopped onto its final status.
    ///
    /// Threshold failure takes precedence; anything that left drones with
    /// unexecuted instructions is incomplete.
    pub fn classify(reason: StopReason, collisions: u64, any_lost: bool) -> RunStatus {
        match reason {
            StopReason::ThresholdExceeded => RunStatus::FailureThreshold,
            StopReason::StepBoundExceeded | StopReason::DetectorFailed => {
                RunStatus::FailureIncomplete
            }
            StopReason::Completed if any_lost => RunStatus::FailureIncomplete,
            StopReason::Completed if collisions > 0 => RunStatus::SuccessWithCollisions,
            StopReason::Completed => RunStatus::Success,
        }
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The step coordinator.
///
/// `Sim` owns the plans, the shared state store and the run control, and
/// drives the lock-step loop from the thread that calls [`Sim::run`]:
///
/// 1. **Release**: send `Go(t)` to every drone still active.
/// 2. **Await**: block until every released drone has published and reported
///    step `t`, bounded by `worker_timeout_ms`; silent drones are lost.
/// 3. **Check**: hand the participants of `t` to the collision detector and
///    block for its verdict.
/// 4. **Advance**: notify the observer and move the clock to `t + 1`.
///
/// The loop ends when no drone is active, the collision threshold is reached,
/// or `max_steps` has run.  Every worker, the detector and (through the event
/// channel) the reporter are shut down before `run` returns.
///
/// Create via [`SimBuilder`][crate::SimBuilder].  A `Sim` runs once.
pub struct Sim {
    pub(crate) config:  SimConfig,
    pub(crate) plans:   Arc<[FlightPlan]>,
    pub(crate) shared:  Arc<SharedState>,
    pub(crate) control: Arc<SimControl>,
    pub(crate) events:  Option<Sender<SimEvent>>,
    pub(crate) phase:   CoordinatorPhase,
    pub(crate) started: bool,
}

/// Per-run bookkeeping owned by the coordinator loop.
struct Roster {
    workers:       Vec<WorkerHandle>,
    lost:          Vec<bool>,
    last_reported: Vec<Step>,
}

impl Sim {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn plans(&self) -> &[FlightPlan] {
        &self.plans
    }

    pub fn control(&self) -> &SimControl {
        &self.control
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    /// Current state of every drone, in plan order.
    pub fn snapshot(&self) -> Vec<DroneSnapshot> {
        self.shared.snapshot()
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation to completion.
    ///
    /// Runtime failures (lost workers, threshold, step bound) end the run
    /// normally and show up in the returned [`RunOutcome`].  Only thread
    /// spawn failure or a second call return `Err`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunOutcome> {
        if self.started {
            return Err(SimError::AlreadyRun);
        }
        self.started = true;

        let n = self.plans.len();
        tracing::info!(
            drones    = n,
            max_steps = self.config.max_steps,
            threshold = self.config.collision_threshold,
            "simulation starting",
        );
        observer.on_run_start(&self.plans);

        // ── Spawn one worker per drone ────────────────────────────────────
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<WorkerReport>();
        let mut workers = Vec::with_capacity(n);
        let mut notices = Vec::with_capacity(n);
        for slot in 0..n {
            match spawn_worker(slot, self.plans.clone(), self.shared.clone(), report_tx.clone()) {
                Ok((handle, notice_tx)) => {
                    workers.push(handle);
                    notices.push(notice_tx);
                }
                Err(source) => {
                    abort_workers(workers);
                    self.control.stop(StopReason::Completed);
                    self.phase = CoordinatorPhase::Done;
                    return Err(SimError::Spawn {
                        what: format!("worker for {}", self.plans[slot].id),
                        source,
                    });
                }
            }
        }
        // Only workers hold report senders from here on.
        drop(report_tx);

        let detector = CollisionDetector::new(
            self.shared.clone(),
            self.control.clone(),
            self.events.take(),
            notices,
        );
        let detector = match spawn_detector(detector) {
            Ok(handle) => handle,
            Err(source) => {
                abort_workers(workers);
                self.control.stop(StopReason::Completed);
                self.phase = CoordinatorPhase::Done;
                return Err(SimError::Spawn { what: "collision detector".into(), source });
            }
        };

        let mut roster = Roster {
            workers,
            lost:          vec![false; n],
            last_reported: vec![Step(0); n],
        };

        let steps_executed = self.step_loop(&mut roster, &detector, &report_rx, observer);
        let outcome = self.finish(roster, detector, steps_executed, observer);

        tracing::info!(
            status         = %outcome.status,
            reason         = %outcome.stop_reason,
            steps          = outcome.steps_executed,
            collisions     = outcome.collisions,
            lost           = outcome.lost_drones.len(),
            "simulation finished",
        );
        observer.on_run_end(&outcome);
        Ok(outcome)
    }

    // ── Step loop ─────────────────────────────────────────────────────────

    /// Run steps until something stops the run.  Returns the number of steps
    /// in which drones were released.
    fn step_loop<O: SimObserver>(
        &mut self,
        roster:    &mut Roster,
        detector:  &DetectorHandle,
        report_rx: &Receiver<WorkerReport>,
        observer:  &mut O,
    ) -> u64 {
        let mut steps_executed = 0;

        while self.control.is_running() {
            let step = self.control.current_step();

            let released: Vec<usize> = (0..self.shared.len())
                .filter(|&slot| !roster.lost[slot] && self.shared.read(slot).active)
                .collect();
            if released.is_empty() {
                self.control.stop(StopReason::Completed);
                break;
            }
            if step > self.config.last_step() {
                tracing::warn!(
                    %step,
                    active = released.len(),
                    "step bound reached with drones still active",
                );
                self.control.stop(StopReason::StepBoundExceeded);
                break;
            }

            // ── Release ───────────────────────────────────────────────────
            self.enter(CoordinatorPhase::Releasing, step, observer);
            observer.on_step_start(step);
            let mut pending = Vec::with_capacity(released.len());
            for &slot in &released {
                if roster.workers[slot].send(WorkerCommand::Go(step)) {
                    pending.push(slot);
                } else {
                    self.lose(slot, step, roster, observer);
                }
            }
            steps_executed = step.get();

            // ── Await reports ─────────────────────────────────────────────
            self.enter(CoordinatorPhase::AwaitingWorkers, step, observer);
            self.await_reports(step, &mut pending, &mut roster.last_reported, report_rx);
            for slot in pending {
                self.lose(slot, step, roster, observer);
            }

            // ── Collision check ───────────────────────────────────────────
            self.enter(CoordinatorPhase::AwaitingCollisionCheck, step, observer);
            let participants: Vec<usize> =
                released.iter().copied().filter(|&slot| !roster.lost[slot]).collect();
            let Some(verdict) = detector.check(step, participants) else {
                tracing::error!(%step, "collision detector stopped responding");
                self.control.stop(StopReason::DetectorFailed);
                break;
            };

            tracing::info!(
                %step,
                released   = released.len(),
                collisions = verdict.collisions,
                total      = verdict.total,
                "step complete",
            );
            observer.on_step_end(step, &self.shared.snapshot(), &verdict);

            if !self.control.is_running() {
                break;
            }
            if self.config.step_pause_ms > 0 {
                thread::sleep(Duration::from_millis(self.config.step_pause_ms));
            }
            self.control.advance_step();
        }

        steps_executed
    }

    /// Collect `WorkerReport`s for `step` until every slot in `pending` has
    /// reported or the deadline passes.  Slots still in `pending` afterwards
    /// did not answer in time.
    fn await_reports(
        &self,
        step:          Step,
        pending:       &mut Vec<usize>,
        last_reported: &mut [Step],
        report_rx:     &Receiver<WorkerReport>,
    ) {
        let deadline = Instant::now() + Duration::from_millis(self.config.worker_timeout_ms);
        while !pending.is_empty() {
            let report = match report_rx.recv_deadline(deadline) {
                Ok(report) => report,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(%step, missing = pending.len(), "worker reports timed out");
                    return;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            };

            if report.step != step || report.step <= last_reported[report.slot] {
                tracing::warn!(
                    drone    = self.shared.id(report.slot).get(),
                    reported = %report.step,
                    expected = %step,
                    "ignoring stale worker report",
                );
                continue;
            }
            last_reported[report.slot] = report.step;
            pending.retain(|&slot| slot != report.slot);
        }
    }

    /// Take an unresponsive drone out of the run.
    fn lose<O: SimObserver>(&self, slot: usize, step: Step, roster: &mut Roster, observer: &mut O) {
        if roster.lost[slot] {
            return;
        }
        roster.lost[slot] = true;
        self.shared.mark_lost(slot);
        let drone = self.shared.id(slot);
        tracing::warn!(drone = drone.get(), %step, "drone lost");
        observer.on_drone_lost(step, drone);
    }

    fn enter<O: SimObserver>(&mut self, phase: CoordinatorPhase, step: Step, observer: &mut O) {
        tracing::trace!(%step, ?phase, "coordinator phase");
        self.phase = phase;
        observer.on_phase(step, phase);
    }

    // ── Shutdown ──────────────────────────────────────────────────────────

    fn finish<O: SimObserver>(
        &mut self,
        mut roster:     Roster,
        detector:       DetectorHandle,
        steps_executed: u64,
        observer:       &mut O,
    ) -> RunOutcome {
        // No-op unless the loop ended without recording a reason.
        self.control.stop(StopReason::Completed);
        let step = self.control.current_step();
        self.enter(CoordinatorPhase::Done, step, observer);

        for (slot, worker) in roster.workers.iter().enumerate() {
            if self.shared.read(slot).active || roster.lost[slot] {
                self.shared.request_terminate(slot);
            }
            // Finished workers have already exited; the send just fails.
            worker.send(WorkerCommand::Terminate);
        }

        let events_emitted = match detector.shutdown() {
            Ok(n) => n,
            Err(_) => {
                tracing::error!("collision detector panicked");
                0
            }
        };

        let mut exits = Vec::with_capacity(roster.workers.len());
        let workers = std::mem::take(&mut roster.workers);
        for (slot, worker) in workers.into_iter().enumerate() {
            let drone = worker.drone;
            match worker.join() {
                Ok(exit) => exits.push(exit),
                Err(_) => {
                    tracing::error!(drone = drone.get(), "worker panicked");
                    if !roster.lost[slot] {
                        roster.lost[slot] = true;
                        self.shared.mark_lost(slot);
                        observer.on_drone_lost(step, drone);
                    }
                }
            }
        }

        let lost_drones: Vec<DroneId> = roster
            .lost
            .iter()
            .enumerate()
            .filter(|&(_, &lost)| lost)
            .map(|(slot, _)| self.shared.id(slot))
            .collect();

        let stop_reason = self.control.stop_reason().unwrap_or(StopReason::Completed);
        let collisions = self.control.collisions();
        RunOutcome {
            status: RunOutcome::classify(stop_reason, collisions, !lost_drones.is_empty()),
            stop_reason,
            steps_executed,
            collisions,
            events_emitted,
            lost_drones,
            exits,
        }
    }
}

/// Tell every already-spawned worker to exit and wait for it.
fn abort_workers(workers: Vec<WorkerHandle>) {
    for worker in &workers {
        worker.send(WorkerCommand::Terminate);
    }
    for worker in workers {
        let _ = worker.join();
    }
}
