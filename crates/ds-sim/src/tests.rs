//! Integration tests for ds-sim.

use std::sync::Arc;

use crossbeam_channel::Receiver;

use ds_core::{DroneId, GridPos, Instruction, RunStatus, SimConfig, Step};
use ds_plan::{FlightPlan, RandomPlanSpec, generate_plans};

use crate::{
    CollisionDetector, CollisionEvent, CollisionNotice, CoordinatorPhase, DroneSnapshot,
    ExitReason, NoopObserver, RunOutcome, SharedState, SimBuilder, SimControl, SimError,
    SimEvent, SimObserver, StepRecord, StepVerdict, StopReason,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(threshold: u64) -> SimConfig {
    SimConfig {
        collision_threshold: threshold,
        ..SimConfig::default()
    }
}

/// `instrs` is a whitespace-separated list of instruction tokens.
fn plan(id: u32, (x, y, z): (i32, i32, i32), instrs: &str) -> FlightPlan {
    let instructions = instrs
        .split_whitespace()
        .map(|t| t.parse::<Instruction>().unwrap())
        .collect();
    FlightPlan::new(DroneId(id), GridPos::new(x, y, z), instructions)
}

struct Finished {
    outcome: RunOutcome,
    events:  Vec<CollisionEvent>,
    drones:  Vec<DroneSnapshot>,
}

fn run_with<O: SimObserver>(config: SimConfig, plans: Vec<FlightPlan>, observer: &mut O) -> Finished {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut sim = SimBuilder::new(config, plans).event_channel(tx).build().unwrap();
    let outcome = sim.run(observer).unwrap();
    assert_eq!(sim.phase(), CoordinatorPhase::Done);
    Finished { outcome, events: collisions(drain(&rx)), drones: sim.snapshot() }
}

fn run(config: SimConfig, plans: Vec<FlightPlan>) -> Finished {
    run_with(config, plans, &mut NoopObserver)
}

/// The detector drops its sender when the run ends, so this never blocks.
fn drain(rx: &Receiver<SimEvent>) -> Vec<SimEvent> {
    rx.iter().collect()
}

fn collisions(events: Vec<SimEvent>) -> Vec<CollisionEvent> {
    events
        .into_iter()
        .filter_map(|e| match e {
            SimEvent::Collision(c) => Some(c),
            SimEvent::Step(_) => None,
        })
        .collect()
}

fn pairs(events: &[CollisionEvent]) -> Vec<(u64, u32, u32)> {
    events.iter().map(|e| (e.step.get(), e.first.get(), e.second.get())).collect()
}

/// Records every observer callback.
#[derive(Default)]
struct Recorder {
    run_starts: usize,
    phases:     Vec<CoordinatorPhase>,
    starts:     Vec<Step>,
    ends:       Vec<(Step, StepVerdict)>,
    lost:       Vec<(Step, DroneId)>,
    outcome:    Option<RunOutcome>,
}

impl SimObserver for Recorder {
    fn on_run_start(&mut self, _plans: &[FlightPlan]) {
        self.run_starts += 1;
    }
    fn on_phase(&mut self, _step: Step, phase: CoordinatorPhase) {
        self.phases.push(phase);
    }
    fn on_step_start(&mut self, step: Step) {
        self.starts.push(step);
    }
    fn on_step_end(&mut self, step: Step, _drones: &[DroneSnapshot], verdict: &StepVerdict) {
        self.ends.push((step, *verdict));
    }
    fn on_drone_lost(&mut self, step: Step, drone: DroneId) {
        self.lost.push((step, drone));
    }
    fn on_run_end(&mut self, outcome: &RunOutcome) {
        self.outcome = Some(outcome.clone());
    }
}

fn scenario_c_plans() -> Vec<FlightPlan> {
    vec![
        plan(1, (-1, 0, 0), "RIGHT UP DOWN UP SHAKE SHAKE"),
        plan(2, (1, 0, 0), "LEFT RIGHT SHAKE LEFT SHAKE SHAKE"),
        plan(3, (0, -2, 0), "FORWARD FORWARD SHAKE BACKWARD SHAKE SHAKE"),
        plan(4, (0, 0, -2), "UP UP DOWN UP SHAKE SHAKE"),
    ]
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_initial_positions() {
        let plans = vec![plan(1, (1, 2, 3), "UP"), plan(2, (0, 0, 0), "")];
        let sim = SimBuilder::new(test_config(3), plans).build().unwrap();
        assert_eq!(sim.phase(), CoordinatorPhase::Idle);
        assert_eq!(sim.control().current_step(), Step::FIRST);
        let drones = sim.snapshot();
        assert_eq!(drones[0].position, GridPos::new(1, 2, 3));
        assert!(drones.iter().all(|d| d.active && !d.finished && d.last_executed.is_none()));
    }

    #[test]
    fn zero_threshold_is_config_error() {
        let result = SimBuilder::new(test_config(0), vec![]).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let plans = vec![plan(5, (0, 0, 0), "UP"), plan(5, (1, 1, 1), "UP")];
        let result = SimBuilder::new(test_config(3), plans).build();
        assert!(matches!(result, Err(SimError::Plan(_))));
    }

    #[test]
    fn too_many_drones_rejected() {
        let config = SimConfig { max_drones: 1, ..test_config(3) };
        let plans = vec![plan(1, (0, 0, 0), "UP"), plan(2, (1, 1, 1), "UP")];
        assert!(SimBuilder::new(config, plans).build().is_err());
    }

    #[test]
    fn plan_leaving_the_grid_rejected() {
        let plans = vec![plan(1, (i32::MAX, 0, 0), "RIGHT"), plan(2, (0, 0, 0), "UP")];
        let result = SimBuilder::new(test_config(3), plans).build();
        assert!(matches!(result, Err(SimError::Plan(_))));
    }

    #[test]
    fn sim_runs_only_once() {
        let mut sim = SimBuilder::new(test_config(3), vec![plan(1, (0, 0, 0), "UP")])
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();
        assert!(matches!(sim.run(&mut NoopObserver), Err(SimError::AlreadyRun)));
    }
}

// ── Run control ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod control_tests {
    use super::*;

    #[test]
    fn first_stop_reason_wins() {
        let control = SimControl::new(3);
        assert!(control.is_running());
        assert!(control.stop(StopReason::ThresholdExceeded));
        assert!(!control.stop(StopReason::Completed));
        assert!(!control.is_running());
        assert_eq!(control.stop_reason(), Some(StopReason::ThresholdExceeded));
    }

    #[test]
    fn counters_only_grow() {
        let control = SimControl::new(2);
        assert_eq!(control.advance_step(), Step(2));
        assert_eq!(control.advance_step(), Step(3));
        assert_eq!(control.current_step(), Step(3));
        assert_eq!(control.record_collision(), 1);
        assert!(!control.threshold_reached());
        assert_eq!(control.record_collision(), 2);
        assert!(control.threshold_reached());
    }

    #[test]
    fn classify_maps_stop_reasons() {
        use RunStatus::*;
        assert_eq!(RunOutcome::classify(StopReason::Completed, 0, false), Success);
        assert_eq!(RunOutcome::classify(StopReason::Completed, 2, false), SuccessWithCollisions);
        assert_eq!(RunOutcome::classify(StopReason::Completed, 0, true), FailureIncomplete);
        assert_eq!(RunOutcome::classify(StopReason::ThresholdExceeded, 3, true), FailureThreshold);
        assert_eq!(RunOutcome::classify(StopReason::StepBoundExceeded, 0, false), FailureIncomplete);
        assert_eq!(RunOutcome::classify(StopReason::DetectorFailed, 0, false), FailureIncomplete);
    }
}

// ── Collision detector ────────────────────────────────────────────────────────

#[cfg(test)]
mod detector_tests {
    use super::*;

    fn setup(
        plans:     &[FlightPlan],
        threshold: u64,
    ) -> (Arc<SharedState>, Arc<SimControl>) {
        (Arc::new(SharedState::new(plans)), Arc::new(SimControl::new(threshold)))
    }

    #[test]
    fn rechecking_a_step_never_double_counts() {
        let plans = [plan(1, (0, 0, 0), ""), plan(2, (0, 0, 0), "")];
        let (shared, control) = setup(&plans, 10);
        let mut detector = CollisionDetector::new(shared, control.clone(), None, vec![]);

        let first = detector.check_step(Step(1), &[0, 1]);
        assert_eq!(first.collisions, 1);
        let again = detector.check_step(Step(1), &[0, 1]);
        assert_eq!(again.collisions, 0);
        assert_eq!(again.total, 1);
        let older = detector.check_step(Step(0), &[0, 1]);
        assert_eq!(older.collisions, 0);
        assert_eq!(control.collisions(), 1);
    }

    #[test]
    fn pairs_reported_in_ascending_id_order() {
        let plans = [plan(5, (2, 2, 2), ""), plan(2, (2, 2, 2), ""), plan(9, (2, 2, 2), "")];
        let (shared, control) = setup(&plans, 10);
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut detector = CollisionDetector::new(shared, control, Some(tx), vec![]);

        let verdict = detector.check_step(Step(1), &[0, 1, 2]);
        assert_eq!(verdict.collisions, 3);
        assert_eq!(detector.events_emitted(), 3);
        drop(detector);

        let mut stream = drain(&rx).into_iter();
        match stream.next() {
            Some(SimEvent::Step(StepRecord { step, drones })) => {
                assert_eq!(step, Step(1));
                let ids: Vec<u32> = drones.iter().map(|d| d.id.get()).collect();
                assert_eq!(ids, vec![5, 2, 9]);
            }
            other => panic!("expected the step record first, got {other:?}"),
        }
        let events = collisions(stream.collect());
        assert_eq!(pairs(&events), vec![(1, 2, 5), (1, 2, 9), (1, 5, 9)]);
        assert!(events.iter().all(|e| e.position == GridPos::new(2, 2, 2)));
        assert!(events.iter().all(|e| e.timestamp.timestamp() > 0));
    }

    #[test]
    fn only_participants_are_compared() {
        let plans = [plan(1, (0, 0, 0), ""), plan(2, (0, 0, 0), ""), plan(3, (1, 0, 0), "")];
        let (shared, control) = setup(&plans, 10);
        let mut detector = CollisionDetector::new(shared, control, None, vec![]);
        assert_eq!(detector.check_step(Step(1), &[0, 2]).collisions, 0);
    }

    #[test]
    fn both_drones_get_a_notice() {
        let plans = [plan(1, (4, 0, 0), ""), plan(2, (4, 0, 0), "")];
        let (shared, control) = setup(&plans, 10);
        let (tx0, rx0) = crossbeam_channel::bounded::<CollisionNotice>(1);
        let (tx1, rx1) = crossbeam_channel::bounded::<CollisionNotice>(1);
        let mut detector = CollisionDetector::new(shared, control, None, vec![tx0, tx1]);

        detector.check_step(Step(7), &[0, 1]);
        let n0 = rx0.try_recv().unwrap();
        let n1 = rx1.try_recv().unwrap();
        assert_eq!((n0.step, n0.other, n0.position), (Step(7), DroneId(2), GridPos::new(4, 0, 0)));
        assert_eq!(n1.other, DroneId(1));
    }

    #[test]
    fn full_or_closed_notice_queue_is_not_fatal() {
        let plans = [plan(1, (0, 0, 0), ""), plan(2, (0, 0, 0), "")];
        let (shared, control) = setup(&plans, 10);
        let (tx0, _rx0) = crossbeam_channel::bounded::<CollisionNotice>(0);
        let (tx1, rx1) = crossbeam_channel::bounded::<CollisionNotice>(1);
        drop(rx1);
        let mut detector = CollisionDetector::new(shared, control, None, vec![tx0, tx1]);
        assert_eq!(detector.check_step(Step(1), &[0, 1]).collisions, 1);
    }

    #[test]
    fn dropped_event_receiver_is_not_fatal() {
        let plans = [plan(1, (0, 0, 0), ""), plan(2, (0, 0, 0), "")];
        let (shared, control) = setup(&plans, 10);
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut detector = CollisionDetector::new(shared, control.clone(), Some(tx), vec![]);

        let verdict = detector.check_step(Step(1), &[0, 1]);
        assert_eq!(verdict.collisions, 1);
        assert_eq!(detector.events_emitted(), 0);
        assert!(control.is_running());
    }

    #[test]
    fn reaching_threshold_stops_the_run() {
        let plans = [plan(1, (0, 0, 0), ""), plan(2, (0, 0, 0), "")];
        let (shared, control) = setup(&plans, 1);
        let mut detector = CollisionDetector::new(shared, control.clone(), None, vec![]);

        let verdict = detector.check_step(Step(1), &[0, 1]);
        assert!(verdict.threshold_reached);
        assert!(!control.is_running());
        assert_eq!(control.stop_reason(), Some(StopReason::ThresholdExceeded));
    }

    #[test]
    fn sees_published_positions() {
        let plans = [plan(1, (0, 0, 0), "RIGHT"), plan(2, (2, 0, 0), "LEFT")];
        let (shared, control) = setup(&plans, 10);
        let mut detector = CollisionDetector::new(shared.clone(), control, None, vec![]);
        assert_eq!(detector.check_step(Step(1), &[0, 1]).collisions, 0);

        for slot in 0..2 {
            let mut live = shared.read(slot);
            live.position = GridPos::new(1, 0, 0);
            assert!(shared.publish(slot, live));
        }
        assert_eq!(detector.check_step(Step(2), &[0, 1]).collisions, 1);
    }
}

// ── End-to-end scenarios ──────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn converging_pair_collides_once() {
        let plans = vec![
            plan(1, (0, 0, 0), "RIGHT RIGHT RIGHT"),
            plan(2, (4, 0, 0), "LEFT LEFT FORWARD"),
        ];
        let done = run(test_config(3), plans);

        assert_eq!(done.outcome.status, RunStatus::SuccessWithCollisions);
        assert_eq!(done.outcome.stop_reason, StopReason::Completed);
        assert_eq!(done.outcome.steps_executed, 3);
        assert_eq!(done.outcome.collisions, 1);
        assert_eq!(done.outcome.events_emitted, 1);
        assert_eq!(pairs(&done.events), vec![(2, 1, 2)]);
        assert_eq!(done.events[0].position, GridPos::new(2, 0, 0));

        assert_eq!(done.drones[0].position, GridPos::new(3, 0, 0));
        assert_eq!(done.drones[1].position, GridPos::new(2, 1, 0));
        assert!(done.drones.iter().all(|d| d.finished && !d.active));

        // Each drone acknowledges the step-2 notice before executing step 3.
        assert_eq!(done.outcome.exits.len(), 2);
        for exit in &done.outcome.exits {
            assert_eq!(exit.reason, ExitReason::Finished);
            assert_eq!(exit.steps_executed, 3);
            assert_eq!(exit.notices_acknowledged, 1);
        }
    }

    #[test]
    fn lone_drone_reaches_its_final_cell() {
        let flight = plan(1, (1, 1, 1), "UP FORWARD RIGHT SHAKE UP");
        let expected = flight.final_position();
        let done = run(test_config(3), vec![flight]);

        assert_eq!(done.outcome.status, RunStatus::Success);
        assert_eq!(done.outcome.steps_executed, 5);
        assert_eq!(expected, GridPos::new(2, 2, 3));
        assert_eq!(done.drones[0].position, expected);
        assert_eq!(done.drones[0].last_executed, Some(4));
        assert!(done.drones[0].finished);
        assert!(done.events.is_empty());
    }

    #[test]
    fn threshold_stops_the_swarm_mid_plan() {
        let mut rec = Recorder::default();
        let done = run_with(test_config(3), scenario_c_plans(), &mut rec);

        assert_eq!(done.outcome.status, RunStatus::FailureThreshold);
        assert_eq!(done.outcome.stop_reason, StopReason::ThresholdExceeded);
        assert_eq!(done.outcome.steps_executed, 3);
        assert_eq!(done.outcome.collisions, 3);
        assert_eq!(pairs(&done.events), vec![(1, 1, 2), (2, 3, 4), (3, 1, 3)]);
        assert!(done.events.iter().all(|e| e.position == GridPos::ORIGIN));

        // No step after the third was released.
        assert_eq!(rec.starts, vec![Step(1), Step(2), Step(3)]);
        assert!(done.drones.iter().all(|d| d.last_executed == Some(2) && !d.finished));

        for exit in &done.outcome.exits {
            assert_eq!(exit.reason, ExitReason::Terminated);
            assert_eq!(exit.steps_executed, 3);
        }
        let acks: u64 = done.outcome.exits.iter().map(|e| e.notices_acknowledged).sum();
        assert_eq!(acks, 6);
    }

    #[test]
    fn step_bound_with_active_drones_is_incomplete() {
        let config = SimConfig { max_steps: 2, ..test_config(3) };
        let done = run(config, vec![plan(1, (0, 0, 0), "UP UP UP UP UP")]);

        assert_eq!(done.outcome.status, RunStatus::FailureIncomplete);
        assert_eq!(done.outcome.stop_reason, StopReason::StepBoundExceeded);
        assert_eq!(done.outcome.steps_executed, 2);
        assert_eq!(done.drones[0].position, GridPos::new(0, 0, 2));
        assert_eq!(done.drones[0].last_executed, Some(1));
        assert!(done.outcome.lost_drones.is_empty());
    }

    #[test]
    fn plan_ending_exactly_on_bound_is_success() {
        let config = SimConfig { max_steps: 3, ..test_config(3) };
        let done = run(config, vec![plan(1, (0, 0, 0), "UP UP UP")]);
        assert_eq!(done.outcome.status, RunStatus::Success);
        assert_eq!(done.outcome.steps_executed, 3);
    }

    #[test]
    fn no_drones_is_immediate_success() {
        let mut rec = Recorder::default();
        let done = run_with(test_config(3), vec![], &mut rec);

        assert_eq!(done.outcome.status, RunStatus::Success);
        assert_eq!(done.outcome.steps_executed, 0);
        assert!(done.outcome.exits.is_empty());
        assert_eq!(rec.phases, vec![CoordinatorPhase::Done]);
    }

    #[test]
    fn empty_plan_finishes_in_place() {
        let done = run(test_config(3), vec![plan(1, (3, 3, 3), "")]);

        assert_eq!(done.outcome.status, RunStatus::Success);
        assert_eq!(done.outcome.steps_executed, 1);
        assert_eq!(done.drones[0].position, GridPos::new(3, 3, 3));
        assert_eq!(done.drones[0].last_executed, None);
        assert!(done.drones[0].finished);
        assert_eq!(done.outcome.exits[0].steps_executed, 0);
    }

    #[test]
    fn drone_finishing_this_step_still_collides() {
        let plans = vec![
            plan(1, (0, 0, 0), "RIGHT"),
            plan(2, (2, 0, 0), "LEFT SHAKE"),
        ];
        let done = run(test_config(3), plans);
        assert_eq!(pairs(&done.events), vec![(1, 1, 2)]);
        assert_eq!(done.outcome.status, RunStatus::SuccessWithCollisions);
    }

    #[test]
    fn parked_drone_no_longer_collides() {
        let plans = vec![
            plan(1, (0, 0, 0), "RIGHT"),
            plan(2, (3, 0, 0), "LEFT LEFT"),
        ];
        let done = run(test_config(3), plans);
        assert!(done.events.is_empty());
        assert_eq!(done.drones[0].position, done.drones[1].position);
        assert_eq!(done.outcome.status, RunStatus::Success);
    }

    #[test]
    fn random_swarm_matches_replayed_plans() {
        let spec = RandomPlanSpec { drones: 6, instructions: 15, extent: 3, seed: 11 };
        let plans = generate_plans(&spec);
        let config = SimConfig { collision_threshold: u64::MAX, ..SimConfig::default() };

        // Replay every plan step by step and count coinciding pairs.
        let mut expected = 0u64;
        for k in 1..=spec.instructions {
            for (i, a) in plans.iter().enumerate() {
                for b in &plans[i + 1..] {
                    if a.position_after(k) == b.position_after(k) {
                        expected += 1;
                    }
                }
            }
        }

        let done = run(config, plans.clone());
        assert!(done.outcome.status.is_success());
        assert_eq!(done.outcome.steps_executed, spec.instructions as u64);
        assert_eq!(done.outcome.collisions, expected);
        assert_eq!(done.events.len() as u64, expected);
        for (drone, flight) in done.drones.iter().zip(&plans) {
            assert_eq!(drone.position, flight.final_position());
            assert!(drone.finished);
        }
    }
}

// ── Observer hooks ────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn phases_cycle_then_done() {
        use CoordinatorPhase::*;
        let mut rec = Recorder::default();
        run_with(test_config(3), vec![plan(1, (0, 0, 0), "UP DOWN")], &mut rec);
        assert_eq!(
            rec.phases,
            vec![
                Releasing, AwaitingWorkers, AwaitingCollisionCheck,
                Releasing, AwaitingWorkers, AwaitingCollisionCheck,
                Done,
            ],
        );
    }

    #[test]
    fn steps_and_totals_never_decrease() {
        let mut rec = Recorder::default();
        let plans = generate_plans(&RandomPlanSpec { drones: 5, instructions: 12, extent: 2, seed: 3 });
        let config = SimConfig { collision_threshold: u64::MAX, ..SimConfig::default() };
        run_with(config, plans, &mut rec);

        assert_eq!(rec.ends.len(), 12);
        for w in rec.ends.windows(2) {
            assert_eq!(w[1].0, w[0].0.next());
            assert!(w[1].1.total >= w[0].1.total);
            assert_eq!(w[1].1.total, w[0].1.total + w[1].1.collisions);
        }
    }

    #[test]
    fn run_hooks_fire_once() {
        let mut rec = Recorder::default();
        let done = run_with(test_config(3), vec![plan(1, (0, 0, 0), "SHAKE")], &mut rec);
        assert_eq!(rec.run_starts, 1);
        assert_eq!(rec.outcome.as_ref(), Some(&done.outcome));
        assert_eq!(rec.starts, rec.ends.iter().map(|(s, _)| *s).collect::<Vec<_>>());
    }
}

// ── Lost drones ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_stream_tests {
    use super::*;

    #[test]
    fn each_step_record_precedes_its_collisions() {
        let plans = vec![
            plan(1, (0, 0, 0), "RIGHT RIGHT LEFT"),
            plan(2, (2, 0, 0), "LEFT SHAKE FORWARD"),
        ];
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sim = SimBuilder::new(test_config(5), plans).event_channel(tx).build().unwrap();
        let outcome = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(outcome.steps_executed, 3);

        let kinds: Vec<(char, u64)> = drain(&rx)
            .iter()
            .map(|e| match e {
                SimEvent::Step(r) => ('s', r.step.get()),
                SimEvent::Collision(c) => ('c', c.step.get()),
            })
            .collect();
        assert_eq!(kinds, vec![('s', 1), ('c', 1), ('s', 2), ('s', 3)]);
    }

    #[test]
    fn finished_drone_appears_in_its_last_step_only() {
        let plans = vec![plan(1, (0, 0, 0), "UP"), plan(2, (5, 5, 5), "UP UP")];
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sim = SimBuilder::new(test_config(3), plans).event_channel(tx).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let records: Vec<StepRecord> = drain(&rx)
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Step(r) => Some(r),
                SimEvent::Collision(_) => None,
            })
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].drones.len(), 2);
        assert!(records[0].drones[0].finished);
        assert_eq!(records[1].drones.len(), 1);
        assert_eq!(records[1].drones[0].id, DroneId(2));
    }
}

#[cfg(test)]
mod lost_drone_tests {
    use super::*;

    use std::time::{Duration, Instant};

    use crate::Sim;

    /// Build a sim whose drone in `slot` has already been told to stop, so its
    /// worker exits on the first `Go` without ever reporting.
    fn with_silent_drone(config: SimConfig, plans: Vec<FlightPlan>, slot: usize) -> Sim {
        let sim = SimBuilder::new(config, plans).build().unwrap();
        sim.shared.request_terminate(slot);
        sim
    }

    #[test]
    fn silent_drone_is_lost_and_the_rest_finish() {
        let config = SimConfig { worker_timeout_ms: 200, ..test_config(3) };
        let plans = vec![
            plan(1, (0, 0, 0), "UP UP UP"),
            plan(2, (5, 5, 5), "LEFT LEFT"),
            plan(3, (9, 0, 0), "RIGHT RIGHT"),
        ];
        let mut sim = with_silent_drone(config, plans.clone(), 1);
        let mut rec = Recorder::default();
        let outcome = sim.run(&mut rec).unwrap();

        assert_eq!(outcome.status, RunStatus::FailureIncomplete);
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.lost_drones, vec![DroneId(2)]);
        assert_eq!(outcome.steps_executed, 3);
        assert_eq!(rec.lost, vec![(Step(1), DroneId(2))]);

        let drones = sim.snapshot();
        assert!(drones[0].finished);
        assert_eq!(drones[0].position, plans[0].final_position());
        assert!(drones[2].finished);
        assert_eq!(drones[2].position, plans[2].final_position());
        assert!(!drones[1].active && !drones[1].finished);
        assert_eq!(drones[1].position, plans[1].start);

        let exit = outcome.exits.iter().find(|e| e.drone == DroneId(2)).unwrap();
        assert_eq!(exit.reason, ExitReason::Terminated);
        assert_eq!(exit.steps_executed, 0);
    }

    #[test]
    fn closed_report_channel_does_not_wait_for_the_deadline() {
        let config = SimConfig { worker_timeout_ms: 60_000, ..test_config(3) };
        let mut sim = with_silent_drone(config, vec![plan(4, (0, 0, 0), "UP UP")], 0);

        let t0 = Instant::now();
        let outcome = sim.run(&mut NoopObserver).unwrap();
        assert!(t0.elapsed() < Duration::from_secs(30));

        assert_eq!(outcome.status, RunStatus::FailureIncomplete);
        assert_eq!(outcome.lost_drones, vec![DroneId(4)]);
        assert_eq!(outcome.steps_executed, 1);
    }

    #[test]
    fn lost_drone_takes_no_part_in_collisions() {
        let config = SimConfig { worker_timeout_ms: 200, ..test_config(1) };
        let plans = vec![plan(1, (0, 0, 0), "SHAKE"), plan(2, (0, 0, 0), "SHAKE")];
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sim = SimBuilder::new(config, plans).event_channel(tx).build().unwrap();
        sim.shared.request_terminate(1);
        let outcome = sim.run(&mut NoopObserver).unwrap();

        assert_eq!(outcome.collisions, 0);
        let events = drain(&rx);
        assert!(collisions(events.clone()).is_empty());
        let SimEvent::Step(record) = &events[0] else {
            panic!("expected a step record, got {:?}", events[0]);
        };
        assert_eq!(record.drones.len(), 1);
        assert_eq!(record.drones[0].id, DroneId(1));
        assert_eq!(outcome.lost_drones, vec![DroneId(2)]);
        assert_eq!(outcome.status, RunStatus::FailureIncomplete);
    }

    #[test]
    fn lost_drone_cannot_republish() {
        let plans = [plan(1, (0, 0, 0), "UP UP")];
        let shared = SharedState::new(&plans);
        shared.mark_lost(0);

        let mut late = shared.read(0);
        late.position = GridPos::new(0, 0, 1);
        late.active = true;
        assert!(!shared.publish(0, late));

        let snap = shared.snapshot_of(0);
        assert!(!snap.active);
        assert_eq!(snap.position, GridPos::ORIGIN);
    }
}
