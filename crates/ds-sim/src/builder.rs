//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use crossbeam_channel::Sender;

use ds_core::SimConfig;
use ds_plan::{FlightPlan, validate_plans};

use crate::control::SimControl;
use crate::detector::SimEvent;
use crate::shared::SharedState;
use crate::sim::CoordinatorPhase;
use crate::{Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: limits, collision threshold, worker timeout, pacing
/// - `Vec<FlightPlan>`: one plan per drone, e.g. from
///   [`ds_plan::load_plans_csv`] or [`ds_plan::generate_plans`]
///
/// # Optional inputs
///
/// | Method              | Default                                       |
/// |---------------------|-----------------------------------------------|
/// | `.event_channel(tx)`| No event stream; collisions are only counted  |
///
/// # Example
///
/// ```rust,ignore
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let mut sim = SimBuilder::new(config, plans)
///     .event_channel(tx)
///     .build()?;
/// let outcome = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config: SimConfig,
    plans:  Vec<FlightPlan>,
    events: Option<Sender<SimEvent>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, plans: Vec<FlightPlan>) -> Self {
        Self { config, plans, events: None }
    }

    /// Send a [`StepRecord`][crate::StepRecord] for every examined step and
    /// every detected collision to `tx`.
    ///
    /// The sender is owned by the collision detector and dropped when the run
    /// ends, so a consumer draining the matching receiver sees the channel
    /// close once the simulation is over.
    pub fn event_channel(mut self, tx: Sender<SimEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Validate the configuration and plans and return a ready-to-run
    /// [`Sim`].  Plans built in code get the same checks as loaded ones.
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;
        validate_plans(&self.plans, &self.config)?;

        let shared = SharedState::new(&self.plans);
        Ok(Sim {
            control: Arc::new(SimControl::new(self.config.collision_threshold)),
            shared:  Arc::new(shared),
            plans:   self.plans.into(),
            config:  self.config,
            events:  self.events,
            phase:   CoordinatorPhase::Idle,
            started: false,
        })
    }
}
