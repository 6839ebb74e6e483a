// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! The free-running clock.

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{ClockSpec, Simulation, SimulationError, time::virtual_duration};

/// What the clock has done so far. Published once per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClockState {
    /// Transitions in either direction since the clock started.
    pub edges: u64,
    /// Low-to-high transitions since the clock started.
    pub rising_edges: u64,
    /// The level the clock is currently driven to.
    pub level: bool,
    /// Simulated time of the most recent edge, in picoseconds.
    pub time_ps: u64,
}

/// Owns a background task that toggles one signal forever: low for half a
/// period, then high for half a period.
///
/// The generator is the only writer of its signal; any other write to it fails
/// with [`SimulationError::ClockOwned`]. The task runs until [`stop`] is
/// awaited or the generator is dropped, at which point it is aborted and the
/// signal is released.
///
/// [`stop`]: ClockGenerator::stop
pub struct ClockGenerator {
    signal: String,
    half_period_ps: u64,
    state: watch::Receiver<ClockState>,
    task: Option<JoinHandle<()>>,
    simulation: Simulation,
}

impl ClockGenerator {
    /// Drives `spec.signal()` low and spawns the toggling task.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        simulation: &Simulation,
        spec: &ClockSpec,
    ) -> Result<Self, SimulationError> {
        let half_period_ps = spec.half_period_ps()?;
        let handle = simulation.signal(spec.signal())?;
        simulation.claim_clock(handle.signal())?;
        if let Err(error) = simulation.drive_clock(spec.signal(), false) {
            simulation.release_clock(spec.signal());
            return Err(error);
        }

        let (sender, state) = watch::channel(ClockState::default());
        let task = tokio::spawn(toggle_forever(
            simulation.clone(),
            spec.signal().to_string(),
            half_period_ps,
            sender,
        ));

        log::debug!("Started clock {spec}");

        Ok(Self {
            signal: spec.signal().to_string(),
            half_period_ps,
            state,
            task: Some(task),
            simulation: simulation.clone(),
        })
    }

    /// The name of the clocked signal.
    pub fn signal(&self) -> &str {
        &self.signal
    }

    pub fn half_period_ps(&self) -> u64 {
        self.half_period_ps
    }

    /// A snapshot of the clock's progress.
    pub fn state(&self) -> ClockState {
        *self.state.borrow()
    }

    /// Total edges so far.
    pub fn edges(&self) -> u64 {
        self.state.borrow().edges
    }

    /// A fresh receiver for the clock's published state, used by waiters.
    pub fn subscribe(&self) -> watch::Receiver<ClockState> {
        self.state.clone()
    }

    /// Whether the toggling task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Aborts the toggling task, waits for it to unwind, and releases the
    /// signal.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // the only possible error is the cancellation we just requested
            let _ = task.await;
        }
        self.simulation.release_clock(&self.signal);
        log::debug!(
            "Stopped clock {} after {} edges",
            self.signal,
            self.edges()
        );
    }
}

impl Drop for ClockGenerator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.simulation.release_clock(&self.signal);
    }
}

async fn toggle_forever(
    simulation: Simulation,
    signal: String,
    half_period_ps: u64,
    sender: watch::Sender<ClockState>,
) {
    let half_period = virtual_duration(half_period_ps);
    let mut ticks = time::interval_at(Instant::now() + half_period, half_period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        ticks.tick().await;

        let level = !sender.borrow().level;
        if let Err(error) = simulation.drive_clock(&signal, level) {
            log::error!("Clock generator for {signal} stopped: {error}");
            return;
        }

        sender.send_modify(|state| {
            state.edges += 1;
            if level {
                state.rising_edges += 1;
            }
            state.level = level;
            state.time_ps += half_period_ps;
        });
    }
}
