// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Dut, PortDirection, Signal, SimulationError};

struct SimulationInner {
    dut: Box<dyn Dut>,
    /// Signals currently driven by a [`crate::ClockGenerator`].
    clocked: HashSet<String>,
}

/// Shared ownership of a DUT.
///
/// Cloning a `Simulation` is cheap and yields another reference to the same
/// device. The lock is only ever held for the duration of a single pin, read,
/// or evaluation and never across a suspension point.
#[derive(Clone)]
pub struct Simulation {
    inner: Arc<Mutex<SimulationInner>>,
}

impl Simulation {
    pub fn new(dut: impl Dut + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimulationInner {
                dut: Box::new(dut),
                clocked: HashSet::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulationInner> {
        self.inner.lock().expect("poisoned")
    }

    /// The name of the simulated DUT.
    pub fn dut_name(&self) -> String {
        self.lock().dut.name().to_string()
    }

    /// The DUT's declared ports.
    pub fn ports(&self) -> Vec<Signal> {
        self.lock().dut.ports().to_vec()
    }

    /// The reset input the DUT declares, if any.
    pub fn reset_signal(&self) -> Option<String> {
        self.lock().dut.reset().map(str::to_string)
    }

    /// Binds a handle to the declared signal `name`.
    pub fn signal(
        &self,
        name: impl AsRef<str>,
    ) -> Result<SignalHandle, SimulationError> {
        let name = name.as_ref();
        let inner = self.lock();
        let signal = inner.dut.port(name).cloned().ok_or_else(|| {
            SimulationError::NoSuchSignal {
                dut: inner.dut.name().to_string(),
                signal: name.to_string(),
            }
        })?;
        Ok(SignalHandle {
            signal,
            simulation: self.clone(),
        })
    }

    /// Writes every `(handle, value)` pair in the same simulated instant: all
    /// writes are validated before any is applied, and the DUT is evaluated
    /// once afterwards.
    pub fn write_all(
        &self,
        writes: &[(&SignalHandle, u64)],
    ) -> Result<(), SimulationError> {
        let mut inner = self.lock();
        for (handle, value) in writes {
            inner.check_write(&handle.signal, *value)?;
        }
        for (handle, value) in writes {
            inner.dut.pin(handle.name(), *value)?;
        }
        inner.dut.eval();
        Ok(())
    }

    pub(crate) fn claim_clock(
        &self,
        signal: &Signal,
    ) -> Result<(), SimulationError> {
        let mut inner = self.lock();
        if !signal.direction().is_writable() {
            return Err(SimulationError::InvalidDirection {
                dut: inner.dut.name().to_string(),
                signal: signal.name().to_string(),
                direction: signal.direction(),
                attempted_direction: PortDirection::Input,
            });
        }
        if !inner.clocked.insert(signal.name().to_string()) {
            return Err(SimulationError::ClockAlreadyRunning {
                signal: signal.name().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn release_clock(&self, signal: &str) {
        self.lock().clocked.remove(signal);
    }

    /// Drives a claimed clock signal to `level` and lets the DUT react.
    pub(crate) fn drive_clock(
        &self,
        signal: &str,
        level: bool,
    ) -> Result<(), SimulationError> {
        let mut inner = self.lock();
        inner.dut.pin(signal, u64::from(level))?;
        inner.dut.eval();
        Ok(())
    }
}

impl SimulationInner {
    fn check_write(
        &self,
        signal: &Signal,
        value: u64,
    ) -> Result<(), SimulationError> {
        if !signal.direction().is_writable() {
            return Err(SimulationError::InvalidDirection {
                dut: self.dut.name().to_string(),
                signal: signal.name().to_string(),
                direction: signal.direction(),
                attempted_direction: PortDirection::Input,
            });
        }
        if self.clocked.contains(signal.name()) {
            return Err(SimulationError::ClockOwned {
                signal: signal.name().to_string(),
            });
        }
        signal.check(value)?;
        Ok(())
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Simulation")
            .field("dut", &inner.dut.name())
            .field("clocked", &inner.clocked)
            .finish()
    }
}

/// Read/write access to one declared signal of a [`Simulation`].
#[derive(Clone, Debug)]
pub struct SignalHandle {
    signal: Signal,
    simulation: Simulation,
}

impl SignalHandle {
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn name(&self) -> &str {
        self.signal.name()
    }

    pub fn width(&self) -> u32 {
        self.signal.width()
    }

    /// Drives the signal to `value` and evaluates the DUT. Fails if the signal
    /// is an output, is owned by a clock generator, or `value` does not fit.
    pub fn write(&self, value: u64) -> Result<(), SimulationError> {
        self.simulation.write_all(&[(self, value)])
    }

    /// Samples the signal's current value.
    pub fn read(&self) -> Result<u64, SimulationError> {
        let inner = self.simulation.lock();
        if !self.signal.direction().is_readable() {
            return Err(SimulationError::InvalidDirection {
                dut: inner.dut.name().to_string(),
                signal: self.signal.name().to_string(),
                direction: self.signal.direction(),
                attempted_direction: PortDirection::Output,
            });
        }
        Ok(inner.dut.read(self.signal.name())? & self.signal.mask())
    }
}
