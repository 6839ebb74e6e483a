// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! The boundary between the harness and a device under test.

use crate::{Signal, SimulationError};

/// A device under test, seen only through its ports.
///
/// The harness never inspects internal state. It pins inputs, calls
/// [`Dut::eval`] to let the device react, and reads outputs. Implementations
/// react to clock edges inside `eval` by comparing the clock's current level
/// against the level seen on the previous call.
///
/// [`crate::Simulation`] validates names, directions, and widths before calling
/// [`Dut::pin`] or [`Dut::read`], so implementations only need to report
/// [`SimulationError::NoSuchSignal`] for ports they do not recognize.
pub trait Dut: Send {
    /// The source-level name of the device.
    fn name(&self) -> &str;

    /// The device's interface.
    fn ports(&self) -> &[Signal];

    /// The name of the reset input, if the device has one.
    fn reset(&self) -> Option<&str> {
        None
    }

    /// Sets the input `port` to `value`. The new value takes effect on the next
    /// [`Dut::eval`].
    fn pin(&mut self, port: &str, value: u64) -> Result<(), SimulationError>;

    /// Returns the current value of `port`.
    fn read(&self, port: &str) -> Result<u64, SimulationError>;

    /// Propagates pinned inputs through the device.
    fn eval(&mut self);

    /// Looks up a declared port by name.
    fn port(&self, name: &str) -> Option<&Signal> {
        self.ports().iter().find(|signal| signal.name() == name)
    }
}
