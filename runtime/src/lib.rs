// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! This crate implements the cycle-synchronization runtime for driving a
//! simulated device under test (DUT).
//!
//! A [`Simulation`] owns a [`Dut`] and hands out [`SignalHandle`]s that
//! validate every read and write against the DUT's declared ports. A
//! [`ClockGenerator`] toggles a clock signal from a background task, and
//! [`await_cycles`] suspends the caller until a number of clock edges have
//! elapsed.
//!
//! Everything here expects to run on a current-thread tokio runtime with paused
//! time. See `Harness::run_blocking` in `skipjack-harness` for one that is set
//! up correctly.

use std::fmt;

pub mod clock;
pub mod dut;
pub mod error;
pub mod simulation;
pub mod time;
pub mod waiter;

pub use clock::{ClockGenerator, ClockState};
pub use dut::Dut;
pub use error::{ErrorKind, SimulationError};
pub use simulation::{SignalHandle, Simulation};
pub use time::{ClockSpec, TimeUnit};
pub use waiter::{await_cycles, await_rising_edges};

/// The widest signal a DUT may declare.
pub const MAX_SIGNAL_WIDTH: u32 = 64;

/// <https://www.digikey.com/en/maker/blogs/2024/verilog-ports-part-7-of-our-verilog-journey>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    /// Whether the harness may drive this port.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Input | Self::Inout)
    }

    /// Whether the harness may sample this port.
    pub fn is_readable(self) -> bool {
        matches!(self, Self::Output | Self::Inout)
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
            PortDirection::Inout => "inout",
        }
        .fmt(f)
    }
}

/// Returns a mask with the low `width` bits set.
pub fn mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

/// A named wire or bus on a DUT. The width is fixed for the lifetime of the
/// DUT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signal {
    name: String,
    width: u32,
    direction: PortDirection,
}

impl Signal {
    /// Declares a signal `width` bits wide. Widths must lie in `1..=64`.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        direction: PortDirection,
    ) -> Result<Self, SimulationError> {
        let name = name.into();
        if width == 0 || width > MAX_SIGNAL_WIDTH {
            return Err(SimulationError::InvalidWidth {
                signal: name,
                width,
            });
        }
        Ok(Self {
            name,
            width,
            direction,
        })
    }

    pub fn input(
        name: impl Into<String>,
        width: u32,
    ) -> Result<Self, SimulationError> {
        Self::new(name, width, PortDirection::Input)
    }

    pub fn output(
        name: impl Into<String>,
        width: u32,
    ) -> Result<Self, SimulationError> {
        Self::new(name, width, PortDirection::Output)
    }

    pub fn inout(
        name: impl Into<String>,
        width: u32,
    ) -> Result<Self, SimulationError> {
        Self::new(name, width, PortDirection::Inout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// The largest value this signal can hold.
    pub fn mask(&self) -> u64 {
        mask(self.width)
    }

    /// Whether `value` is representable in this signal's width.
    pub fn fits(&self, value: u64) -> bool {
        value & !self.mask() == 0
    }

    /// Returns `value` unchanged if it fits, otherwise fails with
    /// [`SimulationError::ValueOutOfRange`].
    pub fn check(&self, value: u64) -> Result<u64, SimulationError> {
        if self.fits(value) {
            Ok(value)
        } else {
            Err(SimulationError::ValueOutOfRange {
                signal: self.name.clone(),
                value,
                width: self.width,
            })
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}[{}:0]", self.direction, self.name, self.width - 1)
    }
}
