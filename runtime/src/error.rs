// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use snafu::Snafu;

use crate::{PortDirection, TimeUnit};

/// The coarse category of a failure, which decides how a run reacts to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A bad cycle count, width, period, or out-of-range value. Never retried.
    InvalidArgument,
    /// An observed output differed from the reference.
    ComparisonMismatch,
    /// Access to an undeclared or wrong-direction signal, or a dead clock.
    SimulationFault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::ComparisonMismatch => "comparison mismatch",
            ErrorKind::SimulationFault => "simulation fault",
        }
        .fmt(f)
    }
}

/// Runtime signal, clock, and wait errors.
#[derive(Debug, Snafu)]
pub enum SimulationError {
    #[snafu(display(
        "Cannot wait for zero {what}: the count must be at least one"
    ))]
    ZeroCycles { what: &'static str },
    #[snafu(display(
        "Value {value} does not fit in the {width}-bit signal {signal}"
    ))]
    ValueOutOfRange {
        signal: String,
        value: u64,
        width: u32,
    },
    #[snafu(display(
        "Signal {signal} was declared with width {width}, but widths must be between 1 and 64 bits"
    ))]
    InvalidWidth { signal: String, width: u32 },
    #[snafu(display(
        "Clock period {period}{unit} is not a positive, even number of picoseconds"
    ))]
    InvalidPeriod { period: u64, unit: TimeUnit },
    #[snafu(display("Unknown time unit `{unit}`"))]
    UnknownTimeUnit { unit: String },
    #[snafu(display("Signal {signal} already has a running clock generator"))]
    ClockAlreadyRunning { signal: String },
    #[snafu(display("Signal {signal} is not declared on DUT {dut}"))]
    NoSuchSignal { dut: String, signal: String },
    #[snafu(display(
        "Signal {signal} on DUT {dut} is an {direction} port, but was used as an {attempted_direction} port"
    ))]
    InvalidDirection {
        dut: String,
        signal: String,
        direction: PortDirection,
        attempted_direction: PortDirection,
    },
    #[snafu(display(
        "Signal {signal} is driven by a clock generator and cannot be written directly"
    ))]
    ClockOwned { signal: String },
    #[snafu(display(
        "The clock generator for {signal} stopped while a wait was pending"
    ))]
    ClockStopped { signal: String },
}

impl SimulationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroCycles { .. }
            | Self::ValueOutOfRange { .. }
            | Self::InvalidWidth { .. }
            | Self::InvalidPeriod { .. }
            | Self::UnknownTimeUnit { .. }
            | Self::ClockAlreadyRunning { .. } => ErrorKind::InvalidArgument,
            Self::NoSuchSignal { .. }
            | Self::InvalidDirection { .. }
            | Self::ClockOwned { .. }
            | Self::ClockStopped { .. } => ErrorKind::SimulationFault,
        }
    }
}
