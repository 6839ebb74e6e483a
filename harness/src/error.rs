// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use camino::Utf8PathBuf;
use skipjack_runtime::{ErrorKind, SimulationError};
use snafu::Snafu;

use crate::{RunReport, RunResult};

/// Anything that stops a run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HarnessError {
    #[snafu(display("Simulation operation failed"), context(false))]
    Simulation { source: SimulationError },
    #[snafu(display(
        "{} case {} failed: expected {}, observed {}",
        result.kind,
        result.case_index,
        result.expected,
        result.observed
    ))]
    Mismatch { result: RunResult },
    #[snafu(display("Invalid harness configuration: {reason}"))]
    InvalidConfig { reason: String },
    #[snafu(display(
        "Signal {signal} is {width} bits wide, but the configuration needs {required} bits"
    ))]
    WidthMismatch {
        signal: String,
        width: u32,
        required: u32,
    },
    #[snafu(display("Case {case_index} does not drive input {input}"))]
    IncompleteCase { case_index: usize, input: String },
    #[snafu(display(
        "The configuration requires a reset, but DUT {dut} declares no reset signal"
    ))]
    MissingReset { dut: String },
    #[snafu(display("Failed to build the simulation runtime"))]
    Runtime { source: std::io::Error },
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Simulation { source } => source.kind(),
            Self::Mismatch { .. } => ErrorKind::ComparisonMismatch,
            Self::InvalidConfig { .. }
            | Self::WidthMismatch { .. }
            | Self::IncompleteCase { .. } => ErrorKind::InvalidArgument,
            Self::MissingReset { .. } | Self::Runtime { .. } => {
                ErrorKind::SimulationFault
            }
        }
    }
}

/// A run that ended early. Carries the first fatal error and whatever had been
/// recorded before it.
#[derive(Debug, Snafu)]
#[snafu(display(
    "Run aborted after {} case(s) ({})",
    report.total_cases,
    error.kind()
))]
pub struct RunAborted {
    #[snafu(source)]
    pub error: HarnessError,
    pub report: RunReport,
}

impl RunAborted {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// An aborted run never passes.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Failure to load a [`crate::HarnessConfig`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Failed to read configuration file {path}"))]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse configuration as TOML"))]
    Parse { source: toml::de::Error },
    #[snafu(display("Unknown configuration key `{key}`"))]
    UnknownKey { key: String },
    #[snafu(display("Configuration key `{key}` must be {expected}"))]
    WrongType { key: String, expected: &'static str },
    #[snafu(display("Configuration key `{key}` is invalid: {reason}"))]
    InvalidValue { key: String, reason: String },
}
