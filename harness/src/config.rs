// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Harness configuration and its TOML form.
//!
//! Every key is optional; missing keys keep the [`Default`] value. A complete
//! file looks like:
//!
//! ```toml
//! clock_period = 10
//! clock_unit = "us"
//! input_width = 8
//! output_width = 8
//! settle_cycles = 10
//! reset_present = false
//! reset_active_low = false
//! reset_assert_cycles = 5
//! reset_settle_cycles = 5
//! random_case_count = 1000
//! seed = 42
//! directed_mismatch = "abort"
//! random_mismatch = "record"
//! out_of_range = "reject"
//! log = true
//!
//! [signals]
//! clock = "clk"
//! inputs = ["a", "b"]
//! output = "sum"
//! reset = "rst"
//!
//! [directed]
//! a = 45
//! b = 20
//! ```

use std::{collections::BTreeSet, fmt, fs};

use camino::Utf8Path;
use skipjack_runtime::{ClockSpec, MAX_SIGNAL_WIDTH, TimeUnit, mask};
use snafu::{OptionExt, ResultExt};

use crate::{
    CaseKind, ConfigError, HarnessError, Inputs, ResetPolarity,
    error::{ParseSnafu, ReadSnafu, UnknownKeySnafu, WrongTypeSnafu},
};

/// What to do when an observed output differs from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchPolicy {
    /// End the run immediately with the mismatch as its error.
    Abort,
    /// Record a failing result and keep going.
    Record,
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchPolicy::Abort => "abort",
            MismatchPolicy::Record => "record",
        }
        .fmt(f)
    }
}

/// What to do with a stimulus value wider than its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutOfRangePolicy {
    /// Fail the run with an invalid-argument error.
    #[default]
    Reject,
    /// Keep the low bits and log a warning.
    Mask,
}

impl fmt::Display for OutOfRangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfRangePolicy::Reject => "reject",
            OutOfRangePolicy::Mask => "mask",
        }
        .fmt(f)
    }
}

/// Which DUT signals play which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalNames {
    pub clock: String,
    /// Random inputs are drawn in this order.
    pub inputs: Vec<String>,
    pub output: String,
    /// Overrides the reset signal the DUT declares.
    pub reset: Option<String>,
}

impl Default for SignalNames {
    fn default() -> Self {
        Self {
            clock: "clk".into(),
            inputs: vec!["a".into(), "b".into()],
            output: "sum".into(),
            reset: None,
        }
    }
}

/// Options for a [`crate::Harness`] run. Usually, you can start from
/// [`HarnessConfig::default()`] and override a few fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub clock_period: u64,
    pub clock_unit: TimeUnit,
    /// Random input values are drawn from `[0, 2^input_width - 1]`.
    pub input_width: u32,
    /// Expected and observed values are compared modulo `2^output_width`.
    pub output_width: u32,
    /// Clock edges between applying a case and sampling the output. Must
    /// exceed the DUT's latency.
    pub settle_cycles: u64,
    /// `Some(true)` requires a reset, `Some(false)` skips it, and `None` resets
    /// exactly when the DUT declares a reset signal.
    pub reset_present: Option<bool>,
    pub reset_active_low: bool,
    pub reset_assert_cycles: u64,
    pub reset_settle_cycles: u64,
    pub random_case_count: u64,
    /// `None` draws a fresh seed, reported in the [`crate::RunReport`].
    pub seed: Option<u64>,
    pub directed_mismatch: MismatchPolicy,
    pub random_mismatch: MismatchPolicy,
    pub out_of_range: OutOfRangePolicy,
    pub signals: SignalNames,
    /// Values for the directed case, one per input.
    pub directed: Inputs,
    /// Whether to use the log crate.
    pub log: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clock_period: 10,
            clock_unit: TimeUnit::Us,
            input_width: 8,
            output_width: 8,
            settle_cycles: 10,
            reset_present: None,
            reset_active_low: false,
            reset_assert_cycles: 5,
            reset_settle_cycles: 5,
            random_case_count: 1000,
            seed: None,
            directed_mismatch: MismatchPolicy::Abort,
            random_mismatch: MismatchPolicy::Record,
            out_of_range: OutOfRangePolicy::Reject,
            signals: SignalNames::default(),
            directed: Inputs::from([("a".into(), 45), ("b".into(), 20)]),
            log: false,
        }
    }
}

impl HarnessConfig {
    /// The same as the [`Default`] implementation except that the log crate is
    /// used.
    pub fn default_logging() -> Self {
        Self {
            log: true,
            ..Default::default()
        }
    }

    pub fn clock_spec(&self) -> ClockSpec {
        ClockSpec::new(
            self.signals.clock.clone(),
            self.clock_period,
            self.clock_unit,
        )
    }

    pub fn reset_polarity(&self) -> ResetPolarity {
        if self.reset_active_low {
            ResetPolarity::ActiveLow
        } else {
            ResetPolarity::ActiveHigh
        }
    }

    pub fn mismatch_policy(&self, kind: CaseKind) -> MismatchPolicy {
        match kind {
            CaseKind::Directed => self.directed_mismatch,
            CaseKind::Random => self.random_mismatch,
        }
    }

    /// Checks everything that can be checked without a DUT.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let invalid = |reason: String| HarnessError::InvalidConfig { reason };

        for (key, width) in [
            ("input_width", self.input_width),
            ("output_width", self.output_width),
        ] {
            if width == 0 || width > MAX_SIGNAL_WIDTH {
                return Err(invalid(format!(
                    "{key} is {width}, but must be between 1 and {MAX_SIGNAL_WIDTH}"
                )));
            }
        }
        for (key, cycles) in [
            ("settle_cycles", self.settle_cycles),
            ("reset_assert_cycles", self.reset_assert_cycles),
            ("reset_settle_cycles", self.reset_settle_cycles),
        ] {
            if cycles == 0 {
                return Err(invalid(format!("{key} must be at least 1")));
            }
        }
        self.clock_spec().period_ps()?;

        if self.signals.inputs.is_empty() {
            return Err(invalid("no input signals are configured".into()));
        }
        let inputs = self
            .signals
            .inputs
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();
        if inputs.len() != self.signals.inputs.len() {
            return Err(invalid("input signals are listed twice".into()));
        }
        if let Some(input) =
            inputs.iter().find(|input| !self.directed.contains_key(**input))
        {
            return Err(invalid(format!(
                "the directed case does not set input {input}"
            )));
        }
        if let Some(input) = self
            .directed
            .keys()
            .find(|input| !inputs.contains(input.as_str()))
        {
            return Err(invalid(format!(
                "the directed case sets {input}, which is not a configured input"
            )));
        }
        if self.out_of_range == OutOfRangePolicy::Reject {
            let max = mask(self.input_width);
            if let Some((input, value)) =
                self.directed.iter().find(|(_, value)| **value > max)
            {
                return Err(invalid(format!(
                    "the directed case sets {input} to {value}, which does not fit in {} bits",
                    self.input_width
                )));
            }
        }
        Ok(())
    }

    /// Reads a configuration file.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).context(ReadSnafu { path })?;
        Self::from_toml_str(&contents)
    }

    /// Parses the TOML form documented at the top of this module.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table = contents.parse::<toml::Table>().context(ParseSnafu)?;

        let mut config = Self::default();
        for (key, value) in &table {
            match key.as_str() {
                "clock_period" => config.clock_period = integer(key, value)?,
                "clock_unit" => {
                    config.clock_unit = string(key, value)?
                        .parse::<TimeUnit>()
                        .map_err(|error| invalid_value(key, error.to_string()))?;
                }
                "input_width" => config.input_width = width(key, value)?,
                "output_width" => config.output_width = width(key, value)?,
                "settle_cycles" => config.settle_cycles = integer(key, value)?,
                "reset_present" => {
                    config.reset_present = Some(boolean(key, value)?);
                }
                "reset_active_low" => {
                    config.reset_active_low = boolean(key, value)?;
                }
                "reset_assert_cycles" => {
                    config.reset_assert_cycles = integer(key, value)?;
                }
                "reset_settle_cycles" => {
                    config.reset_settle_cycles = integer(key, value)?;
                }
                "random_case_count" => {
                    config.random_case_count = integer(key, value)?;
                }
                "seed" => config.seed = Some(integer(key, value)?),
                "directed_mismatch" => {
                    config.directed_mismatch = mismatch_policy(key, value)?;
                }
                "random_mismatch" => {
                    config.random_mismatch = mismatch_policy(key, value)?;
                }
                "out_of_range" => {
                    config.out_of_range = match string(key, value)? {
                        "reject" => OutOfRangePolicy::Reject,
                        "mask" => OutOfRangePolicy::Mask,
                        other => {
                            return Err(invalid_value(
                                key,
                                format!(
                                    "`{other}` is neither `reject` nor `mask`"
                                ),
                            ));
                        }
                    };
                }
                "log" => config.log = boolean(key, value)?,
                "signals" => config.signals = signal_names(value)?,
                "directed" => config.directed = directed(value)?,
                _ => return UnknownKeySnafu { key }.fail(),
            }
        }

        Ok(config)
    }
}

fn invalid_value(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}

fn integer(key: &str, value: &toml::Value) -> Result<u64, ConfigError> {
    let integer = value.as_integer().context(WrongTypeSnafu {
        key,
        expected: "an integer",
    })?;
    u64::try_from(integer)
        .map_err(|_| invalid_value(key, format!("{integer} is negative")))
}

fn width(key: &str, value: &toml::Value) -> Result<u32, ConfigError> {
    let width = integer(key, value)?;
    u32::try_from(width)
        .map_err(|_| invalid_value(key, format!("{width} bits is too wide")))
}

fn boolean(key: &str, value: &toml::Value) -> Result<bool, ConfigError> {
    value.as_bool().context(WrongTypeSnafu {
        key,
        expected: "a boolean",
    })
}

fn string<'a>(
    key: &str,
    value: &'a toml::Value,
) -> Result<&'a str, ConfigError> {
    value.as_str().context(WrongTypeSnafu {
        key,
        expected: "a string",
    })
}

fn mismatch_policy(
    key: &str,
    value: &toml::Value,
) -> Result<MismatchPolicy, ConfigError> {
    match string(key, value)? {
        "abort" => Ok(MismatchPolicy::Abort),
        "record" => Ok(MismatchPolicy::Record),
        other => Err(invalid_value(
            key,
            format!("`{other}` is neither `abort` nor `record`"),
        )),
    }
}

fn signal_names(value: &toml::Value) -> Result<SignalNames, ConfigError> {
    let table = value.as_table().context(WrongTypeSnafu {
        key: "signals",
        expected: "a table",
    })?;

    let mut names = SignalNames::default();
    for (name, value) in table {
        let key = format!("signals.{name}");
        match name.as_str() {
            "clock" => names.clock = string(&key, value)?.to_string(),
            "output" => names.output = string(&key, value)?.to_string(),
            "reset" => names.reset = Some(string(&key, value)?.to_string()),
            "inputs" => {
                let inputs = value.as_array().context(WrongTypeSnafu {
                    key: key.as_str(),
                    expected: "an array of strings",
                })?;
                names.inputs = inputs
                    .iter()
                    .map(|input| string(&key, input).map(str::to_string))
                    .collect::<Result<_, _>>()?;
            }
            _ => return UnknownKeySnafu { key }.fail(),
        }
    }
    Ok(names)
}

fn directed(value: &toml::Value) -> Result<Inputs, ConfigError> {
    let table = value.as_table().context(WrongTypeSnafu {
        key: "directed",
        expected: "a table",
    })?;
    table
        .iter()
        .map(|(name, value)| -> Result<(String, u64), ConfigError> {
            Ok((name.clone(), integer(&format!("directed.{name}"), value)?))
        })
        .collect()
}
