// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{fmt, str::FromStr, time::Duration};

use crate::SimulationError;

/// Units accepted for clock periods. Simulated time is kept in picoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    Ps,
    Ns,
    #[default]
    Us,
    Ms,
    S,
}

impl TimeUnit {
    pub fn picoseconds(self) -> u64 {
        match self {
            TimeUnit::Ps => 1,
            TimeUnit::Ns => 1_000,
            TimeUnit::Us => 1_000_000,
            TimeUnit::Ms => 1_000_000_000,
            TimeUnit::S => 1_000_000_000_000,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
        .fmt(f)
    }
}

impl FromStr for TimeUnit {
    type Err = SimulationError;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        match unit {
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" | "sec" => Ok(TimeUnit::S),
            other => Err(SimulationError::UnknownTimeUnit {
                unit: other.to_string(),
            }),
        }
    }
}

/// Describes a free-running clock on one signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClockSpec {
    signal: String,
    period: u64,
    unit: TimeUnit,
}

impl ClockSpec {
    pub fn new(signal: impl Into<String>, period: u64, unit: TimeUnit) -> Self {
        Self {
            signal: signal.into(),
            period,
            unit,
        }
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// The full period in picoseconds. Must be positive and even so that both
    /// half periods are whole picoseconds.
    pub fn period_ps(&self) -> Result<u64, SimulationError> {
        match self.period.checked_mul(self.unit.picoseconds()) {
            Some(period_ps) if period_ps > 0 && period_ps % 2 == 0 => {
                Ok(period_ps)
            }
            _ => Err(SimulationError::InvalidPeriod {
                period: self.period,
                unit: self.unit,
            }),
        }
    }

    pub fn half_period_ps(&self) -> Result<u64, SimulationError> {
        Ok(self.period_ps()? / 2)
    }
}

impl fmt::Display for ClockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}{}", self.signal, self.period, self.unit)
    }
}

/// Maps simulated picoseconds onto tokio's virtual clock. The timer wheel has
/// millisecond resolution, so one simulated picosecond is one virtual
/// millisecond; with paused time this costs nothing in wall-clock terms.
pub(crate) fn virtual_duration(picoseconds: u64) -> Duration {
    Duration::from_millis(picoseconds)
}
