// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use skipjack_runtime::{
    ClockGenerator, SignalHandle, SimulationError, await_cycles,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResetPolarity {
    /// Reset is asserted by driving `1`.
    #[default]
    ActiveHigh,
    /// Reset is asserted by driving `0`.
    ActiveLow,
}

impl ResetPolarity {
    pub fn asserted(self) -> u64 {
        match self {
            ResetPolarity::ActiveHigh => 1,
            ResetPolarity::ActiveLow => 0,
        }
    }

    pub fn released(self) -> u64 {
        1 - self.asserted()
    }
}

/// Holds `reset` asserted for `assert_cycles` edges of `clock`, releases it,
/// then waits `release_settle_cycles` more edges.
///
/// Both counts must be at least one.
pub async fn apply_reset(
    reset: &SignalHandle,
    clock: &ClockGenerator,
    polarity: ResetPolarity,
    assert_cycles: u64,
    release_settle_cycles: u64,
) -> Result<(), SimulationError> {
    if assert_cycles == 0 || release_settle_cycles == 0 {
        return Err(SimulationError::ZeroCycles {
            what: "reset cycles",
        });
    }

    reset.write(polarity.asserted())?;
    await_cycles(clock, assert_cycles).await?;
    reset.write(polarity.released())?;
    await_cycles(clock, release_settle_cycles).await?;
    Ok(())
}
