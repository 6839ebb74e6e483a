// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Suspending until the clock has advanced.
//!
//! Waiters subscribe to the clock's published [`ClockState`] and sleep until
//! the relevant counter reaches a target fixed when the wait began. The clock
//! wakes them once per edge; there is no polling. On a current-thread runtime a
//! woken waiter always resumes before the clock's next half-period timer fires,
//! so it observes exactly the edge it asked for.

use tokio::sync::watch;

use crate::{ClockGenerator, ClockState, SimulationError};

/// Suspends until exactly `cycles` edges of `clock` have elapsed since the call,
/// then returns the clock's total edge count.
///
/// Fails with [`SimulationError::ZeroCycles`] if `cycles` is zero and with
/// [`SimulationError::ClockStopped`] if the clock dies first.
pub async fn await_cycles(
    clock: &ClockGenerator,
    cycles: u64,
) -> Result<u64, SimulationError> {
    if cycles == 0 {
        return Err(SimulationError::ZeroCycles {
            what: "clock edges",
        });
    }

    let mut state = clock.subscribe();
    let target = state.borrow_and_update().edges + cycles;
    let reached =
        wait_until(&mut state, clock.signal(), |state| state.edges >= target)
            .await?;
    Ok(reached.edges)
}

/// Like [`await_cycles`], but counts only low-to-high transitions. Returns the
/// clock's total rising-edge count.
pub async fn await_rising_edges(
    clock: &ClockGenerator,
    rising_edges: u64,
) -> Result<u64, SimulationError> {
    if rising_edges == 0 {
        return Err(SimulationError::ZeroCycles {
            what: "rising edges",
        });
    }

    let mut state = clock.subscribe();
    let target = state.borrow_and_update().rising_edges + rising_edges;
    let reached = wait_until(&mut state, clock.signal(), |state| {
        state.rising_edges >= target
    })
    .await?;
    Ok(reached.rising_edges)
}

async fn wait_until(
    state: &mut watch::Receiver<ClockState>,
    signal: &str,
    reached: impl FnMut(&ClockState) -> bool,
) -> Result<ClockState, SimulationError> {
    let current = state.wait_for(reached).await.map_err(|_| {
        SimulationError::ClockStopped {
            signal: signal.to_string(),
        }
    })?;
    Ok(*current)
}
