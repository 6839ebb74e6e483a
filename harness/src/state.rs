// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// Where a run is.
///
/// ```text
/// Unstarted -> ClockRunning -> (Resetting)? -> DirectedCase -> RandomCases -> Completed
/// ```
///
/// Any non-terminal state may move to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    #[default]
    Unstarted,
    ClockRunning,
    Resetting,
    DirectedCase,
    RandomCases,
    Completed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (state, Aborted) => !state.is_terminal(),
            (Unstarted, ClockRunning)
            | (ClockRunning, Resetting | DirectedCase)
            | (Resetting, DirectedCase)
            | (DirectedCase, RandomCases)
            | (RandomCases, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Unstarted => "unstarted",
            RunState::ClockRunning => "clock running",
            RunState::Resetting => "resetting",
            RunState::DirectedCase => "directed case",
            RunState::RandomCases => "random cases",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        }
        .fmt(f)
    }
}
