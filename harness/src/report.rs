// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use crate::{CaseKind, Inputs, cases::DisplayInputs};

/// The outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunResult {
    pub case_index: usize,
    pub kind: CaseKind,
    pub inputs: Inputs,
    pub observed: u64,
    pub expected: u64,
    pub passed: bool,
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "case {} ({}): {}, observed={} (expected {})",
            self.case_index,
            self.kind,
            DisplayInputs(&self.inputs),
            self.observed,
            self.expected
        )
    }
}

/// Everything a run produced. Owned by the caller once the run returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub total_cases: usize,
    pub passed_cases: usize,
    /// Failing cases, in the order they ran.
    pub failures: Vec<RunResult>,
    /// The seed the random cases were drawn from; pass it back to replay.
    pub seed: u64,
    /// Clock edges elapsed over the whole run, reset included.
    pub edges: u64,
    /// Simulated time at the end of the run, in picoseconds.
    pub time_ps: u64,
}

impl RunReport {
    pub(crate) fn record(&mut self, result: RunResult) {
        self.total_cases += 1;
        if result.passed {
            self.passed_cases += 1;
        } else {
            self.failures.push(result);
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `0` when every case passed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} case(s) passed (seed {}, {} edges, {} ps)",
            self.passed_cases,
            self.total_cases,
            self.seed,
            self.edges,
            self.time_ps
        )?;
        for failure in &self.failures {
            writeln!(f, "  FAILED {failure}")?;
        }
        Ok(())
    }
}
