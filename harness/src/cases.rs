// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Test cases and the seeded case generator.

use std::{collections::BTreeMap, fmt, iter::FusedIterator};

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;
use skipjack_runtime::mask;

/// Input values keyed by input signal name.
pub type Inputs = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseKind {
    /// The fixed, hand-chosen case that gates randomized testing.
    Directed,
    Random,
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseKind::Directed => "directed",
            CaseKind::Random => "random",
        }
        .fmt(f)
    }
}

/// One stimulus: values for every input, and how many clock edges to wait
/// before sampling the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCase {
    pub kind: CaseKind,
    pub inputs: Inputs,
    pub settle_cycles: u64,
}

impl TestCase {
    pub fn new<I, S>(kind: CaseKind, inputs: I, settle_cycles: u64) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            kind,
            inputs: inputs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
            settle_cycles,
        }
    }

    pub fn directed<I, S>(inputs: I, settle_cycles: u64) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self::new(CaseKind::Directed, inputs, settle_cycles)
    }

    pub fn input(&self, name: &str) -> Option<u64> {
        self.inputs.get(name).copied()
    }
}

/// Formats inputs as `a=45, b=20`.
pub(crate) struct DisplayInputs<'a>(pub(crate) &'a Inputs);

impl fmt::Display for DisplayInputs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Yields one directed case, then `count` random cases.
///
/// Every random input is drawn independently and uniformly from
/// `[0, 2^input_width - 1]`. Inputs are drawn in the order they were given, so
/// the same seed always produces the same sequence. The generator is consumed
/// as it runs; build a new one to replay.
///
/// With seed 42 and two 4-bit inputs `a` and `b`, the first ten random cases
/// are `(a, b)` = (9, 1), (13, 12), (12, 10), (12, 8), (1, 11), (3, 12), (3, 0),
/// (6, 8), (10, 5), (1, 7).
#[derive(Debug, Clone)]
pub struct CaseGenerator {
    directed: Option<TestCase>,
    inputs: Vec<String>,
    input_mask: u64,
    settle_cycles: u64,
    remaining: u64,
    seed: u64,
    rng: Pcg64,
}

impl CaseGenerator {
    /// When `seed` is `None` a fresh one is drawn from the thread RNG; either
    /// way [`CaseGenerator::seed`] reports the seed in use.
    pub fn new(
        directed: Inputs,
        inputs: Vec<String>,
        count: u64,
        input_width: u32,
        settle_cycles: u64,
        seed: Option<u64>,
    ) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().next_u64());
        Self {
            directed: Some(TestCase {
                kind: CaseKind::Directed,
                inputs: directed,
                settle_cycles,
            }),
            inputs,
            input_mask: mask(input_width),
            settle_cycles,
            remaining: count,
            seed,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn random_case(&mut self) -> TestCase {
        // masking a uniform 64-bit word is uniform over a power-of-two range
        let inputs = self
            .inputs
            .iter()
            .map(|name| (name.clone(), self.rng.next_u64() & self.input_mask))
            .collect();
        TestCase {
            kind: CaseKind::Random,
            inputs,
            settle_cycles: self.settle_cycles,
        }
    }
}

impl Iterator for CaseGenerator {
    type Item = TestCase;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(directed) = self.directed.take() {
            return Some(directed);
        }
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.random_case())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .saturating_add(usize::from(self.directed.is_some()));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CaseGenerator {}

impl FusedIterator for CaseGenerator {}
