// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Golden reference models.

use crate::Inputs;

/// A pure function from a case's inputs to the expected output.
///
/// The driver masks the result to the output width, so implementations may
/// return the unbounded value.
pub trait ReferenceModel {
    fn evaluate(&self, inputs: &Inputs) -> u64;

    /// The inputs [`ReferenceModel::evaluate`] reads. A harness refuses to
    /// start unless every one of them is a configured input signal.
    fn operands(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl<F> ReferenceModel for F
where
    F: Fn(&Inputs) -> u64,
{
    fn evaluate(&self, inputs: &Inputs) -> u64 {
        self(inputs)
    }
}

/// `lhs + rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adder {
    lhs: String,
    rhs: String,
}

impl ReferenceModel for Adder {
    fn evaluate(&self, inputs: &Inputs) -> u64 {
        let operand = |name: &str| inputs.get(name).copied().unwrap_or(0);
        operand(&self.lhs).wrapping_add(operand(&self.rhs))
    }

    fn operands(&self) -> Vec<&str> {
        vec![&self.lhs, &self.rhs]
    }
}

pub fn adder(lhs: impl Into<String>, rhs: impl Into<String>) -> Adder {
    Adder {
        lhs: lhs.into(),
        rhs: rhs.into(),
    }
}
