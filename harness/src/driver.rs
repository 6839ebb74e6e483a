// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Applying one case and judging the result.

use std::collections::BTreeMap;

use skipjack_runtime::{
    ClockGenerator, SignalHandle, Simulation, SimulationError, await_cycles,
    mask,
};

use crate::{
    HarnessConfig, HarnessError, Inputs, OutOfRangePolicy, ReferenceModel,
    RunResult, TestCase, cases::DisplayInputs,
};

/// The stimulus/oracle driver: writes a case's inputs, waits for the DUT to
/// settle, samples the output, and compares it against a reference model.
#[derive(Debug, Clone)]
pub struct Driver {
    inputs: BTreeMap<String, SignalHandle>,
    output: SignalHandle,
    output_mask: u64,
    out_of_range: OutOfRangePolicy,
    log: bool,
    simulation: Simulation,
}

impl Driver {
    /// Binds the configured input and output signals, checking that each is
    /// wide enough for the configured widths.
    pub fn new(
        simulation: &Simulation,
        config: &HarnessConfig,
    ) -> Result<Self, HarnessError> {
        let bind =
            |name: &str, required: u32| -> Result<SignalHandle, HarnessError> {
                let handle = simulation.signal(name)?;
                if handle.width() < required {
                    return Err(HarnessError::WidthMismatch {
                        signal: name.to_string(),
                        width: handle.width(),
                        required,
                    });
                }
                Ok(handle)
            };

        let inputs = config
            .signals
            .inputs
            .iter()
            .map(|name| Ok((name.clone(), bind(name, config.input_width)?)))
            .collect::<Result<_, HarnessError>>()?;
        let output = bind(&config.signals.output, config.output_width)?;

        Ok(Self {
            inputs,
            output,
            output_mask: mask(config.output_width),
            out_of_range: config.out_of_range,
            log: config.log,
            simulation: simulation.clone(),
        })
    }

    /// Runs `case` as case number `case_index`.
    ///
    /// All inputs are written in one simulated instant, then the driver waits
    /// `case.settle_cycles` edges before sampling. A mismatch is not an error
    /// here; it comes back as a result with `passed == false`.
    pub async fn run_case<R: ReferenceModel + ?Sized>(
        &self,
        clock: &ClockGenerator,
        reference: &R,
        case_index: usize,
        case: &TestCase,
    ) -> Result<RunResult, HarnessError> {
        if let Some(input) =
            self.inputs.keys().find(|input| !case.inputs.contains_key(*input))
        {
            return Err(HarnessError::IncompleteCase {
                case_index,
                input: input.clone(),
            });
        }

        let mut applied = Inputs::new();
        let mut writes = Vec::with_capacity(case.inputs.len());
        for (name, value) in &case.inputs {
            let handle = self.inputs.get(name).ok_or_else(|| {
                SimulationError::NoSuchSignal {
                    dut: self.simulation.dut_name(),
                    signal: name.clone(),
                }
            })?;
            let value = self.admit(handle, *value)?;
            applied.insert(name.clone(), value);
            writes.push((handle, value));
        }
        self.simulation.write_all(&writes)?;

        await_cycles(clock, case.settle_cycles).await?;

        let observed = self.output.read()? & self.output_mask;
        let expected = reference.evaluate(&applied) & self.output_mask;
        let result = RunResult {
            case_index,
            kind: case.kind,
            inputs: applied,
            observed,
            expected,
            passed: observed == expected,
        };

        if self.log {
            log::debug!(
                "Test {}: {}, {}={} (Expected: {})",
                case_index,
                DisplayInputs(&result.inputs),
                self.output.name(),
                observed,
                expected
            );
        }

        Ok(result)
    }

    fn admit(
        &self,
        handle: &SignalHandle,
        value: u64,
    ) -> Result<u64, HarnessError> {
        let signal = handle.signal();
        match self.out_of_range {
            OutOfRangePolicy::Reject => Ok(signal.check(value)?),
            OutOfRangePolicy::Mask if !signal.fits(value) => {
                let masked = value & signal.mask();
                if self.log {
                    log::warn!(
                        "Masked {} to {} to fit the {}-bit signal {}",
                        value,
                        masked,
                        signal.width(),
                        signal.name()
                    );
                }
                Ok(masked)
            }
            OutOfRangePolicy::Mask => Ok(value),
        }
    }
}
