// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! This crate implements the verification run: clocking a DUT, optionally
//! resetting it, applying a directed case and then seeded random cases, and
//! comparing every sampled output against a [`ReferenceModel`].
//!
//! ```no_run
//! # use skipjack_harness::{Harness, HarnessConfig, adder};
//! # fn dut() -> skipjack_runtime::Simulation { unimplemented!() }
//! let mut harness = Harness::new(dut(), HarnessConfig::default(), adder("a", "b"))?;
//! let report = harness.run_blocking()?;
//! println!("{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use skipjack_runtime::{ClockGenerator, SignalHandle, Simulation};
use snafu::ResultExt;

pub mod cases;
pub mod config;
pub mod driver;
pub mod error;
pub mod reference;
pub mod report;
pub mod reset;
pub mod state;

pub use cases::{CaseGenerator, CaseKind, Inputs, TestCase};
pub use config::{
    HarnessConfig, MismatchPolicy, OutOfRangePolicy, SignalNames,
};
pub use driver::Driver;
pub use error::{ConfigError, HarnessError, RunAborted};
pub use reference::{Adder, ReferenceModel, adder};
pub use report::{RunReport, RunResult};
pub use reset::{ResetPolarity, apply_reset};
pub use state::RunState;

type Observer = Box<dyn FnMut(&RunResult) + Send>;

/// One DUT, one configuration, one reference model.
pub struct Harness<R> {
    simulation: Simulation,
    config: HarnessConfig,
    reference: R,
    state: RunState,
    observer: Option<Observer>,
}

impl<R: ReferenceModel> Harness<R> {
    /// Fails if `config` is invalid on its own or `reference` reads an input
    /// it does not configure; checks that need the DUT's ports happen when the
    /// run starts.
    pub fn new(
        simulation: Simulation,
        config: HarnessConfig,
        reference: R,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        let inputs = &config.signals.inputs;
        if let Some(operand) = reference
            .operands()
            .into_iter()
            .find(|operand| !inputs.iter().any(|input| input == operand))
        {
            return Err(HarnessError::InvalidConfig {
                reason: format!(
                    "the reference model reads {operand}, which is not a configured input"
                ),
            });
        }
        Ok(Self {
            simulation,
            config,
            reference,
            state: RunState::Unstarted,
            observer: None,
        })
    }

    /// Calls `observer` with every result as soon as it is judged.
    pub fn on_result(
        mut self,
        observer: impl FnMut(&RunResult) + Send + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every case to completion, or until the first fatal error.
    ///
    /// The clock is stopped and its signal released before this returns,
    /// whichever way the run ends. Must be polled on a current-thread tokio
    /// runtime with paused time; [`Harness::run_blocking`] builds one.
    pub async fn run(&mut self) -> Result<RunReport, RunAborted> {
        self.state = RunState::Unstarted;

        let cases = CaseGenerator::new(
            self.config.directed.clone(),
            self.config.signals.inputs.clone(),
            self.config.random_case_count,
            self.config.input_width,
            self.config.settle_cycles,
            self.config.seed,
        );
        let mut report = RunReport {
            seed: cases.seed(),
            ..Default::default()
        };

        if self.config.log {
            log::info!(
                "Testing {} with {} random case(s) (seed {})",
                self.simulation.dut_name(),
                self.config.random_case_count,
                report.seed
            );
        }

        let setup = Driver::new(&self.simulation, &self.config).and_then(
            |driver| {
                let reset = self.reset_handle()?;
                let clock = ClockGenerator::start(
                    &self.simulation,
                    &self.config.clock_spec(),
                )?;
                Ok((driver, reset, clock))
            },
        );
        let (driver, reset, clock) = match setup {
            Ok(setup) => setup,
            Err(error) => return Err(self.abort(error, report)),
        };
        self.advance(RunState::ClockRunning);

        let outcome = self
            .drive(&clock, &driver, reset.as_ref(), cases, &mut report)
            .await;

        let clock_state = clock.state();
        report.edges = clock_state.edges;
        report.time_ps = clock_state.time_ps;
        clock.stop().await;

        match outcome {
            Ok(()) => {
                self.advance(RunState::Completed);
                if self.config.log {
                    log::info!(
                        "{} of {} case(s) passed",
                        report.passed_cases,
                        report.total_cases
                    );
                }
                Ok(report)
            }
            Err(error) => Err(self.abort(error, report)),
        }
    }

    /// [`Harness::run`] on a fresh current-thread runtime with paused time.
    pub fn run_blocking(&mut self) -> Result<RunReport, RunAborted> {
        self.state = RunState::Unstarted;
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .context(error::RuntimeSnafu)
        {
            Ok(runtime) => runtime,
            Err(error) => {
                return Err(self.abort(error, RunReport::default()));
            }
        };
        runtime.block_on(self.run())
    }

    async fn drive(
        &mut self,
        clock: &ClockGenerator,
        driver: &Driver,
        reset: Option<&SignalHandle>,
        mut cases: CaseGenerator,
        report: &mut RunReport,
    ) -> Result<(), HarnessError> {
        if let Some(reset) = reset {
            self.advance(RunState::Resetting);
            apply_reset(
                reset,
                clock,
                self.config.reset_polarity(),
                self.config.reset_assert_cycles,
                self.config.reset_settle_cycles,
            )
            .await?;
        }

        if let Some(directed) = cases.next() {
            self.advance(RunState::DirectedCase);
            self.judge(clock, driver, 0, &directed, report).await?;
        }

        self.advance(RunState::RandomCases);
        for (index, case) in cases.enumerate() {
            self.judge(clock, driver, index + 1, &case, report).await?;
        }
        Ok(())
    }

    async fn judge(
        &mut self,
        clock: &ClockGenerator,
        driver: &Driver,
        case_index: usize,
        case: &TestCase,
        report: &mut RunReport,
    ) -> Result<(), HarnessError> {
        let result = driver
            .run_case(clock, &self.reference, case_index, case)
            .await?;
        if let Some(observer) = &mut self.observer {
            observer(&result);
        }
        report.record(result.clone());

        if !result.passed {
            if self.config.log {
                log::warn!("Mismatch in {result}");
            }
            if self.config.mismatch_policy(result.kind) == MismatchPolicy::Abort
            {
                return Err(HarnessError::Mismatch { result });
            }
        }
        Ok(())
    }

    /// The reset signal to pulse, if this run resets at all.
    fn reset_handle(&self) -> Result<Option<SignalHandle>, HarnessError> {
        let name = self
            .config
            .signals
            .reset
            .clone()
            .or_else(|| self.simulation.reset_signal());
        if !self.config.reset_present.unwrap_or(name.is_some()) {
            return Ok(None);
        }
        let name = name.ok_or_else(|| HarnessError::MissingReset {
            dut: self.simulation.dut_name(),
        })?;
        Ok(Some(self.simulation.signal(name)?))
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition from {} to {}",
            self.state,
            next
        );
        if self.config.log {
            log::debug!("Run state: {} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn abort(&mut self, error: HarnessError, report: RunReport) -> RunAborted {
        if self.config.log {
            log::error!("Aborting run in state {}: {}", self.state, error);
        }
        self.advance(RunState::Aborted);
        RunAborted { error, report }
    }
}
