// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! A clocked adder with the port list of the carry-skip adder under test:
//! `clk`, `a`, `b`, `sum`, and optionally a reset input.

use std::collections::VecDeque;

use skipjack_runtime::{Dut, Signal, SimulationError, mask};

/// A deliberate defect, for exercising the harness's failure paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Output bit `bit` always reads as `value`.
    StuckAt { bit: u32, value: bool },
}

impl Fault {
    fn apply(self, sum: u64) -> u64 {
        match self {
            Fault::StuckAt { bit, value: true } => sum | (1 << bit),
            Fault::StuckAt { bit, value: false } => sum & !(1 << bit),
        }
    }
}

/// Configures an [`AdderModel`].
#[derive(Debug, Clone)]
pub struct AdderBuilder {
    name: String,
    width: u32,
    output_width: Option<u32>,
    latency: usize,
    reset: Option<(String, bool)>,
    fault: Option<Fault>,
}

impl AdderBuilder {
    /// The source-level module name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Width of `sum`. Defaults to the operand width, so the carry out is
    /// dropped.
    pub fn output_width(mut self, output_width: u32) -> Self {
        self.output_width = Some(output_width);
        self
    }

    /// Rising edges between sampling `a`/`b` and the result appearing on
    /// `sum`. Zero makes the adder purely combinational.
    pub fn latency(mut self, latency: usize) -> Self {
        self.latency = latency;
        self
    }

    /// Adds an active-high reset input named `name`.
    pub fn reset(mut self, name: impl Into<String>) -> Self {
        self.reset = Some((name.into(), false));
        self
    }

    /// Adds an active-low reset input named `name`.
    pub fn reset_n(mut self, name: impl Into<String>) -> Self {
        self.reset = Some((name.into(), true));
        self
    }

    pub fn fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn build(self) -> Result<AdderModel, SimulationError> {
        let output_width = self.output_width.unwrap_or(self.width);
        let mut ports = vec![
            Signal::input("clk", 1)?,
            Signal::input("a", self.width)?,
            Signal::input("b", self.width)?,
            Signal::output("sum", output_width)?,
        ];
        if let Some((reset, _)) = &self.reset {
            ports.push(Signal::input(reset.clone(), 1)?);
        }
        match self.fault {
            // the stuck bit index must address a bit of `sum`
            Some(Fault::StuckAt { bit, .. }) if bit >= output_width => {
                return Err(SimulationError::ValueOutOfRange {
                    signal: "sum".into(),
                    value: u64::from(bit),
                    width: output_width,
                });
            }
            _ => {}
        }

        // an active-low reset idles high, so the model starts out of reset
        let reset_level = self
            .reset
            .as_ref()
            .is_some_and(|(_, active_low)| *active_low);

        Ok(AdderModel {
            name: self.name,
            ports,
            output_mask: mask(output_width),
            latency: self.latency,
            reset: self.reset,
            fault: self.fault,
            a: 0,
            b: 0,
            clk: false,
            previous_clk: false,
            reset_level,
            pipeline: VecDeque::from(vec![0; self.latency.saturating_sub(1)]),
            sum: 0,
        })
    }
}

/// A behavioral model of an adder whose result is registered on the rising
/// edge of `clk`.
///
/// With latency `n`, operands present at a rising edge appear on `sum` `n`
/// rising edges later (the first of which is that same edge). While reset is
/// asserted the pipeline is flushed and `sum` reads zero.
pub struct AdderModel {
    name: String,
    ports: Vec<Signal>,
    output_mask: u64,
    latency: usize,
    /// `(port, active_low)`
    reset: Option<(String, bool)>,
    fault: Option<Fault>,
    a: u64,
    b: u64,
    clk: bool,
    previous_clk: bool,
    reset_level: bool,
    pipeline: VecDeque<u64>,
    sum: u64,
}

impl AdderModel {
    /// Starts configuring an adder with `width`-bit operands.
    pub fn builder(width: u32) -> AdderBuilder {
        AdderBuilder {
            name: "carry_skip_adder".into(),
            width,
            output_width: None,
            latency: 1,
            reset: None,
            fault: None,
        }
    }

    fn in_reset(&self) -> bool {
        match &self.reset {
            Some((_, active_low)) => self.reset_level != *active_low,
            None => false,
        }
    }

    fn combine(&self) -> u64 {
        self.a.wrapping_add(self.b) & self.output_mask
    }

    fn on_rising_edge(&mut self) {
        if self.in_reset() {
            self.pipeline.iter_mut().for_each(|stage| *stage = 0);
            self.sum = 0;
            return;
        }

        self.pipeline.push_back(self.combine());
        if let Some(stage) = self.pipeline.pop_front() {
            self.sum = stage;
        }
    }
}

impl Dut for AdderModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Signal] {
        &self.ports
    }

    fn reset(&self) -> Option<&str> {
        self.reset.as_ref().map(|(port, _)| port.as_str())
    }

    fn pin(&mut self, port: &str, value: u64) -> Result<(), SimulationError> {
        match port {
            "clk" => self.clk = value != 0,
            "a" => self.a = value,
            "b" => self.b = value,
            _ if self.reset().is_some_and(|reset| reset == port) => {
                self.reset_level = value != 0;
            }
            _ => {
                return Err(SimulationError::NoSuchSignal {
                    dut: self.name.clone(),
                    signal: port.to_string(),
                });
            }
        }
        Ok(())
    }

    fn read(&self, port: &str) -> Result<u64, SimulationError> {
        if port != "sum" {
            return Err(SimulationError::NoSuchSignal {
                dut: self.name.clone(),
                signal: port.to_string(),
            });
        }
        let sum = match self.fault {
            Some(fault) => fault.apply(self.sum),
            None => self.sum,
        };
        Ok(sum & self.output_mask)
    }

    fn eval(&mut self) {
        if self.latency == 0 {
            self.sum = if self.in_reset() { 0 } else { self.combine() };
        } else if self.clk && !self.previous_clk {
            self.on_rising_edge();
        }
        self.previous_clk = self.clk;
    }
}
