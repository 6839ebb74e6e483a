// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use skipjack_runtime::{Dut, Signal, SimulationError};

/// An 8-bit register: `q` takes `d` on every rising edge of `clk`. `bus` is a
/// bidirectional scratch port that reads back whatever was last written.
pub struct Register {
    ports: Vec<Signal>,
    clk: bool,
    previous_clk: bool,
    d: u64,
    q: u64,
    bus: u64,
}

impl Register {
    pub fn new() -> Self {
        Self {
            ports: vec![
                Signal::input("clk", 1).expect("valid width"),
                Signal::input("d", 8).expect("valid width"),
                Signal::output("q", 8).expect("valid width"),
                Signal::inout("bus", 4).expect("valid width"),
            ],
            clk: false,
            previous_clk: false,
            d: 0,
            q: 0,
            bus: 0,
        }
    }
}

impl Dut for Register {
    fn name(&self) -> &str {
        "register"
    }

    fn ports(&self) -> &[Signal] {
        &self.ports
    }

    fn pin(&mut self, port: &str, value: u64) -> Result<(), SimulationError> {
        match port {
            "clk" => self.clk = value != 0,
            "d" => self.d = value,
            "bus" => self.bus = value,
            _ => {
                return Err(SimulationError::NoSuchSignal {
                    dut: self.name().to_string(),
                    signal: port.to_string(),
                });
            }
        }
        Ok(())
    }

    fn read(&self, port: &str) -> Result<u64, SimulationError> {
        match port {
            "q" => Ok(self.q),
            "bus" => Ok(self.bus),
            _ => Err(SimulationError::NoSuchSignal {
                dut: self.name().to_string(),
                signal: port.to_string(),
            }),
        }
    }

    fn eval(&mut self) {
        if self.clk && !self.previous_clk {
            self.q = self.d;
        }
        self.previous_clk = self.clk;
    }
}
