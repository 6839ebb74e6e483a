// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Behavioral device models that plug into `skipjack-runtime` through its
//! [`Dut`](skipjack_runtime::Dut) trait.
//!
//! These stand in for the real hardware when no simulator backend is wired up.
//! They model port-level timing (registers, pipeline latency, reset) but not
//! gate-level structure.

pub mod adder;

pub use adder::{AdderBuilder, AdderModel, Fault};
