// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    env,
    sync::{Arc, Mutex},
};

use skipjack_harness::{
    CaseKind, Harness, HarnessConfig, HarnessError, Inputs, MismatchPolicy,
    OutOfRangePolicy, RunAborted, RunReport, RunState, adder,
};
use skipjack_models::{AdderModel, Fault};
use skipjack_runtime::{ClockGenerator, ErrorKind, Simulation};
use snafu::{ResultExt, Whatever};

fn directed(a: u64, b: u64) -> Inputs {
    Inputs::from([("a".into(), a), ("b".into(), b)])
}

fn config(width: u32, count: u64) -> HarnessConfig {
    HarnessConfig {
        input_width: width,
        output_width: width,
        random_case_count: count,
        seed: Some(42),
        ..Default::default()
    }
}

fn run(
    simulation: Simulation,
    config: HarnessConfig,
) -> Result<RunReport, Whatever> {
    Harness::new(simulation, config, adder("a", "b"))
        .whatever_context("invalid configuration")?
        .run_blocking()
        .whatever_context("run aborted")
}

fn run_aborted(simulation: Simulation, config: HarnessConfig) -> RunAborted {
    let mut harness = Harness::new(simulation, config, adder("a", "b"))
        .expect("valid configuration");
    let aborted = harness.run_blocking().expect_err("run should abort");
    assert_eq!(harness.state(), RunState::Aborted);
    aborted
}

#[test]
#[snafu::report]
fn directed_case_on_an_eight_bit_adder() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(8).build().whatever_context("adder")?,
    );
    let mut harness =
        Harness::new(simulation, config(8, 0), adder("a", "b"))
            .whatever_context("invalid configuration")?;
    let report = harness.run_blocking().whatever_context("run aborted")?;

    assert_eq!(harness.state(), RunState::Completed);
    assert_eq!(report.total_cases, 1);
    assert_eq!(report.passed_cases, 1);
    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
    Ok(())
}

#[test]
#[snafu::report]
fn directed_case_on_a_four_bit_adder() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(4).build().whatever_context("adder")?,
    );
    let config = HarnessConfig {
        directed: directed(5, 3),
        ..config(4, 0)
    };

    let observed = Arc::new(Mutex::new(Vec::new()));
    let results = observed.clone();
    let mut harness = Harness::new(simulation, config, adder("a", "b"))
        .whatever_context("invalid configuration")?
        .on_result(move |result| {
            results.lock().expect("poisoned").push(result.clone())
        });
    let report = harness.run_blocking().whatever_context("run aborted")?;

    assert!(report.is_success());
    let observed = observed.lock().expect("poisoned");
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].kind, CaseKind::Directed);
    assert_eq!(observed[0].observed, 8);
    assert_eq!(observed[0].expected, 8);
    Ok(())
}

#[test]
#[snafu::report]
fn reset_runs_before_the_directed_case() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(4)
            .reset("rst")
            .build()
            .whatever_context("adder")?,
    );
    let config = HarnessConfig {
        directed: directed(5, 3),
        reset_assert_cycles: 5,
        reset_settle_cycles: 5,
        settle_cycles: 20,
        ..config(4, 0)
    };
    let report = run(simulation, config)?;

    assert!(report.is_success());
    assert_eq!(report.edges, 5 + 5 + 20);
    Ok(())
}

#[test]
#[snafu::report]
fn active_low_reset_is_released_high() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .reset_n("rst_n")
            .build()
            .whatever_context("adder")?,
    );
    let config = HarnessConfig {
        reset_active_low: true,
        ..config(8, 25)
    };
    let report = run(simulation, config)?;

    assert_eq!(report.total_cases, 26);
    assert!(report.is_success(), "{report}");
    Ok(())
}

#[test]
#[snafu::report]
fn sum_wraps_modulo_the_output_width() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(8).build().whatever_context("adder")?,
    );
    let observed = Arc::new(Mutex::new(Vec::new()));
    let results = observed.clone();
    let config = HarnessConfig {
        directed: directed(255, 255),
        ..config(8, 0)
    };
    Harness::new(simulation, config, adder("a", "b"))
        .whatever_context("invalid configuration")?
        .on_result(move |result| {
            results.lock().expect("poisoned").push(result.observed)
        })
        .run_blocking()
        .whatever_context("run aborted")?;

    assert_eq!(*observed.lock().expect("poisoned"), [254]);
    Ok(())
}

#[test]
#[snafu::report]
fn directed_boundaries_on_an_eight_bit_adder() -> Result<(), Whatever> {
    for (a, b, sum) in
        [(0, 0, 0), (0, 255, 255), (255, 0, 255), (255, 255, 254)]
    {
        let simulation = Simulation::new(
            AdderModel::builder(8).build().whatever_context("adder")?,
        );
        let observed = Arc::new(Mutex::new(Vec::new()));
        let results = observed.clone();
        let config = HarnessConfig {
            directed: directed(a, b),
            ..config(8, 0)
        };
        let report = Harness::new(simulation, config, adder("a", "b"))
            .whatever_context("invalid configuration")?
            .on_result(move |result| {
                results.lock().expect("poisoned").push(result.clone())
            })
            .run_blocking()
            .whatever_context("run aborted")?;

        assert!(report.is_success(), "{a} + {b}: {report}");
        let observed = observed.lock().expect("poisoned");
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].kind, CaseKind::Directed);
        assert_eq!(observed[0].inputs, directed(a, b));
        assert_eq!(observed[0].observed, sum, "{a} + {b}");
        assert_eq!(observed[0].expected, sum, "{a} + {b}");
        assert!(observed[0].passed);
    }
    Ok(())
}

#[test]
#[snafu::report]
fn seeded_run_times_every_case_exactly() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(4).build().whatever_context("adder")?,
    );
    let config = HarnessConfig {
        directed: directed(5, 3),
        ..config(4, 10)
    };
    let report = run(simulation, config)?;

    assert_eq!(report.seed, 42);
    assert_eq!(report.total_cases, 11);
    assert_eq!(report.passed_cases, 11);
    assert_eq!(report.edges, 11 * 10);
    // 10 us period, so each edge is 5 us apart
    assert_eq!(report.time_ps, 11 * 10 * 5_000_000);
    Ok(())
}

#[test]
#[snafu::report]
fn logging_does_not_change_the_outcome() -> Result<(), Whatever> {
    if env::var("RUST_LOG").is_ok() {
        env_logger::init();
    }

    let adder_dut = || -> Result<Simulation, Whatever> {
        Ok(Simulation::new(
            AdderModel::builder(8).build().whatever_context("adder")?,
        ))
    };
    let logged = run(
        adder_dut()?,
        HarnessConfig {
            random_case_count: 10,
            seed: Some(42),
            ..HarnessConfig::default_logging()
        },
    )?;
    let quiet = run(adder_dut()?, config(8, 10))?;
    assert_eq!(logged, quiet);
    Ok(())
}

#[test]
#[snafu::report]
fn same_seed_replays_the_same_run() -> Result<(), Whatever> {
    let faulty = || -> Result<Simulation, Whatever> {
        Ok(Simulation::new(
            AdderModel::builder(8)
                .fault(Fault::StuckAt {
                    bit: 3,
                    value: false,
                })
                .build()
                .whatever_context("adder")?,
        ))
    };
    let config = HarnessConfig {
        directed_mismatch: MismatchPolicy::Record,
        ..config(8, 50)
    };

    let first = run(faulty()?, config.clone())?;
    let second = run(faulty()?, config)?;
    assert!(!first.failures.is_empty());
    assert_eq!(first, second);
    Ok(())
}

#[test]
#[snafu::report]
fn unseeded_run_reports_a_replayable_seed() -> Result<(), Whatever> {
    let faulty = || -> Result<Simulation, Whatever> {
        Ok(Simulation::new(
            AdderModel::builder(8)
                .fault(Fault::StuckAt {
                    bit: 2,
                    value: true,
                })
                .build()
                .whatever_context("adder")?,
        ))
    };
    let config = HarnessConfig {
        directed_mismatch: MismatchPolicy::Record,
        seed: None,
        ..config(8, 30)
    };

    let first = run(faulty()?, config.clone())?;
    let replay = run(
        faulty()?,
        HarnessConfig {
            seed: Some(first.seed),
            ..config
        },
    )?;
    assert_eq!(first.failures, replay.failures);
    Ok(())
}

#[test]
fn stuck_bit_aborts_on_the_directed_case() {
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .fault(Fault::StuckAt {
                bit: 1,
                value: true,
            })
            .build()
            .expect("valid adder"),
    );
    let aborted = run_aborted(simulation, config(8, 100));

    assert_eq!(aborted.kind(), ErrorKind::ComparisonMismatch);
    assert_eq!(aborted.exit_code(), 1);
    assert_eq!(aborted.report.total_cases, 1);
    let HarnessError::Mismatch { result } = &aborted.error else {
        panic!("expected a mismatch, got {:?}", aborted.error);
    };
    assert_eq!(result.kind, CaseKind::Directed);
    assert_eq!(result.observed, 67);
    assert_eq!(result.expected, 65);
    assert_eq!(aborted.report.failures, [result.clone()]);
}

#[test]
#[snafu::report]
fn stuck_bit_is_recorded_in_random_cases() -> Result<(), Whatever> {
    // bit 0 of 45 + 20 is already set, so the directed case passes
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .fault(Fault::StuckAt {
                bit: 0,
                value: true,
            })
            .build()
            .whatever_context("adder")?,
    );
    let report = run(simulation, config(8, 40))?;

    assert_eq!(report.total_cases, 41);
    assert!(!report.failures.is_empty());
    assert_eq!(report.exit_code(), 1);
    for failure in &report.failures {
        assert_eq!(failure.kind, CaseKind::Random);
        assert_eq!(failure.expected % 2, 0);
        assert_eq!(failure.observed, failure.expected | 1);
    }
    Ok(())
}

#[test]
fn random_mismatch_can_abort() {
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .fault(Fault::StuckAt {
                bit: 0,
                value: true,
            })
            .build()
            .expect("valid adder"),
    );
    let config = HarnessConfig {
        random_mismatch: MismatchPolicy::Abort,
        ..config(8, 40)
    };
    let aborted = run_aborted(simulation, config);

    assert_eq!(aborted.kind(), ErrorKind::ComparisonMismatch);
    assert_eq!(aborted.report.failures.len(), 1);
    assert_eq!(
        aborted.report.total_cases,
        aborted.report.failures[0].case_index + 1
    );
}

#[test]
fn out_of_range_directed_value_is_rejected() {
    let simulation =
        Simulation::new(AdderModel::builder(8).build().expect("valid adder"));
    for (a, b) in [(300, 20), (45, 256)] {
        let config = HarnessConfig {
            directed: directed(a, b),
            ..config(8, 5)
        };
        let error = Harness::new(simulation.clone(), config, adder("a", "b"))
            .err()
            .expect("directed case does not fit in 8 bits");
        assert!(matches!(error, HarnessError::InvalidConfig { .. }));
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn default_directed_case_does_not_fit_four_bits() {
    let simulation =
        Simulation::new(AdderModel::builder(4).build().expect("valid adder"));
    let error = Harness::new(simulation, config(4, 10), adder("a", "b"))
        .err()
        .expect("45 and 20 are wider than 4 bits");
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
#[snafu::report]
fn out_of_range_directed_value_can_be_masked() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(8).build().whatever_context("adder")?,
    );
    let observed = Arc::new(Mutex::new(Vec::new()));
    let results = observed.clone();
    let config = HarnessConfig {
        directed: directed(300, 20),
        out_of_range: OutOfRangePolicy::Mask,
        ..config(8, 0)
    };
    Harness::new(simulation, config, adder("a", "b"))
        .whatever_context("invalid configuration")?
        .on_result(move |result| {
            results.lock().expect("poisoned").push(result.clone())
        })
        .run_blocking()
        .whatever_context("run aborted")?;

    let observed = observed.lock().expect("poisoned");
    assert_eq!(observed[0].inputs, directed(44, 20));
    assert_eq!(observed[0].observed, 64);
    Ok(())
}

#[test]
fn narrow_dut_is_a_width_mismatch() {
    let simulation =
        Simulation::new(AdderModel::builder(4).build().expect("valid adder"));
    let aborted = run_aborted(simulation, config(8, 5));

    assert!(matches!(
        aborted.error,
        HarnessError::WidthMismatch {
            width: 4,
            required: 8,
            ..
        }
    ));
    assert_eq!(aborted.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn required_reset_must_exist() {
    let simulation =
        Simulation::new(AdderModel::builder(8).build().expect("valid adder"));
    let config = HarnessConfig {
        reset_present: Some(true),
        ..config(8, 5)
    };
    let aborted = run_aborted(simulation, config);

    assert!(matches!(aborted.error, HarnessError::MissingReset { .. }));
    assert_eq!(aborted.kind(), ErrorKind::SimulationFault);
}

#[test]
#[snafu::report]
fn declared_reset_can_be_skipped() -> Result<(), Whatever> {
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .reset("rst")
            .build()
            .whatever_context("adder")?,
    );
    let config = HarnessConfig {
        reset_present: Some(false),
        ..config(8, 0)
    };
    let report = run(simulation, config)?;

    assert_eq!(report.edges, 10);
    Ok(())
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let simulation =
        Simulation::new(AdderModel::builder(8).build().expect("valid adder"));
    for config in [
        HarnessConfig {
            input_width: 0,
            ..Default::default()
        },
        HarnessConfig {
            output_width: 65,
            ..Default::default()
        },
        HarnessConfig {
            settle_cycles: 0,
            ..Default::default()
        },
        HarnessConfig {
            clock_period: 0,
            ..Default::default()
        },
        HarnessConfig {
            directed: Inputs::from([("a".into(), 1)]),
            ..Default::default()
        },
    ] {
        let error = Harness::new(simulation.clone(), config, adder("a", "b"))
            .err()
            .expect("configuration should be rejected");
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn reference_operands_must_be_configured_inputs() {
    let simulation =
        Simulation::new(AdderModel::builder(8).build().expect("valid adder"));
    let error =
        Harness::new(simulation.clone(), config(8, 5), adder("a", "c"))
            .err()
            .expect("c is not an input");
    assert!(matches!(
        error,
        HarnessError::InvalidConfig { ref reason } if reason.contains("reads c,")
    ));
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    let closure = |inputs: &Inputs| inputs.values().sum::<u64>();
    assert!(Harness::new(simulation, config(8, 5), closure).is_ok());
}

#[tokio::test(start_paused = true)]
async fn clock_is_released_after_a_run() {
    let simulation =
        Simulation::new(AdderModel::builder(8).build().expect("valid adder"));
    let config = config(8, 3);
    let clock_spec = config.clock_spec();

    let mut harness = Harness::new(simulation.clone(), config, adder("a", "b"))
        .expect("valid configuration");
    harness.run().await.expect("run passes");

    let clock = ClockGenerator::start(&simulation, &clock_spec)
        .expect("clock signal was released");
    clock.stop().await;
}

#[tokio::test(start_paused = true)]
async fn clock_is_released_after_an_aborted_run() {
    let simulation = Simulation::new(
        AdderModel::builder(8)
            .fault(Fault::StuckAt {
                bit: 1,
                value: true,
            })
            .build()
            .expect("valid adder"),
    );
    let config = config(8, 3);
    let clock_spec = config.clock_spec();

    let mut harness = Harness::new(simulation.clone(), config, adder("a", "b"))
        .expect("valid configuration");
    assert!(harness.run().await.is_err());
    assert_eq!(harness.state(), RunState::Aborted);

    let clock = ClockGenerator::start(&simulation, &clock_spec)
        .expect("clock signal was released");
    clock.stop().await;
}
