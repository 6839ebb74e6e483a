// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::process;

use argh::FromArgs;
use camino::Utf8PathBuf;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use skipjack_harness::{Harness, HarnessConfig, RunReport, adder};
use skipjack_models::{AdderModel, Fault};
use skipjack_runtime::{Dut, Simulation};
use snafu::{ResultExt, Whatever, whatever};

/// Verify a clocked adder model against its reference
#[derive(FromArgs)]
struct SkipjackCommand {
    #[argh(subcommand)]
    subcommand: Subcommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Subcommand {
    Run(RunSubcommand),
    Check(CheckSubcommand),
}

/// run the directed case and then random cases
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunSubcommand {
    /// harness configuration file (TOML)
    #[argh(option, short = 'c')]
    config: Option<Utf8PathBuf>,

    /// seed for the random cases, overriding the configuration
    #[argh(option)]
    seed: Option<u64>,

    /// number of random cases, overriding the configuration
    #[argh(option)]
    count: Option<u64>,

    /// rising edges between applying operands and the sum appearing
    #[argh(option, default = "1")]
    latency: usize,

    /// hold this bit of the sum at 1
    #[argh(option)]
    stuck_high: Option<u32>,

    /// hold this bit of the sum at 0
    #[argh(option)]
    stuck_low: Option<u32>,

    /// log every case
    #[argh(switch, short = 'v')]
    verbose: bool,
}

/// check that a configuration file is well-formed
#[derive(FromArgs)]
#[argh(subcommand, name = "check")]
struct CheckSubcommand {
    /// harness configuration file (TOML)
    #[argh(positional)]
    config: Utf8PathBuf,
}

fn load_config(path: Option<&Utf8PathBuf>) -> Result<HarnessConfig, Whatever> {
    let config = match path {
        Some(path) => HarnessConfig::load(path).whatever_context(format!(
            "Failed to load configuration from {path}"
        ))?,
        None => HarnessConfig::default(),
    };
    config
        .validate()
        .whatever_context("Configuration is invalid")?;
    Ok(config)
}

/// An adder whose ports match what `config` expects to find.
fn build_model(
    config: &HarnessConfig,
    options: &RunSubcommand,
) -> Result<AdderModel, Whatever> {
    let mut builder = AdderModel::builder(config.input_width)
        .output_width(config.output_width)
        .latency(options.latency);

    if config.reset_present == Some(true) || config.signals.reset.is_some() {
        let default_name =
            if config.reset_active_low { "rst_n" } else { "rst" };
        let reset = config
            .signals
            .reset
            .clone()
            .unwrap_or_else(|| default_name.to_string());
        builder = if config.reset_active_low {
            builder.reset_n(reset)
        } else {
            builder.reset(reset)
        };
    }

    match (options.stuck_high, options.stuck_low) {
        (Some(_), Some(_)) => {
            whatever!("At most one of --stuck-high and --stuck-low may be set")
        }
        (Some(bit), None) => {
            builder = builder.fault(Fault::StuckAt { bit, value: true });
        }
        (None, Some(bit)) => {
            builder = builder.fault(Fault::StuckAt { bit, value: false });
        }
        (None, None) => {}
    }

    builder.build().whatever_context("Failed to build the adder model")
}

fn print_failures(report: &RunReport) {
    for failure in &report.failures {
        println!("         {} {}", "FAIL".bold().bright_red(), failure);
    }
}

fn run(options: RunSubcommand) -> Result<(), Whatever> {
    let mut config = load_config(options.config.as_ref())?;
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if let Some(count) = options.count {
        config.random_case_count = count;
    }
    config.log |= options.verbose;

    if config.log {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let model = build_model(&config, &options)?;
    println!(
        "{} {} with 1 directed and {} random case{}",
        "     STARTING".bold().bright_cyan(),
        model.name(),
        config.random_case_count,
        if config.random_case_count == 1 { "" } else { "s" },
    );

    let progress = ProgressBar::new(config.random_case_count + 1);
    let ticker = progress.clone();
    let mut harness =
        Harness::new(Simulation::new(model), config, adder("a", "b"))
            .whatever_context("Configuration is invalid")?
            .on_result(move |_| ticker.inc(1));
    let outcome = harness.run_blocking();
    progress.finish_and_clear();

    match outcome {
        Ok(report) => {
            print_failures(&report);
            println!("{} {}", "     FINISHED".bold().bright_cyan(), report);
            process::exit(report.exit_code());
        }
        Err(aborted) => {
            print_failures(&aborted.report);
            println!(
                "{} {}: {}",
                "      ABORTED".bold().on_bright_yellow(),
                aborted.kind(),
                snafu::Report::from_error(&aborted.error)
            );
            println!(
                "{} {}",
                "     FINISHED".bold().bright_cyan(),
                aborted.report
            );
            process::exit(aborted.exit_code());
        }
    }
}

fn check(options: CheckSubcommand) -> Result<(), Whatever> {
    let config = load_config(Some(&options.config))?;
    println!(
        "{} {} ({} random case{}, {} {} clock)",
        "      CHECKED".bold().bright_green(),
        options.config,
        config.random_case_count,
        if config.random_case_count == 1 { "" } else { "s" },
        config.clock_period,
        config.clock_unit,
    );
    Ok(())
}

#[snafu::report]
fn main() -> Result<(), Whatever> {
    let command: SkipjackCommand = argh::from_env();

    match command.subcommand {
        Subcommand::Run(run_subcommand) => run(run_subcommand),
        Subcommand::Check(check_subcommand) => check(check_subcommand),
    }
}
