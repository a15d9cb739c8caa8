//! Runs directed scenarios and randomized soaks against the elastic register.

mod scenarios;

use std::collections::BTreeSet;
use std::fmt;

use clap::{Parser, ValueEnum};
use itertools::Itertools;
use skidflow::{Report, SimError, Signal, TestbenchConfig, Trace};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenarios::{Soak, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// One value in, one value out
    Basic,
    /// Output held while the consumer is blocked
    Backpressure,
    /// Both handshakes on the same step
    PassThrough,
    /// Reset of a full, blocked register
    Reset,
    /// Seeded random handshakes
    Random,
    /// Everything above
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Width {
    #[value(name = "8")]
    W8,
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
    #[value(name = "1024")]
    W1024,
}

/// Cycle-level testbench for a single-entry elastic register.
#[derive(Parser, Debug)]
#[command(name = "skidflow-examples")]
struct Args {
    /// Scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: Scenario,

    /// Steps of the random soak
    #[arg(long, default_value = "10000")]
    steps: u64,

    /// Seed of the random soak
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Probability of raising in_valid in the random soak
    #[arg(long, default_value = "0.5")]
    valid_prob: f64,

    /// Probability of raising out_ready in the random soak
    #[arg(long, default_value = "0.5")]
    ready_prob: f64,

    /// Payload width of the random soak
    #[arg(long, value_enum, default_value = "32")]
    width: Width,

    /// Cycles on which the random soak asserts reset
    #[arg(long = "reset-at", value_name = "CYCLE")]
    reset_at: Vec<u64>,

    /// Steps of backpressure in the backpressure scenario
    #[arg(long, default_value = "4")]
    stall: u64,

    /// First payload of the directed scenarios
    #[arg(long, default_value = "0xdeadbeef")]
    d0: Word,

    /// Second payload of the directed scenarios
    #[arg(long, default_value = "0xcafebabe")]
    d1: Word,

    /// Print a trace of every scenario
    #[arg(long)]
    trace: bool,

    /// Log level, overridden by `RUST_LOG`
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) -> Result<(), SimError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| SimError::Config { reason: format!("invalid log level {:?}: {}", level, e) })?;
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

fn print_trace<V: Signal>(name: &str, trace: Option<Trace<V>>) {
    if let Some(trace) = trace {
        println!("-- {} --\n{}", name, trace);
    }
}

fn print_report(width: usize, report: &Report) {
    println!(
        "random (width {}): {} cycles, {} accepted, {} produced, {} pass-throughs, {} stalls, {} resets, {} dropped",
        width,
        report.cycles,
        report.accepted,
        report.produced,
        report.pass_throughs,
        report.stalls,
        report.resets,
        report.dropped
    );
}

fn soak<const N: usize>(soak: Soak, print: bool) -> Result<(), SimError> {
    let (report, trace) = scenarios::random::<N>(soak)?;
    print_report(N, &report);
    if print {
        print_trace("random", trace);
    }
    Ok(())
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.to_possible_value().map(|v| v.get_name().to_string()).unwrap_or_default();
        write!(f, "{}", name)
    }
}

fn main() -> Result<(), SimError> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let selected = match args.scenario {
        Scenario::All => vec![Scenario::Basic, Scenario::Backpressure, Scenario::PassThrough, Scenario::Reset, Scenario::Random],
        scenario => vec![scenario],
    };
    info!(scenarios = %selected.iter().join(", "), "running");

    for scenario in &selected {
        let trace = match scenario {
            Scenario::Basic => scenarios::basic(&args.d0, args.trace)?,
            Scenario::Backpressure => scenarios::backpressure(&args.d1, args.stall, args.trace)?,
            Scenario::PassThrough => scenarios::pass_through(&args.d0, &args.d1, args.trace)?,
            Scenario::Reset => scenarios::reset_under_load(&args.d0, &args.d1, args.trace)?,
            Scenario::Random => {
                let soak_args = Soak {
                    seed: args.seed,
                    valid_prob: args.valid_prob,
                    ready_prob: args.ready_prob,
                    config: TestbenchConfig {
                        steps: args.steps,
                        resets: args.reset_at.iter().copied().collect::<BTreeSet<_>>(),
                        trace: args.trace,
                    },
                };
                match args.width {
                    Width::W8 => soak::<8>(soak_args, args.trace)?,
                    Width::W32 => soak::<32>(soak_args, args.trace)?,
                    Width::W64 => soak::<64>(soak_args, args.trace)?,
                    Width::W1024 => soak::<1024>(soak_args, args.trace)?,
                }
                continue;
            }
            Scenario::All => continue,
        };
        println!("{}: ok", scenario);
        print_trace(&scenario.to_string(), trace);
    }

    println!("passed: {}", selected.iter().join(", "));
    Ok(())
}
