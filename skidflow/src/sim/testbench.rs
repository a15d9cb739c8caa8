//! Testbench: drives a stage from a producer and a consumer and checks the valid-ready contract.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::*;

/// Testbench configuration.
#[derive(Debug, Clone)]
pub struct TestbenchConfig {
    /// Number of steps `Testbench::run` advances.
    pub steps: u64,
    /// Cycles on which reset is asserted.
    pub resets: BTreeSet<u64>,
    /// Whether to capture a [`Trace`].
    pub trace: bool,
}

impl Default for TestbenchConfig {
    fn default() -> Self { Self { steps: 1000, resets: BTreeSet::new(), trace: false } }
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Steps advanced.
    pub cycles: u64,
    /// Values accepted from upstream.
    pub accepted: u64,
    /// Values delivered downstream.
    pub produced: u64,
    /// Steps on which both handshakes fired.
    pub pass_throughs: u64,
    /// Steps on which the producer was held back.
    pub stalls: u64,
    /// Reset steps.
    pub resets: u64,
    /// Accepted values discarded by reset.
    pub dropped: u64,
}

/// Drives a [`Stage`] and checks every step.
#[derive(Debug)]
pub struct Testbench<V: Signal, R: Stage<V>, P: Producer<V>, C: Consumer<V>> {
    stage: R,
    producer: P,
    consumer: C,
    checker: ProtocolChecker<V>,
    scoreboard: Scoreboard<V>,
    trace: Option<Trace<V>>,
    config: TestbenchConfig,
    report: Report,
}

impl<V: Signal, R: Stage<V>, P: Producer<V>, C: Consumer<V>> Testbench<V, R, P, C> {
    /// Creates a testbench around a single-entry stage.
    pub fn new(stage: R, producer: P, consumer: C, config: TestbenchConfig) -> Self {
        let trace = config.trace.then(Trace::new);
        Self {
            stage,
            producer,
            consumer,
            checker: ProtocolChecker::new(),
            scoreboard: Scoreboard::new(1),
            trace,
            config,
            report: Report::default(),
        }
    }

    /// Advances one step.
    pub fn step(&mut self) -> Result<StepRecord<V>, SimError> {
        let cycle = self.report.cycles;
        let reset = self.config.resets.contains(&cycle);

        let inputs = StepInputs { input: self.producer.drive(), out_ready: Ready::new(self.consumer.ready()), reset };
        let outputs = self.stage.step(&inputs);
        let record = StepRecord { cycle, inputs, outputs };

        self.producer.observe(record.input_fire());
        self.consumer.observe(record.output_fire().then(|| record.outputs.out_data()));
        if let Some(trace) = &mut self.trace {
            trace.record(&record);
        }
        self.account(&record);

        trace!(
            cycle,
            in_valid = record.inputs.in_valid(),
            in_ready = record.outputs.in_ready(),
            out_valid = record.outputs.out_valid(),
            out_ready = record.inputs.out_ready.ready,
            "step"
        );

        let checked = self.checker.check(&record).and_then(|_| self.scoreboard.check(&record));
        if let Err(error) = checked {
            warn!(%error, "protocol violation");
            return Err(error.into());
        }
        Ok(record)
    }

    /// Advances `config.steps` steps, stopping at the first violation.
    pub fn run(&mut self) -> Result<Report, SimError> {
        for _ in 0..self.config.steps {
            let _ = self.step()?;
        }
        let report = self.report();
        debug!(?report, "run finished");
        Ok(report)
    }

    fn account(&mut self, record: &StepRecord<V>) {
        let report = &mut self.report;
        report.cycles += 1;
        if record.inputs.reset {
            report.resets += 1;
            debug!(cycle = record.cycle, outstanding = self.scoreboard.outstanding(), "reset asserted");
        }
        report.accepted += u64::from(record.input_fire());
        report.produced += u64::from(record.output_fire());
        report.pass_throughs += u64::from(record.input_fire() && record.output_fire());
        report.stalls += u64::from(record.stalled());
    }

    /// Counters so far.
    pub fn report(&self) -> Report { Report { dropped: self.scoreboard.dropped(), ..self.report } }

    /// The stage under test.
    pub fn stage(&self) -> &R { &self.stage }

    /// The producer.
    pub fn producer(&self) -> &P { &self.producer }

    /// The consumer.
    pub fn consumer(&self) -> &C { &self.consumer }

    /// The captured trace, if enabled.
    pub fn trace(&self) -> Option<&Trace<V>> { self.trace.as_ref() }

    /// Decomposes the testbench.
    pub fn into_parts(self) -> (R, P, C, Option<Trace<V>>) { (self.stage, self.producer, self.consumer, self.trace) }
}
