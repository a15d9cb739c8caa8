//! Directed scenarios and randomized soaks against the elastic register.

use skidflow::*;
use skidflow_std::*;
use tracing::{debug, info};

/// Payload of the directed scenarios.
pub type Word = Bits<32>;

/// Register driven step by step, every step checked.
#[derive(Debug)]
struct Directed {
    name: &'static str,
    reg: ElasticRegister<Word>,
    checker: ProtocolChecker<Word>,
    scoreboard: Scoreboard<Word>,
    trace: Option<Trace<Word>>,
}

impl Directed {
    fn new(name: &'static str, trace: bool) -> Self {
        Self {
            name,
            reg: ElasticRegister::new(),
            checker: ProtocolChecker::new(),
            scoreboard: Scoreboard::new(1),
            trace: trace.then(Trace::new),
        }
    }

    fn step(&mut self, inputs: StepInputs<Word>) -> Result<StepRecord<Word>, SimError> {
        let cycle = self.reg.cycle();
        let outputs = self.reg.step(&inputs);
        let record = StepRecord { cycle, inputs, outputs };
        debug!(scenario = self.name, cycle, in_ready = record.outputs.in_ready(), out_valid = record.outputs.out_valid(), "step");

        if let Some(trace) = &mut self.trace {
            trace.record(&record);
        }
        self.checker.check(&record)?;
        self.scoreboard.check(&record)?;
        Ok(record)
    }

    fn expect(&self, holds: bool, reason: &str) -> Result<(), SimError> {
        if holds {
            Ok(())
        } else {
            Err(SimError::Scenario { name: self.name.to_string(), reason: format!("cycle {}: {}", self.reg.cycle(), reason) })
        }
    }

    fn finish(self) -> Option<Trace<Word>> {
        info!(scenario = self.name, cycles = self.reg.cycle(), "passed");
        self.trace
    }
}

/// Accepts `d0` with the consumer ready, then offers it on the next step.
pub fn basic(d0: &Word, trace: bool) -> Result<Option<Trace<Word>>, SimError> {
    let mut s = Directed::new("basic", trace);

    let record = s.step(StepInputs::new(true, d0.clone(), true))?;
    s.expect(record.outputs.in_ready(), "register did not accept while empty")?;
    s.expect(!record.output_fire(), "value left on the step it arrived")?;

    let record = s.step(StepInputs::new(false, Word::zero(), true))?;
    s.expect(record.outputs.output == Valid::valid(d0.clone()), "stored value was not offered")?;
    s.expect(s.reg.occupancy() == Occupancy::Empty, "register did not drain")?;
    Ok(s.finish())
}

/// Holds `d1` under `stall` steps of backpressure, then drains.
pub fn backpressure(d1: &Word, stall: u64, trace: bool) -> Result<Option<Trace<Word>>, SimError> {
    let mut s = Directed::new("backpressure", trace);
    s.step(StepInputs::new(true, d1.clone(), false))?;

    for _ in 0..stall {
        let record = s.step(StepInputs::new(false, Word::zero(), false))?;
        s.expect(!record.outputs.in_ready(), "ready while full and blocked")?;
        s.expect(record.outputs.out_data() == d1, "held output changed")?;
    }

    let record = s.step(StepInputs::new(false, Word::zero(), true))?;
    s.expect(record.output_fire(), "held value was not delivered")?;
    s.expect(s.reg.occupancy() == Occupancy::Empty, "register did not empty")?;
    Ok(s.finish())
}

/// Replaces `d0` by `d1` in a single step with both handshakes firing.
pub fn pass_through(d0: &Word, d1: &Word, trace: bool) -> Result<Option<Trace<Word>>, SimError> {
    let mut s = Directed::new("pass-through", trace);
    s.step(StepInputs::new(true, d0.clone(), false))?;

    let inputs = StepInputs::new(true, d1.clone(), true);
    s.expect(s.reg.transition(&inputs) == Some(Transition::PassThrough), "not a pass-through step")?;
    let record = s.step(inputs)?;
    s.expect(record.outputs.out_data() == d0, "old value was not delivered")?;

    s.expect(s.reg.out_valid(), "register emptied on pass-through")?;
    s.expect(s.reg.out_data() == *d1, "new value was not stored")?;
    Ok(s.finish())
}

/// Resets a full, blocked register.
pub fn reset_under_load(d0: &Word, d1: &Word, trace: bool) -> Result<Option<Trace<Word>>, SimError> {
    let mut s = Directed::new("reset", trace);
    s.step(StepInputs::new(true, d0.clone(), false))?;
    s.step(StepInputs::new(true, d1.clone(), false))?;

    let record = s.step(StepInputs::new(true, d1.clone(), true).with_reset())?;
    s.expect(!record.input_fire() && !record.output_fire(), "handshake fired during reset")?;
    s.expect(!s.reg.out_valid(), "out_valid after reset")?;
    s.expect(s.reg.in_ready(false), "in_ready deasserted after reset")?;
    s.expect(s.reg.stored().is_none(), "stored value survived reset")?;
    Ok(s.finish())
}

/// Parameters of a randomized soak.
#[derive(Debug, Clone)]
pub struct Soak {
    /// Seed of both patterns.
    pub seed: u64,
    /// Probability of raising `in_valid`.
    pub valid_prob: f64,
    /// Probability of raising `out_ready`.
    pub ready_prob: f64,
    /// Testbench configuration.
    pub config: TestbenchConfig,
}

/// `i`-th payload of a soak: a multiplicative hash of the index, truncated to `N` bits.
fn soak_value<const N: usize>(i: u64) -> Bits<N> {
    Bits::from(u128::from(i).wrapping_mul(0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835))
}

/// Streams a deterministic sequence through an `N`-bit register under random handshakes.
///
/// Payloads are generated as they are offered and deliveries are checked as they arrive, so
/// memory stays flat in the number of steps unless a trace is requested. Delivery order is only
/// checked when no reset is scheduled, since a reset discards the value in flight.
pub fn random<const N: usize>(soak: Soak) -> Result<(Report, Option<Trace<Bits<N>>>), SimError> {
    let steps = soak.config.steps;
    let producer = SequenceProducer::new((0..steps).map(soak_value::<N>), Bernoulli::new(soak.seed, soak.valid_prob)?);
    let expected = soak.config.resets.is_empty().then(|| (0..steps).map(soak_value::<N>));
    let consumer = StreamConsumer::new(Bernoulli::new(soak.seed.wrapping_add(1), soak.ready_prob)?, expected);

    let mut bench = Testbench::new(ElasticRegister::<Bits<N>>::new(), producer, consumer, soak.config);
    let report = bench.run()?;
    if let Some(index) = bench.consumer().mismatch() {
        return Err(SimError::Scenario {
            name: "random".to_string(),
            reason: format!("delivery {} departs from the offered sequence", index),
        });
    }
    info!(width = N, ?report, "random soak passed");

    let (_, _, _, trace) = bench.into_parts();
    Ok((report, trace))
}
