use skidflow::*;
use skidflow_std::*;

type Word = Bits<32>;

const D0: u32 = 0xdead_beef;
const D1: u32 = 0xcafe_babe;

fn word(value: u32) -> Word { Word::from(value) }

/// Register holding `value`, with the output side blocked for the filling step.
fn full_with(value: u32) -> ElasticRegister<Word> {
    let mut reg = ElasticRegister::new();
    let outputs = reg.step(&StepInputs::new(true, word(value), false));
    assert!(outputs.in_ready());
    assert_eq!(reg.stored(), Some(&word(value)));
    reg
}

#[test]
fn basic_transfer() {
    let mut reg = ElasticRegister::<Word>::new();
    assert_eq!(reg.occupancy(), Occupancy::Empty);

    let outputs = reg.step(&StepInputs::new(true, word(D0), true));
    assert!(outputs.in_ready());
    assert!(!outputs.out_valid());

    let outputs = reg.outputs(&StepInputs::new(false, Word::zero(), true));
    assert!(outputs.out_valid());
    assert_eq!(outputs.out_data(), &word(D0));
    assert_eq!(reg.cycle(), 1);
}

#[test]
fn backpressure_holds_output() {
    let mut reg = full_with(D1);
    for _ in 0..5 {
        let outputs = reg.step(&StepInputs::new(true, word(D0), false));
        assert!(!outputs.in_ready());
        assert!(outputs.out_valid());
        assert_eq!(outputs.out_data(), &word(D1));
    }

    let outputs = reg.step(&StepInputs::new(false, Word::zero(), true));
    assert!(outputs.out_valid());
    assert_eq!(outputs.out_data(), &word(D1));
    assert_eq!(reg.occupancy(), Occupancy::Empty);
    assert!(!reg.out_valid());
    assert!(reg.in_ready(false));
}

#[test]
fn pass_through_keeps_register_full() {
    let mut reg = full_with(D0);
    let inputs = StepInputs::new(true, word(D1), true);
    assert_eq!(reg.transition(&inputs), Some(Transition::PassThrough));

    let outputs = reg.step(&inputs);
    assert!(outputs.in_ready());
    assert_eq!(outputs.output, Valid::valid(word(D0)));
    assert_eq!(reg.occupancy(), Occupancy::Full);
    assert_eq!(reg.out_data(), word(D1));
}

#[test]
fn reset_under_load() {
    let mut reg = full_with(D0);
    reg.step(&StepInputs::new(true, word(D1), false));
    assert!(!reg.in_ready(false));

    let outputs = reg.step(&StepInputs::new(true, word(D1), true).with_reset());
    assert_eq!(outputs, StepOutputs::idle());
    assert!(!reg.out_valid());
    assert!(reg.in_ready(false));
    assert_eq!(reg.cycle(), 3);

    // Reset clears the stored value.
    assert_eq!(reg.slot(), &Slot::Empty);
    assert_eq!(reg.out_data(), Word::zero());
}

#[test]
fn immediate_reset() {
    let mut reg = full_with(D0);
    reg.reset();
    assert_eq!(reg.stored(), None);
    assert!(reg.in_ready(false));
    assert_eq!(reg.cycle(), 1);

    let outputs = reg.outputs(&StepInputs::new(true, word(D1), false));
    assert!(outputs.in_ready());
    assert!(!outputs.out_valid());
}

#[test]
fn hold_is_idempotent() {
    let mut reg = full_with(D0);
    for inputs in [StepInputs::new(false, word(D1), false), StepInputs::new(true, word(D1), false)] {
        assert_eq!(reg.transition(&inputs), Some(Transition::Hold));
        reg.step(&inputs);
        assert_eq!(reg.slot(), &Slot::Occupied(word(D0)));
    }

    let mut reg = ElasticRegister::<Word>::new();
    reg.step(&StepInputs::new(false, word(D1), true));
    assert_eq!(reg.slot(), &Slot::Empty);
}

#[test]
fn instances_are_independent() {
    let mut a = full_with(D0);
    let b = ElasticRegister::<Word>::new();
    a.step(&StepInputs::new(false, Word::zero(), true));
    let a = full_with(D1);
    assert_eq!(a.stored(), Some(&word(D1)));
    assert_eq!(b.occupancy(), Occupancy::Empty);
    assert_eq!(b.cycle(), 0);
}

#[test]
fn wide_payload() {
    let value = "0x8000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0000_0001"
        .parse::<Bits<1024>>()
        .unwrap();
    let mut reg = ElasticRegister::<Bits<1024>>::new();
    reg.step(&StepInputs::new(true, value.clone(), false));
    let outputs = reg.step(&StepInputs::new(true, Bits::zero(), true));
    assert_eq!(outputs.out_data(), &value);
    assert_eq!(outputs.out_data().count_ones(), 2);
    assert_eq!(reg.stored(), Some(&Bits::zero()));
}

#[derive(Debug, Clone, PartialEq, Signal)]
struct Packet {
    data: Bits<16>,
    last: bool,
}

#[test]
fn structured_payload() {
    let packet = Packet { data: Bits::from(0x1234u16), last: true };
    let mut bench = Testbench::new(
        ElasticRegister::<Packet>::new(),
        SequenceProducer::new(vec![packet.clone(), Packet::zero()], Always),
        PatternConsumer::new(Repeat::new(vec![false, true]).unwrap()),
        TestbenchConfig { steps: 8, trace: true, ..Default::default() },
    );
    let report = bench.run().unwrap();
    assert_eq!(report.accepted, 2);
    assert_eq!(report.produced, 2);

    let trace = bench.trace().unwrap();
    assert_eq!(trace.port_names()[..3].to_vec(), vec!["in_data_data", "in_data_last", "in_valid"]);
    assert_eq!(trace.column("out_data_data").unwrap()[1], "0x1234");
    assert_eq!(bench.consumer().received(), &[packet, Packet::zero()]);
}

#[test]
fn testbench_counts_scenario_events() {
    let values = (1..=6u32).map(word).collect::<Vec<_>>();
    let mut bench = Testbench::new(
        ElasticRegister::new(),
        SequenceProducer::new(values.clone(), Always),
        PatternConsumer::new(Repeat::new(vec![true, true, false]).unwrap()),
        TestbenchConfig { steps: 20, ..Default::default() },
    );
    let report = bench.run().unwrap();
    assert_eq!(report.cycles, 20);
    assert_eq!(report.accepted, 6);
    assert_eq!(report.produced, 6);
    assert!(report.pass_throughs > 0);
    assert!(report.stalls > 0);
    assert_eq!(bench.consumer().received(), values.as_slice());
    assert!(bench.trace().is_none());
}

#[test]
fn testbench_resets_drop_in_flight_value() {
    let values = (1..=4u32).map(word).collect::<Vec<_>>();
    let mut bench = Testbench::new(
        ElasticRegister::new(),
        SequenceProducer::new(values, Always),
        PatternConsumer::new(Never),
        TestbenchConfig { steps: 6, resets: [2].into_iter().collect(), trace: false },
    );
    let report = bench.run().unwrap();
    assert_eq!(report.resets, 1);
    assert_eq!(report.dropped, 1);
    // Value 1 accepted then dropped; value 2 accepted after reset and still held.
    assert_eq!(report.accepted, 2);
    assert_eq!(report.produced, 0);
    assert_eq!(bench.stage().stored(), Some(&word(2)));
    assert_eq!(bench.producer().sent(), 2);
}

/// Stage that forgets to hold its output under backpressure.
#[derive(Debug, Default)]
struct Leaky {
    inner: ElasticRegister<Word>,
}

impl Stage<Word> for Leaky {
    fn outputs(&self, inputs: &StepInputs<Word>) -> StepOutputs<Word> { self.inner.outputs(inputs) }

    fn step(&mut self, inputs: &StepInputs<Word>) -> StepOutputs<Word> {
        let outputs = self.inner.step(inputs);
        if outputs.out_valid() && !inputs.out_ready.ready {
            self.inner.reset();
        }
        outputs
    }

    fn reset(&mut self) { self.inner.reset() }
}

#[test]
fn testbench_reports_violations() {
    let mut bench = Testbench::new(
        Leaky::default(),
        SequenceProducer::new([word(D0), word(D1)], Always),
        PatternConsumer::new(Never),
        TestbenchConfig { steps: 10, ..Default::default() },
    );
    let err = bench.run().unwrap_err();
    assert!(matches!(err, SimError::Protocol { error: ProtocolViolation::UnstableOutput { cycle: 2, .. } }), "{err}");
}
