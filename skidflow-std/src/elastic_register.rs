//! Single-entry elastic register (skid buffer) for valid-ready channels.

use static_assertions::assert_impl_all;
use tracing::trace;

use crate::*;

/// Whether the register holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupancy {
    /// Nothing stored.
    Empty,
    /// One value stored and offered downstream.
    Full,
}

/// Storage of the register.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<V: Signal> {
    /// Nothing stored.
    Empty,
    /// A stored value.
    Occupied(V),
}

impl<V: Signal> Default for Slot<V> {
    fn default() -> Self { Self::Empty }
}

impl<V: Signal> Slot<V> {
    /// Occupancy of the slot.
    pub fn occupancy(&self) -> Occupancy {
        match self {
            Self::Empty => Occupancy::Empty,
            Self::Occupied(_) => Occupancy::Full,
        }
    }

    /// The stored value.
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Empty => None,
            Self::Occupied(value) => Some(value),
        }
    }

    /// Output channel driven by the slot. An empty slot drives the cleared payload.
    pub fn to_valid(&self) -> Valid<V> {
        match self {
            Self::Empty => Valid::invalid(),
            Self::Occupied(value) => Valid::valid(value.clone()),
        }
    }

    /// `in_ready`: accepts when empty, or when the stored value leaves on the same step.
    fn ready(&self, o_bwd: &Ready) -> Ready { Ready::new(self.occupancy() == Occupancy::Empty || o_bwd.ready) }
}

/// What a step does to the register, keyed by which handshakes fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Neither handshake: state and value unchanged.
    Hold,
    /// Output only: the stored value leaves and the register empties.
    Drain,
    /// Input only: `in_data` is stored.
    Fill,
    /// Both: the stored value leaves and `in_data` takes its place.
    PassThrough,
}

impl Transition {
    /// Transition for the given handshakes.
    pub fn of(input_fire: bool, output_fire: bool) -> Self {
        match (input_fire, output_fire) {
            (false, false) => Self::Hold,
            (false, true) => Self::Drain,
            (true, false) => Self::Fill,
            (true, true) => Self::PassThrough,
        }
    }

    /// Transition a step took, judged from its inputs and the outputs the register drove. `None`
    /// on a reset step.
    pub fn of_step<V: Signal>(inputs: &StepInputs<V>, outputs: &StepOutputs<V>) -> Option<Self> {
        if inputs.reset {
            return None;
        }
        Some(Self::of(inputs.in_valid() && outputs.in_ready(), outputs.out_valid() && inputs.out_ready.ready))
    }

    /// Next slot after this transition.
    fn apply<V: Signal>(self, slot: &Slot<V>, in_data: &V) -> Slot<V> {
        match self {
            Self::Hold => slot.clone(),
            Self::Drain => Slot::Empty,
            Self::Fill | Self::PassThrough => Slot::Occupied(in_data.clone()),
        }
    }
}

/// Register logic.
fn logic<V: Signal>(i_fwd: &Valid<V>, o_bwd: &Ready, slot: &Slot<V>) -> (Valid<V>, Ready, Slot<V>) {
    let o_fwd = slot.to_valid();
    let i_bwd = slot.ready(o_bwd);

    let input_fire = Handshake::between(i_fwd, &i_bwd).fire();
    let output_fire = Handshake::between(&o_fwd, o_bwd).fire();
    let slot_next = Transition::of(input_fire, output_fire).apply(slot, &i_fwd.inner);

    (o_fwd, i_bwd, slot_next)
}

type Logic<V> = fn(&Valid<V>, &Ready, &Slot<V>) -> (Valid<V>, Ready, Slot<V>);

/// Single-entry elastic register.
///
/// Sits between an upstream producer and a downstream consumer, both speaking valid-ready:
///
/// - `in_ready = EMPTY || out_ready`
/// - `out_valid = FULL`
/// - `out_data` is the stored value, held bit-for-bit while `out_valid && !out_ready`.
///
/// Back-to-back transfers sustain one value per step with one step of latency. Reset empties the
/// register and clears the stored value.
///
/// ### Example
/// ```
/// use skidflow::*;
/// use skidflow_std::*;
///
/// let mut reg = ElasticRegister::<Bits<32>>::new();
/// reg.step(&StepInputs::new(true, Bits::from(0xdead_beefu32), true));
/// assert!(reg.out_valid());
/// assert_eq!(reg.out_data(), Bits::from(0xdead_beefu32));
/// ```
#[derive(Debug)]
pub struct ElasticRegister<V: Signal> {
    inner: FsmInst<VrChannel<V>, VrChannel<V>, Slot<V>, Logic<V>>,
}

impl<V: Signal> Default for ElasticRegister<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Signal> ElasticRegister<V> {
    /// Creates an empty register.
    pub fn new() -> Self {
        let fsm = Fsm::<VrChannel<V>, VrChannel<V>, _, Logic<V>>::new("elastic_register", logic, Slot::Empty);
        Self { inner: FsmInst::new(fsm) }
    }

    /// Current occupancy.
    pub fn occupancy(&self) -> Occupancy { self.slot().occupancy() }

    /// Current slot.
    pub fn slot(&self) -> &Slot<V> { self.inner.state() }

    /// Stored value, if any.
    pub fn stored(&self) -> Option<&V> { self.slot().value() }

    /// Steps advanced so far, reset steps included.
    pub fn cycle(&self) -> u64 { self.inner.cycle() }

    /// `in_ready` for the given `out_ready`.
    pub fn in_ready(&self, out_ready: bool) -> bool { self.slot().ready(&Ready::new(out_ready)).ready }

    /// `out_valid`
    pub fn out_valid(&self) -> bool { self.occupancy() == Occupancy::Full }

    /// `out_data`. Reads as [`Signal::zero`] while empty.
    pub fn out_data(&self) -> V { self.slot().to_valid().inner }

    /// Transition a step with these inputs would take. `None` if reset is asserted.
    pub fn transition(&self, inputs: &StepInputs<V>) -> Option<Transition> {
        Transition::of_step(inputs, &self.outputs(inputs))
    }
}

impl<V: Signal> Stage<V> for ElasticRegister<V> {
    fn outputs(&self, inputs: &StepInputs<V>) -> StepOutputs<V> { self.inner.outputs(inputs) }

    fn step(&mut self, inputs: &StepInputs<V>) -> StepOutputs<V> {
        let cycle = self.cycle();
        let outputs = self.inner.step(inputs);
        if let Some(transition) = Transition::of_step(inputs, &outputs) {
            trace!(cycle, ?transition, "elastic register");
        }
        outputs
    }

    fn reset(&mut self) { self.inner.reset() }
}

assert_impl_all!(ElasticRegister<Bits<32>>: Send, Sync, Stage<Bits<32>>);
assert_impl_all!(ElasticRegister<Bits<1024>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_total() {
        assert_eq!(Transition::of(false, false), Transition::Hold);
        assert_eq!(Transition::of(false, true), Transition::Drain);
        assert_eq!(Transition::of(true, false), Transition::Fill);
        assert_eq!(Transition::of(true, true), Transition::PassThrough);

        let full = Slot::Occupied(1u8);
        assert_eq!(Transition::Hold.apply(&full, &2), full);
        assert_eq!(Transition::Drain.apply(&full, &2), Slot::Empty);
        assert_eq!(Transition::Fill.apply(&Slot::<u8>::Empty, &2), Slot::Occupied(2));
        assert_eq!(Transition::PassThrough.apply(&full, &2), Slot::Occupied(2));
    }

    #[test]
    fn logic_outputs_follow_occupancy() {
        for out_ready in [false, true] {
            let (o_fwd, i_bwd, next) = logic(&Valid::valid(5u8), &Ready::new(out_ready), &Slot::Empty);
            assert_eq!(o_fwd, Valid::invalid());
            assert!(i_bwd.ready);
            assert_eq!(next, Slot::Occupied(5));

            let (o_fwd, i_bwd, _) = logic(&Valid::invalid(), &Ready::new(out_ready), &Slot::Occupied(3u8));
            assert_eq!(o_fwd, Valid::valid(3));
            assert_eq!(i_bwd.ready, out_ready);
        }
    }

    #[test]
    fn occupancy_follows_slot() {
        assert_eq!(Slot::<u8>::default().occupancy(), Occupancy::Empty);
        assert_eq!(Slot::Occupied(0u8).occupancy(), Occupancy::Full);
        assert_eq!(Slot::Occupied(7u8).to_valid(), Valid::valid(7));
        assert_eq!(Slot::<u8>::Empty.to_valid(), Valid::invalid());
    }

    #[test]
    fn transition_preview_does_not_commit() {
        let mut reg = ElasticRegister::<u8>::new();
        let inputs = StepInputs::new(true, 9, false);
        assert_eq!(reg.transition(&inputs), Some(Transition::Fill));
        assert_eq!(reg.occupancy(), Occupancy::Empty);
        reg.step(&inputs);
        assert_eq!(reg.transition(&StepInputs::new(true, 10, false)), Some(Transition::Hold));
        assert_eq!(reg.transition(&StepInputs::new(true, 10, true)), Some(Transition::PassThrough));
        assert_eq!(reg.transition(&StepInputs::new(false, 0, true)), Some(Transition::Drain));
        assert_eq!(reg.transition(&StepInputs::idle().with_reset()), None);
        assert_eq!(reg.stored(), Some(&9));
    }

    #[test]
    fn committed_transition_matches_preview() {
        let mut reg = ElasticRegister::<u8>::new();
        let steps = [
            StepInputs::new(true, 1, false),
            StepInputs::new(true, 2, false),
            StepInputs::new(true, 2, true),
            StepInputs::new(false, 0, true),
            StepInputs::new(false, 0, false),
            StepInputs::new(true, 3, true).with_reset(),
        ];
        let expected = [
            Some(Transition::Fill),
            Some(Transition::Hold),
            Some(Transition::PassThrough),
            Some(Transition::Drain),
            Some(Transition::Hold),
            None,
        ];
        for (inputs, expected) in steps.iter().zip(expected) {
            let preview = reg.transition(inputs);
            let outputs = reg.step(inputs);
            assert_eq!(preview, expected);
            assert_eq!(Transition::of_step(inputs, &outputs), expected);
        }
        assert_eq!(reg.cycle(), 6);
        assert_eq!(reg.occupancy(), Occupancy::Empty);
    }
}
