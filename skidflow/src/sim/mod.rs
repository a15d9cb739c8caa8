//! Discrete-step simulation of valid-ready stages.
//!
//! Every step, the driver presents [`StepInputs`] to a [`Stage`] and observes its [`StepOutputs`].
//! Outputs are pure functions of the stage's state at the beginning of the step and the same-step
//! inputs; the stage then commits its next state exactly once.

mod agent;
mod pattern;
mod testbench;

use std::fmt;

use tracing::debug;

pub use self::agent::*;
pub use self::pattern::*;
pub use self::testbench::*;
use crate::*;

/// Signals driven into a stage for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInputs<V: Signal> {
    /// Upstream forward signals (`in_valid`, `in_data`).
    pub input: Valid<V>,
    /// Downstream backward signal (`out_ready`).
    pub out_ready: Ready,
    /// Synchronous reset, overriding every other input.
    pub reset: bool,
}

impl<V: Signal> StepInputs<V> {
    /// Creates inputs with reset deasserted.
    pub fn new(in_valid: bool, in_data: V, out_ready: bool) -> Self {
        Self { input: Valid::new(in_valid, in_data), out_ready: Ready::new(out_ready), reset: false }
    }

    /// Nothing offered, nothing accepted.
    pub fn idle() -> Self { Self::new(false, V::zero(), false) }

    /// Asserts reset on these inputs.
    #[must_use]
    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }

    /// `in_valid`
    pub fn in_valid(&self) -> bool { self.input.valid }

    /// `in_data`
    pub fn in_data(&self) -> &V { &self.input.inner }
}

/// Signals observed from a stage for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutputs<V: Signal> {
    /// Upstream backward signal (`in_ready`).
    pub in_ready: Ready,
    /// Downstream forward signals (`out_valid`, `out_data`).
    pub output: Valid<V>,
}

impl<V: Signal> StepOutputs<V> {
    /// Outputs during a reset step: every handshake signal deasserted.
    pub fn idle() -> Self { Self { in_ready: Ready::new(false), output: Valid::invalid() } }

    /// `in_ready`
    pub fn in_ready(&self) -> bool { self.in_ready.ready }

    /// `out_valid`
    pub fn out_valid(&self) -> bool { self.output.valid }

    /// `out_data`
    pub fn out_data(&self) -> &V { &self.output.inner }
}

/// Everything that happened in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord<V: Signal> {
    /// Step index.
    pub cycle: u64,
    /// Inputs of the step.
    pub inputs: StepInputs<V>,
    /// Outputs of the step.
    pub outputs: StepOutputs<V>,
}

impl<V: Signal> StepRecord<V> {
    /// Input-side handshake.
    pub fn input_handshake(&self) -> Handshake { Handshake::between(&self.inputs.input, &self.outputs.in_ready) }

    /// Output-side handshake.
    pub fn output_handshake(&self) -> Handshake { Handshake::between(&self.outputs.output, &self.inputs.out_ready) }

    /// Whether a value was accepted from upstream.
    pub fn input_fire(&self) -> bool { self.input_handshake().fire() }

    /// Whether a value was delivered downstream.
    pub fn output_fire(&self) -> bool { self.output_handshake().fire() }

    /// Whether the producer was held back.
    pub fn stalled(&self) -> bool { !self.inputs.reset && self.inputs.in_valid() && !self.outputs.in_ready() }
}

/// A stage between two valid-ready channels, advanced one step at a time.
pub trait Stage<V: Signal>: fmt::Debug {
    /// Outputs for the current state and the given same-step inputs. Does not change the state.
    fn outputs(&self, inputs: &StepInputs<V>) -> StepOutputs<V>;

    /// Advances one step and returns that step's outputs.
    ///
    /// With `inputs.reset` asserted, the stage returns to its initial state, no handshake can fire
    /// (see [`StepOutputs::idle`]), and the other inputs are ignored.
    fn step(&mut self, inputs: &StepInputs<V>) -> StepOutputs<V>;

    /// Forces the initial state, effective immediately.
    fn reset(&mut self);
}

impl<V: Signal, S: Clone + fmt::Debug, F> Stage<V> for FsmInst<VrChannel<V>, VrChannel<V>, S, F>
where F: Fn(&Valid<V>, &Ready, &S) -> (Valid<V>, Ready, S)
{
    fn outputs(&self, inputs: &StepInputs<V>) -> StepOutputs<V> {
        if inputs.reset {
            return StepOutputs::idle();
        }
        let (output, in_ready, _) = self.eval(&inputs.input, &inputs.out_ready);
        StepOutputs { in_ready, output }
    }

    fn step(&mut self, inputs: &StepInputs<V>) -> StepOutputs<V> {
        if inputs.reset {
            self.restart();
            self.cycle += 1;
            return StepOutputs::idle();
        }
        let (output, in_ready) = self.tick(&inputs.input, &inputs.out_ready);
        StepOutputs { in_ready, output }
    }

    fn reset(&mut self) {
        debug!(module = self.module_name(), "reset");
        self.restart();
    }
}
