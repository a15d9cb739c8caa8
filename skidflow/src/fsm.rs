//! Finite state machine (Mealy machine).

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::*;

/// Finite state machine (Mealy machine).
///
/// `f` generates (1) the current-cycle outputs and (2) the next-cycle state from the current-cycle
/// inputs and the current state. It must be a pure function: outputs of a cycle are determined by
/// the state at the beginning of that cycle only.
pub struct Fsm<I: Interface, O: Interface, S, F> {
    /// Module name.
    module_name: String,
    /// FSM function.
    pub(crate) f: F,
    /// Initial value of registers in the FSM.
    pub(crate) init: S,
    _marker: PhantomData<(I, O)>,
}

impl<I: Interface, O: Interface, S, F> Fsm<I, O, S, F>
where F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)
{
    /// Creates a new FSM.
    pub fn new(module_name: &str, f: F, init: S) -> Self {
        Self { module_name: module_name.to_string(), f, init, _marker: PhantomData }
    }

    /// Returns module name.
    pub fn module_name(&self) -> &str { &self.module_name }

    /// Returns the initial state.
    pub fn init(&self) -> &S { &self.init }
}

impl<I: Interface, O: Interface, S: fmt::Debug, F> fmt::Debug for Fsm<I, O, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm").field("module_name", &self.module_name).field("init", &self.init).finish()
    }
}

/// Running instance of an [`Fsm`]: the description plus its current state.
pub struct FsmInst<I: Interface, O: Interface, S, F> {
    pub(crate) fsm: Fsm<I, O, S, F>,
    pub(crate) state: S,
    pub(crate) cycle: u64,
}

impl<I: Interface, O: Interface, S: Clone + fmt::Debug, F> FsmInst<I, O, S, F>
where F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)
{
    /// Instantiates the FSM in its initial state.
    pub fn new(fsm: Fsm<I, O, S, F>) -> Self {
        let state = fsm.init.clone();
        Self { fsm, state, cycle: 0 }
    }

    /// Returns module name.
    pub fn module_name(&self) -> &str { self.fsm.module_name() }

    /// Current state.
    pub fn state(&self) -> &S { &self.state }

    /// Number of cycles advanced so far.
    pub fn cycle(&self) -> u64 { self.cycle }

    /// Evaluates the FSM function on the current state without committing anything.
    pub fn eval(&self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> (O::Fwd, I::Bwd, S) { (self.fsm.f)(i_fwd, o_bwd, &self.state) }

    /// Advances one cycle: all outputs are computed from the pre-cycle state, then the next state
    /// is committed once.
    pub fn tick(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> (O::Fwd, I::Bwd) {
        let (o_fwd, i_bwd, state_next) = self.eval(i_fwd, o_bwd);
        trace!(module = self.fsm.module_name.as_str(), cycle = self.cycle, state = ?state_next, "tick");
        self.state = state_next;
        self.cycle += 1;
        (o_fwd, i_bwd)
    }

    /// Forces the initial state, effective immediately. Does not advance the cycle count.
    pub fn restart(&mut self) {
        debug!(module = self.fsm.module_name.as_str(), cycle = self.cycle, "restart");
        self.state = self.fsm.init.clone();
    }
}

impl<I: Interface, O: Interface, S: fmt::Debug, F> fmt::Debug for FsmInst<I, O, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmInst")
            .field("module_name", &self.fsm.module_name)
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts transfers through a combinational valid-ready wire.
    fn counter() -> FsmInst<VrChannel<u8>, VrChannel<u8>, u32, impl Fn(&Valid<u8>, &Ready, &u32) -> (Valid<u8>, Ready, u32)>
    {
        FsmInst::new(Fsm::<VrChannel<u8>, VrChannel<u8>, u32, _>::new(
            "transfer_counter",
            |fwd: &Valid<u8>, bwd: &Ready, count: &u32| {
                let fire = Handshake::between(fwd, bwd).fire();
                (fwd.clone(), *bwd, if fire { count + 1 } else { *count })
            },
            0,
        ))
    }

    #[test]
    fn tick_commits_after_outputs() {
        let mut inst = counter();
        let (o_fwd, i_bwd) = inst.tick(&Valid::valid(7), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid(7));
        assert!(i_bwd.ready);
        assert_eq!(*inst.state(), 1);
        inst.tick(&Valid::valid(8), &Ready::new(false));
        assert_eq!(*inst.state(), 1);
        assert_eq!(inst.cycle(), 2);
    }

    #[test]
    fn eval_is_pure_and_restart_is_immediate() {
        let mut inst = counter();
        inst.tick(&Valid::valid(1), &Ready::new(true));
        let (_, _, next) = inst.eval(&Valid::valid(2), &Ready::new(true));
        assert_eq!(next, 2);
        assert_eq!(*inst.state(), 1);

        inst.restart();
        assert_eq!(*inst.state(), 0);
        assert_eq!(inst.cycle(), 1);
        assert_eq!(inst.module_name(), "transfer_counter");
    }
}
