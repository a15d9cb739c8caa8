//! Protocol checker and scoreboard for single-entry valid-ready stages.
//!
//! Neither is consulted by the stage itself: they observe [`StepRecord`]s and report the first
//! [`ProtocolViolation`] they see.

use std::collections::VecDeque;

use crate::*;

fn hex<V: Signal>(value: &V) -> String { bits_to_hex(&value.transl()) }

/// Checks the valid-ready rules step by step.
///
/// - A stalled producer (`in_valid && !in_ready`) keeps `in_valid` and `in_data` on the next step.
/// - A held output (`out_valid && !out_ready`) keeps `out_valid` and `out_data` on the next step.
/// - `in_ready == !out_valid || out_ready`: a single-entry stage accepts exactly when it is empty
///   or being drained.
///
/// A reset step is exempt, and so is the step right after it.
#[derive(Debug, Clone)]
pub struct ProtocolChecker<V: Signal> {
    prev: Option<StepRecord<V>>,
}

impl<V: Signal> Default for ProtocolChecker<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Signal> ProtocolChecker<V> {
    /// Creates a new checker.
    pub fn new() -> Self { Self { prev: None } }

    /// Checks the next step.
    pub fn check(&mut self, record: &StepRecord<V>) -> Result<(), ProtocolViolation> {
        let prev = self.prev.replace(record.clone());
        if record.inputs.reset {
            return Ok(());
        }

        let cycle = record.cycle;
        let (inputs, outputs) = (&record.inputs, &record.outputs);

        let out_ready = inputs.out_ready.ready;
        if outputs.in_ready() != (!outputs.out_valid() || out_ready) {
            return Err(ProtocolViolation::ReadinessMismatch {
                cycle,
                in_ready: outputs.in_ready(),
                out_valid: outputs.out_valid(),
                out_ready,
            });
        }

        let prev = some_or!(prev, return Ok(()));
        if prev.inputs.reset {
            return Ok(());
        }

        if prev.stalled() && (!inputs.in_valid() || inputs.in_data() != prev.inputs.in_data()) {
            return Err(ProtocolViolation::StaleInput {
                cycle,
                held: hex(prev.inputs.in_data()),
                observed: inputs.input.render(),
            });
        }

        let held = prev.outputs.out_valid() && !prev.inputs.out_ready.ready;
        if held && (!outputs.out_valid() || outputs.out_data() != prev.outputs.out_data()) {
            return Err(ProtocolViolation::UnstableOutput {
                cycle,
                held: hex(prev.outputs.out_data()),
                observed: outputs.output.render(),
            });
        }

        Ok(())
    }
}

/// In-order reference of values in flight through a stage.
///
/// Every delivered value must be the oldest accepted one, and no more than `capacity` values may
/// be in flight after a step. Reset discards whatever is in flight.
#[derive(Debug, Clone)]
pub struct Scoreboard<V: Signal> {
    outstanding: VecDeque<V>,
    capacity: usize,
    dropped: u64,
}

impl<V: Signal> Scoreboard<V> {
    /// Creates a scoreboard for a stage holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self { Self { outstanding: VecDeque::new(), capacity, dropped: 0 } }

    /// Values accepted but not yet delivered.
    pub fn outstanding(&self) -> usize { self.outstanding.len() }

    /// Values discarded by reset so far.
    pub fn dropped(&self) -> u64 { self.dropped }

    /// Checks the next step.
    pub fn check(&mut self, record: &StepRecord<V>) -> Result<(), ProtocolViolation> {
        let cycle = record.cycle;
        if record.inputs.reset {
            self.dropped += self.outstanding.len() as u64;
            self.outstanding.clear();
            return Ok(());
        }

        // Delivery retires the old value before a same-step acceptance enqueues the new one.
        if record.output_fire() {
            let observed = record.outputs.out_data();
            match self.outstanding.pop_front() {
                None => return Err(ProtocolViolation::Duplication { cycle, observed: hex(observed) }),
                Some(expected) if &expected != observed => {
                    return Err(ProtocolViolation::Corruption { cycle, expected: hex(&expected), observed: hex(observed) })
                }
                Some(_) => {}
            }
        }

        if record.input_fire() {
            self.outstanding.push_back(record.inputs.in_data().clone());
        }

        if self.outstanding.len() > self.capacity {
            return Err(ProtocolViolation::Overflow { cycle, outstanding: self.outstanding.len(), capacity: self.capacity });
        }
        Ok(())
    }
}
