//! Errors.

use thiserror::Error;

/// Errors converting bits into signal values.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("expected {expected} bits, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("{value:#x} is not a valid encoding of `{typ}`")]
    InvalidEncoding { typ: &'static str, value: usize },

    #[error("invalid hex literal {input:?}")]
    InvalidHex { input: String },
}

/// Valid-ready contract violations observed by the checker and the scoreboard.
///
/// Values are rendered in hex so that the error does not depend on the payload type.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("cycle {cycle}: stale input, producer stalled with {held} but then drove {observed}")]
    StaleInput { cycle: u64, held: String, observed: String },

    #[error("cycle {cycle}: unstable output, {held} was held under backpressure but became {observed}")]
    UnstableOutput { cycle: u64, held: String, observed: String },

    #[error("cycle {cycle}: in_ready={in_ready} disagrees with out_valid={out_valid}, out_ready={out_ready}")]
    ReadinessMismatch { cycle: u64, in_ready: bool, out_valid: bool, out_ready: bool },

    #[error("cycle {cycle}: produced {observed} with nothing outstanding")]
    Duplication { cycle: u64, observed: String },

    #[error("cycle {cycle}: produced {observed}, expected {expected}")]
    Corruption { cycle: u64, expected: String, observed: String },

    #[error("cycle {cycle}: {outstanding} values outstanding, capacity is {capacity}")]
    Overflow { cycle: u64, outstanding: usize, capacity: usize },
}

/// Simulation errors.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SimError {
    #[error("protocol violation: {error}")]
    Protocol {
        #[from]
        error: ProtocolViolation,
    },

    #[error("signal error: {error}")]
    Signal {
        #[from]
        error: SignalError,
    },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("scenario `{name}` failed: {reason}")]
    Scenario { name: String, reason: String },
}
