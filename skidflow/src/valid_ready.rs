//! Valid-ready channels.

use std::fmt::Debug;
use std::marker::PhantomData;

use skidflow_macro::Signal;

use crate::*;

/// Interface of channels.
///
/// Forward signals flow from producer to consumer, backward signals the other way.
pub trait Interface: 'static + Sized + Debug {
    /// Forward signals.
    type Fwd: Signal;

    /// Backward signals.
    type Bwd: Signal;
}

impl Interface for () {
    type Bwd = ();
    type Fwd = ();
}

/// Valid-ready channel.
#[derive(Debug)]
pub struct VrChannel<V: Signal> {
    _marker: PhantomData<V>,
}

impl<V: Signal> Interface for VrChannel<V> {
    type Bwd = Ready;
    type Fwd = Valid<V>;
}

/// Valid/ready channel's forward signals.
#[derive(Debug, Clone, PartialEq, Signal)]
pub struct Valid<V: Signal> {
    /// Inner data
    #[member(name = "data")]
    pub inner: V,

    /// Valid bit
    pub valid: bool,
}

impl<V: Signal> Valid<V> {
    /// Creates a new value.
    pub fn new(valid: bool, inner: V) -> Self { Self { inner, valid } }

    /// Creates an invalid value carrying the cleared payload.
    pub fn invalid() -> Self { Self::new(false, V::zero()) }

    /// Creates a valid value.
    pub fn valid(inner: V) -> Self { Self::new(true, inner) }

    /// The payload, if valid.
    pub fn as_option(&self) -> Option<&V> { self.valid.then_some(&self.inner) }

    /// Renders the payload in hex, or `-` when not valid.
    pub fn render(&self) -> String {
        if self.valid {
            bits_to_hex(&self.inner.transl())
        } else {
            "-".to_string()
        }
    }
}

/// Ready signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Ready {
    /// Ready bit
    pub ready: bool,
}

impl Ready {
    /// Creates a new value.
    pub fn new(ready: bool) -> Self { Self { ready } }
}

/// One side of a valid-ready handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// Valid bit asserted by the sender.
    pub valid: bool,
    /// Ready bit asserted by the receiver.
    pub ready: bool,
}

impl Handshake {
    /// Creates a new handshake.
    pub fn new(valid: bool, ready: bool) -> Self { Self { valid, ready } }

    /// Handshake between the forward and backward signals of a channel.
    pub fn between<V: Signal>(fwd: &Valid<V>, bwd: &Ready) -> Self { Self::new(fwd.valid, bwd.ready) }

    /// Whether a transfer happens.
    pub fn fire(&self) -> bool { self.valid && self.ready }
}
