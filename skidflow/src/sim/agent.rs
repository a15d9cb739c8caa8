//! Upstream producers and downstream consumers driving a stage.

use std::fmt;

use crate::*;

/// Drives the forward signals of a stage's input channel.
pub trait Producer<V: Signal>: fmt::Debug {
    /// `in_valid` and `in_data` for this step.
    fn drive(&mut self) -> Valid<V>;

    /// Called after each step with whether the input handshake fired.
    fn observe(&mut self, accepted: bool);
}

/// Drives the backward signal of a stage's output channel.
pub trait Consumer<V: Signal>: fmt::Debug {
    /// `out_ready` for this step.
    fn ready(&mut self) -> bool;

    /// Called after each step with the delivered value, if the output handshake fired.
    fn observe(&mut self, delivered: Option<&V>);
}

/// Offers a stream of values in order.
///
/// Values are pulled from `values` one at a time, so the stream may be long or unbounded.
/// `pattern` decides when to start offering the next value. Once `in_valid` is raised, the
/// producer keeps it raised with the same `in_data` until the value is accepted.
pub struct SequenceProducer<I: Iterator, P: Pattern> {
    values: I,
    front: Option<I::Item>,
    pattern: P,
    asserted: bool,
    sent: usize,
}

impl<I: Iterator, P: Pattern> SequenceProducer<I, P> {
    /// Creates a new producer.
    pub fn new<T: IntoIterator<IntoIter = I>>(values: T, pattern: P) -> Self {
        let mut values = values.into_iter();
        let front = values.next();
        Self { values, front, pattern, asserted: false, sent: 0 }
    }

    /// Whether every value has been accepted.
    pub fn is_exhausted(&self) -> bool { self.front.is_none() }

    /// Values accepted so far.
    pub fn sent(&self) -> usize { self.sent }
}

impl<I: Iterator, P: Pattern> fmt::Debug for SequenceProducer<I, P>
where I::Item: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceProducer")
            .field("front", &self.front)
            .field("pattern", &self.pattern)
            .field("asserted", &self.asserted)
            .field("sent", &self.sent)
            .finish()
    }
}

impl<V: Signal, I: Iterator<Item = V>, P: Pattern> Producer<V> for SequenceProducer<I, P> {
    fn drive(&mut self) -> Valid<V> {
        let front = some_or!(self.front.as_ref(), return Valid::invalid());
        if !self.asserted {
            self.asserted = self.pattern.next();
        }
        Valid::new(self.asserted, front.clone())
    }

    fn observe(&mut self, accepted: bool) {
        if accepted {
            self.front = self.values.next();
            self.asserted = false;
            self.sent += 1;
        }
    }
}

/// Raises `out_ready` according to a pattern and keeps everything it receives.
///
/// Suited to short runs; [`StreamConsumer`] checks long ones without keeping the values.
#[derive(Debug, Clone)]
pub struct PatternConsumer<V: Signal, P: Pattern> {
    pattern: P,
    received: Vec<V>,
}

impl<V: Signal, P: Pattern> PatternConsumer<V, P> {
    /// Creates a new consumer.
    pub fn new(pattern: P) -> Self { Self { pattern, received: Vec::new() } }

    /// Values received so far, in order.
    pub fn received(&self) -> &[V] { &self.received }

    /// Takes the received values.
    pub fn into_received(self) -> Vec<V> { self.received }
}

impl<V: Signal, P: Pattern> Consumer<V> for PatternConsumer<V, P> {
    fn ready(&mut self) -> bool { self.pattern.next() }

    fn observe(&mut self, delivered: Option<&V>) {
        if let Some(value) = delivered {
            self.received.push(value.clone());
        }
    }
}

/// Raises `out_ready` according to a pattern and checks each delivery against an expected stream.
///
/// Keeps a count and the index of the first departure, never the values themselves.
pub struct StreamConsumer<I: Iterator, P: Pattern> {
    pattern: P,
    expected: Option<I>,
    delivered: u64,
    mismatch: Option<u64>,
}

impl<I: Iterator, P: Pattern> StreamConsumer<I, P> {
    /// Creates a new consumer. With `expected` set to `None` deliveries are only counted.
    pub fn new(pattern: P, expected: Option<I>) -> Self { Self { pattern, expected, delivered: 0, mismatch: None } }

    /// Values received so far.
    pub fn delivered(&self) -> u64 { self.delivered }

    /// Index of the first delivery that departed from the expected stream.
    pub fn mismatch(&self) -> Option<u64> { self.mismatch }
}

impl<I: Iterator, P: Pattern> fmt::Debug for StreamConsumer<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConsumer")
            .field("pattern", &self.pattern)
            .field("checked", &self.expected.is_some())
            .field("delivered", &self.delivered)
            .field("mismatch", &self.mismatch)
            .finish()
    }
}

impl<V: Signal, I: Iterator<Item = V>, P: Pattern> Consumer<V> for StreamConsumer<I, P> {
    fn ready(&mut self) -> bool { self.pattern.next() }

    fn observe(&mut self, delivered: Option<&V>) {
        let value = some_or!(delivered, return);
        if let (Some(expected), None) = (&mut self.expected, self.mismatch) {
            if expected.next().as_ref() != Some(value) {
                self.mismatch = Some(self.delivered);
            }
        }
        self.delivered += 1;
    }
}
