//! Per-step waveform capture.

use std::fmt;
use std::marker::PhantomData;

use itertools::Itertools;
use linked_hash_map::LinkedHashMap;

use crate::*;

#[derive(Debug, Clone)]
struct Column {
    width: usize,
    samples: Vec<Vec<bool>>,
}

/// Flattened names may collide (a member `a_b` next to a member `a { b }`); later ones get a suffix.
fn unique_name(columns: &LinkedHashMap<String, Column>, name: String) -> String {
    if !columns.contains_key(&name) {
        return name;
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{}_{}", name, suffix);
        if !columns.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Waveform of a stage's ports, one sample per step.
///
/// Ports are laid out as `in_data`, `in_valid`, `in_ready`, `out_data`, `out_valid`, `out_ready`
/// and `rst`. A structured payload contributes one column per leaf member.
#[derive(Debug, Clone)]
pub struct Trace<V: Signal> {
    columns: LinkedHashMap<String, Column>,
    cycles: Vec<u64>,
    _marker: PhantomData<V>,
}

impl<V: Signal> Default for Trace<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Signal> Trace<V> {
    /// Creates an empty trace.
    pub fn new() -> Self {
        let ports = [
            Valid::<V>::port_decls().flatten(Some("in".to_string())),
            Ready::port_decls().flatten(Some("in".to_string())),
            Valid::<V>::port_decls().flatten(Some("out".to_string())),
            Ready::port_decls().flatten(Some("out".to_string())),
            vec![(Some("rst".to_string()), 1)],
        ];

        let mut columns = LinkedHashMap::new();
        for (name, width) in ports.into_iter().flatten().filter(|(_, width)| *width > 0) {
            let name = unique_name(&columns, name.unwrap_or_default());
            let _ = columns.insert(name, Column { width, samples: Vec::new() });
        }
        Self { columns, cycles: Vec::new(), _marker: PhantomData }
    }

    /// Appends one step.
    pub fn record(&mut self, record: &StepRecord<V>) {
        let bits = [
            record.inputs.input.transl(),
            record.outputs.in_ready.transl(),
            record.outputs.output.transl(),
            record.inputs.out_ready.transl(),
            vec![record.inputs.reset],
        ]
        .concat();

        let mut offset = 0;
        for (_, column) in self.columns.iter_mut() {
            column.samples.push(bits[offset..offset + column.width].to_vec());
            offset += column.width;
        }
        self.cycles.push(record.cycle);
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize { self.cycles.len() }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool { self.cycles.is_empty() }

    /// Port names, in column order.
    pub fn port_names(&self) -> Vec<&str> { self.columns.keys().map(String::as_str).collect() }

    /// Samples of a port rendered in hex, one per step.
    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        let column = self.columns.get(name)?;
        Some(column.samples.iter().map(|sample| bits_to_hex(sample)).collect())
    }
}

impl<V: Signal> fmt::Display for Trace<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.columns.values().map(|c| c.samples.iter().map(|s| bits_to_hex(s)).collect_vec()).collect_vec();
        let widths = self
            .columns
            .keys()
            .zip(&rendered)
            .map(|(name, samples)| samples.iter().map(String::len).chain([name.len()]).max().unwrap_or(0))
            .collect_vec();

        let header = self.columns.keys().zip(&widths).map(|(name, width)| format!("{:>1$}", name, *width)).join(" ");
        writeln!(f, "{:>6} {}", "cycle", header)?;
        for (row, cycle) in self.cycles.iter().enumerate() {
            let line = rendered.iter().zip(&widths).map(|(samples, width)| format!("{:>1$}", samples[row], *width)).join(" ");
            writeln!(f, "{:>6} {}", cycle, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cycle: u64, inputs: StepInputs<u8>, outputs: StepOutputs<u8>) -> StepRecord<u8> {
        StepRecord { cycle, inputs, outputs }
    }

    #[test]
    fn columns_follow_port_order() {
        let trace = Trace::<u8>::new();
        assert_eq!(trace.port_names(), vec!["in_data", "in_valid", "in_ready", "out_data", "out_valid", "out_ready", "rst"]);
        assert!(trace.is_empty());

        // Zero-width payloads have no data column.
        let trace = Trace::<()>::new();
        assert_eq!(trace.port_names(), vec!["in_valid", "in_ready", "out_valid", "out_ready", "rst"]);
    }

    #[test]
    fn samples_are_rendered_in_hex() {
        let mut trace = Trace::<u8>::new();
        let outputs = StepOutputs { in_ready: Ready::new(true), output: Valid::invalid() };
        trace.record(&record(0, StepInputs::new(true, 0xd0, false), outputs));
        let outputs = StepOutputs { in_ready: Ready::new(false), output: Valid::valid(0xd0) };
        trace.record(&record(1, StepInputs::new(true, 0xd1, false), outputs));
        trace.record(&record(2, StepInputs::idle().with_reset(), StepOutputs::idle()));

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.column("in_data").unwrap(), vec!["0xd0", "0xd1", "0x00"]);
        assert_eq!(trace.column("in_ready").unwrap(), vec!["1", "0", "0"]);
        assert_eq!(trace.column("out_valid").unwrap(), vec!["0", "1", "0"]);
        assert_eq!(trace.column("out_data").unwrap(), vec!["0x00", "0xd0", "0x00"]);
        assert_eq!(trace.column("rst").unwrap(), vec!["0", "0", "1"]);
        assert_eq!(trace.column("missing"), None);

        let table = trace.to_string();
        assert_eq!(table.lines().count(), 4);
        assert!(table.lines().next().unwrap().trim_start().starts_with("cycle"));
        assert!(table.contains("0xd1"));
    }

    #[derive(Debug, Clone, PartialEq, Signal)]
    struct Inner {
        b: bool,
    }

    #[derive(Debug, Clone, PartialEq, Signal)]
    struct Clashing {
        a_b: bool,
        a: Inner,
    }

    #[test]
    fn colliding_port_names_keep_separate_columns() {
        let mut trace = Trace::<Clashing>::new();
        assert_eq!(trace.port_names()[..3].to_vec(), vec!["in_data_a_b", "in_data_a_b_1", "in_valid"]);

        let value = Clashing { a_b: false, a: Inner { b: true } };
        let inputs = StepInputs::new(true, value, false);
        trace.record(&StepRecord { cycle: 0, inputs, outputs: StepOutputs::idle() });
        assert_eq!(trace.column("in_data_a_b").unwrap(), vec!["0"]);
        assert_eq!(trace.column("in_data_a_b_1").unwrap(), vec!["1"]);
        assert_eq!(trace.column("in_valid").unwrap(), vec!["1"]);
        assert_eq!(trace.column("rst").unwrap(), vec!["0"]);
    }
}
