use std::collections::BTreeSet;
use std::fmt;

use super::error::{Result, TraceError};

/// Name of the independent variable.
pub const TIME: &str = "t";

/// Column order written by the oscillator integrator when it emits no header.
pub const OSCILLATOR_COLUMNS: [&str; 7] =
    ["t", "u_rne", "v_rne", "u_sr", "v_sr", "u_exact", "v_exact"];

/// Variant suffix of the reference solution (`u_exact`, `v_exact`).
pub const EXACT_VARIANT: &str = "exact";

// ---------------------------------------------------------------------------
// Schema – how columns get their names
// ---------------------------------------------------------------------------

/// Column layout of an input file, resolved once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// First row names the columns (free-form, any order).
    Headered,
    /// No header; columns are named positionally in this order.
    Fixed(Vec<String>),
}

impl Schema {
    /// The 7-column headerless layout `t, u_rne, v_rne, u_sr, v_sr, u_exact, v_exact`.
    pub fn oscillator() -> Self {
        Schema::Fixed(OSCILLATOR_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    /// Minimum number of columns a file must have for this schema.
    pub fn min_columns(&self) -> usize {
        match self {
            Schema::Headered => 1,
            Schema::Fixed(names) => names.len(),
        }
    }

    pub fn has_header(&self) -> bool {
        matches!(self, Schema::Headered)
    }
}

// ---------------------------------------------------------------------------
// Channel naming
// ---------------------------------------------------------------------------

/// Role of a channel, derived from its name.
///
/// `u` / `u_<variant>` are primary state samples, `v` / `v_<variant>` are
/// their rates of change. Everything else (including `t`) is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Primary,
    Derivative,
    Other,
}

impl ChannelKind {
    pub fn of(name: &str) -> Self {
        match split_channel(name) {
            Some(('u', _)) => ChannelKind::Primary,
            Some(('v', _)) => ChannelKind::Derivative,
            _ => ChannelKind::Other,
        }
    }
}

/// Split `u_rne` into `('u', "rne")`, bare `v` into `('v', "")`.
fn split_channel(name: &str) -> Option<(char, &str)> {
    let mut chars = name.chars();
    let class = chars.next()?;
    if class != 'u' && class != 'v' {
        return None;
    }
    let rest = chars.as_str();
    if rest.is_empty() {
        Some((class, ""))
    } else {
        rest.strip_prefix('_')
            .filter(|suffix| !suffix.is_empty())
            .map(|suffix| (class, suffix))
    }
}

/// Variant suffix of a `u`/`v` channel (`"rne"` for `u_rne`, `""` for `u`).
pub fn variant_of(name: &str) -> Option<&str> {
    split_channel(name).map(|(_, suffix)| suffix)
}

/// Name of the derivative channel paired with a primary channel.
pub fn derivative_name(primary: &str) -> Option<String> {
    match split_channel(primary)? {
        ('u', "") => Some("v".to_string()),
        ('u', suffix) => Some(format!("v_{suffix}")),
        _ => None,
    }
}

/// Name of the primary channel paired with a derivative channel.
pub fn primary_name(derivative: &str) -> Option<String> {
    match split_channel(derivative)? {
        ('v', "") => Some("u".to_string()),
        ('v', suffix) => Some(format!("u_{suffix}")),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Trace – one simulation run
// ---------------------------------------------------------------------------

/// Time-aligned channel arrays for one simulation run.
///
/// Every channel has the same length. A trace produced by the loader is
/// fully finite; augmenting it returns a new trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    len: usize,
}

impl Trace {
    /// Build a trace from `(name, samples)` pairs, keeping their order.
    pub fn new(channels: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let len = channels.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut seen = BTreeSet::new();
        let mut names = Vec::with_capacity(channels.len());
        let mut columns = Vec::with_capacity(channels.len());

        for (name, samples) in channels {
            if !seen.insert(name.clone()) {
                return Err(TraceError::DuplicateChannel(name));
            }
            if samples.len() != len {
                return Err(TraceError::LengthMismatch {
                    channel: name,
                    expected: len,
                    actual: samples.len(),
                });
            }
            names.push(name);
            columns.push(samples);
        }

        Ok(Trace { names, columns, len })
    }

    /// Assemble a trace whose names are already known to be unique and
    /// whose columns all have `len` samples.
    pub(crate) fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>, len: usize) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == len));
        Trace { names, columns, len }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Channel names in column order.
    pub fn channel_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// The independent variable, if the file had a `t` column.
    pub fn time(&self) -> Option<&[f64]> {
        self.channel(TIME)
    }

    /// All channel values of one record, in column order.
    pub fn record(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.len).then(|| self.columns.iter().map(|c| c[index]).collect())
    }

    /// Return a copy of this trace with one more channel appended.
    pub fn with_channel(&self, name: impl Into<String>, samples: Vec<f64>) -> Result<Trace> {
        let name = name.into();
        if self.has_channel(&name) {
            return Err(TraceError::DuplicateChannel(name));
        }
        if !self.names.is_empty() && samples.len() != self.len {
            return Err(TraceError::LengthMismatch {
                channel: name,
                expected: self.len,
                actual: samples.len(),
            });
        }

        let mut next = self.clone();
        next.len = samples.len();
        next.names.push(name);
        next.columns.push(samples);
        Ok(next)
    }

    /// Distinct variant suffixes of all `u`/`v` channels, in column order.
    pub fn variants(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in &self.names {
            if let Some(v) = variant_of(name) {
                if !out.iter().any(|o| o == v) {
                    out.push(v.to_string());
                }
            }
        }
        out
    }

    /// Every `u_X` / `v_X` pair present in the trace, ordered by the
    /// position of `u_X`.
    pub fn phase_pairs(&self) -> Vec<PhasePair<'_>> {
        self.names
            .iter()
            .filter(|n| ChannelKind::of(n) == ChannelKind::Primary)
            .filter_map(|u_name| {
                let v_name = derivative_name(u_name)?;
                Some(PhasePair {
                    variant: variant_of(u_name)?.to_string(),
                    u_name: u_name.clone(),
                    u: self.channel(u_name)?,
                    v: self.channel(&v_name)?,
                })
            })
            .collect()
    }
}

/// A `(u, v)` array pair for one variant, consumed by the phase portrait.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePair<'a> {
    pub variant: String,
    /// Name of the `u` channel; keys the colour of the pair.
    pub u_name: String,
    pub u: &'a [f64],
    pub v: &'a [f64],
}

impl PhasePair<'_> {
    pub fn is_reference(&self) -> bool {
        self.variant == EXACT_VARIANT
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records × [{}]", self.len, self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trace {
        Trace::new(vec![
            ("t".into(), vec![0.0, 0.5, 1.0]),
            ("u_rne".into(), vec![1.0, 0.9, 0.7]),
            ("v_rne".into(), vec![0.0, -0.4, -0.8]),
            ("u_sr".into(), vec![1.0, 0.875, 0.75]),
        ])
        .unwrap()
    }

    #[test]
    fn channel_kind_follows_name() {
        assert_eq!(ChannelKind::of("u"), ChannelKind::Primary);
        assert_eq!(ChannelKind::of("u_rne"), ChannelKind::Primary);
        assert_eq!(ChannelKind::of("v_exact"), ChannelKind::Derivative);
        assert_eq!(ChannelKind::of("t"), ChannelKind::Other);
        assert_eq!(ChannelKind::of("velocity"), ChannelKind::Other);
        assert_eq!(ChannelKind::of("u_"), ChannelKind::Other);
    }

    #[test]
    fn pairing_names() {
        assert_eq!(derivative_name("u_sr").as_deref(), Some("v_sr"));
        assert_eq!(derivative_name("u").as_deref(), Some("v"));
        assert_eq!(primary_name("v_exact").as_deref(), Some("u_exact"));
        assert_eq!(derivative_name("v_sr"), None);
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = Trace::new(vec![
            ("t".into(), vec![0.0, 1.0]),
            ("u".into(), vec![0.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, TraceError::LengthMismatch { actual: 1, .. }));
    }

    #[test]
    fn with_channel_leaves_original_untouched() {
        let trace = sample();
        let next = trace.with_channel("v_sr", vec![0.0, -0.25, -0.5]).unwrap();
        assert!(!trace.has_channel("v_sr"));
        assert_eq!(next.channel("v_sr"), Some(&[0.0, -0.25, -0.5][..]));
        assert_eq!(next.len(), trace.len());

        assert!(matches!(
            trace.with_channel("u_rne", vec![0.0; 3]),
            Err(TraceError::DuplicateChannel(_))
        ));
    }

    #[test]
    fn phase_pairs_only_complete() {
        let trace = sample();
        let pairs = trace.phase_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].variant, "rne");
        assert_eq!(trace.variants(), vec!["rne".to_string(), "sr".to_string()]);
    }

    #[test]
    fn record_reads_across_channels() {
        let trace = sample();
        assert_eq!(trace.record(1), Some(vec![0.5, 0.9, -0.4, 0.875]));
        assert_eq!(trace.record(3), None);
    }
}
