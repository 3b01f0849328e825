use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, TraceError};
use super::model::{derivative_name, variant_of, ChannelKind, Trace, EXACT_VARIANT, TIME};
use crate::config::ValidationConfig;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Which channels are compared against the anomaly threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckedChannels {
    /// Only `v`-class channels (rates of change).
    #[default]
    Derivatives,
    /// Every channel except `t`.
    All,
    /// Exactly these channels; names absent from the trace are skipped.
    Named(Vec<String>),
}

impl CheckedChannels {
    /// Resolve the policy to concrete channel names of `trace`, in column order.
    pub fn resolve(&self, trace: &Trace) -> Vec<String> {
        let names = trace.channel_names();
        match self {
            CheckedChannels::Derivatives => names
                .iter()
                .filter(|n| ChannelKind::of(n) == ChannelKind::Derivative)
                .cloned()
                .collect(),
            CheckedChannels::All => names.iter().filter(|n| *n != TIME).cloned().collect(),
            CheckedChannels::Named(wanted) => {
                for missing in wanted.iter().filter(|w| !trace.has_channel(w)) {
                    log::warn!("Checked channel '{missing}' is not in the trace");
                }
                names.iter().filter(|n| wanted.contains(n)).cloned().collect()
            }
        }
    }
}

/// How a missing `v_exact` is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactDerivative {
    /// Closed form of the reference oscillator, `v(t) = -sin(t)`.
    #[default]
    Analytic,
    /// Same finite difference as every other variant.
    FiniteDifference,
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

/// One flagged record, with all of its original values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Position in the cleaned trace.
    pub index: usize,
    pub values: Vec<f64>,
    /// Checked channels whose magnitude exceeded the threshold.
    pub exceeded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub threshold: f64,
    /// Column names for [`Anomaly::values`].
    pub columns: Vec<String>,
    pub checked: Vec<String>,
    pub anomalies: Vec<Anomaly>,
}

impl AnomalyReport {
    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Flag every record where `|value| > threshold` on at least one checked
/// channel. The trace is not modified.
pub fn detect_anomalies(trace: &Trace, threshold: f64, checked: &CheckedChannels) -> AnomalyReport {
    let checked = checked.resolve(trace);
    let slices: Vec<(&String, &[f64])> = checked
        .iter()
        .filter_map(|name| trace.channel(name).map(|c| (name, c)))
        .collect();

    let anomalies = (0..trace.len())
        .filter_map(|index| {
            let exceeded: Vec<String> = slices
                .iter()
                .filter(|(_, samples)| samples[index].abs() > threshold)
                .map(|(name, _)| (*name).clone())
                .collect();
            if exceeded.is_empty() {
                return None;
            }
            Some(Anomaly {
                index,
                values: trace.record(index)?,
                exceeded,
            })
        })
        .collect();

    AnomalyReport {
        threshold,
        columns: trace.channel_names().to_vec(),
        checked,
        anomalies,
    }
}

impl fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(
                f,
                "no anomalies found (|x| > {} on [{}])",
                self.threshold,
                self.checked.join(", ")
            );
        }

        writeln!(
            f,
            "{} record(s) exceed |x| > {} on [{}]:",
            self.len(),
            self.threshold,
            self.checked.join(", ")
        )?;
        write!(f, "{:>8}", "index")?;
        for col in &self.columns {
            write!(f, " {col:>12}")?;
        }
        for anomaly in &self.anomalies {
            write!(f, "\n{:>8}", anomaly.index)?;
            for v in &anomaly.values {
                write!(f, " {v:>12.6}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Derivative reconstruction
// ---------------------------------------------------------------------------

/// Numerical derivative of `u` with respect to `t`.
///
/// One-sided differences at both ends, second-order central differences in
/// the interior (reduces to `(u[i+1] - u[i-1]) / (2h)` for uniform spacing).
/// Assumes `t` is strictly increasing; this is not checked here.
pub fn gradient(t: &[f64], u: &[f64]) -> Result<Vec<f64>> {
    if t.len() != u.len() {
        return Err(TraceError::LengthMismatch {
            channel: TIME.to_string(),
            expected: u.len(),
            actual: t.len(),
        });
    }
    let n = u.len();
    match n {
        0 => return Ok(Vec::new()),
        1 => return Err(TraceError::InsufficientSamples { needed: 2, actual: 1 }),
        _ => {}
    }

    let mut out = Vec::with_capacity(n);
    out.push((u[1] - u[0]) / (t[1] - t[0]));
    for i in 1..n - 1 {
        let hd = t[i] - t[i - 1];
        let hs = t[i + 1] - t[i];
        let num = hd * hd * u[i + 1] + (hs * hs - hd * hd) * u[i] - hs * hs * u[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((u[n - 1] - u[n - 2]) / (t[n - 1] - t[n - 2]));
    Ok(out)
}

/// Velocity of the reference oscillator `u(t) = cos(t)`.
pub fn harmonic_velocity(t: &[f64]) -> Vec<f64> {
    t.iter().map(|&tk| -tk.sin()).collect()
}

/// Primary channels that have no paired derivative channel.
pub fn missing_derivatives(trace: &Trace) -> Vec<String> {
    trace
        .channel_names()
        .iter()
        .filter(|n| ChannelKind::of(n) == ChannelKind::Primary)
        .filter(|n| derivative_name(n).is_some_and(|v| !trace.has_channel(&v)))
        .cloned()
        .collect()
}

/// Return a new trace with a derivative channel added for each of
/// `primaries`. Primaries that already have one are left alone.
///
/// Record count and order are preserved.
pub fn reconstruct_derivatives(
    trace: &Trace,
    primaries: &[String],
    exact: ExactDerivative,
) -> Result<Trace> {
    let mut out = trace.clone();

    for primary in primaries {
        let Some(v_name) = derivative_name(primary) else {
            log::warn!("'{primary}' is not a primary channel, skipping");
            continue;
        };
        if out.has_channel(&v_name) {
            continue;
        }
        let t = out
            .time()
            .ok_or_else(|| TraceError::MissingChannel(TIME.to_string()))?;

        let closed_form =
            variant_of(primary) == Some(EXACT_VARIANT) && exact == ExactDerivative::Analytic;
        let samples = if closed_form {
            log::debug!("{v_name}: closed-form reference velocity");
            harmonic_velocity(t)
        } else {
            let u = out
                .channel(primary)
                .ok_or_else(|| TraceError::MissingChannel(primary.clone()))?;
            log::debug!("{v_name}: finite difference of {primary}");
            gradient(t, u)?
        };

        out = out.with_channel(v_name, samples)?;
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Time-step uniformity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpacingReport {
    /// Mean step.
    pub step: f64,
    /// Largest `|dt - step|`.
    pub max_deviation: f64,
    pub strictly_increasing: bool,
    /// `max_deviation <= tolerance * |step|`.
    pub uniform: bool,
}

/// Check that `t` advances by a constant step. `None` without a `t` channel
/// or with fewer than two records.
pub fn check_spacing(trace: &Trace, tolerance: f64) -> Option<SpacingReport> {
    let t = trace.time()?;
    if t.len() < 2 {
        return None;
    }

    let steps: Vec<f64> = t.windows(2).map(|w| w[1] - w[0]).collect();
    let step = steps.iter().sum::<f64>() / steps.len() as f64;
    let max_deviation = steps
        .iter()
        .map(|dt| (dt - step).abs())
        .fold(0.0, f64::max);
    let strictly_increasing = steps.iter().all(|&dt| dt > 0.0);

    Some(SpacingReport {
        step,
        max_deviation,
        strictly_increasing,
        uniform: strictly_increasing && max_deviation <= tolerance * step.abs(),
    })
}

// ---------------------------------------------------------------------------
// Full pass
// ---------------------------------------------------------------------------

/// A primary channel whose derivative could not be rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDerivative {
    pub channel: String,
    pub reason: String,
}

/// Everything the presentation layer needs from one trace.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Input trace plus every derivative channel that could be rebuilt.
    pub trace: Trace,
    pub report: AnomalyReport,
    pub spacing: Option<SpacingReport>,
    pub skipped: Vec<SkippedDerivative>,
}

/// Reconstruct missing derivatives, then flag anomalies on the result.
///
/// A primary whose derivative cannot be rebuilt (no `t`, a single record)
/// is listed in [`Analysis::skipped`]; detection still runs on the rest.
pub fn analyze(trace: &Trace, config: &ValidationConfig) -> Analysis {
    let spacing = check_spacing(trace, config.spacing_tolerance);
    match spacing {
        Some(s) if !s.uniform => log::warn!(
            "Non-uniform time step: mean {:.6e}, max deviation {:.3e}",
            s.step,
            s.max_deviation
        ),
        _ => {}
    }

    let missing = missing_derivatives(trace);
    if !missing.is_empty() {
        log::info!("Reconstructing derivatives for {missing:?}");
    }

    let mut augmented = trace.clone();
    let mut skipped = Vec::new();
    for primary in missing {
        let single = std::slice::from_ref(&primary);
        match reconstruct_derivatives(&augmented, single, config.exact_derivative) {
            Ok(next) => augmented = next,
            Err(e) => {
                log::warn!("Cannot rebuild derivative of {primary}: {e}");
                skipped.push(SkippedDerivative {
                    channel: primary,
                    reason: e.to_string(),
                });
            }
        }
    }

    let report = detect_anomalies(&augmented, config.threshold, &config.checked);
    if report.is_empty() {
        log::info!("{report}");
    } else {
        log::warn!("{report}");
    }

    Analysis {
        trace: augmented,
        report,
        spacing,
        skipped,
    }
}
