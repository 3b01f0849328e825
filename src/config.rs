use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::analyzer::{CheckedChannels, ExactDerivative};

fn default_spacing_tolerance() -> f64 {
    1e-9
}

/// Settings for one validation pass.
///
/// `threshold` has no default: every call site states the bound it checks
/// against. JSON form:
///
/// ```json
/// { "threshold": 10.0, "checked": "derivatives", "exact_derivative": "analytic" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Records with `|x| > threshold` on a checked channel are reported.
    pub threshold: f64,
    #[serde(default)]
    pub checked: CheckedChannels,
    #[serde(default)]
    pub exact_derivative: ExactDerivative,
    /// Allowed time-step deviation, relative to the mean step.
    #[serde(default = "default_spacing_tolerance")]
    pub spacing_tolerance: f64,
}

impl ValidationConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            checked: CheckedChannels::default(),
            exact_derivative: ExactDerivative::default(),
            spacing_tolerance: default_spacing_tolerance(),
        }
    }

    /// `|v| > 1`: the oscillator's velocity never leaves the unit circle.
    pub fn strict() -> Self {
        Self::with_threshold(1.0)
    }

    /// `|v| > 10`: only catches outright divergence.
    pub fn sanity() -> Self {
        Self::with_threshold(10.0)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing validation config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            bail!("threshold must be a finite non-negative number, got {}", self.threshold);
        }
        if !self.spacing_tolerance.is_finite() || self.spacing_tolerance < 0.0 {
            bail!(
                "spacing_tolerance must be a finite non-negative number, got {}",
                self.spacing_tolerance
            );
        }
        Ok(())
    }
}
