use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rounding_trace::data::analyzer::{analyze, Analysis};
use rounding_trace::data::model::{Trace, TIME};
use rounding_trace::ValidationConfig;

use crate::color::ColorMap;

/// Which plot the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    TimeSeries,
    PhasePortrait,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// File the current trace came from.
    pub source: Option<PathBuf>,

    /// Cleaned trace as loaded (None until user loads a file).
    pub loaded: Option<Trace>,

    /// Result of the last validation pass over `loaded`.
    pub analysis: Option<Analysis>,

    pub config: ValidationConfig,

    /// Channels drawn in the time-series view.
    pub visible: BTreeSet<String>,

    pub color_map: Option<ColorMap>,

    pub mode: PlotMode,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            source: None,
            loaded: None,
            analysis: None,
            config: ValidationConfig::sanity(),
            visible: BTreeSet::new(),
            color_map: None,
            mode: PlotMode::PhasePortrait,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded trace and validate it.
    pub fn set_trace(&mut self, path: &Path, trace: Trace) {
        self.source = Some(path.to_path_buf());
        self.loaded = Some(trace);
        self.status_message = None;
        self.reanalyze();

        if let Some(analysis) = &self.analysis {
            let names = analysis.trace.channel_names();
            self.color_map = Some(ColorMap::new(names));
            self.visible = names.iter().filter(|n| *n != TIME).cloned().collect();
        }
    }

    /// Re-run validation after the trace or the config changed.
    pub fn reanalyze(&mut self) {
        let Some(trace) = &self.loaded else {
            return;
        };
        let analysis = analyze(trace, &self.config);
        self.status_message = if analysis.skipped.is_empty() {
            None
        } else {
            let channels: Vec<&str> =
                analysis.skipped.iter().map(|s| s.channel.as_str()).collect();
            Some(format!("No derivative rebuilt for {}", channels.join(", ")))
        };
        self.analysis = Some(analysis);
    }

    pub fn set_config(&mut self, config: ValidationConfig) {
        self.config = config;
        self.reanalyze();
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        if threshold != self.config.threshold {
            self.config.threshold = threshold;
            self.reanalyze();
        }
    }

    pub fn toggle_channel(&mut self, channel: &str) {
        if !self.visible.remove(channel) {
            self.visible.insert(channel.to_string());
        }
    }

    pub fn select_all(&mut self) {
        if let Some(analysis) = &self.analysis {
            self.visible = analysis
                .trace
                .channel_names()
                .iter()
                .filter(|n| *n != TIME)
                .cloned()
                .collect();
        }
    }

    pub fn select_none(&mut self) {
        self.visible.clear();
    }
}
