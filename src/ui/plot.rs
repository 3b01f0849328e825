use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotBounds, PlotPoints};

use rounding_trace::data::analyzer::Analysis;
use rounding_trace::data::model::TIME;

use crate::state::AppState;

/// Both phase-portrait axes span `[-PHASE_LIMIT, PHASE_LIMIT]`.
pub const PHASE_LIMIT: f64 = 2.0;

fn variant_label(variant: &str) -> String {
    match variant {
        "exact" => "Exact".to_string(),
        "rne" => "RNE".to_string(),
        "sr" => "StochRnd".to_string(),
        "" => "u, v".to_string(),
        other => other.to_string(),
    }
}

fn current_analysis<'a>(ui: &mut Ui, state: &'a AppState) -> Option<&'a Analysis> {
    match &state.analysis {
        Some(analysis) => Some(analysis),
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a trace to plot it  (File → Open trace…)");
            });
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Every visible channel against `t` (or the record index without `t`).
pub fn time_series_plot(ui: &mut Ui, state: &AppState) {
    let Some(analysis) = current_analysis(ui, state) else {
        return;
    };
    let trace = &analysis.trace;
    let x: Vec<f64> = match trace.time() {
        Some(t) => t.to_vec(),
        None => (0..trace.len()).map(|i| i as f64).collect(),
    };

    Plot::new("time_series_plot")
        .legend(Legend::default())
        .x_axis_label(if trace.time().is_some() { "t" } else { "record" })
        .y_axis_label("value")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for name in trace.channel_names() {
                if name == TIME || !state.visible.contains(name) {
                    continue;
                }
                let Some(samples) = trace.channel(name) else {
                    continue;
                };
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(name))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let points: PlotPoints = x
                    .iter()
                    .zip(samples)
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                plot_ui.line(Line::new(points).name(name).color(color).width(1.5));
            }
        });
}

// ---------------------------------------------------------------------------
// Phase portrait
// ---------------------------------------------------------------------------

/// `u` against `v` for each variant, exact reference drawn solid and first.
pub fn phase_portrait(ui: &mut Ui, state: &AppState) {
    let Some(analysis) = current_analysis(ui, state) else {
        return;
    };
    let mut pairs = analysis.trace.phase_pairs();
    if pairs.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No u/v channel pairs in this trace");
        });
        return;
    }
    pairs.sort_by_key(|p| !p.is_reference());

    Plot::new("phase_portrait")
        .legend(Legend::default())
        .x_axis_label("u(t)")
        .y_axis_label("v(t)")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [-PHASE_LIMIT, -PHASE_LIMIT],
                [PHASE_LIMIT, PHASE_LIMIT],
            ));

            for pair in &pairs {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&pair.u_name))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let points: PlotPoints = pair
                    .u
                    .iter()
                    .zip(pair.v)
                    .map(|(&u, &v)| [u, v])
                    .collect();

                let line = Line::new(points)
                    .name(variant_label(&pair.variant))
                    .color(color);
                let line = if pair.is_reference() {
                    line.width(2.0)
                } else {
                    line.width(1.5).style(LineStyle::dashed_loose())
                };
                plot_ui.line(line);
            }
        });
}
