use eframe::egui;

use crate::state::{AppState, PlotMode};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct TraceViewerApp {
    pub state: AppState,
}

impl eframe::App for TraceViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: validation settings + channels ----
        egui::SidePanel::left("channel_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: flagged records ----
        egui::TopBottomPanel::bottom("anomaly_panel")
            .default_height(180.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::anomaly_table(ui, &self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.mode {
            PlotMode::TimeSeries => plot::time_series_plot(ui, &self.state),
            PlotMode::PhasePortrait => plot::phase_portrait(ui, &self.state),
        });
    }
}
