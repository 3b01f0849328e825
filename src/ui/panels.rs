use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rounding_trace::data::analyzer::{AnomalyReport, CheckedChannels};
use rounding_trace::data::loader::load_any;
use rounding_trace::data::model::TIME;
use rounding_trace::ValidationConfig;

use crate::state::{AppState, PlotMode};

// ---------------------------------------------------------------------------
// Left side panel – validation settings and channel toggles
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Validation");
    ui.separator();

    let mut threshold = state.config.threshold;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Threshold |x| >");
        ui.add(
            egui::DragValue::new(&mut threshold)
                .speed(0.1)
                .range(0.0..=1.0e6),
        );
    });
    state.set_threshold(threshold);

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Strict (1)").clicked() {
            state.set_threshold(ValidationConfig::strict().threshold);
        }
        if ui.small_button("Sanity (10)").clicked() {
            state.set_threshold(ValidationConfig::sanity().threshold);
        }
    });

    let policy_label = match &state.config.checked {
        CheckedChannels::Derivatives => "derivative channels".to_string(),
        CheckedChannels::All => "all channels".to_string(),
        CheckedChannels::Named(names) => names.join(", "),
    };
    egui::ComboBox::from_id_salt("checked_channels")
        .selected_text(policy_label)
        .show_ui(ui, |ui: &mut Ui| {
            let mut next = None;
            let derivatives = state.config.checked == CheckedChannels::Derivatives;
            if ui
                .selectable_label(derivatives, "derivative channels")
                .clicked()
            {
                next = Some(CheckedChannels::Derivatives);
            }
            if ui
                .selectable_label(state.config.checked == CheckedChannels::All, "all channels")
                .clicked()
            {
                next = Some(CheckedChannels::All);
            }
            if let Some(checked) = next {
                let mut config = state.config.clone();
                config.checked = checked;
                state.set_config(config);
            }
        });

    let Some(analysis) = &state.analysis else {
        ui.label("No trace loaded.");
        return;
    };

    if let Some(spacing) = &analysis.spacing {
        if !spacing.uniform {
            ui.label(
                RichText::new(format!(
                    "Non-uniform time step (mean {:.3e}, max dev {:.3e})",
                    spacing.step, spacing.max_deviation
                ))
                .color(Color32::YELLOW),
            );
        }
    }

    let summary = if analysis.report.is_empty() {
        RichText::new("No anomalies found").color(Color32::GREEN)
    } else {
        RichText::new(format!("{} flagged record(s)", analysis.report.len())).color(Color32::RED)
    };
    ui.label(summary);

    ui.add_space(8.0);
    ui.heading("Channels");
    ui.separator();

    let channels: Vec<String> = analysis
        .trace
        .channel_names()
        .iter()
        .filter(|n| *n != TIME)
        .cloned()
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for name in &channels {
                let mut text = RichText::new(name);
                if let Some(cm) = &state.color_map {
                    text = text.color(cm.color_for(name));
                }
                let mut checked = state.visible.contains(name);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_channel(name);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open trace…").clicked() {
                open_trace_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load validation config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
            let has_report = state.analysis.is_some();
            if ui
                .add_enabled(has_report, egui::Button::new("Export anomaly report…"))
                .clicked()
            {
                export_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .selectable_label(state.mode == PlotMode::PhasePortrait, "Phase portrait")
            .clicked()
        {
            state.mode = PlotMode::PhasePortrait;
        }
        if ui
            .selectable_label(state.mode == PlotMode::TimeSeries, "Time series")
            .clicked()
        {
            state.mode = PlotMode::TimeSeries;
        }

        ui.separator();

        if let (Some(path), Some(analysis)) = (&state.source, &state.analysis) {
            ui.label(format!(
                "{}: {} records",
                path.file_name().and_then(|n| n.to_str()).unwrap_or("trace"),
                analysis.trace.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom panel – flagged records
// ---------------------------------------------------------------------------

pub fn anomaly_table(ui: &mut Ui, state: &AppState) {
    let Some(analysis) = &state.analysis else {
        ui.label("No trace loaded.");
        return;
    };
    let report = &analysis.report;
    if report.is_empty() {
        ui.label(RichText::new(report.to_string()).color(Color32::GREEN));
        return;
    }

    ui.strong(format!(
        "{} record(s) with |x| > {} on {}",
        report.len(),
        report.threshold,
        report.checked.join(", ")
    ));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(50.0))
        .columns(Column::auto().at_least(80.0), report.columns.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("index");
            });
            for name in &report.columns {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for anomaly in &report.anomalies {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(anomaly.index.to_string());
                    });
                    for (name, value) in report.columns.iter().zip(&anomaly.values) {
                        row.col(|ui| {
                            let mut text = RichText::new(format!("{value:.6}"));
                            if anomaly.exceeded.contains(name) {
                                text = text.color(Color32::RED);
                            }
                            ui.label(text);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_trace_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open oscillator trace")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match load_any(&path) {
            Ok(trace) => {
                log::info!("Loaded {trace}");
                state.set_trace(&path, trace);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load validation config")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match ValidationConfig::from_json_file(&path) {
            Ok(config) => {
                log::info!("Validation config: {config:?}");
                state.status_message = None;
                state.set_config(config);
            }
            Err(e) => {
                log::error!("Failed to load config: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_report_dialog(state: &mut AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export anomaly report")
        .set_file_name("anomalies.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = write_report(&path, &analysis.report) {
            log::error!("Failed to export report: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn write_report(path: &Path, report: &AnomalyReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing anomaly report")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} flagged record(s) to {}", report.len(), path.display());
    Ok(())
}
