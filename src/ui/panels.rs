use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::EntityColors;
use crate::state::Session;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the wiki and metric multi-selects.
pub fn side_panel(ui: &mut Ui, session: &mut Session, colors: &EntityColors) {
    ui.heading("You are comparing");
    ui.separator();

    // Clone what we need so we can mutate the session inside the loops.
    let entities = session.entities.clone();
    let metric_labels = session.metric_labels.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Wikis ----
            let header = format!(
                "Wikis  ({}/{})",
                session.selection.entities.len(),
                entities.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("wikis_selection")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            session.select_all_entities();
                        }
                        if ui.small_button("None").clicked() {
                            session.select_no_entities();
                        }
                    });

                    for (idx, name) in entities.iter().enumerate() {
                        let mut checked = session.selection.entities.contains(&idx);
                        let text = RichText::new(name).color(colors.color_for(idx));
                        if ui.checkbox(&mut checked, text).changed() {
                            session.toggle_entity(idx);
                        }
                    }
                });

            ui.separator();

            // ---- Metrics ----
            let header = format!(
                "Metrics  ({}/{})",
                session.selection.metrics.len(),
                metric_labels.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("metrics_selection")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            session.select_all_metrics();
                        }
                        if ui.small_button("None").clicked() {
                            session.select_no_metrics();
                        }
                    });

                    for (idx, label) in metric_labels.iter().enumerate() {
                        let mut checked = session.selection.metrics.contains(&idx);
                        if ui.checkbox(&mut checked, label.as_str()).changed() {
                            session.toggle_metric(idx);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, session: &mut Session) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export panels…").clicked() {
                export_dialog(session);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("WIKI CHRON");
        ui.separator();

        let shown = session
            .curves()
            .rows()
            .flatten()
            .filter(|c| c.is_shown())
            .count();
        ui.label(format!(
            "{} wikis × {} metrics, {shown} curves plotted",
            session.series.n_entities(),
            session.series.n_metrics(),
        ));

        ui.separator();
        ui.label(format!("x axis: {}", session.axis.axis_label()));

        if let Some(msg) = &session.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(session: &mut Session) {
    let file = rfd::FileDialog::new()
        .set_title("Export panels")
        .add_filter("JSON", &["json"])
        .set_file_name("panels.json")
        .save_file();

    if let Some(path) = file {
        match session.export_panels(&path) {
            Ok(()) => session.status_message = None,
            Err(e) => {
                log::error!("Failed to export panels: {e:#}");
                session.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
