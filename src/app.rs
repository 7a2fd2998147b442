use eframe::egui;

use crate::color::EntityColors;
use crate::state::Session;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct WikiChronApp {
    pub session: Session,
    pub colors: EntityColors,
}

impl WikiChronApp {
    pub fn new(session: Session) -> Self {
        let colors = EntityColors::new(session.entities.len());
        Self { session, colors }
    }
}

impl eframe::App for WikiChronApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.session);
        });

        // ---- Left side panel: wiki / metric selection ----
        egui::SidePanel::left("selection_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.session, &self.colors);
            });

        // ---- Central panel: one plot per selected metric ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::metric_panels(ui, &self.session, &self.colors);
        });
    }
}
