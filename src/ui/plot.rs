use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoints};

use crate::color::EntityColors;
use crate::graph::{AxisMode, GraphCurve, x_to_period};
use crate::state::{Panel, Session};

const PANEL_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Metric panels (central panel)
// ---------------------------------------------------------------------------

/// Render one plot per panel produced by the last selection change.
pub fn metric_panels(ui: &mut Ui, session: &Session, colors: &EntityColors) {
    if session.panels.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select at least one metric to plot");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for panel in &session.panels {
                ui.label(RichText::new(&panel.title).strong().size(16.0));
                metric_plot(ui, panel, session.axis, colors);
                ui.add_space(8.0);
            }
        });
}

fn legend_name(curve: &GraphCurve) -> String {
    match &curve.unavailable {
        Some(_) => format!("{} (unavailable)", curve.label),
        None => curve.label.clone(),
    }
}

fn format_month(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    x_to_period(mark.value)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn metric_plot(ui: &mut Ui, panel: &Panel, axis: AxisMode, colors: &EntityColors) {
    // Legend-only curves are still added to the plot so they stay listed.
    let hidden: Vec<String> = panel
        .curves
        .iter()
        .filter(|c| !c.is_shown())
        .map(legend_name)
        .collect();

    let mut plot = Plot::new(("metric_panel", panel.metric))
        .height(PANEL_HEIGHT)
        .legend(Legend::default().hidden_items(hidden))
        .x_axis_label(axis.axis_label())
        .y_axis_label(panel.title.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);
    if axis == AxisMode::Absolute {
        plot = plot.x_axis_formatter(format_month);
    }

    plot.show(ui, |plot_ui| {
        for (entity, curve) in panel.curves.iter().enumerate() {
            let points: PlotPoints = curve
                .x
                .iter()
                .zip(curve.y.iter())
                .map(|(&xi, &yi)| [xi, yi])
                .collect();

            let line = Line::new(points)
                .name(legend_name(curve))
                .color(colors.color_for(entity))
                .width(1.5);

            plot_ui.line(line);
        }
    });

    for curve in panel.curves.iter().filter(|c| c.unavailable.is_some()) {
        if let Some(reason) = &curve.unavailable {
            ui.label(
                RichText::new(format!("{}: {reason}", curve.label))
                    .color(egui::Color32::YELLOW)
                    .small(),
            );
        }
    }
}
