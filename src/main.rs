mod app;
mod color;
mod config;
mod data;
mod error;
mod graph;
mod matrix;
mod metrics;
mod state;
mod ui;

use anyhow::Context;
use app::WikiChronApp;
use clap::Parser;
use config::Args;
use eframe::egui;
use metrics::MetricRegistry;
use state::Session;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let registry = MetricRegistry::new();

    if args.list_metrics {
        println!("{} metrics available:", registry.len());
        for (idx, metric) in registry.iter().enumerate() {
            println!("{idx:>2}  {:<12} {}", metric.id(), metric.label());
        }
        return Ok(());
    }

    log::info!(
        "Loading {} wikis from {}",
        args.entities.len(),
        args.data_dir.display()
    );
    let session = Session::load(&args, &registry)
        .inspect_err(|e| log::error!("Load failed: {e}"))
        .context("loading dashboard data")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "WikiChron",
        options,
        Box::new(|_cc| Ok(Box::new(WikiChronApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
