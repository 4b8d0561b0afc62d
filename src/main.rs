mod app;
mod catalog;
mod explorer;
mod graph;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogSnapshot;
use crate::explorer::{Explorer, ExplorerConfig};
use crate::graph::{LayoutConfig, LayoutMode};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON catalog snapshot; the bundled demo catalog is used when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// User id to explore right away.
    #[arg(long)]
    user: Option<String>,
    #[arg(long, value_enum, default_value_t = LayoutMode::Tree)]
    layout: LayoutMode,
    #[arg(long, default_value_t = 300.0)]
    level_spacing: f32,
    #[arg(long, default_value_t = 100.0)]
    node_spacing: f32,
    #[arg(long, default_value_t = 10)]
    max_recommendations: usize,
    #[arg(long, default_value_t = 3)]
    related_limit: usize,
    /// How long a finished expansion stays in the status line.
    #[arg(long, default_value_t = 3.0, value_parser = parse_status_secs)]
    status_secs: f64,
}

fn parse_status_secs(value: &str) -> Result<f64, String> {
    let secs = value
        .parse::<f64>()
        .map_err(|error| format!("invalid number of seconds: {error}"))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(format!("expected a finite, non-negative number of seconds, got {value}"))
    }
}

impl Args {
    fn explorer_config(&self) -> ExplorerConfig {
        ExplorerConfig {
            max_recommendations: self.max_recommendations,
            related_limit: self.related_limit,
            status_secs: self.status_secs,
            layout: LayoutConfig {
                mode: self.layout,
                level_spacing: self.level_spacing,
                node_spacing: self.node_spacing,
                ..LayoutConfig::default()
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let catalog = match &args.catalog {
        Some(path) => CatalogSnapshot::load(path)?,
        None => CatalogSnapshot::demo()?,
    };
    let catalog_summary = format!(
        "Catalog: {} items, {} users with recommendations",
        catalog.item_count(),
        catalog.user_count()
    );
    info!("{catalog_summary}");

    let explorer = Explorer::new(Arc::new(catalog), args.explorer_config());
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Recommendation Explorer",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RecGraphApp::new(
                cc,
                explorer,
                args.user,
                catalog_summary,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the explorer window: {error}"))
}
