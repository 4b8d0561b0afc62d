use std::time::Duration;

use eframe::egui::{self, Context, Vec2};

use crate::catalog::RelationMode;
use crate::explorer::{ExpansionStatus, Explorer, InteractionEvent};

mod controls;
mod details;
mod render_utils;
mod search;
mod view;

pub struct RecGraphApp {
    explorer: Explorer,
    user_input: String,
    relation_mode: RelationMode,
    search: String,
    pan: Vec2,
    zoom: f32,
    catalog_summary: String,
}

impl RecGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        explorer: Explorer,
        initial_user: Option<String>,
        catalog_summary: String,
    ) -> Self {
        let mut app = Self {
            explorer,
            user_input: initial_user.unwrap_or_default(),
            relation_mode: RelationMode::Complementary,
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 0.8,
            catalog_summary,
        };
        if !app.user_input.trim().is_empty() {
            let user = app.user_input.clone();
            app.submit_user(&user);
        }
        app
    }

    fn submit_user(&mut self, user_id: &str) {
        if self.explorer.submit_user(user_id) {
            self.pan = Vec2::ZERO;
            self.search.clear();
        }
    }

    fn reset(&mut self) {
        self.explorer.reset();
        self.pan = Vec2::ZERO;
        self.search.clear();
    }

    fn select(&mut self, node_id: String) {
        self.explorer
            .handle_event(InteractionEvent::NodeClick(node_id));
    }

    fn status_text(&self) -> Option<String> {
        match self.explorer.status() {
            ExpansionStatus::Idle => None,
            ExpansionStatus::InProgress(node_id) => {
                Some(format!("Fetching related items for {node_id}..."))
            }
            ExpansionStatus::Done(node_id) => {
                let report = self
                    .explorer
                    .last_report()
                    .filter(|report| report.key.node_id == *node_id);
                Some(match report {
                    Some(report) if report.failure.is_some() => {
                        format!("No related items found for {node_id}")
                    }
                    Some(report) if !report.outcome.changed() => {
                        format!("Nothing new to add for {node_id}")
                    }
                    Some(report) => format!(
                        "Added {} items and {} links for {node_id} ({} already shown)",
                        report.outcome.nodes_added,
                        report.outcome.edges_added,
                        report.outcome.nodes_present
                    ),
                    None => format!("Finished expanding {node_id}"),
                })
            }
        }
    }
}

impl eframe::App for RecGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);
        if self.explorer.poll(now) {
            ctx.request_repaint();
        }
        if self.explorer.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if let Some(delay) = self
            .explorer
            .seconds_until_idle(now)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            ctx.request_repaint_after(delay);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.explorer.store().node_count() == 0 {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Enter a user id to explore their recommendations.");
                    ui.label(self.catalog_summary.as_str());
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
