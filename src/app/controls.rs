use eframe::egui::{self, Align, Key, Layout, RichText, Ui};

use crate::catalog::RelationMode;
use crate::graph::LayoutMode;

use super::RecGraphApp;
use super::search::best_match;

impl RecGraphApp {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Recommendation Explorer");
            ui.separator();

            let input = ui.add(
                egui::TextEdit::singleline(&mut self.user_input)
                    .hint_text("Enter User ID")
                    .desired_width(140.0),
            );
            let submitted = input.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
            if ui.button("Show Recommendations").clicked() || submitted {
                let user = self.user_input.clone();
                self.submit_user(&user);
            }
            if ui.button("Reset").clicked() {
                self.reset();
            }

            ui.separator();
            ui.label("Relation:");
            for mode in RelationMode::ALL {
                ui.selectable_value(&mut self.relation_mode, mode, mode.label());
            }

            ui.separator();
            ui.label("Layout:");
            let mut layout_mode = self.explorer.layout_mode();
            for mode in [LayoutMode::Tree, LayoutMode::Radial] {
                ui.selectable_value(&mut layout_mode, mode, mode.label());
            }
            if layout_mode != self.explorer.layout_mode() {
                self.explorer.set_layout_mode(layout_mode);
                self.pan = egui::Vec2::ZERO;
            }

            ui.separator();
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search labels")
                    .desired_width(160.0),
            );
            if search.lost_focus()
                && ui.input(|input| input.key_pressed(Key::Enter))
                && let Some(node_id) = best_match(self.explorer.store().nodes(), &self.search)
            {
                self.select(node_id);
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let store = self.explorer.store();
                ui.label(format!(
                    "nodes: {}  edges: {}",
                    store.node_count(),
                    store.edge_count()
                ));
                if let Some(status) = self.status_text() {
                    ui.separator();
                    ui.label(RichText::new(status).italics());
                    if self.explorer.has_pending() {
                        ui.spinner();
                    }
                }
            });
        });
    }
}
