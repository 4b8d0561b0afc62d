use eframe::egui::{self, RichText, Ui};

use crate::catalog::RelationMode;
use crate::explorer::ExpansionState;
use crate::graph::{NodeMeta, category_color};
use crate::util::{format_rating, user_id_of};

use super::RecGraphApp;

impl RecGraphApp {
    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        let Some(node) = self.explorer.selected_node().cloned() else {
            ui.heading("Details");
            ui.add_space(6.0);
            ui.label("Click a node in the graph to see its details.");
            return;
        };

        let mut expand_request = None;

        match &node.meta {
            NodeMeta::User {
                recommendation_count,
            } => {
                ui.heading("User Details");
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!("User ID: {}", user_id_of(&node.id)))
                        .color(category_color(node.category()))
                        .strong(),
                );
                ui.label(format!("{recommendation_count} recommendations"));
            }
            NodeMeta::Item {
                predicted_rating,
                title,
                description,
                image,
            } => {
                ui.heading("Product Details");
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(title.as_deref().unwrap_or("Unknown Product")).strong(),
                    );
                    if let Some(rating) = predicted_rating {
                        ui.label(format_rating(*rating));
                    }
                });
                ui.small(format!("ID: {}", node.id));
                if let Some(image) = image {
                    ui.hyperlink_to("Product image", image);
                }
                if let Some(parent) = &node.parent {
                    ui.label(format!("Reached from: {parent}"));
                }

                if let Some(description) = description {
                    ui.separator();
                    ui.label(RichText::new("Description").strong());
                    egui::ScrollArea::vertical()
                        .id_salt("description_scroll")
                        .max_height(180.0)
                        .show(ui, |ui| ui.label(description.as_str()));
                }

                ui.separator();
                ui.label(RichText::new("Expand").strong());
                for mode in RelationMode::ALL {
                    let state = self.explorer.expansion_state(&node.id, mode);
                    let text = match state {
                        ExpansionState::NotStarted => format!("Find {} items", mode.label()),
                        ExpansionState::InProgress => format!("Fetching {} items...", mode.label()),
                        ExpansionState::Completed => format!("{} items added", mode.label()),
                    };
                    let enabled = state == ExpansionState::NotStarted;
                    let button = ui.add_enabled(enabled, egui::Button::new(text));
                    let button = if mode == self.relation_mode {
                        button.highlight()
                    } else {
                        button
                    };
                    if button.clicked() {
                        expand_request = Some(mode);
                    }
                }
                ui.small("Double-click a node to expand it with the selected relation.");
            }
        }

        ui.separator();
        let store = self.explorer.store();
        ui.label(format!(
            "Links: {} in / {} out",
            store.incoming_count(&node.id),
            store.outgoing_count(&node.id)
        ));

        if let Some(mode) = expand_request {
            self.relation_mode = mode;
            self.explorer.expand_selected(mode);
        }
    }
}
