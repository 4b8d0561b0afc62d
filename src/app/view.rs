use std::collections::{HashMap, HashSet};

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

use crate::explorer::InteractionEvent;
use crate::graph::HighlightRole;
use crate::util::{LABEL_MAX_CHARS, truncate_label};

use super::RecGraphApp;
use super::render_utils::{
    circle_visible, draw_background, node_radius, screen_to_world, trim_segment, world_to_screen,
};
use super::search::search_matches;

impl RecGraphApp {
    fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 5.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Closest node under the pointer, if any.
    fn hovered_node(ui: &Ui, screen: &[(String, Pos2, f32)]) -> Option<String> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        screen
            .iter()
            .filter_map(|(id, position, radius)| {
                let distance = position.distance(pointer);
                (distance <= *radius + 2.0).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.clone())
    }

    fn sync_hover(&mut self, hovered: Option<&String>) {
        if hovered.map(String::as_str) == self.explorer.hovered() {
            return;
        }

        let event = match hovered {
            Some(id) => InteractionEvent::HoverEnter(id.clone()),
            None => InteractionEvent::HoverLeave,
        };
        self.explorer.handle_event(event);
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let layout = self.explorer.layout();
        let screen = self
            .explorer
            .store()
            .nodes()
            .iter()
            .filter_map(|node| {
                let world = layout.position(&node.id)?;
                Some((
                    node.id.clone(),
                    world_to_screen(rect, self.pan, self.zoom, world),
                    node_radius(node.category(), self.zoom),
                ))
            })
            .collect::<Vec<_>>();

        let hovered = if response.hovered() || response.dragged() {
            Self::hovered_node(ui, &screen)
        } else {
            None
        };
        self.sync_hover(hovered.as_ref());
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if let Some(id) = &hovered {
            if response.double_clicked() {
                self.select(id.clone());
                self.explorer.expand(id, self.relation_mode);
            } else if response.clicked_by(egui::PointerButton::Primary) {
                self.select(id.clone());
            }
        }

        let overlay = self.explorer.highlight();
        let search_hits = search_matches(self.explorer.store().nodes(), &self.search)
            .into_iter()
            .collect::<HashSet<_>>();
        let by_id = screen
            .iter()
            .map(|(id, position, radius)| (id.as_str(), (*position, *radius)))
            .collect::<HashMap<_, _>>();

        let edge_width = (1.6 * self.zoom.sqrt()).clamp(0.8, 3.5);
        for edge in self.explorer.store().edges() {
            let (Some(&(start, start_radius)), Some(&(end, end_radius))) =
                (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str()))
            else {
                continue;
            };
            let Some((start, end)) = trim_segment(start, end, start_radius, end_radius) else {
                continue;
            };
            let color = overlay
                .edge_color(&edge.source, &edge.target)
                .unwrap_or(Color32::GRAY);
            let width = match overlay.edge_role(&edge.source, &edge.target) {
                Some(HighlightRole::Incoming | HighlightRole::Outgoing) => edge_width * 1.8,
                _ => edge_width,
            };
            painter.arrow(start, end - start, Stroke::new(width, color));
        }

        let selected = self.explorer.selected();
        for (id, position, radius) in &screen {
            if !circle_visible(rect, *position, *radius) {
                continue;
            }
            let Some(node) = self.explorer.store().node(id) else {
                continue;
            };

            let color = overlay.node_color(id).unwrap_or(Color32::GRAY);
            let linked = matches!(
                overlay.node_role(id),
                Some(HighlightRole::Incoming | HighlightRole::Outgoing)
            );
            painter.circle_filled(*position, *radius, color);
            painter.circle_stroke(
                *position,
                *radius,
                Stroke::new(
                    if linked { 2.2 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(30, 30, 30, 160),
                ),
            );

            if selected == Some(id.as_str()) {
                painter.circle_stroke(
                    *position,
                    *radius + 4.0,
                    Stroke::new(2.0, Color32::from_rgb(245, 166, 35)),
                );
            }
            if search_hits.contains(id) {
                painter.circle_stroke(
                    *position,
                    *radius + 8.0,
                    Stroke::new(1.5, Color32::from_rgb(66, 133, 244)),
                );
            }

            painter.text(
                *position + vec2(*radius + 5.0, 0.0),
                Align2::LEFT_CENTER,
                truncate_label(&node.label, LABEL_MAX_CHARS),
                FontId::proportional(13.0),
                Color32::from_gray(40),
            );
        }

        if let Some(node) = hovered.as_deref().and_then(|id| self.explorer.store().node(id)) {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  level {}  |  in {}  |  out {}",
                    node.label,
                    layout.level(&node.id).unwrap_or_default(),
                    self.explorer.store().incoming_count(&node.id),
                    self.explorer.store().outgoing_count(&node.id)
                ),
                FontId::proportional(13.0),
                Color32::from_gray(30),
            );
        }
    }
}
