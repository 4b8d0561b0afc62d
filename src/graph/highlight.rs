use std::collections::HashMap;

use eframe::egui::Color32;

use super::store::{EdgeKey, EdgeRecord, NodeCategory, NodeRecord, Relation};

pub const USER_COLOR: Color32 = Color32::from_rgb(0x42, 0x85, 0xf4);
pub const ITEM_COLOR: Color32 = Color32::from_rgb(0x34, 0xa8, 0x53);
pub const DIRECT_EDGE_COLOR: Color32 = Color32::from_rgb(0xda, 0xda, 0xda);
pub const COMPLEMENTARY_EDGE_COLOR: Color32 = Color32::from_rgb(0xf4, 0xb4, 0x00);
pub const SUBSTITUTE_EDGE_COLOR: Color32 = Color32::from_rgb(0xab, 0x47, 0xbc);
pub const INCOMING_COLOR: Color32 = Color32::from_rgb(0xea, 0x43, 0x35);
pub const OUTGOING_COLOR: Color32 = Color32::from_rgb(0x00, 0xac, 0xc1);
pub const MUTED_COLOR: Color32 = Color32::from_rgb(0x3c, 0x40, 0x43);

pub fn category_color(category: NodeCategory) -> Color32 {
    match category {
        NodeCategory::User => USER_COLOR,
        NodeCategory::Item => ITEM_COLOR,
    }
}

pub fn relation_color(relation: Relation) -> Color32 {
    match relation {
        Relation::Direct => DIRECT_EDGE_COLOR,
        Relation::Complementary => COMPLEMENTARY_EDGE_COLOR,
        Relation::Substitute => SUBSTITUTE_EDGE_COLOR,
    }
}

/// How a node or edge relates to the hovered node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightRole {
    Intrinsic,
    Incoming,
    Outgoing,
    Muted,
}

impl HighlightRole {
    fn color(self, intrinsic: Color32) -> Color32 {
        match self {
            Self::Intrinsic => intrinsic,
            Self::Incoming => INCOMING_COLOR,
            Self::Outgoing => OUTGOING_COLOR,
            Self::Muted => MUTED_COLOR,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightOverlay {
    pub node_roles: HashMap<String, HighlightRole>,
    pub node_colors: HashMap<String, Color32>,
    pub edge_roles: HashMap<EdgeKey, HighlightRole>,
    pub edge_colors: HashMap<EdgeKey, Color32>,
}

impl HighlightOverlay {
    pub fn node_role(&self, id: &str) -> Option<HighlightRole> {
        self.node_roles.get(id).copied()
    }

    pub fn node_color(&self, id: &str) -> Option<Color32> {
        self.node_colors.get(id).copied()
    }

    pub fn edge_color(&self, source: &str, target: &str) -> Option<Color32> {
        self.edge_colors
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }

    pub fn edge_role(&self, source: &str, target: &str) -> Option<HighlightRole> {
        self.edge_roles
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }
}

/// Style overlay for the current hover target. Incoming links are applied
/// before outgoing ones, so a node on both sides ends up outgoing.
pub fn build_highlight(
    nodes: &[NodeRecord],
    edges: &[EdgeRecord],
    hovered_id: Option<&str>,
) -> HighlightOverlay {
    let hovered_id = hovered_id.filter(|id| nodes.iter().any(|node| node.id == *id));

    let mut node_roles = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let role = match hovered_id {
            None => HighlightRole::Intrinsic,
            Some(hovered) if hovered == node.id => HighlightRole::Intrinsic,
            Some(_) => HighlightRole::Muted,
        };
        node_roles.insert(node.id.clone(), role);
    }

    let default_edge_role = if hovered_id.is_some() {
        HighlightRole::Muted
    } else {
        HighlightRole::Intrinsic
    };
    let mut edge_roles = edges
        .iter()
        .map(|edge| (edge.key(), default_edge_role))
        .collect::<HashMap<_, _>>();

    if let Some(hovered) = hovered_id {
        collect_linked(edges, hovered, false, &mut node_roles, &mut edge_roles);
        collect_linked(edges, hovered, true, &mut node_roles, &mut edge_roles);
    }

    let node_colors = nodes
        .iter()
        .map(|node| {
            let role = node_roles
                .get(&node.id)
                .copied()
                .unwrap_or(HighlightRole::Intrinsic);
            (node.id.clone(), role.color(category_color(node.category())))
        })
        .collect();
    let edge_colors = edges
        .iter()
        .map(|edge| {
            let key = edge.key();
            let role = edge_roles
                .get(&key)
                .copied()
                .unwrap_or(HighlightRole::Intrinsic);
            (key, role.color(relation_color(edge.relation)))
        })
        .collect();

    HighlightOverlay {
        node_roles,
        node_colors,
        edge_roles,
        edge_colors,
    }
}

fn collect_linked(
    edges: &[EdgeRecord],
    hovered: &str,
    forward: bool,
    node_roles: &mut HashMap<String, HighlightRole>,
    edge_roles: &mut HashMap<EdgeKey, HighlightRole>,
) {
    let role = if forward {
        HighlightRole::Outgoing
    } else {
        HighlightRole::Incoming
    };

    for edge in edges {
        let (anchor, other) = if forward {
            (&edge.source, &edge.target)
        } else {
            (&edge.target, &edge.source)
        };
        if anchor != hovered || other == hovered {
            continue;
        }

        node_roles.insert(other.clone(), role);
        edge_roles.insert(edge.key(), role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store::{GraphStore, item_spec};

    fn scenario_store() -> GraphStore {
        let mut store = GraphStore::new();
        store.seed("user-42", "User 42", vec![item_spec("P1"), item_spec("P2")]);
        store.merge("P1", Relation::Complementary, vec![item_spec("P3")]);
        store
    }

    #[test]
    fn no_hover_uses_intrinsic_colors() {
        let store = scenario_store();
        let overlay = build_highlight(store.nodes(), store.edges(), None);

        assert_eq!(overlay.node_color("user-42"), Some(USER_COLOR));
        assert_eq!(overlay.node_color("P3"), Some(ITEM_COLOR));
        assert_eq!(overlay.edge_color("user-42", "P1"), Some(DIRECT_EDGE_COLOR));
        assert_eq!(overlay.edge_color("P1", "P3"), Some(COMPLEMENTARY_EDGE_COLOR));
        assert!(
            overlay
                .node_roles
                .values()
                .all(|role| *role == HighlightRole::Intrinsic)
        );
    }

    #[test]
    fn hover_marks_incoming_outgoing_and_muted() {
        let store = scenario_store();
        let overlay = build_highlight(store.nodes(), store.edges(), Some("P1"));

        assert_eq!(overlay.node_role("P1"), Some(HighlightRole::Intrinsic));
        assert_eq!(overlay.node_color("P1"), Some(ITEM_COLOR));
        assert_eq!(overlay.node_color("user-42"), Some(INCOMING_COLOR));
        assert_eq!(overlay.node_color("P3"), Some(OUTGOING_COLOR));
        assert_eq!(overlay.node_color("P2"), Some(MUTED_COLOR));

        assert_eq!(overlay.edge_color("user-42", "P1"), Some(INCOMING_COLOR));
        assert_eq!(overlay.edge_color("P1", "P3"), Some(OUTGOING_COLOR));
        assert_eq!(overlay.edge_color("user-42", "P2"), Some(MUTED_COLOR));
    }

    #[test]
    fn every_other_node_gets_exactly_one_role() {
        let mut store = scenario_store();
        store.merge("P2", Relation::Substitute, vec![item_spec("P3"), item_spec("P4")]);
        store.merge("P3", Relation::Complementary, vec![item_spec("P2")]);

        for hovered in store.nodes().iter().map(|node| node.id.clone()) {
            let overlay = build_highlight(store.nodes(), store.edges(), Some(hovered.as_str()));
            assert_eq!(overlay.node_roles.len(), store.node_count());
            for node in store.nodes() {
                let role = overlay.node_role(&node.id).unwrap();
                if node.id == hovered {
                    assert_eq!(role, HighlightRole::Intrinsic);
                } else {
                    assert_ne!(role, HighlightRole::Intrinsic);
                }
            }
        }
    }

    #[test]
    fn node_on_both_sides_resolves_to_outgoing() {
        let mut store = scenario_store();
        store.merge("P3", Relation::Substitute, vec![item_spec("P1")]);

        let overlay = build_highlight(store.nodes(), store.edges(), Some("P1"));
        assert_eq!(overlay.node_role("P3"), Some(HighlightRole::Outgoing));
        assert_eq!(overlay.edge_role("P3", "P1"), Some(HighlightRole::Incoming));
        assert_eq!(overlay.edge_role("P1", "P3"), Some(HighlightRole::Outgoing));
    }

    #[test]
    fn unknown_hover_target_is_ignored() {
        let store = scenario_store();
        let overlay = build_highlight(store.nodes(), store.edges(), Some("ghost"));
        assert_eq!(overlay, build_highlight(store.nodes(), store.edges(), None));
    }

    #[test]
    fn overlay_leaves_store_untouched() {
        let store = scenario_store();
        let before = store.edges().to_vec();
        let _ = build_highlight(store.nodes(), store.edges(), Some("P1"));
        assert_eq!(store.edges(), before.as_slice());
    }
}
