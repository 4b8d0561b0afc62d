use std::collections::{BTreeMap, HashMap};
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

use super::store::NodeRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LayoutMode {
    /// Left-to-right columns, one per level.
    #[default]
    Tree,
    /// Root in the middle, descendants fanned out around their parent.
    Radial,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Radial => "radial",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub level_spacing: f32,
    pub node_spacing: f32,
    pub radial_radius: f32,
    pub fan_spread: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Tree,
            level_spacing: 300.0,
            node_spacing: 100.0,
            radial_radius: 600.0,
            fan_spread: FRAC_PI_2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphLayout {
    pub positions: HashMap<String, Vec2>,
    pub levels: HashMap<String, usize>,
}

impl GraphLayout {
    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    pub fn level(&self, id: &str) -> Option<usize> {
        self.levels.get(id).copied()
    }
}

/// Level of every node: the root is 0, a parented node sits one below its
/// parent and anything else is treated as a flat recommendation at level 1.
pub fn compute_levels(nodes: &[NodeRecord], root_id: Option<&str>) -> HashMap<String, usize> {
    let mut levels = HashMap::with_capacity(nodes.len());

    for node in nodes {
        let level = if root_id == Some(node.id.as_str()) {
            0
        } else {
            match &node.parent {
                Some(parent) => levels.get(parent.as_str()).map_or(1, |level| level + 1),
                None => 1,
            }
        };
        levels.insert(node.id.clone(), level);
    }

    levels
}

/// Node ids per level, each group in insertion order.
fn group_by_level<'a>(
    nodes: &'a [NodeRecord],
    levels: &HashMap<String, usize>,
) -> BTreeMap<usize, Vec<&'a str>> {
    let mut groups: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for node in nodes {
        let level = levels.get(&node.id).copied().unwrap_or(1);
        groups.entry(level).or_default().push(node.id.as_str());
    }
    groups
}

/// Assigns coordinates to every node. Depends only on the node records and
/// their order, so repeated calls on the same snapshot agree exactly.
pub fn compute_layout(
    nodes: &[NodeRecord],
    root_id: Option<&str>,
    config: &LayoutConfig,
) -> GraphLayout {
    let levels = compute_levels(nodes, root_id);
    let positions = match config.mode {
        LayoutMode::Tree => tree_positions(nodes, &levels, config),
        LayoutMode::Radial => radial_positions(nodes, &levels, config),
    };

    GraphLayout { positions, levels }
}

fn tree_positions(
    nodes: &[NodeRecord],
    levels: &HashMap<String, usize>,
    config: &LayoutConfig,
) -> HashMap<String, Vec2> {
    let mut positions = HashMap::with_capacity(nodes.len());

    for (level, group) in group_by_level(nodes, levels) {
        let x = level as f32 * config.level_spacing;
        let start_y = -((group.len() as f32 - 1.0) / 2.0) * config.node_spacing;
        for (index, id) in group.into_iter().enumerate() {
            let y = start_y + index as f32 * config.node_spacing;
            positions.insert(id.to_string(), vec2(x, y));
        }
    }

    positions
}

fn radial_positions(
    nodes: &[NodeRecord],
    levels: &HashMap<String, usize>,
    config: &LayoutConfig,
) -> HashMap<String, Vec2> {
    let mut positions = HashMap::with_capacity(nodes.len());
    let mut angles: HashMap<&str, f32> = HashMap::with_capacity(nodes.len());
    let parent_of = nodes
        .iter()
        .filter_map(|node| node.parent.as_deref().map(|parent| (node.id.as_str(), parent)))
        .collect::<HashMap<_, _>>();

    for (level, group) in group_by_level(nodes, levels) {
        match level {
            0 => {
                for id in group {
                    positions.insert(id.to_string(), Vec2::ZERO);
                    angles.insert(id, 0.0);
                }
            }
            1 => {
                let step = TAU / group.len() as f32;
                for (index, id) in group.into_iter().enumerate() {
                    let angle = index as f32 * step;
                    positions.insert(id.to_string(), Vec2::angled(angle) * config.radial_radius);
                    angles.insert(id, angle);
                }
            }
            depth => {
                let mut siblings: Vec<(&str, Vec<&str>)> = Vec::new();
                for id in group {
                    let parent = parent_of.get(id).copied().unwrap_or_default();
                    match siblings.iter_mut().find(|(key, _)| *key == parent) {
                        Some((_, children)) => children.push(id),
                        None => siblings.push((parent, vec![id])),
                    }
                }

                let spread = config.fan_spread / (depth - 1) as f32;
                let reach = config.level_spacing * depth as f32 / 2.0;
                for (parent, children) in siblings {
                    let origin = positions.get(parent).copied().unwrap_or(Vec2::ZERO);
                    let base_angle = angles.get(parent).copied().unwrap_or(0.0);
                    let count = children.len();
                    for (index, id) in children.into_iter().enumerate() {
                        let offset = if count == 1 {
                            0.0
                        } else {
                            -spread / 2.0 + index as f32 * spread / (count - 1) as f32
                        };
                        let angle = base_angle + offset;
                        positions.insert(id.to_string(), origin + Vec2::angled(angle) * reach);
                        angles.insert(id, angle);
                    }
                }
            }
        }
    }

    positions
}
