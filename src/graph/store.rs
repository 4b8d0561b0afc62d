use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::catalog::RelationMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    User,
    Item,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeMeta {
    User {
        recommendation_count: usize,
    },
    Item {
        predicted_rating: Option<f32>,
        title: Option<String>,
        description: Option<String>,
        image: Option<String>,
    },
}

impl NodeMeta {
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::User { .. } => NodeCategory::User,
            Self::Item { .. } => NodeCategory::Item,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    /// Node whose expansion first introduced this one. Never rewritten.
    pub parent: Option<String>,
    pub meta: NodeMeta,
}

impl NodeRecord {
    pub fn category(&self) -> NodeCategory {
        self.meta.category()
    }
}

/// A node offered to the store by a seed or an expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub label: String,
    pub meta: NodeMeta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Direct,
    Complementary,
    Substitute,
}

impl Relation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Complementary => "complementary",
            Self::Substitute => "substitute",
        }
    }
}

impl From<RelationMode> for Relation {
    fn from(mode: RelationMode) -> Self {
        match mode {
            RelationMode::Complementary => Self::Complementary,
            RelationMode::Substitute => Self::Substitute,
        }
    }
}

pub type EdgeKey = (String, String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

impl EdgeRecord {
    pub fn key(&self) -> EdgeKey {
        (self.source.clone(), self.target.clone())
    }
}

/// One already-performed expansion: a node queried under one relation mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExpansionKey {
    pub node_id: String,
    pub mode: RelationMode,
}

impl ExpansionKey {
    pub fn new(node_id: impl Into<String>, mode: RelationMode) -> Self {
        Self {
            node_id: node_id.into(),
            mode,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub nodes_added: usize,
    pub nodes_present: usize,
    pub edges_added: usize,
    pub edges_present: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.nodes_added > 0 || self.edges_added > 0
    }
}

/// Authoritative node and edge tables for one exploration session.
///
/// Nodes and edges are kept in insertion order, which is what layout uses to
/// order nodes inside a level.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    root_id: Option<String>,
    nodes: Vec<NodeRecord>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<EdgeRecord>,
    edge_index: HashMap<EdgeKey, usize>,
    expanded: HashSet<ExpansionKey>,
    generation: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole graph with `root_id` and its direct children.
    pub fn seed(&mut self, root_id: &str, root_label: &str, children: Vec<NodeSpec>) -> MergeOutcome {
        if root_id.is_empty() {
            debug!("ignoring seed with an empty root id");
            return MergeOutcome::default();
        }

        self.reset();
        self.insert_node(NodeRecord {
            id: root_id.to_string(),
            label: root_label.to_string(),
            parent: None,
            meta: NodeMeta::User {
                recommendation_count: 0,
            },
        });
        self.root_id = Some(root_id.to_string());

        let outcome = self.merge(root_id, Relation::Direct, children);
        if let Some(root) = self.nodes.first_mut() {
            root.meta = NodeMeta::User {
                recommendation_count: outcome.edges_added,
            };
        }

        outcome
    }

    /// Adds unseen candidates under `parent_id` and links every candidate to
    /// it. Existing nodes keep their first parent.
    pub fn merge(&mut self, parent_id: &str, relation: Relation, candidates: Vec<NodeSpec>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if parent_id.is_empty() || !self.index_by_id.contains_key(parent_id) {
            debug!(parent_id, "ignoring merge under a node that is not in the graph");
            return outcome;
        }

        for candidate in candidates {
            if candidate.id.is_empty() || candidate.id == parent_id {
                continue;
            }

            if self.index_by_id.contains_key(&candidate.id) {
                outcome.nodes_present += 1;
            } else {
                self.insert_node(NodeRecord {
                    id: candidate.id.clone(),
                    label: candidate.label,
                    parent: Some(parent_id.to_string()),
                    meta: candidate.meta,
                });
                outcome.nodes_added += 1;
            }

            if self.insert_edge(parent_id, &candidate.id, relation) {
                outcome.edges_added += 1;
            } else {
                outcome.edges_present += 1;
            }
        }

        debug!(
            parent_id,
            relation = relation.label(),
            nodes_added = outcome.nodes_added,
            nodes_present = outcome.nodes_present,
            edges_added = outcome.edges_added,
            edges_present = outcome.edges_present,
            "merged candidates"
        );
        outcome
    }

    pub fn reset(&mut self) {
        self.root_id = None;
        self.nodes.clear();
        self.index_by_id.clear();
        self.edges.clear();
        self.edge_index.clear();
        self.expanded.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    fn insert_node(&mut self, node: NodeRecord) {
        self.index_by_id.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn insert_edge(&mut self, source: &str, target: &str, relation: Relation) -> bool {
        if !self.index_by_id.contains_key(source) || !self.index_by_id.contains_key(target) {
            return false;
        }

        if self.edge(source, target).is_some() {
            return false;
        }

        self.edge_index
            .insert((source.to_string(), target.to_string()), self.edges.len());
        self.edges.push(EdgeRecord {
            source: source.to_string(),
            target: target.to_string(),
            relation,
        });
        true
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeRecord> {
        self.edge_index
            .get(&(source.to_string(), target.to_string()))
            .map(|&index| &self.edges[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.source == id).count()
    }

    pub fn incoming_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.target == id).count()
    }

    pub fn is_expanded(&self, key: &ExpansionKey) -> bool {
        self.expanded.contains(key)
    }

    pub(crate) fn mark_expanded(&mut self, key: ExpansionKey) {
        self.expanded.insert(key);
    }

    /// Bumped on every seed and reset so late fetch results can be told apart
    /// from ones issued against the current graph.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
pub(crate) fn item_spec(id: &str) -> NodeSpec {
    NodeSpec {
        id: id.to_string(),
        label: format!("Item {id}"),
        meta: NodeMeta::Item {
            predicted_rating: None,
            title: None,
            description: None,
            image: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> GraphStore {
        let mut store = GraphStore::new();
        store.seed("user-42", "User 42", vec![item_spec("P1"), item_spec("P2")]);
        store
    }

    #[test]
    fn seed_builds_root_and_direct_children() {
        let store = seeded();
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.root_id(), Some("user-42"));
        assert_eq!(store.node("P1").unwrap().parent.as_deref(), Some("user-42"));
        assert_eq!(store.edge("user-42", "P2").unwrap().relation, Relation::Direct);
        assert_eq!(
            store.node("user-42").unwrap().meta,
            NodeMeta::User {
                recommendation_count: 2
            }
        );
    }

    #[test]
    fn seed_with_empty_root_keeps_previous_graph() {
        let mut store = seeded();
        let outcome = store.seed("", "nobody", vec![item_spec("P9")]);
        assert_eq!(outcome, MergeOutcome::default());
        assert_eq!(store.node_count(), 3);
        assert!(!store.contains("P9"));
    }

    #[test]
    fn seed_replaces_previous_graph_and_expansions() {
        let mut store = seeded();
        let key = ExpansionKey::new("P1", RelationMode::Complementary);
        store.mark_expanded(key.clone());
        let generation = store.generation();

        store.seed("user-7", "User 7", vec![item_spec("P5")]);
        assert!(!store.contains("P1"));
        assert_eq!(store.node_count(), 2);
        assert!(!store.is_expanded(&key));
        assert_ne!(store.generation(), generation);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut store = seeded();
        let first = store.merge("P1", Relation::Complementary, vec![item_spec("P3")]);
        assert_eq!(first.nodes_added, 1);
        assert_eq!(first.edges_added, 1);
        assert!(first.changed());

        let second = store.merge("P1", Relation::Complementary, vec![item_spec("P3")]);
        assert!(!second.changed());
        assert_eq!(second.nodes_present, 1);
        assert_eq!(second.edges_present, 1);
        assert_eq!(store.node_count(), 4);
        assert_eq!(store.edge_count(), 3);
    }

    #[test]
    fn merge_keeps_first_parent_but_adds_new_edge() {
        let mut store = seeded();
        store.merge("P1", Relation::Complementary, vec![item_spec("P3")]);
        let outcome = store.merge("P2", Relation::Substitute, vec![item_spec("P3")]);

        assert_eq!(outcome.nodes_added, 0);
        assert_eq!(outcome.edges_added, 1);
        assert_eq!(store.node("P3").unwrap().parent.as_deref(), Some("P1"));
        assert_eq!(store.incoming_count("P3"), 2);
        assert_eq!(store.edge("P2", "P3").unwrap().relation, Relation::Substitute);
    }

    #[test]
    fn merge_under_unknown_parent_is_a_no_op() {
        let mut store = seeded();
        let outcome = store.merge("ghost", Relation::Complementary, vec![item_spec("P3")]);
        assert_eq!(outcome, MergeOutcome::default());
        assert!(!store.contains("P3"));

        let outcome = store.merge("", Relation::Complementary, vec![item_spec("P3")]);
        assert_eq!(outcome, MergeOutcome::default());
    }

    #[test]
    fn merge_skips_self_links_and_blank_ids() {
        let mut store = seeded();
        let outcome = store.merge(
            "P1",
            Relation::Complementary,
            vec![item_spec("P1"), item_spec(""), item_spec("P4")],
        );
        assert_eq!(outcome.nodes_added, 1);
        assert_eq!(outcome.edges_added, 1);
        assert!(store.edge("P1", "P1").is_none());
    }

    #[test]
    fn merge_to_existing_ancestor_adds_back_edge_only() {
        let mut store = seeded();
        let outcome = store.merge("P1", Relation::Complementary, vec![item_spec("user-42")]);
        assert_eq!(outcome.nodes_present, 1);
        assert_eq!(outcome.edges_added, 1);
        assert_eq!(store.node("user-42").unwrap().parent, None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = seeded();
        store.mark_expanded(ExpansionKey::new("P2", RelationMode::Substitute));
        store.reset();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.root_id(), None);
        assert!(!store.is_expanded(&ExpansionKey::new("P2", RelationMode::Substitute)));
    }
}
