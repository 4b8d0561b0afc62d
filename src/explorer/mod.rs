mod expansion;

pub use expansion::{ExpansionController, ExpansionReport, ExpansionState, ExpansionStatus};

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{Catalog, RelationMode};
use crate::graph::{
    ExpansionKey, GraphLayout, GraphStore, HighlightOverlay, LayoutConfig, LayoutMode, NodeMeta,
    NodeRecord, NodeSpec, build_highlight, compute_layout,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplorerConfig {
    pub max_recommendations: usize,
    pub related_limit: usize,
    pub status_secs: f64,
    pub layout: LayoutConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 10,
            related_limit: 3,
            status_secs: 3.0,
            layout: LayoutConfig::default(),
        }
    }
}

/// Raw events coming back from the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    NodeClick(String),
    HoverEnter(String),
    HoverLeave,
}

pub fn root_node_id(user_id: &str) -> String {
    format!("user-{user_id}")
}

/// Node for `item_id`, falling back to a placeholder label when the catalog
/// has no record of it.
pub(crate) fn item_node_spec(
    catalog: &dyn Catalog,
    item_id: &str,
    predicted_rating: Option<f32>,
) -> NodeSpec {
    let record = catalog.item(item_id);
    let title = record
        .as_ref()
        .map(|record| record.title.clone())
        .filter(|title| !title.is_empty());

    NodeSpec {
        id: record
            .as_ref()
            .map_or_else(|| item_id.to_string(), |record| record.id.clone()),
        label: title
            .clone()
            .unwrap_or_else(|| format!("Product {item_id}")),
        meta: NodeMeta::Item {
            predicted_rating,
            title,
            description: record.as_ref().and_then(|record| record.description.clone()),
            image: record.and_then(|record| record.image),
        },
    }
}

/// One exploration session: the graph, what is selected and hovered, and the
/// expansions running against it.
pub struct Explorer {
    catalog: Arc<dyn Catalog>,
    config: ExplorerConfig,
    store: GraphStore,
    expansions: ExpansionController,
    selected: Option<String>,
    hovered: Option<String>,
}

impl Explorer {
    pub fn new(catalog: Arc<dyn Catalog>, config: ExplorerConfig) -> Self {
        Self {
            catalog,
            expansions: ExpansionController::new(config.related_limit, config.status_secs),
            config,
            store: GraphStore::new(),
            selected: None,
            hovered: None,
        }
    }

    /// Seeds the graph with `user_id` and its best-rated recommendations.
    pub fn submit_user(&mut self, user_id: &str) -> bool {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            debug!("ignoring empty user id");
            return false;
        }

        let mut recommendations = self.catalog.recommendations_for(user_id);
        recommendations.sort_by(|a, b| b.predicted_rating.total_cmp(&a.predicted_rating));
        recommendations.truncate(self.config.max_recommendations);

        let children = recommendations
            .iter()
            .map(|rec| {
                item_node_spec(
                    self.catalog.as_ref(),
                    rec.item_id.trim(),
                    Some(rec.predicted_rating),
                )
            })
            .collect::<Vec<_>>();

        let root_id = root_node_id(user_id);
        let outcome = self
            .store
            .seed(&root_id, &format!("User {user_id}"), children);
        self.expansions.reset();
        self.hovered = None;
        self.selected = Some(root_id);

        info!(user_id, recommendations = outcome.nodes_added, "seeded graph");
        true
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.expansions.reset();
        self.selected = None;
        self.hovered = None;
        info!("graph reset");
    }

    pub fn handle_event(&mut self, event: InteractionEvent) {
        match event {
            InteractionEvent::NodeClick(id) => {
                if self.store.contains(&id) {
                    self.selected = Some(id);
                } else {
                    debug!(node_id = %id, "click on unknown node");
                }
            }
            InteractionEvent::HoverEnter(id) => {
                if self.store.contains(&id) {
                    self.hovered = Some(id);
                }
            }
            InteractionEvent::HoverLeave => self.hovered = None,
        }
    }

    pub fn expand(&mut self, node_id: &str, mode: RelationMode) -> bool {
        self.expansions.request(
            &self.store,
            ExpansionKey::new(node_id, mode),
            Arc::clone(&self.catalog),
        )
    }

    pub fn expand_selected(&mut self, mode: RelationMode) -> bool {
        match self.selected.clone() {
            Some(node_id) => self.expand(&node_id, mode),
            None => false,
        }
    }

    /// Applies finished expansions and ages the status. Returns whether the
    /// graph structure changed.
    pub fn poll(&mut self, now: f64) -> bool {
        let reports = self.expansions.poll(&mut self.store, now);
        self.expansions.tick(&self.store, now);

        reports.iter().any(|report| report.outcome.changed())
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_node(&self) -> Option<&NodeRecord> {
        self.selected.as_deref().and_then(|id| self.store.node(id))
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn status(&self) -> &ExpansionStatus {
        self.expansions.status()
    }

    pub fn last_report(&self) -> Option<&ExpansionReport> {
        self.expansions.last_report()
    }

    pub fn has_pending(&self) -> bool {
        self.expansions.has_pending()
    }

    pub fn seconds_until_idle(&self, now: f64) -> Option<f64> {
        self.expansions.seconds_until_idle(now)
    }

    pub fn expansion_state(&self, node_id: &str, mode: RelationMode) -> ExpansionState {
        self.expansions
            .state(&self.store, &ExpansionKey::new(node_id, mode))
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.config.layout.mode
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.config.layout.mode = mode;
    }

    pub fn layout(&self) -> GraphLayout {
        compute_layout(self.store.nodes(), self.store.root_id(), &self.config.layout)
    }

    pub fn highlight(&self) -> HighlightOverlay {
        build_highlight(self.store.nodes(), self.store.edges(), self.hovered())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::catalog::{CatalogError, ItemRecord, Recommendation};
    use crate::graph::{HighlightRole, MergeOutcome, Relation};

    #[derive(Default)]
    struct MockCatalog {
        related_calls: AtomicUsize,
        failing: bool,
        gate: Option<Mutex<Receiver<()>>>,
    }

    impl MockCatalog {
        fn gated() -> (Self, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            (
                Self {
                    gate: Some(Mutex::new(rx)),
                    ..Self::default()
                },
                tx,
            )
        }
    }

    impl Catalog for MockCatalog {
        fn item(&self, item_id: &str) -> Option<ItemRecord> {
            (item_id != "P404").then(|| ItemRecord {
                id: item_id.to_string(),
                title: format!("Title {item_id}"),
                description: None,
                image: None,
            })
        }

        fn recommendations_for(&self, user_id: &str) -> Vec<Recommendation> {
            if user_id != "42" {
                return Vec::new();
            }
            vec![
                Recommendation {
                    item_id: "P2".to_string(),
                    predicted_rating: 3.5,
                },
                Recommendation {
                    item_id: "P1".to_string(),
                    predicted_rating: 4.5,
                },
            ]
        }

        fn related(&self, item_id: &str, mode: RelationMode) -> Result<Vec<String>, CatalogError> {
            self.related_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().map(|rx| rx.recv());
            }
            if self.failing {
                return Err(CatalogError::Unavailable("timeout".to_string()));
            }
            Ok(match (item_id, mode) {
                ("P1", RelationMode::Complementary) => vec!["P3".to_string(), "P1".to_string()],
                ("P1", RelationMode::Substitute) => vec!["P2".to_string(), "P404".to_string()],
                _ => Vec::new(),
            })
        }
    }

    fn explorer_with(catalog: Arc<MockCatalog>) -> Explorer {
        let mut explorer = Explorer::new(catalog, ExplorerConfig::default());
        assert!(explorer.submit_user("42"));
        explorer
    }

    fn settle(explorer: &mut Explorer, now: f64) {
        for _ in 0..1000 {
            explorer.poll(now);
            if !explorer.has_pending() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("expansion never finished");
    }

    fn wait_for_done(explorer: &mut Explorer, now: f64) -> String {
        for _ in 0..1000 {
            explorer.poll(now);
            if let ExpansionStatus::Done(node_id) = explorer.status() {
                return node_id.clone();
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("no expansion finished");
    }

    #[test]
    fn submit_seeds_root_with_rated_children() {
        let explorer = explorer_with(Arc::new(MockCatalog::default()));
        let store = explorer.store();

        assert_eq!(store.node_count(), 3);
        assert_eq!(store.edge_count(), 2);
        let ids = store.nodes().iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["user-42", "P1", "P2"]);
        assert_eq!(explorer.selected(), Some("user-42"));
        assert_eq!(store.node("P1").unwrap().label, "Title P1");

        let layout = explorer.layout();
        assert_eq!(layout.level("user-42"), Some(0));
        let p1 = layout.position("P1").unwrap();
        let p2 = layout.position("P2").unwrap();
        assert_eq!(p1.y, -p2.y);
        assert_ne!(p1.y, p2.y);
    }

    #[test]
    fn blank_user_is_ignored() {
        let mut explorer = explorer_with(Arc::new(MockCatalog::default()));
        assert!(!explorer.submit_user("   "));
        assert_eq!(explorer.store().node_count(), 3);
    }

    #[test]
    fn max_recommendations_caps_children() {
        let config = ExplorerConfig {
            max_recommendations: 1,
            ..ExplorerConfig::default()
        };
        let mut explorer = Explorer::new(Arc::new(MockCatalog::default()), config);
        explorer.submit_user("42");
        assert_eq!(explorer.store().node_count(), 2);
        assert!(explorer.store().contains("P1"));
    }

    #[test]
    fn expansion_runs_once_per_node_and_mode() {
        let catalog = Arc::new(MockCatalog::default());
        let mut explorer = explorer_with(Arc::clone(&catalog));
        let mode = RelationMode::Complementary;

        assert_eq!(explorer.expansion_state("P1", mode), ExpansionState::NotStarted);
        assert!(explorer.expand("P1", mode));
        assert_eq!(explorer.status(), &ExpansionStatus::InProgress("P1".to_string()));
        settle(&mut explorer, 1.0);

        assert_eq!(explorer.expansion_state("P1", mode), ExpansionState::Completed);
        assert_eq!(explorer.status(), &ExpansionStatus::Done("P1".to_string()));
        assert!(explorer.store().contains("P3"));
        assert_eq!(explorer.store().node_count(), 4);
        assert_eq!(explorer.store().edge_count(), 3);

        assert!(!explorer.expand("P1", mode));
        settle(&mut explorer, 1.5);
        assert_eq!(catalog.related_calls.load(Ordering::SeqCst), 1);
        assert_eq!(explorer.store().node_count(), 4);
        assert_eq!(explorer.store().edge_count(), 3);
    }

    #[test]
    fn poll_reports_only_graph_changes() {
        let catalog = Arc::new(MockCatalog::default());
        let mut explorer = explorer_with(Arc::clone(&catalog));

        let mut changed = false;
        assert!(explorer.expand("P1", RelationMode::Complementary));
        for _ in 0..1000 {
            changed |= explorer.poll(0.0);
            if !explorer.has_pending() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(changed);
        assert!(!explorer.poll(0.5));

        assert!(explorer.expand("P3", RelationMode::Complementary));
        let mut changed = false;
        for _ in 0..1000 {
            changed |= explorer.poll(1.0);
            if !explorer.has_pending() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!changed);
        assert_eq!(explorer.status(), &ExpansionStatus::Done("P3".to_string()));
    }

    #[test]
    fn switching_mode_is_a_separate_expansion() {
        let catalog = Arc::new(MockCatalog::default());
        let mut explorer = explorer_with(Arc::clone(&catalog));

        assert!(explorer.expand("P1", RelationMode::Complementary));
        settle(&mut explorer, 0.0);
        assert!(explorer.expand("P1", RelationMode::Substitute));
        settle(&mut explorer, 0.0);

        assert_eq!(catalog.related_calls.load(Ordering::SeqCst), 2);
        let store = explorer.store();
        assert_eq!(store.edge("P1", "P2").unwrap().relation, Relation::Substitute);
        assert_eq!(store.node("P2").unwrap().parent.as_deref(), Some("user-42"));
        assert_eq!(store.node("P404").unwrap().label, "Product P404");

        let report = explorer.last_report().unwrap();
        assert_eq!(
            report.outcome,
            MergeOutcome {
                nodes_added: 1,
                nodes_present: 1,
                edges_added: 2,
                edges_present: 0,
            }
        );
    }

    #[test]
    fn in_progress_pair_rejects_duplicates_but_not_other_pairs() {
        let (catalog, gate) = MockCatalog::gated();
        let catalog = Arc::new(catalog);
        let mut explorer = explorer_with(Arc::clone(&catalog));

        assert!(explorer.expand("P1", RelationMode::Complementary));
        assert_eq!(
            explorer.expansion_state("P1", RelationMode::Complementary),
            ExpansionState::InProgress
        );
        assert!(!explorer.expand("P1", RelationMode::Complementary));
        assert!(explorer.expand("P2", RelationMode::Complementary));

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        settle(&mut explorer, 0.0);

        assert_eq!(catalog.related_calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            explorer.expansion_state("P2", RelationMode::Complementary),
            ExpansionState::Completed
        );
    }

    #[test]
    fn expired_done_status_falls_back_to_running_fetch() {
        let (catalog, gate) = MockCatalog::gated();
        let mut explorer = explorer_with(Arc::new(catalog));

        assert!(explorer.expand("P1", RelationMode::Complementary));
        assert!(explorer.expand("P2", RelationMode::Complementary));

        gate.send(()).unwrap();
        let first = wait_for_done(&mut explorer, 0.0);
        let second = if first == "P1" { "P2" } else { "P1" };
        assert!(explorer.has_pending());

        explorer.poll(2.0);
        assert_eq!(explorer.status(), &ExpansionStatus::Done(first.clone()));
        explorer.poll(3.0);
        assert_eq!(
            explorer.status(),
            &ExpansionStatus::InProgress(second.to_string())
        );

        gate.send(()).unwrap();
        settle(&mut explorer, 3.0);
        assert_eq!(explorer.status(), &ExpansionStatus::Done(second.to_string()));

        explorer.poll(6.0);
        assert_eq!(explorer.status(), &ExpansionStatus::Idle);
    }

    #[test]
    fn failed_fetch_completes_without_changes() {
        let catalog = Arc::new(MockCatalog {
            failing: true,
            ..MockCatalog::default()
        });
        let mut explorer = explorer_with(Arc::clone(&catalog));

        assert!(explorer.expand("P1", RelationMode::Complementary));
        settle(&mut explorer, 10.0);

        assert_eq!(explorer.store().node_count(), 3);
        assert_eq!(
            explorer.expansion_state("P1", RelationMode::Complementary),
            ExpansionState::Completed
        );
        assert!(explorer.last_report().unwrap().failure.is_some());
        assert_eq!(explorer.status(), &ExpansionStatus::Done("P1".to_string()));

        explorer.poll(12.0);
        assert_eq!(explorer.status(), &ExpansionStatus::Done("P1".to_string()));
        explorer.poll(13.0);
        assert_eq!(explorer.status(), &ExpansionStatus::Idle);

        assert!(!explorer.expand("P1", RelationMode::Complementary));
        assert_eq!(catalog.related_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn user_node_cannot_be_expanded() {
        let catalog = Arc::new(MockCatalog::default());
        let mut explorer = explorer_with(Arc::clone(&catalog));
        assert!(!explorer.expand("user-42", RelationMode::Complementary));
        assert!(!explorer.expand("ghost", RelationMode::Complementary));
        assert_eq!(explorer.status(), &ExpansionStatus::Idle);
    }

    #[test]
    fn results_for_a_previous_graph_are_dropped() {
        let (catalog, gate) = MockCatalog::gated();
        let mut explorer = explorer_with(Arc::new(catalog));

        assert!(explorer.expand("P1", RelationMode::Complementary));
        explorer.submit_user("42");
        gate.send(()).unwrap();
        settle(&mut explorer, 0.0);

        assert!(!explorer.store().contains("P3"));
        assert_eq!(
            explorer.expansion_state("P1", RelationMode::Complementary),
            ExpansionState::NotStarted
        );
        assert_eq!(explorer.status(), &ExpansionStatus::Idle);
    }

    #[test]
    fn events_drive_selection_and_hover() {
        let catalog = Arc::new(MockCatalog::default());
        let mut explorer = explorer_with(catalog);
        assert!(explorer.expand("P1", RelationMode::Complementary));
        settle(&mut explorer, 0.0);

        explorer.handle_event(InteractionEvent::NodeClick("P2".to_string()));
        assert_eq!(explorer.selected(), Some("P2"));
        explorer.handle_event(InteractionEvent::NodeClick("ghost".to_string()));
        assert_eq!(explorer.selected(), Some("P2"));

        explorer.handle_event(InteractionEvent::HoverEnter("P1".to_string()));
        let overlay = explorer.highlight();
        assert_eq!(overlay.node_role("user-42"), Some(HighlightRole::Incoming));
        assert_eq!(overlay.node_role("P3"), Some(HighlightRole::Outgoing));
        assert_eq!(overlay.node_role("P2"), Some(HighlightRole::Muted));

        explorer.handle_event(InteractionEvent::HoverLeave);
        assert_eq!(explorer.hovered(), None);
        assert_eq!(explorer.highlight().node_role("P2"), Some(HighlightRole::Intrinsic));
    }

    #[test]
    fn reset_clears_session() {
        let mut explorer = explorer_with(Arc::new(MockCatalog::default()));
        explorer.handle_event(InteractionEvent::HoverEnter("P1".to_string()));
        explorer.reset();
        assert_eq!(explorer.store().node_count(), 0);
        assert_eq!(explorer.selected(), None);
        assert_eq!(explorer.hovered(), None);
        assert!(!explorer.expand_selected(RelationMode::Complementary));
    }
}
