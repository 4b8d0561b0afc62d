use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, RelationMode};
use crate::graph::{ExpansionKey, GraphStore, MergeOutcome, NodeCategory, NodeSpec};

use super::item_node_spec;

type FetchResult = Result<Vec<NodeSpec>, CatalogError>;

/// UI-facing progress of the most recent expansion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpansionStatus {
    #[default]
    Idle,
    InProgress(String),
    Done(String),
}

/// Lifecycle of one (node, mode) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpansionState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpansionReport {
    pub key: ExpansionKey,
    pub outcome: MergeOutcome,
    pub failure: Option<CatalogError>,
}

struct PendingFetch {
    key: ExpansionKey,
    generation: u64,
    rx: Receiver<FetchResult>,
}

pub struct ExpansionController {
    pending: Vec<PendingFetch>,
    status: ExpansionStatus,
    done_at: Option<f64>,
    display_secs: f64,
    related_limit: usize,
    last_report: Option<ExpansionReport>,
}

impl ExpansionController {
    pub fn new(related_limit: usize, display_secs: f64) -> Self {
        Self {
            pending: Vec::new(),
            status: ExpansionStatus::Idle,
            done_at: None,
            display_secs,
            related_limit,
            last_report: None,
        }
    }

    pub fn status(&self) -> &ExpansionStatus {
        &self.status
    }

    pub fn last_report(&self) -> Option<&ExpansionReport> {
        self.last_report.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn state(&self, store: &GraphStore, key: &ExpansionKey) -> ExpansionState {
        if store.is_expanded(key) {
            ExpansionState::Completed
        } else if self
            .pending
            .iter()
            .any(|pending| pending.key == *key && pending.generation == store.generation())
        {
            ExpansionState::InProgress
        } else {
            ExpansionState::NotStarted
        }
    }

    /// Starts a background fetch for `key` unless that pair has already been
    /// started. Returns whether a fetch was issued.
    pub fn request(
        &mut self,
        store: &GraphStore,
        key: ExpansionKey,
        catalog: Arc<dyn Catalog>,
    ) -> bool {
        let Some(node) = store.node(&key.node_id) else {
            debug!(node_id = %key.node_id, "ignoring expansion of a node outside the graph");
            return false;
        };
        if node.category() != NodeCategory::Item {
            debug!(node_id = %key.node_id, "only item nodes can be expanded");
            return false;
        }

        match self.state(store, &key) {
            ExpansionState::NotStarted => {}
            state => {
                debug!(node_id = %key.node_id, mode = key.mode.label(), ?state, "expansion already started");
                return false;
            }
        }

        info!(node_id = %key.node_id, mode = key.mode.label(), "expanding node");
        self.status = ExpansionStatus::InProgress(key.node_id.clone());
        self.done_at = None;

        let rx = Self::spawn_fetch(catalog, key.clone(), self.related_limit);
        self.pending.push(PendingFetch {
            key,
            generation: store.generation(),
            rx,
        });
        true
    }

    fn spawn_fetch(catalog: Arc<dyn Catalog>, key: ExpansionKey, limit: usize) -> Receiver<FetchResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = fetch_related(catalog.as_ref(), &key.node_id, key.mode, limit);
            let _ = tx.send(result);
        });

        rx
    }

    /// Merges every fetch that has finished since the last call.
    pub fn poll(&mut self, store: &mut GraphStore, now: f64) -> Vec<ExpansionReport> {
        let mut reports = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for pending in std::mem::take(&mut self.pending) {
            let result = match pending.rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => {
                    still_pending.push(pending);
                    continue;
                }
                Err(TryRecvError::Disconnected) => Err(CatalogError::Unavailable(
                    "fetch worker disconnected".to_owned(),
                )),
            };

            if let Some(report) = self.complete(store, pending.key, pending.generation, result, now) {
                reports.push(report);
            }
        }

        self.pending.extend(still_pending);
        reports
    }

    fn complete(
        &mut self,
        store: &mut GraphStore,
        key: ExpansionKey,
        generation: u64,
        result: FetchResult,
        now: f64,
    ) -> Option<ExpansionReport> {
        if generation != store.generation() {
            debug!(node_id = %key.node_id, "discarding expansion issued against a previous graph");
            return None;
        }

        let (candidates, failure) = match result {
            Ok(candidates) => (candidates, None),
            Err(error) => {
                warn!(node_id = %key.node_id, mode = key.mode.label(), %error, "related item fetch failed");
                (Vec::new(), Some(error))
            }
        };

        let outcome = store.merge(&key.node_id, key.mode.into(), candidates);
        store.mark_expanded(key.clone());
        info!(
            node_id = %key.node_id,
            mode = key.mode.label(),
            nodes_added = outcome.nodes_added,
            edges_added = outcome.edges_added,
            "expansion finished"
        );

        self.status = ExpansionStatus::Done(key.node_id.clone());
        self.done_at = Some(now);

        let report = ExpansionReport {
            key,
            outcome,
            failure,
        };
        self.last_report = Some(report.clone());
        Some(report)
    }

    /// Retires a `done` status once its display window has passed.
    pub fn tick(&mut self, store: &GraphStore, now: f64) {
        let Some(done_at) = self.done_at else {
            return;
        };
        if now - done_at < self.display_secs {
            return;
        }

        self.done_at = None;
        self.status = self
            .pending
            .iter()
            .rev()
            .find(|pending| pending.generation == store.generation())
            .map(|pending| ExpansionStatus::InProgress(pending.key.node_id.clone()))
            .unwrap_or(ExpansionStatus::Idle);
    }

    /// Forgets outstanding fetches. Their workers still run to completion but
    /// nothing listens for the result.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.status = ExpansionStatus::Idle;
        self.done_at = None;
        self.last_report = None;
    }

    pub fn seconds_until_idle(&self, now: f64) -> Option<f64> {
        self.done_at
            .map(|done_at| (done_at + self.display_secs - now).max(0.0))
    }
}

fn fetch_related(
    catalog: &dyn Catalog,
    node_id: &str,
    mode: RelationMode,
    limit: usize,
) -> FetchResult {
    let related = catalog.related(node_id, mode)?;
    Ok(related
        .into_iter()
        .filter(|id| id != node_id)
        .take(limit)
        .map(|id| item_node_spec(catalog, &id, None))
        .collect())
}
