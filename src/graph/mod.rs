mod highlight;
mod layout;
mod store;

pub use highlight::{HighlightOverlay, HighlightRole, build_highlight, category_color};
pub use layout::{GraphLayout, LayoutConfig, LayoutMode, compute_layout};
pub use store::{
    ExpansionKey, GraphStore, MergeOutcome, NodeCategory, NodeMeta, NodeRecord, NodeSpec,
};

#[cfg(test)]
pub(crate) use store::Relation;
