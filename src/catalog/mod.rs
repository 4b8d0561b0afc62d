mod snapshot;

pub use snapshot::CatalogSnapshot;

use thiserror::Error;

/// Which related-item query an expansion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationMode {
    Complementary,
    Substitute,
}

impl RelationMode {
    pub const ALL: [Self; 2] = [Self::Complementary, Self::Substitute];

    pub fn label(self) -> &'static str {
        match self {
            Self::Complementary => "complementary",
            Self::Substitute => "substitute",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub item_id: String,
    pub predicted_rating: f32,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("catalog has no record for {0}")]
    UnknownNode(String),
}

/// Read side of the recommendation catalog. Implementations are shared with
/// background fetch workers, hence `Send + Sync`.
pub trait Catalog: Send + Sync {
    fn item(&self, item_id: &str) -> Option<ItemRecord>;

    /// Recommendations for a user, in no particular order.
    fn recommendations_for(&self, user_id: &str) -> Vec<Recommendation>;

    /// Related item ids in catalog order. An empty vector means no results.
    fn related(&self, item_id: &str, mode: RelationMode) -> Result<Vec<String>, CatalogError>;
}
