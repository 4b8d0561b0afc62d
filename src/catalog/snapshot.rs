use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::{Catalog, CatalogError, ItemRecord, Recommendation, RelationMode};

const DEMO_SNAPSHOT: &str = include_str!("../../demos/sample_catalog.json");

#[derive(Clone, Debug, Deserialize)]
struct RawItem {
    product_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawRecommendation {
    user_id: String,
    product_id: String,
    #[serde(default)]
    predicted_rating: f32,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawRelated {
    #[serde(default)]
    complementary: HashMap<String, Vec<String>>,
    #[serde(default)]
    substitute: HashMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    related: RawRelated,
}

/// In-memory catalog built from a JSON snapshot.
#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    items: HashMap<String, ItemRecord>,
    recommendations: HashMap<String, Vec<Recommendation>>,
    complementary: HashMap<String, Vec<String>>,
    substitute: HashMap<String, Vec<String>>,
}

impl CatalogSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog snapshot {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("failed to parse catalog snapshot {}", path.display()))
    }

    pub fn demo() -> Result<Self> {
        Self::parse(DEMO_SNAPSHOT).context("bundled demo catalog is invalid")
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: RawSnapshot = serde_json::from_str(raw).context("invalid catalog JSON")?;

        let mut items = HashMap::with_capacity(parsed.items.len());
        for raw_item in parsed.items {
            let id = raw_item.product_id.trim().to_string();
            if id.is_empty() {
                continue;
            }
            items.insert(
                id.clone(),
                ItemRecord {
                    id,
                    title: raw_item.title.trim().to_string(),
                    description: raw_item.description.filter(|text| !text.trim().is_empty()),
                    image: raw_item.images.filter(|url| !url.trim().is_empty()),
                },
            );
        }

        let mut recommendations: HashMap<String, Vec<Recommendation>> = HashMap::new();
        for raw_rec in parsed.recommendations {
            let user_id = raw_rec.user_id.trim().to_string();
            let item_id = raw_rec.product_id.trim().to_string();
            if user_id.is_empty() || item_id.is_empty() {
                continue;
            }
            recommendations.entry(user_id).or_default().push(Recommendation {
                item_id,
                predicted_rating: raw_rec.predicted_rating,
            });
        }

        if items.is_empty() && recommendations.is_empty() {
            return Err(anyhow!("catalog snapshot has neither items nor recommendations"));
        }

        Ok(Self {
            items,
            recommendations,
            complementary: normalize_related(parsed.related.complementary),
            substitute: normalize_related(parsed.related.substitute),
        })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn user_count(&self) -> usize {
        self.recommendations.len()
    }
}

fn normalize_related(raw: HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    raw.into_iter()
        .map(|(key, values)| {
            let key = key.trim().to_string();
            let mut seen = Vec::with_capacity(values.len());
            for value in values {
                let value = value.trim().to_string();
                if !value.is_empty() && value != key && !seen.contains(&value) {
                    seen.push(value);
                }
            }
            (key, seen)
        })
        .collect()
}

impl Catalog for CatalogSnapshot {
    fn item(&self, item_id: &str) -> Option<ItemRecord> {
        self.items.get(item_id.trim()).cloned()
    }

    fn recommendations_for(&self, user_id: &str) -> Vec<Recommendation> {
        self.recommendations
            .get(user_id.trim())
            .cloned()
            .unwrap_or_default()
    }

    fn related(&self, item_id: &str, mode: RelationMode) -> Result<Vec<String>, CatalogError> {
        let table = match mode {
            RelationMode::Complementary => &self.complementary,
            RelationMode::Substitute => &self.substitute,
        };

        match table.get(item_id) {
            Some(related) => Ok(related.clone()),
            None if self.items.contains_key(item_id) => Ok(Vec::new()),
            None => Err(CatalogError::UnknownNode(item_id.to_string())),
        }
    }
}
