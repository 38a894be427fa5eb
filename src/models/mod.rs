use serde::Deserialize;
use std::collections::BTreeMap;

/// A dataset as returned by the catalog's `/datasets` endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub collections: Vec<CollectionRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionRef {
    pub id: String,
    #[serde(default)]
    pub types: Vec<CollectionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    SourceImagery,
    Labels,
    #[serde(other)]
    Other,
}

impl Dataset {
    pub fn source_imagery(&self) -> impl Iterator<Item = &CollectionRef> {
        self.collections_of(CollectionType::SourceImagery)
    }

    pub fn labels(&self) -> impl Iterator<Item = &CollectionRef> {
        self.collections_of(CollectionType::Labels)
    }

    fn collections_of(&self, kind: CollectionType) -> impl Iterator<Item = &CollectionRef> {
        self.collections
            .iter()
            .filter(move |c| c.types.contains(&kind))
    }
}

/// A named group of items, holding only the items fetched so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: String,
    pub items: Vec<Item>,
}

/// A single STAC item. Assets are keyed by name and kept ordered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// GeoJSON feature collection wrapper returned by the items endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,
}
