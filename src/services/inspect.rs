//! Console summaries of catalog contents. Output is informational only.

use crate::models::{Collection, Dataset, Item};
use std::fmt::Write;

pub fn format_dataset_ids(datasets: &[Dataset]) -> String {
    let mut out = String::new();
    for dataset in datasets {
        let _ = writeln!(out, "{}", dataset.id);
    }
    out
}

pub fn format_collection_listing(dataset: &Dataset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source Imagery Collections");
    let _ = writeln!(out, "--------------------------");
    for collection in dataset.source_imagery() {
        let _ = writeln!(out, "{}", collection.id);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Label Collections");
    let _ = writeln!(out, "-----------------");
    for collection in dataset.labels() {
        let _ = writeln!(out, "{}", collection.id);
    }
    out
}

pub fn format_item_summary(collection_id: &str, item: &Item) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Collection: {}", collection_id);
    let _ = writeln!(out, "Item: {}", item.id);
    let _ = writeln!(out, "Assets:");
    for (name, asset) in &item.assets {
        let _ = writeln!(
            out,
            "- {}: {} [{}]",
            name,
            asset.title.as_deref().unwrap_or("<untitled>"),
            asset.media_type.as_deref().unwrap_or("unknown")
        );
    }
    out
}

pub fn format_collection_summary(collection: &Collection) -> String {
    collection
        .items
        .iter()
        .map(|item| format_item_summary(&collection.id, item))
        .collect::<Vec<_>>()
        .join("\n")
}
