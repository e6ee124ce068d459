//! Listing document validation and per-item mapping.
//!
//! Expected shape:
//!
//! ```text
//! { "status": 200,
//!   "data": { "items": [ { "id", "title", "description",
//!                          "metadata": { "author", "source", "timecode" } } ] } }
//! ```
//!
//! The document as a whole is either accepted or rejected. Individual
//! entries are never dropped: an entry with missing or odd fields maps to an
//! item with empty text and no source, so the catalog length always equals
//! the number of entries in an accepted document.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::error::{LoadFailure, RejectReason};
use crate::protocol::{Catalog, CatalogItem, Timecode};

const SUCCESS_STATUS: f64 = 200.0;

/// Decode, validate and map a listing document.
pub fn parse_listing(bytes: &[u8], generation: u64) -> Result<Catalog, LoadFailure> {
    let doc: Value =
        serde_json::from_slice(bytes).map_err(|e| LoadFailure::Decode(e.to_string()))?;
    catalog_from_value(&doc, generation)
}

pub fn parse_listing_str(content: &str, generation: u64) -> Result<Catalog, LoadFailure> {
    parse_listing(content.as_bytes(), generation)
}

pub fn catalog_from_value(doc: &Value, generation: u64) -> Result<Catalog, LoadFailure> {
    let entries = validate(doc).map_err(LoadFailure::Rejected)?;
    let items: Vec<CatalogItem> = entries.iter().map(map_entry).collect();
    warn_on_duplicate_ids(&items);
    Ok(Catalog::new(items, generation))
}

fn validate(doc: &Value) -> Result<&Vec<Value>, RejectReason> {
    match doc.get("status") {
        // Compared numerically so `200.0` counts the same as `200`.
        Some(status) if status.as_f64() == Some(SUCCESS_STATUS) => {}
        Some(other) => return Err(RejectReason::BadStatus(other.to_string())),
        None => return Err(RejectReason::BadStatus("missing".to_string())),
    }

    let items = doc
        .get("data")
        .and_then(|data| data.get("items"))
        .and_then(Value::as_array)
        .ok_or(RejectReason::MissingItems)?;

    if items.is_empty() {
        return Err(RejectReason::EmptyItems);
    }
    Ok(items)
}

/// Map one raw entry. `title`/`description` are top-level; presenter, source
/// and timecode live in the nested `metadata` block.
pub fn map_entry(entry: &Value) -> CatalogItem {
    let id = text_field(entry, "id").unwrap_or_else(|| {
        warn!("catalog: entry without id: {}", entry);
        String::new()
    });

    let metadata = entry.get("metadata").filter(|m| m.is_object());
    if metadata.is_none() {
        warn!("catalog: entry {:?} has no metadata block", id);
    }

    CatalogItem {
        title: text_field(entry, "title").unwrap_or_default(),
        description: text_field(entry, "description").unwrap_or_default(),
        presenter: metadata
            .and_then(|m| text_field(m, "author"))
            .unwrap_or_default(),
        video_ref: metadata
            .and_then(|m| text_field(m, "source"))
            .filter(|s| !s.trim().is_empty()),
        timecode: metadata.and_then(|m| timecode_field(m, "timecode")),
        id,
    }
}

/// Strings pass through, numbers and booleans are rendered, anything else
/// counts as absent.
fn text_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn timecode_field(obj: &Value, key: &str) -> Option<Timecode> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64().map(Timecode::Minutes),
        Value::String(s) if !s.trim().is_empty() => Some(Timecode::Text(s.clone())),
        _ => None,
    }
}

fn warn_on_duplicate_ids(items: &[CatalogItem]) {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id.as_str()) {
            warn!("catalog: duplicate id {:?}; lookups use the first entry", item.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(items: Value) -> Value {
        json!({ "status": 200, "data": { "items": items } })
    }

    #[test]
    fn test_maps_nested_metadata() {
        let catalog = catalog_from_value(
            &doc(json!([{
                "id": "a",
                "title": "Intro",
                "description": "first",
                "metadata": {
                    "author": "X",
                    "source": "https://x.test/watch?v=123",
                    "timecode": 7
                }
            }])),
            3,
        )
        .unwrap();

        assert_eq!(catalog.generation, 3);
        assert!(catalog.loaded_at.is_some());
        let item = &catalog.items[0];
        assert_eq!(item.id, "a");
        assert_eq!(item.title, "Intro");
        assert_eq!(item.presenter, "X");
        assert_eq!(item.description, "first");
        assert_eq!(item.video_ref.as_deref(), Some("https://x.test/watch?v=123"));
        assert_eq!(item.timecode, Some(Timecode::Minutes(7.0)));
    }

    #[test]
    fn test_entry_without_metadata_is_kept_with_empty_fields() {
        let catalog = catalog_from_value(
            &doc(json!([
                { "id": "a", "title": "no meta" },
                { "id": "b", "title": "null meta", "metadata": null },
                "not even an object",
                { "id": 4, "title": "numeric id", "metadata": { "author": "Y" } }
            ])),
            1,
        )
        .unwrap();

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.items[0].presenter, "");
        assert!(catalog.items[0].video_ref.is_none());
        assert!(catalog.items[1].video_ref.is_none());
        assert_eq!(catalog.items[2].id, "");
        assert_eq!(catalog.items[3].id, "4");
        assert_eq!(catalog.items[3].presenter, "Y");
        assert!(!catalog.items[3].is_playable());
    }

    #[test]
    fn test_float_status_marker_is_accepted() {
        let catalog =
            parse_listing_str(r#"{"status":200.0,"data":{"items":[{"id":"a"}]}}"#, 1).unwrap();
        assert_eq!(catalog.len(), 1);

        let fractional = json!({ "status": 200.5, "data": { "items": [{ "id": "a" }] } });
        assert_eq!(
            catalog_from_value(&fractional, 1),
            Err(LoadFailure::Rejected(RejectReason::BadStatus("200.5".into())))
        );
    }

    #[test]
    fn test_rejects_bad_status() {
        let bad = json!({ "status": 404, "data": { "items": [{ "id": "a" }] } });
        assert_eq!(
            catalog_from_value(&bad, 1),
            Err(LoadFailure::Rejected(RejectReason::BadStatus("404".into())))
        );

        let stringly = json!({ "status": "200", "data": { "items": [{ "id": "a" }] } });
        assert!(matches!(
            catalog_from_value(&stringly, 1),
            Err(LoadFailure::Rejected(RejectReason::BadStatus(_)))
        ));

        let missing = json!({ "data": { "items": [{ "id": "a" }] } });
        assert_eq!(
            catalog_from_value(&missing, 1),
            Err(LoadFailure::Rejected(RejectReason::BadStatus("missing".into())))
        );
    }

    #[test]
    fn test_rejects_missing_or_empty_items() {
        assert_eq!(
            catalog_from_value(&json!({ "status": 200 }), 1),
            Err(LoadFailure::Rejected(RejectReason::MissingItems))
        );
        assert_eq!(
            catalog_from_value(&json!({ "status": 200, "data": { "items": {} } }), 1),
            Err(LoadFailure::Rejected(RejectReason::MissingItems))
        );
        assert_eq!(
            catalog_from_value(&doc(json!([])), 1),
            Err(LoadFailure::Rejected(RejectReason::EmptyItems))
        );
    }

    #[test]
    fn test_non_json_is_decode_failure() {
        assert!(matches!(
            parse_listing_str("<html>", 1),
            Err(LoadFailure::Decode(_))
        ));
        // An empty array (what a failed fetch degrades to) is not a listing.
        assert!(matches!(
            parse_listing_str("[]", 1),
            Err(LoadFailure::Rejected(RejectReason::BadStatus(_)))
        ));
    }

    #[test]
    fn test_preserves_server_order() {
        let catalog = parse_listing_str(
            r#"{"status":200,"data":{"items":[{"id":"z"},{"id":"a"},{"id":"m"}]}}"#,
            1,
        )
        .unwrap();
        let ids: Vec<&str> = catalog.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["z", "a", "m"]);
    }
}
