//! A listing read from disk, mapped, then resolved entry by entry.

use std::io::Write;

use tv_proto::catalog::parse_listing;
use tv_proto::error::{LoadFailure, RejectReason};
use tv_proto::protocol::Timecode;
use tv_proto::resolver::VideoUrlResolver;

const LISTING: &str = r#"{
  "status": 200,
  "data": {
    "items": [
      {"id": "n1", "title": "Morning", "description": "news",
       "metadata": {"author": "Desk", "source": "https://www.youtube.com/watch?v=aaa&t=30", "timecode": 12.5}},
      {"id": "n2", "title": "Noon",
       "metadata": {"author": "Desk", "source": "https://www.youtube.com/watch?list=PL1", "timecode": "1:02:03"}},
      {"id": "n3", "title": "Night"}
    ]
  }
}"#;

fn write_listing(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn listing_file_resolves_to_embed_urls() {
    let file = write_listing(LISTING);
    let bytes = std::fs::read(file.path()).unwrap();
    let catalog = parse_listing(&bytes, 3).unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.generation, 3);
    let first = catalog.get("n1").unwrap();
    assert_eq!(first.presenter, "Desk");
    assert_eq!(first.timecode, Some(Timecode::Minutes(12.5)));
    assert_eq!(
        catalog.get("n2").unwrap().timecode,
        Some(Timecode::Text("1:02:03".into()))
    );

    let resolver = VideoUrlResolver::new("https://embed.test/v/");
    let urls: Vec<String> = catalog
        .iter()
        .map(|item| resolver.resolve_or_sentinel(item.video_ref.as_deref()).into_string())
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://embed.test/v/aaa".to_string(),
            "https://embed.test/v/".to_string(),
            "https://embed.test/v/".to_string(),
        ]
    );
}

#[test]
fn rejected_listing_file() {
    let file = write_listing(r#"{"status": 200, "data": {}}"#);
    let bytes = std::fs::read(file.path()).unwrap();
    assert_eq!(
        parse_listing(&bytes, 1).unwrap_err(),
        LoadFailure::Rejected(RejectReason::MissingItems)
    );
}
