//! Search over the bundled dataset in `data/colleges.json`.

use std::collections::HashSet;
use std::path::PathBuf;

use pathwise_common::Ownership;
use pathwise_directory::{DirectoryIndex, SearchQuery};

fn bundled() -> DirectoryIndex {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/colleges.json");
    DirectoryIndex::load(&path).expect("bundled dataset loads")
}

#[test]
fn bundled_dataset_is_complete() {
    let index = bundled();
    assert!(!index.is_empty());
    assert!(index.colleges().iter().all(|c| c.is_complete()));

    let ids: HashSet<_> = index.colleges().iter().filter_map(|c| c.id.clone()).collect();
    assert_eq!(ids.len(), index.len(), "every record has a unique id");
}

#[test]
fn walking_cursors_visits_every_match_once() {
    let index = bundled();
    let mut seen = Vec::new();
    let mut cursor = None;

    loop {
        let page = index
            .search(&SearchQuery {
                limit: Some(4),
                cursor: cursor.take(),
                ..Default::default()
            })
            .unwrap();
        assert!(page.colleges.len() <= 4);
        seen.extend(page.colleges.into_iter().filter_map(|c| c.id));

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), index.len());
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), index.len());
}

#[test]
fn government_engineering_in_delhi() {
    let page = bundled()
        .search(&SearchQuery {
            state: Some("Delhi".into()),
            ownership: Some("government".into()),
            category: Some("Engineering".into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(page.colleges.len(), 1);
    assert_eq!(page.colleges[0].name, "Indian Institute of Technology Delhi");
    assert_eq!(page.colleges[0].ownership, Ownership::Government);
}

#[test]
fn query_is_case_insensitive_substring() {
    let page = bundled()
        .search(&SearchQuery {
            query: Some("pune".into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(page.colleges.len(), 2);
    assert!(page.colleges.iter().all(|c| c.city == "Pune"));
}

#[test]
fn serializes_camel_case_with_integer_cursor() {
    let page = bundled()
        .search(&SearchQuery {
            query: Some("IIMA".into()),
            ..Default::default()
        })
        .unwrap();

    let json = serde_json::to_value(&page).unwrap();
    assert!(json["nextCursor"].is_null());

    assert_eq!(json["colleges"][0]["id"], "8");
    assert_eq!(json["colleges"][0]["ownership"], "government");

    let first = bundled()
        .search(&SearchQuery {
            limit: Some(4),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(serde_json::to_value(&first).unwrap()["nextCursor"], 4);
}
