use reading_list_core::{
    decode_entry, parse_date, DirStorage, Entry, EntryError, EntryForm, EntryManager,
    ManagerConfig, RefreshStatus, Source,
};
use serde_yaml::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const WITH_EXTRA_FIELD: &str = "---
title: An Important Article
summary: Old summary
other-field: [1, 2, 3]
reading-list:
  source:
    text: github.com
    uri: https://github.com/cceckman
  added: 2021-08-20
---
Some notes go here.
";

fn store(dir: &Path) -> Arc<DirStorage> {
    Arc::new(DirStorage::open(dir).unwrap())
}

fn manager_for(dir: &Path) -> EntryManager {
    EntryManager::new(store(dir), ManagerConfig::with_workers(2))
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn read_file(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

fn doc(title: &str, added: &str, read: Option<&str>) -> String {
    let read_line = read.map(|d| format!("  read: {d}\n")).unwrap_or_default();
    format!("---\ntitle: {title}\nreading-list:\n  added: {added}\n{read_line}---\n")
}

#[test]
fn read_returns_entry_from_disk() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "article-title.md", WITH_EXTRA_FIELD);
    let manager = manager_for(dir.path());

    let entry = manager.read("article-title").unwrap();
    assert_eq!(entry.id, "article-title");
    assert_eq!(entry.title, "An Important Article");
    assert_eq!(entry.content(), "Some notes go here.\n");
    assert!(Arc::ptr_eq(&manager.cached("article-title").unwrap(), &entry));
}

#[test]
fn read_sees_changes_made_behind_the_cache() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "item.md", &doc("Before", "2021-08-20", None));
    let manager = manager_for(dir.path());
    assert_eq!(manager.read("item").unwrap().title, "Before");

    write_file(dir.path(), "item.md", &doc("After", "2021-08-20", None));
    assert_eq!(manager.read("item").unwrap().title, "After");
}

#[test]
fn read_of_bad_data_and_missing_file_fail() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "article-title.md", "No front matter here.");
    let manager = manager_for(dir.path());

    assert!(matches!(
        manager.read("article-title").unwrap_err(),
        EntryError::Format { .. }
    ));
    assert!(manager.read("other-title").unwrap_err().is_not_found());
}

#[test]
fn update_creates_new_file() {
    let dir = TempDir::new().unwrap();
    let manager = manager_for(dir.path());
    let mut entry = Entry::new(
        "article-title",
        "Article title",
        Source::new("github.com", "https://github.com/cceckman/reading-list"),
    );
    entry.added = Some(parse_date("2021-08-20").unwrap());

    let stored = manager.update(entry).unwrap();

    let text = read_file(dir.path(), "article-title.md");
    let decoded = decode_entry("article-title", text.as_bytes()).unwrap();
    assert_eq!(decoded.title, "Article title");
    assert_eq!(decoded.source.uri, "https://github.com/cceckman/reading-list");
    assert_eq!(stored.added, decoded.added);
    assert_eq!(manager.cached_len(), 1);
}

#[test]
fn update_preserves_unknown_header_keys_and_body() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "article.md", WITH_EXTRA_FIELD);
    let manager = manager_for(dir.path());

    let mut entry = (*manager.read("article").unwrap()).clone();
    entry.summary = "New summary".to_string();
    manager.update(entry).unwrap();

    let text = read_file(dir.path(), "article.md");
    assert!(text.ends_with("---\nSome notes go here.\n"));
    let decoded = decode_entry("article", text.as_bytes()).unwrap();
    assert_eq!(decoded.summary, "New summary");
    assert_eq!(decoded.title, "An Important Article");
    assert_eq!(decoded.source.text, "github.com");
    let expected: Value = serde_yaml::from_str("[1, 2, 3]").unwrap();
    assert_eq!(decoded.original_header().get("other-field"), Some(&expected));
}

#[test]
fn update_from_form_merges_with_existing_file() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "article.md", WITH_EXTRA_FIELD);
    let manager = manager_for(dir.path());

    let form = EntryForm {
        id: "article".to_string(),
        title: "An Important Article".to_string(),
        source_url: "https://github.com/cceckman".to_string(),
        added: "2021-08-20".to_string(),
        read: "2021-09-01".to_string(),
        ..EntryForm::default()
    };
    let now = parse_date("2021-09-01T12:00:00Z").unwrap();
    let stored = manager.update(Entry::from_form(&form, now).unwrap()).unwrap();

    assert!(stored.is_read());
    assert_eq!(stored.content(), "Some notes go here.\n");
    assert!(stored.original_header().contains_key("other-field"));
}

#[test]
fn update_with_shorter_encoding_leaves_no_trailing_bytes() {
    let dir = TempDir::new().unwrap();
    let long_summary = "x".repeat(2048);
    write_file(
        dir.path(),
        "item.md",
        &format!("---\ntitle: Item\nsummary: {long_summary}\n---\nbody\n"),
    );
    let manager = manager_for(dir.path());

    let mut entry = (*manager.read("item").unwrap()).clone();
    entry.summary = "short".to_string();
    manager.update(entry).unwrap();

    let text = read_file(dir.path(), "item.md");
    assert!(text.ends_with("---\nbody\n"));
    assert!(!text.contains("xxxx"));
    assert_eq!(manager.read("item").unwrap().summary, "short");
}

#[test]
fn update_keeps_non_utf8_body_bytes() {
    let dir = TempDir::new().unwrap();
    let body: &[u8] = b"notes in latin-1: caf\xE9, na\xEFve\n";
    let mut raw = b"---\ntitle: Legacy Notes\nsummary: Old\n---\n".to_vec();
    raw.extend_from_slice(body);
    std::fs::write(dir.path().join("legacy.md"), &raw).unwrap();
    let manager = manager_for(dir.path());

    let mut entry = (*manager.read("legacy").unwrap()).clone();
    assert_eq!(entry.content_bytes(), body);
    entry.summary = "New".to_string();
    manager.update(entry).unwrap();

    let stored = std::fs::read(dir.path().join("legacy.md")).unwrap();
    assert!(stored.ends_with(body));
    assert_eq!(manager.read("legacy").unwrap().summary, "New");
    assert!(manager.list(10).refresh.failures.is_empty());
}

#[test]
fn read_after_write_returns_written_fields() {
    let dir = TempDir::new().unwrap();
    let manager = manager_for(dir.path());
    let form = EntryForm {
        title: "Reading List Admin".to_string(),
        source_url: "https://reading-list.example.net".to_string(),
        summary: "Admin page".to_string(),
        author: "cceckman".to_string(),
        discovery_url: "https://example.org/found".to_string(),
        ..EntryForm::default()
    };
    let entry = Entry::from_form(&form, parse_date("2021-09-10T08:30:00Z").unwrap()).unwrap();

    manager.update(entry.clone()).unwrap();
    let read = manager.read("reading-list-admin").unwrap();

    assert_eq!(read.id, entry.id);
    assert_eq!(read.title, entry.title);
    assert_eq!(read.summary, entry.summary);
    assert_eq!(read.source, entry.source);
    assert_eq!(read.author, entry.author);
    assert_eq!(read.discovery, entry.discovery);
    assert_eq!(read.added, entry.added);
    assert_eq!(read.read, None);
    assert_eq!(read.reviewed, None);
}

#[test]
fn update_rejects_invalid_ids() {
    let dir = TempDir::new().unwrap();
    let manager = manager_for(dir.path());
    for id in ["", "../outside", "Upper", "a/b"] {
        let err = manager
            .update(Entry::new(id, "Title", Source::default()))
            .unwrap_err();
        assert!(matches!(err, EntryError::Validation(_)), "id {id:?}");
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn list_orders_fifo_and_applies_limit() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "c.md", &doc("C", "2021-08-01", Some("2021-08-20")));
    write_file(dir.path(), "b.md", &doc("B", "2021-08-21", None));
    write_file(dir.path(), "a.md", &doc("A", "2021-08-20", None));
    let manager = manager_for(dir.path());

    let ids = |limit| -> Vec<String> {
        manager
            .list(limit)
            .items
            .iter()
            .map(|e| e.id.clone())
            .collect()
    };
    assert_eq!(ids(10), vec!["a", "b", "c"]);
    assert_eq!(ids(2), vec!["a", "b"]);
    assert!(ids(0).is_empty());
}

#[test]
fn list_serves_valid_entries_despite_corrupt_file() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "first.md", &doc("First", "2021-08-20", None));
    write_file(dir.path(), "second.md", &doc("Second", "2021-08-21", None));
    write_file(dir.path(), "corrupt.md", "---\ntitle: [broken\n---\n");
    let manager = manager_for(dir.path());

    let listed = manager.list(10);
    let ids: Vec<&str> = listed.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert_eq!(listed.refresh.status(), RefreshStatus::Partial);

    match listed.refresh.into_result() {
        Err(EntryError::Aggregate(aggregate)) => {
            assert_eq!(aggregate.len(), 1);
            assert_eq!(aggregate.failures()[0].id.as_deref(), Some("corrupt"));
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

#[test]
fn list_keeps_entries_whose_files_were_removed() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "kept.md", &doc("Kept", "2021-08-20", None));
    let manager = manager_for(dir.path());
    assert_eq!(manager.list(10).items.len(), 1);

    std::fs::remove_file(dir.path().join("kept.md")).unwrap();
    let listed = manager.list(10);
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.refresh.status(), RefreshStatus::Clean);
}

#[test]
fn open_warms_cache_and_tolerates_bad_files() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "one.md", &doc("One", "2021-08-20", None));
    write_file(dir.path(), "two.md", &doc("Two", "2021-08-21", None));
    write_file(dir.path(), "junk.md", "not an entry");

    let manager = EntryManager::open(store(dir.path()), ManagerConfig::default());
    assert_eq!(manager.cached_len(), 2);
    assert_eq!(manager.cached("two").unwrap().title, "Two");
}

#[test]
fn background_refresh_can_be_awaited() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "one.md", &doc("One", "2021-08-20", None));
    let manager = Arc::new(manager_for(dir.path()));
    assert_eq!(manager.cached_len(), 0);

    let report = manager.refresh_in_background().wait();
    assert_eq!(report.loaded, 1);
    assert!(!report.coalesced);
    assert_eq!(manager.cached_len(), 1);
    assert!(!manager.refresh_in_progress());
}
