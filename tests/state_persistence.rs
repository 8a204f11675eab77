//! Integration tests for processed-state durability across process lifetimes.
//!
//! The store is exercised through the crate's public API the way the binary
//! uses it: load at pass start, mutate via reconciliation, save at pass end.

use std::path::PathBuf;

use feedwatch::feed::{Feed, FeedItem};
use feedwatch::reconcile::reconcile;
use feedwatch::state::{StateError, StateStore};

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("feedwatch_persistence_test_{}", name));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn feed_with(titles: &[&str]) -> Feed {
    Feed {
        title: Some("F".to_string()),
        description: None,
        link: Some("https://f.example.com".to_string()),
        items: titles
            .iter()
            .map(|t| FeedItem {
                title: Some(t.to_string()),
                description: None,
                link: Some(format!("https://f.example.com/{}", t)),
            })
            .collect(),
    }
}

#[test]
fn test_seen_set_grows_monotonically_across_saves() {
    let dir = test_dir("monotonic");
    let store = StateStore::new(dir.join("processed.json"));

    // Pass 1: two items.
    let mut state = store.load().unwrap();
    let key = reconcile(&feed_with(&["a", "b"]), &mut state).feed_key;
    store.save(&state).unwrap();

    // Pass 2 (fresh load): one more item; earlier entries still present.
    let mut state = store.load().unwrap();
    let result = reconcile(&feed_with(&["a", "b", "c"]), &mut state);
    assert_eq!(result.new_items.len(), 1);
    store.save(&state).unwrap();

    // Pass 3: the feed drops an old item from its window; nothing is evicted.
    let mut state = store.load().unwrap();
    let result = reconcile(&feed_with(&["c"]), &mut state);
    assert!(result.new_items.is_empty());
    store.save(&state).unwrap();

    let final_state = store.load().unwrap();
    assert_eq!(final_state.seen(&key).unwrap().len(), 3);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_state_file_is_a_flat_json_object() {
    let dir = test_dir("shape");
    let store = StateStore::new(dir.join("processed.json"));

    let mut state = store.load().unwrap();
    reconcile(&feed_with(&["a"]), &mut state);
    store.save(&state).unwrap();

    let raw = std::fs::read_to_string(dir.join("processed.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1);
    for (feed_key, items) in object {
        assert_eq!(feed_key.len(), 32);
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_str().unwrap().len(), 32);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupt_state_file_refuses_to_load() {
    let dir = test_dir("corrupt");
    let path = dir.join("processed.json");
    std::fs::write(&path, "]]] definitely not json").unwrap();

    let store = StateStore::new(&path);
    match store.load() {
        Err(StateError::Corrupt { path: p, .. }) => assert_eq!(p, path),
        other => panic!("Expected Corrupt error, got {:?}", other.map(|_| ())),
    }

    // The corrupt file is left untouched for the operator to inspect.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "]]] definitely not json"
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_save_into_missing_directory_creates_it() {
    let dir = test_dir("mkdirs");
    let store = StateStore::new(dir.join("deeply").join("nested").join("processed.json"));

    let mut state = store.load().unwrap();
    reconcile(&feed_with(&["a"]), &mut state);
    store.save(&state).unwrap();

    assert!(store.path().exists());
    assert_eq!(store.load().unwrap(), state);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_repeated_saves_leave_single_file() {
    let dir = test_dir("single_file");
    let store = StateStore::new(dir.join("processed.json"));

    let mut state = store.load().unwrap();
    for round in 0..5 {
        reconcile(&feed_with(&[&format!("item{}", round)]), &mut state);
        store.save(&state).unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["processed.json".to_string()]);

    std::fs::remove_dir_all(&dir).ok();
}
