// tests/store_test.rs — Integration test: SQLite round-trip (storage contract)

use std::collections::HashMap;

use flowcast::core::types::{Action, Event, PatternKey, Workflow};
use flowcast::memory::schema;
use flowcast::memory::{SqliteStorage, Storage};
use pretty_assertions::assert_eq;
use rusqlite::Connection;

/// Create an in-memory SQLite store with schema applied.
fn test_store(namespace: &str, capacity: usize) -> SqliteStorage {
    let conn = Connection::open_in_memory().unwrap();
    schema::run_migrations(&conn).unwrap();
    SqliteStorage::new(conn, namespace, capacity)
}

fn action(id: &str, sig: &str) -> Action {
    Action::from_event(&Event::new(id, sig, 0)).unwrap()
}

#[test]
fn test_event_log_is_capped_oldest_first() {
    let store = test_store("ns", 3);
    for i in 0..5 {
        store
            .append_event(&Event::new(format!("e{i}"), "GET:/a", i))
            .unwrap();
    }

    let ids: Vec<String> = store
        .read_event_log()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["e2", "e3", "e4"]);
    assert_eq!(store.count_events().unwrap(), 3);
}

#[test]
fn test_namespaces_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    // Two handles on one file, different namespaces
    let a = SqliteStorage::open(&path, "tab-a", 2).unwrap();
    let b = SqliteStorage::open(&path, "tab-b", 2).unwrap();

    for i in 0..3 {
        a.append_event(&Event::new(format!("a{i}"), "GET:/a", i)).unwrap();
    }
    b.append_event(&Event::new("b0", "GET:/b", 0)).unwrap();

    assert_eq!(a.count_events().unwrap(), 2);
    assert_eq!(b.count_events().unwrap(), 1);
    b.set_action(&action("x", "GET:/x")).unwrap();
    assert!(a.get_actions().unwrap().is_empty());
}

#[test]
fn test_patterns_round_trip_with_separator_ids() {
    let store = test_store("ns", 10);
    let tricky = PatternKey::new(vec!["a,b".into(), "c → d".into()]);
    let plain = PatternKey::new(vec!["a".into(), "b,c → d".into()]);

    let mut table = HashMap::new();
    table.insert(tricky.clone(), 3);
    table.insert(plain.clone(), 1);
    store.set_patterns(&table).unwrap();

    assert_eq!(store.get_patterns().unwrap(), table);

    // Upsert replaces counts in place
    table.insert(tricky.clone(), 7);
    store.set_patterns(&table).unwrap();
    let top = store.top_patterns(1).unwrap();
    assert_eq!(top, vec![(tricky, 7)]);
}

#[test]
fn test_oversized_count_saturates_instead_of_wrapping() {
    let store = test_store("ns", 10);
    let key = PatternKey::new(vec!["a".into(), "b".into()]);
    let mut table = HashMap::new();
    table.insert(key.clone(), u64::MAX);
    store.set_patterns(&table).unwrap();

    assert_eq!(store.get_patterns().unwrap()[&key], i64::MAX as u64);
}

#[test]
fn test_actions_round_trip() {
    let store = test_store("ns", 10);
    let api = action("1", "post:https://example.com/items");
    let ui = action("2", "UI:input:#search");
    store.set_action(&api).unwrap();
    store.set_action(&ui).unwrap();

    let stored = store.get_actions().unwrap();
    assert_eq!(stored["1"], api);
    assert_eq!(stored["2"], ui);
}

#[test]
fn test_workflow_update_keeps_creation_order() {
    let store = test_store("ns", 10);
    let mut first = Workflow::new(
        "w1",
        "Workflow 1",
        "GET /a → GET /b",
        vec![action("a", "GET:/a"), action("b", "GET:/b")],
        100,
    );
    let second = Workflow::new(
        "w2",
        "Workflow 2",
        "GET /c → GET /d",
        vec![action("c", "GET:/c"), action("d", "GET:/d")],
        200,
    );
    store.set_workflow(&first).unwrap();
    store.set_workflow(&second).unwrap();

    first.mark_executed(300);
    store.set_workflow(&first).unwrap();

    let workflows = store.get_workflows().unwrap();
    assert_eq!(workflows, vec![first, second]);
    assert_eq!(workflows[0].frequency, 2);
    assert_eq!(workflows[0].last_executed, Some(300));
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flowcast.db");

    {
        let store = SqliteStorage::open(&path, "ns", 10).unwrap();
        store.append_event(&Event::new("e1", "GET:/a", 1)).unwrap();
        store
            .set_workflow(&Workflow::new(
                "w",
                "Workflow 1",
                "",
                vec![action("a", "GET:/a"), action("b", "GET:/b")],
                1,
            ))
            .unwrap();
    }

    let store = SqliteStorage::open(&path, "ns", 10).unwrap();
    assert_eq!(store.read_event_log().unwrap().len(), 1);
    assert_eq!(store.get_workflows().unwrap()[0].actions().len(), 2);
}
