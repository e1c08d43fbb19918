//! The SQL rendering of a filter selects exactly the documents that the
//! in-memory evaluation of the same filter accepts.

#![allow(unused_results)]

use proptest::prelude::*;
use racing_core::{Document, Filter};
use racing_store::{DocumentStore, SqliteStore};
use serde_json::{Value, json};

fn doc(number: i64, label: &str) -> Document {
    match json!({ "number": number, "label": label }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn sorted_numbers(docs: &[Document]) -> Vec<(i64, String)> {
    let mut out: Vec<(i64, String)> = docs
        .iter()
        .map(|d| {
            (
                d["number"].as_i64().unwrap(),
                d["label"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    out.sort();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn sql_and_in_memory_filters_agree(
        rows in prop::collection::vec((0i64..20, "[a-d]{1,3}"), 0..25),
        eq_number in prop::option::of(0i64..20),
        lt_number in prop::option::of(0i64..20),
        lt_label in prop::option::of("[a-d]{1,3}"),
    ) {
        let store = SqliteStore::in_memory().unwrap();
        let documents: Vec<Document> = rows.iter().map(|(n, l)| doc(*n, l)).collect();
        for d in &documents {
            store.insert("samples", d).unwrap();
        }

        let mut filter = Filter::new();
        if let Some(n) = eq_number {
            filter = filter.eq("number", n);
        }
        if let Some(n) = lt_number {
            filter = filter.lt("number", n);
        }
        if let Some(l) = lt_label {
            filter = filter.lt("label", l);
        }

        let from_sql = store.find("samples", &filter).unwrap();
        let in_memory: Vec<Document> = documents
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();

        prop_assert_eq!(sorted_numbers(&from_sql), sorted_numbers(&in_memory));
    }
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("racing.db");
    let config = racing_store::ConnectionConfig::default();

    let id = {
        let store = SqliteStore::open(&path, &config).unwrap();
        store.insert("meets", &doc(1, "a")).unwrap()
    };

    let store = SqliteStore::open(&path, &config).unwrap();
    let found = store.find_one("meets", &Filter::by_id(&id)).unwrap().unwrap();
    assert_eq!(found["label"], "a");
    let conn = store.pool().get().unwrap();
    assert_eq!(
        racing_store::migrations::current_version(&conn).unwrap(),
        racing_store::migrations::latest_version()
    );
}

#[test]
fn concurrent_writers_share_one_in_memory_database() {
    let store = std::sync::Arc::new(SqliteStore::in_memory().unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 0..25 {
                    store.insert("samples", &doc(t * 100 + n, "x")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.count("samples").unwrap(), 200);
}
