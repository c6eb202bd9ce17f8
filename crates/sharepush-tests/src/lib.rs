use std::collections::HashMap;

use serde_json::Value;
use sharepush_core::records::{Record, RecordStore, AWARDS, CONTRIBUTORS, FUNDERS, WORKS};

pub fn work(key: &str) -> Record {
    Record::new(WORKS, key)
        .with("type", "Preprint")
        .with("title", format!("Work {key}"))
        .with("description", "A description")
        .with("url", format!("https://example.org/{key}"))
}

pub fn person(key: &str, name: &str) -> Record {
    Record::new(CONTRIBUTORS, key)
        .with("name", name)
        .with("type", "person")
}

pub fn funder(key: &str, name: &str) -> Record {
    Record::new(FUNDERS, key).with("name", name)
}

pub fn award(key: &str, name: &str) -> Record {
    Record::new(AWARDS, key).with("name", name)
}

pub fn store(records: impl IntoIterator<Item = Record>) -> RecordStore {
    let mut store = RecordStore::new();
    for record in records {
        store.insert(record);
    }
    store
}

/// A store exercising every relation: creators, contributors, tags,
/// affiliations, funders with awards and related works.
pub fn full_store() -> RecordStore {
    store([
        work("w1")
            .with("contributors", "u1|u2")
            .with("non_bibliographic_contributors", "u3")
            .with("tags", "graphs|rust")
            .with("identifiers", "doi:10.1234/w1")
            .with("funders", "f1")
            .with("related_works", "doi:10.1234/other")
            .with("date_published", "2017-03-09"),
        person("u1", "Ada Lovelace")
            .with("affiliation", "Uni A|Uni B")
            .with("department", "Math")
            .with("email", "ada@example.org"),
        person("u2", "Alan Turing").with("identifiers", "https://orcid.org/0000-0001"),
        person("u3", "Grace Hopper").with("department", "CS"),
        funder("f1", "Science Fund").with("awards", "a1|a2"),
        award("a1", "Grant One").with("uri", "https://fund.org/a1"),
        award("a2", "Grant Two"),
    ])
}

pub fn count_type(records: &[Value], kind: &str) -> usize {
    records.iter().filter(|r| r["@type"] == kind).count()
}

pub fn records_of<'a>(records: &'a [Value], kind: &str) -> Vec<&'a Value> {
    records.iter().filter(|r| r["@type"] == kind).collect()
}

/// Pointer fields (`{@id, @type}` objects) of one record.
pub fn pointers(record: &Value) -> Vec<(&str, &Value)> {
    record
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(name, value)| !name.starts_with('@') && value.is_object())
                .map(|(name, value)| (name.as_str(), value))
                .collect()
        })
        .unwrap_or_default()
}

/// Every `@id` occurs once and every pointer resolves to a record of the
/// same type.
pub fn assert_no_orphans(records: &[Value]) {
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let id = record["@id"].as_str().expect("record without @id");
        *by_id.entry(id).or_default() += 1;
    }
    assert!(
        by_id.values().all(|&n| n == 1),
        "duplicate @id in output: {by_id:?}"
    );

    let types: HashMap<&str, &Value> = records
        .iter()
        .map(|r| (r["@id"].as_str().unwrap(), &r["@type"]))
        .collect();
    for record in records {
        for (field, pointer) in pointers(record) {
            let target = pointer["@id"].as_str().expect("pointer without @id");
            let kind = types
                .get(target)
                .unwrap_or_else(|| panic!("field {field} points at missing {target}"));
            assert_eq!(*kind, &pointer["@type"], "pointer type mismatch on {field}");
        }
    }
}

/// No arrays, no nulls, no empty strings, and pointers carry exactly
/// `@id` and `@type`.
pub fn assert_flat(records: &[Value]) {
    for record in records {
        let fields = record.as_object().expect("record is not an object");
        for (name, value) in fields {
            assert!(!value.is_array(), "{name} is an array in {record}");
            assert!(!value.is_null(), "{name} is null in {record}");
            assert_ne!(value, "", "{name} is empty in {record}");
            if let Some(pointer) = value.as_object() {
                assert_eq!(pointer.len(), 2, "{name} is not a bare pointer in {record}");
                assert!(pointer.contains_key("@id") && pointer.contains_key("@type"));
            }
        }
    }
}
