//! Indexed Table Tests
//!
//! Tests for the table facade:
//! - Reads served from cache, index or scan return the same documents
//! - Every write keeps field indexes and cached results current
//! - Rejected writes leave the table untouched

use indextable::operations::{delete, increment};
use indextable::storage::shared;
use indextable::{
    field, DocId, Document, IndexedTable, MemoryStorage, TableConfig, TableError, Update,
};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn open(fields: &[&str]) -> IndexedTable {
    let config = TableConfig::default().with_indexes(fields.iter().copied());
    IndexedTable::open(shared(MemoryStorage::new()), config).unwrap()
}

/// Table indexed on `int` holding `{int: 1, yar: 5, char: c}` for a, b, c
fn seeded() -> IndexedTable {
    let mut table = open(&["int"]);
    table
        .insert_multiple(
            "abc"
                .chars()
                .map(|c| json!({"int": 1, "yar": 5, "char": c.to_string()})),
        )
        .unwrap();
    table
}

fn ids(docs: &[Document]) -> Vec<DocId> {
    docs.iter().map(|d| d.id).collect()
}

/// Every index holds exactly the table's ids
fn assert_indexes_complete(table: &IndexedTable) {
    let mut table_ids: Vec<DocId> = table.all().unwrap().iter().map(|d| d.id).collect();
    table_ids.sort_unstable();

    for name in table.indexed_fields() {
        let mut index_ids = table.index(name).unwrap().ids();
        index_ids.sort_unstable();
        assert_eq!(index_ids, table_ids, "index on '{}' out of step", name);
    }
}

/// Every cached entry equals a fresh scan of its predicate
fn assert_cache_correct(table: &IndexedTable) {
    let all = table.all().unwrap();
    for predicate in table.cached_predicates() {
        let mut cached = table.cached_ids(&predicate).unwrap();
        cached.sort_unstable();
        let expected: Vec<DocId> = all
            .iter()
            .filter(|d| predicate.matches(&d.body))
            .map(|d| d.id)
            .collect();
        assert_eq!(cached, expected, "stale cache entry for {}", predicate);
    }
}

fn assert_consistent(table: &IndexedTable) {
    assert_indexes_complete(table);
    assert_cache_correct(table);
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Three matching documents, one empty predicate, both cached.
#[test]
fn test_search_caches_index_results() {
    let mut table = open(&["int"]);
    for _ in 0..3 {
        table.insert(json!({"int": 1})).unwrap();
    }

    let one = field("int").eq(1);
    let two = field("int").eq(2);
    assert_eq!(table.search(&one).unwrap().len(), 3);
    assert_eq!(table.search(&two).unwrap().len(), 0);

    assert_eq!(table.cached_ids(&one).unwrap().len(), 3);
    assert_eq!(table.cached_ids(&two).unwrap().len(), 0);
}

/// Truncate empties the cache and every index.
#[test]
fn test_truncate_clears_cache_and_indexes() {
    let mut table = seeded();
    table.search(&field("int").eq(1)).unwrap();
    table.search(&field("int").eq(2)).unwrap();

    table.truncate().unwrap();

    assert!(table.is_empty().unwrap());
    assert!(table.cached_predicates().is_empty());
    assert!(table.index("int").unwrap().is_empty());
    assert!(table.search(&field("int").eq(1)).unwrap().is_empty());
    assert_consistent(&table);
}

/// An update moves the document to its new key.
#[test]
fn test_update_rekeys_index() {
    let mut table = open(&["int"]);
    table.insert(json!({"int": 1})).unwrap();

    table
        .update(json!({"int": 2}), Some(&field("int").eq(1)), None)
        .unwrap();

    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 0);
    assert_eq!(table.count(&field("int").eq(2)).unwrap(), 1);

    let keys: Vec<Value> = table
        .index("int")
        .unwrap()
        .entries()
        .map(|(key, _)| key.to_json())
        .collect();
    assert_eq!(keys, vec![json!(2)]);
}

/// Removing by id keeps every index the size of the table.
#[test]
fn test_remove_ids() {
    let mut table = seeded();

    assert_eq!(table.remove_ids(&[1, 2]).unwrap(), vec![1, 2]);

    assert_eq!(table.len().unwrap(), 1);
    assert_eq!(table.index("int").unwrap().len(), 1);
    assert_consistent(&table);
}

/// A range over ten keys returns only the one below the bound.
#[test]
fn test_range_query() {
    let mut table = open(&["int"]);
    for i in 0..10 {
        table.insert(json!({"int": i * 10})).unwrap();
    }

    let found = table.search(&field("int").lt(5)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("int"), Some(&json!(0)));
    assert_eq!(table.metrics().index_lookups, 1);
}

/// Integers past 2^53 keep distinct keys, through the index and the scan.
#[test]
fn test_large_integers_compare_exactly() {
    let mut indexed = open(&["int"]);
    let mut scanned = open(&[]);
    for table in [&mut indexed, &mut scanned] {
        table.insert(json!({"int": 9007199254740992u64})).unwrap();
        table.insert(json!({"int": 9007199254740993u64})).unwrap();
    }

    let eq = field("int").eq(9007199254740993u64);
    let lt = field("int").lt(9007199254740993u64);
    let ge = field("int").ge(9007199254740992u64);
    for table in [&mut indexed, &mut scanned] {
        assert_eq!(ids(&table.search(&eq).unwrap()), vec![2]);
        assert_eq!(ids(&table.search(&lt).unwrap()), vec![1]);
        assert_eq!(ids(&table.search(&ge).unwrap()), vec![1, 2]);
    }
    assert_eq!(indexed.metrics().index_lookups, 3);
    assert_eq!(indexed.index("int").unwrap().key_count(), 2);

    indexed
        .update(json!({"int": 9007199254740994u64}), Some(&eq), None)
        .unwrap();
    assert!(indexed.cached_ids(&eq).unwrap().is_empty());
    assert_consistent(&indexed);
}

/// Insert, update and remove all maintain both cached predicates.
#[test]
fn test_cache_follows_writes() {
    let mut table = seeded();
    let one = field("int").eq(1);
    let two = field("int").eq(2);

    table.search(&one).unwrap();
    table.search(&two).unwrap();
    table.truncate().unwrap();

    assert!(table.search(&one).unwrap().is_empty());
    assert!(table.search(&two).unwrap().is_empty());

    table.insert(json!({"int": 1})).unwrap();
    assert_eq!(table.cached_predicates().len(), 2);
    assert_eq!(table.cached_ids(&one).unwrap().len(), 1);
    assert_eq!(table.cached_ids(&two).unwrap().len(), 0);

    table.update(json!({"int": 2}), Some(&one), None).unwrap();
    assert_eq!(table.cached_ids(&one).unwrap().len(), 0);
    assert_eq!(table.cached_ids(&two).unwrap().len(), 1);
    assert_eq!(table.count(&one).unwrap(), 0);

    table.insert(json!({"int": 1})).unwrap();
    table.remove_where(&one).unwrap();
    assert_eq!(table.count(&one).unwrap(), 0);
    assert_consistent(&table);
}

// =============================================================================
// Read Tests
// =============================================================================

/// Repeated searches return identical lists.
#[test]
fn test_search_idempotent() {
    let mut table = seeded();
    for predicate in [field("int").eq(1), field("char").eq("b"), field("int").ge(0)] {
        let first = table.search(&predicate).unwrap();
        let second = table.search(&predicate).unwrap();
        assert_eq!(first, second);
    }
}

/// The second search of a predicate is a cache hit.
#[test]
fn test_search_served_from_cache() {
    let mut table = seeded();
    assert!(table.cached_predicates().is_empty());

    assert_eq!(table.search(&field("int").eq(1)).unwrap().len(), 3);
    assert_eq!(table.cached_predicates().len(), 1);
    assert_eq!(table.search(&field("int").eq(1)).unwrap().len(), 3);
    assert_eq!(table.metrics().cache_hits, 1);
}

/// An inserted document is found again by its indexed value.
#[test]
fn test_insert_then_get() {
    let mut table = open(&["int"]);
    let doc = json!({"int": 42, "char": "z"});
    let id = table.insert(doc.clone()).unwrap();

    let found = table.get(&field("int").eq(42)).unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.into_value(), doc);
}

#[test]
fn test_get_and_contains() {
    let mut table = seeded();

    let item = table.get(&field("char").eq("b")).unwrap().unwrap();
    assert_eq!(item.get("char"), Some(&json!("b")));

    assert!(table.contains(&field("int").eq(1)).unwrap());
    assert!(!table.contains(&field("int").eq(0)).unwrap());
    assert!(!table.contains_id(88).unwrap());
    assert_eq!(table.count(&field("char").eq("d")).unwrap(), 0);
}

#[test]
fn test_get_by_id() {
    let table = seeded();
    let first = table.all().unwrap().remove(0);

    assert_eq!(table.get_by_id(first.id).unwrap(), Some(first));
    assert_eq!(table.get_by_id(999).unwrap(), None);
    assert_eq!(ids(&table.get_by_ids(&[3, 99, 1]).unwrap()), vec![3, 1]);
}

#[test]
fn test_get_idempotent() {
    let table = seeded();
    let u = table.get(&field("int").eq(1)).unwrap();
    let z = table.get(&field("int").eq(1)).unwrap();
    assert_eq!(u, z);
}

/// Negated predicates are answered by a scan and return the complement.
#[test]
fn test_negation_returns_complement() {
    let mut table = open(&["int"]);
    table
        .insert_multiple([json!({"int": 1}), json!({"int": 2}), json!({"int": "x"})])
        .unwrap();

    let not_lt_two = !field("int").lt(2);
    assert_eq!(ids(&table.search(&not_lt_two).unwrap()), vec![2, 3]);
    assert_eq!(ids(&table.search(&!field("int").eq(1)).unwrap()), vec![2, 3]);

    let metrics = table.metrics();
    assert_eq!(metrics.full_scans, 2);
    assert_eq!(metrics.index_lookups, 0);
}

/// Index and scan agree across mixed value types.
#[test]
fn test_index_agrees_with_scan() {
    let mut indexed = open(&["v"]);
    let mut plain = open(&[]);
    let values = [json!(1), json!(2.5), json!("a"), json!(null), json!(true), json!([1]), json!(-3)];
    for v in &values {
        indexed.insert(json!({ "v": v })).unwrap();
        plain.insert(json!({ "v": v })).unwrap();
    }

    for literal in [json!(1), json!(2), json!("a"), json!(null), json!(false)] {
        for predicate in [
            field("v").eq(literal.clone()),
            field("v").ne(literal.clone()),
            field("v").lt(literal.clone()),
            field("v").le(literal.clone()),
            field("v").gt(literal.clone()),
            field("v").ge(literal.clone()),
        ] {
            let mut from_index = ids(&indexed.search(&predicate).unwrap());
            from_index.sort_unstable();
            let from_scan = ids(&plain.search(&predicate).unwrap());
            assert_eq!(from_index, from_scan, "disagreement on {}", predicate);
        }
    }
    assert_eq!(plain.metrics().index_lookups, 0);
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_insert_ids() {
    let mut table = open(&["int"]);
    assert_eq!(table.insert(json!({"int": 1, "char": "a"})).unwrap(), 1);
    assert_eq!(table.insert(json!({"int": 1, "char": "a"})).unwrap(), 2);
    assert_eq!(
        table
            .insert_multiple([json!({"int": 1}), json!({"int": 2})])
            .unwrap(),
        vec![3, 4]
    );
    assert_consistent(&table);
}

#[test]
fn test_insert_multiple() {
    let mut table = open(&["int"]);
    assert!(!table.contains(&field("int").eq(1)).unwrap());

    table
        .insert_multiple([
            json!({"int": 1, "char": "a"}),
            json!({"int": 1, "char": "b"}),
            json!({"int": 1, "char": "c"}),
        ])
        .unwrap();

    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 3);
    assert_eq!(table.count(&field("char").eq("a")).unwrap(), 1);

    table.truncate().unwrap();
    table
        .insert_multiple((0..10).map(|i| json!({ "int": i })))
        .unwrap();
    for i in 0..10 {
        assert_eq!(table.count(&field("int").eq(i)).unwrap(), 1);
    }
    assert_eq!(table.count(&field("int").exists()).unwrap(), 10);
    assert_consistent(&table);
}

#[test]
fn test_remove_by_predicate() {
    let mut table = seeded();
    table.search(&field("int").eq(1)).unwrap();

    table.remove_where(&field("char").eq("b")).unwrap();

    assert_eq!(table.len().unwrap(), 2);
    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 2);
    assert_eq!(table.count(&field("char").eq("b")).unwrap(), 0);
    assert_consistent(&table);
}

/// The entry keyed by the removal predicate is dropped outright.
#[test]
fn test_remove_evicts_own_entry() {
    let mut table = seeded();
    let one = field("int").eq(1);
    table.search(&one).unwrap();

    assert_eq!(table.remove_where(&one).unwrap(), vec![1, 2, 3]);

    assert!(table.is_empty().unwrap());
    assert!(table.cached_ids(&one).is_none());
    assert!(table.index("int").unwrap().is_empty());
}

#[test]
fn test_remove_without_selector_fails() {
    let mut table = seeded();

    let err = table.remove(None, None).unwrap_err();
    assert!(matches!(err, TableError::RemoveAll));
    assert!(err.to_string().contains("truncate()"));
    assert_eq!(table.len().unwrap(), 3);
}

#[test]
fn test_remove_unknown_ids_is_no_match() {
    let mut table = seeded();
    assert!(table.remove_ids(&[77, 78]).unwrap().is_empty());
    assert_eq!(table.len().unwrap(), 3);
}

#[test]
fn test_update_by_predicate() {
    let mut table = seeded();
    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 3);

    table
        .update(json!({"int": 2}), Some(&field("char").eq("a")), None)
        .unwrap();

    assert_eq!(table.count(&field("int").eq(2)).unwrap(), 1);
    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 2);
    assert_consistent(&table);
}

#[test]
fn test_update_transform() {
    let mut table = seeded();
    table.search(&field("int").eq(1)).unwrap();
    table.search(&field("char").eq("a")).unwrap();

    table
        .update(increment("int"), Some(&field("char").eq("a")), None)
        .unwrap();
    table
        .update(delete("char"), Some(&field("char").eq("a")), None)
        .unwrap();

    assert_eq!(table.count(&field("int").eq(2)).unwrap(), 1);
    assert_eq!(table.count(&field("char").eq("a")).unwrap(), 0);
    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 2);
    assert_consistent(&table);
}

#[test]
fn test_update_closure() {
    let mut table = seeded();
    let bump = 10;
    let update = Update::transform(|body: &mut Map<String, Value>| {
        body.insert("yar".into(), json!(bump));
    });

    assert_eq!(table.update(update, None, None).unwrap(), vec![1, 2, 3]);
    assert_eq!(table.count(&field("yar").eq(10)).unwrap(), 3);
}

#[test]
fn test_update_ids() {
    let mut table = seeded();
    table.search(&field("int").eq(2)).unwrap();

    let updated = table
        .update(json!({"int": 2}), None, Some(&[1, 2, 2, 99][..]))
        .unwrap();

    assert_eq!(updated, vec![1, 2]);
    assert_eq!(table.count(&field("int").eq(2)).unwrap(), 2);
    assert_consistent(&table);
}

#[test]
fn test_upsert() {
    let mut table = seeded();

    let updated = table
        .upsert(json!({"int": 1, "char": "z"}), &field("char").eq("a"))
        .unwrap();
    assert_eq!(updated, vec![1]);

    let inserted = table
        .upsert(json!({"int": 9, "char": "q"}), &field("char").eq("q"))
        .unwrap();
    assert_eq!(inserted, vec![4]);
    assert_eq!(table.len().unwrap(), 4);
    assert_consistent(&table);
}

// =============================================================================
// Missing Indexed Field Tests
// =============================================================================

#[test]
fn test_insert_without_indexed_field_rejected() {
    let mut table = seeded();
    table.search(&field("char").exists()).unwrap();

    let err = table.insert(json!({"char": "d"})).unwrap_err();

    assert_eq!(err.code(), "INDEXTABLE_INDEX_MISSING_FIELD");
    assert_eq!(table.len().unwrap(), 3);
    assert_consistent(&table);
}

#[test]
fn test_insert_multiple_rejected_as_whole() {
    let mut table = seeded();

    let err = table
        .insert_multiple([json!({"int": 2}), json!({"char": "d"})])
        .unwrap_err();

    assert!(matches!(err, TableError::MissingField(_)));
    assert_eq!(table.len().unwrap(), 3);
    assert_eq!(table.count(&field("int").eq(2)).unwrap(), 0);
    assert_consistent(&table);

    // Ids are not consumed by the rejected batch
    assert_eq!(table.insert(json!({"int": 2})).unwrap(), 4);
}

#[test]
fn test_update_removing_indexed_field_rejected() {
    let mut table = seeded();
    table.search(&field("int").eq(1)).unwrap();

    let err = table
        .update(delete("int"), Some(&field("char").eq("a")), None)
        .unwrap_err();

    assert_eq!(err.code(), "INDEXTABLE_INDEX_MISSING_FIELD");
    assert_eq!(table.count(&field("int").eq(1)).unwrap(), 3);
    assert_eq!(table.metrics().writes_rejected, 1);
    assert_consistent(&table);
}

#[test]
fn test_unindexed_table_accepts_any_object() {
    let mut table = open(&[]);
    table.insert(json!({})).unwrap();
    table.insert(json!({"anything": [1, 2]})).unwrap();
    assert_eq!(table.len().unwrap(), 2);
}
