//! List reconciliation - the pure part of the store.
//!
//! These functions edit the in-memory list while keeping identifiers unique
//! and preserving the position of every untouched record. The store decides
//! which tier a record comes from; this module only decides where it goes.

use crate::schema::Placement;
use crate::{Fields, Record, RecordId};
use std::collections::HashSet;

/// Position of the record with `id`.
pub fn position(list: &[Record], id: RecordId) -> Option<usize> {
    list.iter().position(|r| r.id == id)
}

/// Add a new record according to `placement`.
///
/// If the identifier is already present the existing entry is replaced in
/// place instead, so the list never holds two records with one identifier.
pub fn place(list: &mut Vec<Record>, record: Record, placement: Placement) {
    if let Some(index) = position(list, record.id) {
        list[index] = record;
        return;
    }
    match placement {
        Placement::Prepend => list.insert(0, record),
        Placement::Append => list.push(record),
    }
}

/// Replace the entry with identifier `id`, keeping its position.
///
/// Returns `false` when no such entry exists.
pub fn replace(list: &mut [Record], id: RecordId, record: Record) -> bool {
    match position(list, id) {
        Some(index) => {
            list[index] = record;
            true
        }
        None => false,
    }
}

/// Overlay `fields` onto the entry with identifier `id`.
pub fn merge(list: &mut [Record], id: RecordId, fields: &Fields) -> Option<Record> {
    let index = position(list, id)?;
    list[index].merge(fields);
    Some(list[index].clone())
}

/// Remove and return the entry with identifier `id`.
pub fn remove(list: &mut Vec<Record>, id: RecordId) -> Option<Record> {
    let index = position(list, id)?;
    Some(list.remove(index))
}

/// Drop records whose identifier was already seen. The first one wins.
///
/// Returns the kept records and the number dropped.
pub fn dedupe(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let kept: Vec<Record> = records.into_iter().filter(|r| seen.insert(r.id)).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rec(id: RecordId, total: i64) -> Record {
        Record::new(id, json!({"total": total}).as_object().cloned().unwrap())
    }

    fn ids(list: &[Record]) -> Vec<RecordId> {
        list.iter().map(|r| r.id).collect()
    }

    #[test]
    fn place_prepend_and_append() {
        let mut list = vec![rec(1, 10)];
        place(&mut list, rec(2, 20), Placement::Prepend);
        place(&mut list, rec(3, 30), Placement::Append);
        assert_eq!(ids(&list), vec![2, 1, 3]);
    }

    #[test]
    fn place_existing_id_replaces_in_place() {
        let mut list = vec![rec(1, 10), rec(2, 20)];
        place(&mut list, rec(2, 99), Placement::Prepend);
        assert_eq!(ids(&list), vec![1, 2]);
        assert_eq!(list[1].get("total"), Some(&json!(99)));
    }

    #[test]
    fn replace_by_identifier_preserves_order() {
        let mut list = vec![rec(1, 10), rec(2, 20), rec(3, 30)];
        assert!(replace(&mut list, 2, rec(2, 999)));
        assert_eq!(ids(&list), vec![1, 2, 3]);
        assert_eq!(list[0].get("total"), Some(&json!(10)));
        assert_eq!(list[1].get("total"), Some(&json!(999)));

        assert!(!replace(&mut list, 42, rec(42, 0)));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn merge_overlays_only_target() {
        let mut list = vec![rec(1, 10), rec(2, 20)];
        let fields = json!({"total": 5, "note": "rush"}).as_object().cloned().unwrap();
        let merged = merge(&mut list, 1, &fields).unwrap();

        assert_eq!(merged.get("note"), Some(&Value::from("rush")));
        assert_eq!(list[0], merged);
        assert_eq!(list[1].get("total"), Some(&json!(20)));
        assert!(merge(&mut list, 9, &fields).is_none());
    }

    #[test]
    fn remove_by_identifier() {
        let mut list = vec![rec(1, 10), rec(5, 50), rec(7, 70)];
        let removed = remove(&mut list, 5).unwrap();
        assert_eq!(removed.id, 5);
        assert_eq!(ids(&list), vec![1, 7]);
        assert!(remove(&mut list, 5).is_none());
    }

    #[test]
    fn dedupe_keeps_first() {
        let (kept, dropped) = dedupe(vec![rec(1, 10), rec(2, 20), rec(1, 11)]);
        assert_eq!(dropped, 1);
        assert_eq!(ids(&kept), vec![1, 2]);
        assert_eq!(kept[0].get("total"), Some(&json!(10)));
    }
}
