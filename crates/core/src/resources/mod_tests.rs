// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: String,
    n: u32,
}

impl Keyed for Item {
    fn key(&self) -> &str {
        &self.id
    }
}

fn item(id: &str, n: u32) -> Item {
    Item {
        id: id.to_string(),
        n,
    }
}

fn list() -> Vec<Item> {
    vec![item("a", 1), item("b", 2), item("c", 3)]
}

#[parameterized(
    transcript = { "transcript", ResourceKind::Transcript },
    board = { "board", ResourceKind::Board },
    trace = { "trace", ResourceKind::Trace },
    interview = { "interview", ResourceKind::Interview },
)]
fn kind_parses(s: &str, expected: ResourceKind) {
    assert_eq!(s.parse::<ResourceKind>().unwrap(), expected);
    assert_eq!(expected.to_string(), s);
}

#[test]
fn unknown_kind_is_rejected() {
    let err = "chart".parse::<ResourceKind>().unwrap_err();
    assert!(err.to_string().contains("unknown resource kind: 'chart'"));
}

#[test]
fn upsert_appends_new_and_overwrites_existing_in_place() {
    let mut items = list();
    apply_list(&mut items, &ListPatch::Upsert(item("d", 4)));
    apply_list(&mut items, &ListPatch::Upsert(item("b", 20)));
    assert_eq!(
        items,
        vec![item("a", 1), item("b", 20), item("c", 3), item("d", 4)]
    );
}

#[test]
fn remove_missing_is_noop() {
    let mut items = list();
    apply_list(&mut items, &ListPatch::Remove { id: "zz".into() });
    assert_eq!(items, list());
}

#[test]
fn insert_at_clamps_index() {
    let mut items = list();
    apply_list(
        &mut items,
        &ListPatch::InsertAt {
            index: 99,
            item: item("z", 0),
        },
    );
    assert_eq!(items.last(), Some(&item("z", 0)));
}

#[parameterized(
    upsert_new = { ListPatch::Upsert(Item { id: "d".into(), n: 4 }) },
    upsert_existing = { ListPatch::Upsert(Item { id: "b".into(), n: 9 }) },
    remove_first = { ListPatch::Remove { id: "a".into() } },
    remove_middle = { ListPatch::Remove { id: "b".into() } },
    remove_missing = { ListPatch::Remove { id: "q".into() } },
    insert_at_new = { ListPatch::InsertAt { index: 1, item: Item { id: "x".into(), n: 0 } } },
)]
fn inverse_restores_list(patch: ListPatch<Item>) {
    let original = list();
    let inverse = invert_list(&original, &patch);
    let mut items = original.clone();
    apply_list(&mut items, &patch);
    apply_list(&mut items, &inverse);
    assert_eq!(items, original);
}

#[test]
fn removal_accepts_id_aliases() {
    let p: ListPatch<Item> = decode_remove(&json!({"node_id": "n1"})).unwrap();
    assert_eq!(p, ListPatch::Remove { id: "n1".into() });
    assert!(decode_remove::<Item>(&json!({"name": "n1"})).is_err());
}

#[test]
fn upsert_decoder_rejects_bad_payload() {
    assert!(decode_upsert::<Item>(&json!({"id": "a"})).is_err());
    assert_eq!(
        decode_upsert::<Item>(&json!({"id": "a", "n": 1})).unwrap(),
        ListPatch::Upsert(item("a", 1))
    );
}
