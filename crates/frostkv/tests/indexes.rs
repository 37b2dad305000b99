mod common;

use common::{Person, Reading, person, setup};
use frostkv::prelude::*;
use proptest::prelude::*;

#[test]
fn indexed_fields_have_entries_and_others_do_not() {
    let (store, db) = setup();

    let mut record = person("Ada", 36);
    db.save(&mut record).expect("save");
    let id = record.id();

    assert_eq!(store.score("Person:n", id), Some(text_rank("Ada")));
    assert_eq!(store.score("Person:age", id), Some(36.0));
    assert_eq!(store.score("Person:score", id), Some(18.0));
    assert_eq!(store.score("Person:active", id), Some(1.0));
    assert!(store.zset("Person:nickname").is_empty());
    assert!(store.zset("Person:session").is_empty());
    assert!(store.zset("Person:name").is_empty(), "renamed field uses 'n'");
}

fn text_rank(text: &str) -> f64 {
    frostkv::db::index::text_rank(text)
}

#[test]
fn two_records_with_same_value_scenario() {
    let (store, db) = setup();

    let mut a = Reading {
        int: 42,
        flag: true,
        text: "a".to_string(),
        ..Default::default()
    };
    let mut b = Reading {
        int: 42,
        text: "b".to_string(),
        ..Default::default()
    };
    db.save(&mut a).expect("save a");
    db.save(&mut b).expect("save b");

    let index = store.zset("Reading:int");
    assert_eq!(index.len(), 2);
    assert!(index.iter().all(|(_, score)| *score == 42.0));

    let hash = store
        .hash(&format!("Reading:{}", a.id()))
        .expect("hash for a");
    assert_eq!(hash.get("int").map(String::as_str), Some("42"));
    assert_eq!(hash.get("flag").map(String::as_str), Some("1"));
    assert_eq!(hash.get("text").map(String::as_str), Some("a"));

    let members = store.set_members("Reading:all");
    assert!(members.contains(&a.id().to_owned()) && members.contains(&b.id().to_owned()));
}

#[test]
fn updating_replaces_the_old_entry() {
    let (store, db) = setup();

    let mut record = person("Ada", 36);
    db.save(&mut record).expect("save");
    record.name = "Bea".to_string();
    record.age = 37;
    db.save(&mut record).expect("update");

    assert_eq!(store.zset("Person:n").len(), 1);
    assert_eq!(store.score("Person:n", record.id()), Some(text_rank("Bea")));
    assert!(
        db.ids_equal::<Person>("name", "Ada")
            .expect("old value")
            .is_empty()
    );
    assert_eq!(
        db.ids_equal::<Person>("age", 37).expect("new value"),
        vec![record.id().to_string()]
    );
}

#[test]
fn range_and_prefix_lookups() {
    let (_, db) = setup();

    let mut people = vec![
        person("Alice", 20),
        person("Alicia", 30),
        person("Bob", 40),
        person("alice", 50),
    ];
    db.msave(&mut people).expect("msave");
    let id = |i: usize| people[i].id().to_string();

    let mut in_range = db
        .ids_by_score::<Person>("age", 25.0, 45.0)
        .expect("range");
    in_range.sort();
    let mut expected = vec![id(1), id(2)];
    expected.sort();
    assert_eq!(in_range, expected);

    let mut prefixed = db
        .ids_with_prefix::<Person>("name", "Ali")
        .expect("prefix");
    prefixed.sort();
    let mut expected = vec![id(0), id(1)];
    expected.sort();
    assert_eq!(prefixed, expected);

    assert_eq!(
        db.ids_equal::<Person>("name", "alice").expect("equality"),
        vec![id(3)]
    );
    assert!(
        db.ids_with_prefix::<Person>("name", "Zed")
            .expect("no match")
            .is_empty()
    );
}

#[test]
fn lookups_on_unindexed_fields_fail() {
    let (_, db) = setup();

    let err = db
        .ids_equal::<Person>("nickname", "x")
        .expect_err("unindexed field");
    assert_eq!(err.class, ErrorClass::Unsupported);
    assert!(err.message.contains("not indexed"));
}

#[test]
fn deleting_clears_index_entries() {
    let (store, db) = setup();

    let mut record = person("Ada", 36);
    db.save(&mut record).expect("save");
    db.delete::<Person>(record.id()).expect("delete");

    for key in ["Person:n", "Person:age", "Person:score", "Person:active"] {
        assert!(store.zset(key).is_empty(), "{key} still has entries");
    }
    assert!(store.keys().is_empty());
}

proptest! {
    #[test]
    fn index_tracks_latest_value(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let (store, db) = setup();
        let mut record = Reading::default();

        for value in &values {
            record.int = i64::from(*value);
            db.save(&mut record).expect("save");
        }

        let last = *values.last().expect("non-empty");
        prop_assert_eq!(store.zset("Reading:int").len(), 1);
        prop_assert_eq!(store.score("Reading:int", record.id()), Some(f64::from(last)));
        prop_assert_eq!(
            db.ids_equal::<Reading>("int", last).expect("lookup"),
            vec![record.id().to_string()]
        );
    }
}
