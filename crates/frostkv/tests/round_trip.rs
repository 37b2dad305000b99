mod common;

use common::{Person, Reading, Settings, Team, person, setup};
use frostkv::prelude::*;
use proptest::prelude::*;

#[test]
fn related_records_round_trip() {
    let (_, db) = setup();

    let mut captain = person("Grace", 45);
    let mut mate = person("Alan", 41);
    db.msave(std::slice::from_mut(&mut captain))
        .expect("save captain");
    db.save(&mut mate).expect("save mate");

    let mut team = Team {
        title: "Compilers".to_string(),
        settings: Embedded(Settings {
            theme: "dark".to_string(),
            volume: 7,
        }),
        captain: Ref::to(&captain),
        members: Refs::new(vec![captain.id().to_string(), mate.id().to_string()]),
        ..Default::default()
    };
    db.save(&mut team).expect("save team");

    let loaded: Team = db.find(team.id()).expect("find team");
    assert_eq!(loaded, team);
    assert_eq!(loaded.settings.theme, "dark");

    let captain_id = loaded.captain.id().expect("captain ref should be set");
    let found: Person = db.find(captain_id).expect("follow captain ref");
    assert_eq!(found, captain);
}

#[test]
fn excluded_field_is_not_persisted() {
    let (store, db) = setup();

    let mut record = Person {
        session: "token".to_string(),
        ..person("Ada", 36)
    };
    db.save(&mut record).expect("save");

    let hash = store
        .hash(&format!("Person:{}", record.id()))
        .expect("hash should exist");
    assert!(hash.values().all(|v| v != "token"));

    let loaded: Person = db.find(record.id()).expect("find");
    assert_eq!(loaded.session, "");
}

#[test]
fn caller_supplied_ids_are_kept() {
    let (store, db) = setup();

    let mut record = Reading {
        data: DefaultData {
            id: "fixed-id".to_string(),
        },
        int: 3,
        ..Default::default()
    };
    db.save(&mut record).expect("save");

    assert_eq!(record.id(), "fixed-id");
    assert!(store.hash("Reading:fixed-id").is_some());
    assert_eq!(
        db.key_for_model(&record).expect("key"),
        "Reading:fixed-id".to_string()
    );
    assert_eq!(db.key_for_all::<Reading>().expect("key"), "Reading:all");
}

#[test]
fn generated_ids_are_unique() {
    let (_, db) = setup();

    let mut records: Vec<Reading> = (0..50)
        .map(|int| Reading {
            int,
            ..Default::default()
        })
        .collect();
    db.msave(&mut records).expect("msave");

    let mut ids: Vec<&str> = records.iter().map(Model::id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);
    assert_eq!(db.count::<Reading>().expect("count"), 50);
}

proptest! {
    #[test]
    fn saved_person_loads_back_equal(
        name in ".{0,24}",
        age in any::<u32>(),
        score in -1.0e12f64..1.0e12,
        active in any::<bool>(),
        nickname in proptest::option::of("[a-z]{0,8}"),
    ) {
        let (_, db) = setup();
        let mut record = Person {
            name,
            age,
            score,
            active,
            nickname,
            ..Default::default()
        };
        db.save(&mut record).expect("save");

        let loaded: Person = db.find(record.id()).expect("find");
        prop_assert_eq!(loaded, record);
    }
}
