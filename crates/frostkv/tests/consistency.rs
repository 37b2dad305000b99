mod common;

use common::{BadOption, Calibration, Person, Reading, Sensor, person, setup, setup_with};
use frostkv::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin},
    prelude::*,
};
use proptest::prelude::*;

#[test]
fn invalid_option_fails_registration_without_trace() {
    let (_, db) = setup();

    let err = db
        .register::<BadOption>()
        .expect_err("unknown option should fail");
    assert_eq!(err.origin, ErrorOrigin::Model);
    assert!(err.message.contains("poop"));
    assert!(db.registry().lookup_by_name("BadOption").is_none());
    assert!(db.registry().lookup_by_type::<BadOption>().is_none());

    let err = db
        .save(&mut BadOption::default())
        .expect_err("unregistered model");
    assert!(err.is_model_not_registered());
}

#[test]
fn type_mismatch_on_find_by_name() {
    let (_, db) = setup();

    let mut reading = Reading::default();
    db.save(&mut reading).expect("save");

    let mut dest = Person::default();
    let err = db
        .find_by_name("Reading", reading.id(), &mut dest)
        .expect_err("wrong destination type");
    assert_eq!(err.class, ErrorClass::Mismatch);
    assert_eq!(dest, Person::default());
}

#[test]
fn connections_are_released_on_every_path() {
    let (store, db) = setup();

    let mut record = person("Ada", 36);
    db.save(&mut record).expect("save");
    db.find::<Person>(record.id()).expect("find");
    db.find::<Person>("missing").expect_err("miss");
    db.delete::<Person>("missing").expect_err("delete miss");
    store.fail_next_exec("broken pipe");
    db.save(&mut record).expect_err("failed save");
    store.fail_next_read("broken pipe");
    db.count::<Person>().expect_err("failed count");

    assert_eq!(store.in_use(), 0);
}

#[test]
fn injected_failure_in_batch_save_writes_nothing() {
    let (store, db) = setup();

    let mut existing = person("Ada", 36);
    db.save(&mut existing).expect("save");
    let before: Vec<_> = store
        .keys()
        .into_iter()
        .map(|key| (key.clone(), store.zset(&key), store.hash(&key)))
        .collect();

    let mut batch = vec![person("Bea", 1), person("Cy", 2)];
    existing.age = 99;
    batch.push(existing.clone());
    store.fail_next_exec("connection reset");
    let err = db.msave(&mut batch).expect_err("injected failure");
    assert!(err.is_transport());

    let after: Vec<_> = store
        .keys()
        .into_iter()
        .map(|key| (key.clone(), store.zset(&key), store.hash(&key)))
        .collect();
    assert_eq!(after, before);
    assert_eq!(db.count::<Person>().expect("count"), 1);
}

#[test]
fn config_file_drives_the_db() {
    let config = Config::from_toml_str(
        r#"
            debug = true
            record_locks = true
            lock_stripes = 8
            max_batch_commands = 64

            [memory]
            max_connections = 2
        "#,
    )
    .expect("config should parse");
    let (_, db) = setup_with(config);

    assert!(db.config().debug);
    let mut record = person("Ada", 36);
    db.save(&mut record).expect("save under locks");
    assert_eq!(db.count::<Person>().expect("count"), 1);
}

#[test]
fn invalid_config_is_rejected() {
    let err = Config::from_toml_str("record_locks = true\nlock_stripes = 0")
        .expect_err("zero stripes");
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = Config::from_toml_str("unknown_key = 1").expect_err("unknown key");
    assert!(matches!(err, ConfigError::Parse(_)));

    // the Db constructor validates hand-built configs too
    let config = Config {
        record_locks: true,
        lock_stripes: 0,
        ..Config::default()
    };
    let store = std::sync::Arc::new(MemoryStore::new());
    let err = Db::new(store, config).expect_err("zero stripes");
    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn ids_shadowing_index_keys_are_refused() {
    let (store, db) = setup();

    let mut sensor = Sensor {
        data: DefaultData {
            id: "label".to_string(),
        },
        ..Default::default()
    };
    let err = db.save(&mut sensor).expect_err("id equal to an index name");
    assert!(!err.is_transport());
    assert!(store.keys().is_empty());

    let mut later = Sensor {
        label: Some("hello".to_string()),
        ..Default::default()
    };
    db.save(&mut later).expect("index key is still a sorted set");
    assert!(store.score("Sensor:label", later.id()).is_some());

    let err = db.find::<Reading>("all").expect_err("all-ids key");
    assert!(!err.is_transport());
    assert!(!err.is_not_found());
}

#[test]
fn non_finite_embedded_float_is_not_saved() {
    let (store, db) = setup();

    let mut sensor = Sensor {
        calibration: Embedded(Calibration { offset: f64::NAN }),
        ..Default::default()
    };
    let err = db.save(&mut sensor).expect_err("NaN cannot round-trip");
    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(db.count::<Sensor>().expect("count"), 0);
    assert!(store.keys().is_empty());
}

#[derive(Clone, Debug)]
enum Op {
    Save(i64),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::Save),
        any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn count_matches_live_records(ops in proptest::collection::vec(op(), 0..24)) {
        let (store, db) = setup();
        let mut live: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Save(int) => {
                    let mut record = Reading { int, ..Default::default() };
                    db.save(&mut record).expect("save");
                    live.push(record.id().to_string());
                }
                Op::Delete(pick) if !live.is_empty() => {
                    let id = live.remove(pick % live.len());
                    db.delete::<Reading>(&id).expect("delete");
                }
                Op::Delete(_) => {}
            }
        }

        prop_assert_eq!(db.count::<Reading>().expect("count"), live.len() as u64);
        prop_assert_eq!(store.zset("Reading:int").len(), live.len());
    }
}
