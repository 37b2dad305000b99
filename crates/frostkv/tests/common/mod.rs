#![allow(dead_code)]

use frostkv::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, Default, Model, PartialEq)]
pub struct Person {
    pub data: DefaultData,
    #[frost("n, index")]
    pub name: String,
    #[frost("index")]
    pub age: u32,
    #[frost("index")]
    pub score: f64,
    #[frost("index")]
    pub active: bool,
    pub nickname: Option<String>,
    #[frost("-")]
    pub session: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    pub theme: String,
    pub volume: u8,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
pub struct Team {
    pub data: DefaultData,
    pub title: String,
    pub settings: Embedded<Settings>,
    pub captain: Ref<Person>,
    pub members: Refs<Person>,
}

/// The `{ int (indexed), flag, text }` record used by the store-layout tests.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub struct Reading {
    pub data: DefaultData,
    #[frost("index")]
    pub int: i64,
    pub flag: bool,
    pub text: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Calibration {
    pub offset: f64,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
pub struct Sensor {
    pub data: DefaultData,
    #[frost("index")]
    pub label: Option<String>,
    pub calibration: Embedded<Calibration>,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
pub struct BadOption {
    pub data: DefaultData,
    #[frost("index,poop")]
    pub attr: String,
}

pub fn person(name: &str, age: u32) -> Person {
    Person {
        name: name.to_string(),
        age,
        score: f64::from(age) / 2.0,
        active: age % 2 == 0,
        ..Default::default()
    }
}

/// A `Db` over a fresh memory store with the common models registered.
pub fn setup() -> (Arc<MemoryStore>, Db) {
    setup_with(Config::default())
}

pub fn setup_with(config: Config) -> (Arc<MemoryStore>, Db) {
    let store = Arc::new(MemoryStore::from_config(&config.memory));
    let db = Db::new(store.clone(), config).expect("config should be valid");
    db.register::<Person>().expect("register Person");
    db.register::<Team>().expect("register Team");
    db.register::<Reading>().expect("register Reading");
    db.register::<Sensor>().expect("register Sensor");

    (store, db)
}
