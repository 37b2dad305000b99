//! Record fixtures shared by unit tests.

use crate::{
    config::Config,
    db::Db,
    store::MemoryStore,
    types::{DefaultData, Embedded, Ref, Refs},
};
use frostkv_derive::Model;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

/// No options on any field.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct PlainModel {
    pub(crate) data: DefaultData,
    pub(crate) name: String,
    pub(crate) age: u32,
}

/// `{ int (indexed), flag, text }`.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct ScenarioModel {
    pub(crate) data: DefaultData,
    #[frost("index")]
    pub(crate) int: i64,
    pub(crate) flag: bool,
    pub(crate) text: String,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct InvalidOptionModel {
    pub(crate) data: DefaultData,
    #[frost("index,poop")]
    pub(crate) attr: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Address {
    pub(crate) city: String,
    pub(crate) zip: u32,
}

/// One field of every kind, plus renames and an exclusion.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct KitchenSink {
    pub(crate) data: DefaultData,
    #[frost("n, index")]
    pub(crate) name: String,
    #[frost("index")]
    pub(crate) score: f64,
    #[frost("index")]
    pub(crate) active: bool,
    #[frost(",index")]
    pub(crate) nickname: Option<String>,
    pub(crate) small: i8,
    pub(crate) big: u64,
    #[frost("-")]
    pub(crate) scratch: Vec<u8>,
    pub(crate) address: Embedded<Address>,
    pub(crate) tags: BTreeMap<String, u32>,
    pub(crate) owner: Ref<PlainModel>,
    pub(crate) friends: Refs<PlainModel>,
}

/// A fresh `Db` over an empty memory store.
pub(crate) fn memory_db() -> (Arc<MemoryStore>, Db) {
    memory_db_with(Config::default())
}

pub(crate) fn memory_db_with(config: Config) -> (Arc<MemoryStore>, Db) {
    let store = Arc::new(MemoryStore::from_config(&config.memory));
    let db = Db::new(store.clone(), config).expect("test config should be valid");

    (store, db)
}

/// Every stored field is optional, so a record can have no hash at all.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct SparseModel {
    pub(crate) data: DefaultData,
    #[frost("index")]
    pub(crate) maybe: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Sample {
    pub(crate) value: f64,
}

/// A float nested in JSON, where non-finite values have no encoding.
#[derive(Clone, Debug, Default, Model, PartialEq)]
pub(crate) struct Measurement {
    pub(crate) data: DefaultData,
    #[frost("index")]
    pub(crate) label: Option<String>,
    pub(crate) sample: Embedded<Sample>,
}
