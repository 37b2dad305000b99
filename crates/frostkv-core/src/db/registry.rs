use crate::{
    error::{Error, ErrorClass},
    model::{ModelSpec, compile},
    traits::Model,
};
use parking_lot::RwLock;
use std::{any::TypeId, collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("type '{type_name}' is already registered")]
    TypeAlreadyRegistered { type_name: &'static str },

    #[error("model name '{name}' is already registered")]
    NameAlreadyRegistered { name: String },

    #[error("type '{type_name}' is not registered")]
    TypeNotRegistered { type_name: &'static str },

    #[error("model name '{name}' is not registered")]
    NameNotRegistered { name: String },
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::TypeAlreadyRegistered { .. } | Self::NameAlreadyRegistered { .. } => {
                ErrorClass::Conflict
            }
            Self::TypeNotRegistered { .. } | Self::NameNotRegistered { .. } => {
                ErrorClass::NotFound
            }
        }
    }

    #[must_use]
    pub const fn is_not_registered(&self) -> bool {
        matches!(
            self,
            Self::TypeNotRegistered { .. } | Self::NameNotRegistered { .. }
        )
    }
}

///
/// RegistryMaps
/// Both lookup tables, always mutated together under one lock.
///

#[derive(Default)]
struct RegistryMaps {
    by_name: HashMap<String, Arc<ModelSpec>>,
    by_type: HashMap<TypeId, Arc<ModelSpec>>,
}

///
/// Registry
///
/// Process-scoped table of compiled model specs, keyed both by Rust type
/// and by model name. Owned by a `Db`; the caller controls its lifetime.
///
/// Registration is expected to happen during start-up. The lock keeps
/// each mutation atomic to concurrent readers, but a register/unregister
/// race on the same name is still the caller's to serialize.
///

#[derive(Default)]
pub struct Registry {
    maps: RwLock<RegistryMaps>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register `M` under its type name.
    pub fn register<M: Model>(&self) -> Result<Arc<ModelSpec>, Error> {
        self.insert(compile::<M>(None)?)
    }

    /// Compile and register `M` under an explicit model name.
    pub fn register_name<M: Model>(&self, name: &str) -> Result<Arc<ModelSpec>, Error> {
        self.insert(compile::<M>(Some(name))?)
    }

    fn insert(&self, spec: ModelSpec) -> Result<Arc<ModelSpec>, Error> {
        let mut maps = self.maps.write();

        if maps.by_type.contains_key(&spec.type_id()) {
            return Err(RegistryError::TypeAlreadyRegistered {
                type_name: spec.type_name(),
            }
            .into());
        }
        if maps.by_name.contains_key(spec.name()) {
            return Err(RegistryError::NameAlreadyRegistered {
                name: spec.name().to_string(),
            }
            .into());
        }

        let spec = Arc::new(spec);
        maps.by_type.insert(spec.type_id(), Arc::clone(&spec));
        maps.by_name
            .insert(spec.name().to_string(), Arc::clone(&spec));

        Ok(spec)
    }

    /// Remove the spec registered for `M`.
    pub fn unregister<M: Model>(&self) -> Result<Arc<ModelSpec>, Error> {
        let mut maps = self.maps.write();
        let spec = maps
            .by_type
            .remove(&TypeId::of::<M>())
            .ok_or(RegistryError::TypeNotRegistered {
                type_name: M::TYPE_NAME,
            })?;
        maps.by_name.remove(spec.name());

        Ok(spec)
    }

    /// Remove the spec registered under `name`.
    pub fn unregister_name(&self, name: &str) -> Result<Arc<ModelSpec>, Error> {
        let mut maps = self.maps.write();
        let spec = maps
            .by_name
            .remove(name)
            .ok_or_else(|| RegistryError::NameNotRegistered {
                name: name.to_string(),
            })?;
        maps.by_type.remove(&spec.type_id());

        Ok(spec)
    }

    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<ModelSpec>> {
        self.maps.read().by_name.get(name).cloned()
    }

    #[must_use]
    pub fn lookup_by_type<M: Model>(&self) -> Option<Arc<ModelSpec>> {
        self.maps.read().by_type.get(&TypeId::of::<M>()).cloned()
    }

    /// Look up the spec for `M`, failing when it is not registered.
    pub fn try_get<M: Model>(&self) -> Result<Arc<ModelSpec>, Error> {
        self.lookup_by_type::<M>().ok_or_else(|| {
            RegistryError::TypeNotRegistered {
                type_name: M::TYPE_NAME,
            }
            .into()
        })
    }

    /// Look up a spec by name, failing when it is not registered.
    pub fn try_get_name(&self, name: &str) -> Result<Arc<ModelSpec>, Error> {
        self.lookup_by_name(name).ok_or_else(|| {
            RegistryError::NameNotRegistered {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Registered model names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.maps.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.read().by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorOrigin,
        test_support::{InvalidOptionModel, PlainModel, ScenarioModel},
    };
    use std::{sync::Arc, thread};

    #[test]
    fn register_binds_type_and_name() {
        let registry = Registry::new();
        let spec = registry
            .register::<PlainModel>()
            .expect("registration should succeed");

        assert_eq!(spec.name(), "PlainModel");
        let by_name = registry
            .lookup_by_name("PlainModel")
            .expect("name lookup should resolve");
        let by_type = registry
            .lookup_by_type::<PlainModel>()
            .expect("type lookup should resolve");
        assert!(Arc::ptr_eq(&by_name, &by_type));
        assert!(Arc::ptr_eq(&spec, &by_type));
    }

    #[test]
    fn register_name_overrides_type_name() {
        let registry = Registry::new();
        registry
            .register_name::<PlainModel>("customName")
            .expect("registration should succeed");

        assert!(registry.lookup_by_name("customName").is_some());
        assert!(registry.lookup_by_name("PlainModel").is_none());
        assert_eq!(
            registry.lookup_by_type::<PlainModel>().map(|s| s.name().to_string()),
            Some("customName".to_string())
        );
    }

    #[test]
    fn duplicate_type_registration_is_rejected() {
        let registry = Registry::new();
        registry.register::<PlainModel>().expect("first registration");

        let err = registry
            .register_name::<PlainModel>("other")
            .expect_err("second registration of the same type should fail");
        assert_eq!(err.class, ErrorClass::Conflict);
        assert_eq!(err.origin, ErrorOrigin::Registry);
        assert!(registry.lookup_by_name("other").is_none());
    }

    #[test]
    fn duplicate_name_registration_is_rejected() {
        let registry = Registry::new();
        registry
            .register_name::<PlainModel>("shared")
            .expect("first registration");

        let err = registry
            .register_name::<ScenarioModel>("shared")
            .expect_err("name reuse should fail");
        assert!(err.message.contains("'shared' is already registered"));
        assert!(registry.lookup_by_type::<ScenarioModel>().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_compile_leaves_no_trace() {
        let registry = Registry::new();
        let err = registry
            .register::<InvalidOptionModel>()
            .expect_err("invalid option should fail registration");

        assert_eq!(err.origin, ErrorOrigin::Model);
        assert!(registry.lookup_by_type::<InvalidOptionModel>().is_none());
        assert!(registry.lookup_by_name("InvalidOptionModel").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_removes_both_entries() {
        let registry = Registry::new();
        registry.register::<PlainModel>().expect("registration");

        registry
            .unregister::<PlainModel>()
            .expect("unregister should succeed");
        assert!(registry.lookup_by_name("PlainModel").is_none());
        assert!(registry.lookup_by_type::<PlainModel>().is_none());

        registry
            .register_name::<PlainModel>("again")
            .expect("re-registration after unregister should succeed");
        registry
            .unregister_name("again")
            .expect("unregister by name should succeed");
        assert!(registry.lookup_by_type::<PlainModel>().is_none());
    }

    #[test]
    fn unregister_unknown_reports_not_registered() {
        let registry = Registry::new();

        let err = registry
            .unregister_name("ghost")
            .expect_err("unknown name should fail");
        assert!(err.is_model_not_registered());

        let err = registry
            .unregister::<PlainModel>()
            .expect_err("unknown type should fail");
        assert!(err.is_model_not_registered());
    }

    #[test]
    fn concurrent_registration_of_distinct_types() {
        let registry = Arc::new(Registry::new());
        let a = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register::<PlainModel>().map(|_| ()))
        };
        let b = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register::<ScenarioModel>().map(|_| ()))
        };

        a.join().expect("thread a").expect("register a");
        b.join().expect("thread b").expect("register b");
        assert_eq!(
            registry.names(),
            vec!["PlainModel".to_string(), "ScenarioModel".to_string()]
        );
    }
}
