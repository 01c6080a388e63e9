//! Lazy, cached resolution of driver instances by logical name.
//!
//! [`DriverManager`] is the shared engine behind
//! [`ModelManager`](crate::ai::ModelManager) and
//! [`StoreManager`](crate::stores::StoreManager):
//!
//! 1. an omitted name falls back to the configured default;
//! 2. a cached instance is returned as the same `Arc`;
//! 3. otherwise the static config block is looked up (`ConfigNotFound`),
//!    then a custom factory registered via [`DriverManager::extend`], then
//!    a built-in constructor keyed by the block's `driver` entry (or the
//!    name itself); nothing matching is `DriverNotSupported`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::{VectorError, VectorResult};
use crate::models::DriverConfig;

/// Constructor for a driver instance from its config block
pub type Factory<T> = Arc<dyn Fn(&DriverConfig) -> VectorResult<Arc<T>> + Send + Sync>;

pub struct DriverManager<T: ?Sized> {
    kind: &'static str,
    default_name: String,
    configs: HashMap<String, DriverConfig>,
    builtins: HashMap<&'static str, Factory<T>>,
    custom: RwLock<HashMap<String, Factory<T>>>,
    instances: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized + Send + Sync> DriverManager<T> {
    /// `kind` is only used in error messages and logs ("Vector store", "AI model").
    pub fn new(
        kind: &'static str,
        default_name: impl Into<String>,
        configs: HashMap<String, DriverConfig>,
    ) -> Self {
        Self {
            kind,
            default_name: default_name.into(),
            configs,
            builtins: HashMap::new(),
            custom: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Register a built-in constructor under a driver key
    pub fn with_builtin<F>(mut self, driver: &'static str, factory: F) -> Self
    where
        F: Fn(&DriverConfig) -> VectorResult<Arc<T>> + Send + Sync + 'static,
    {
        self.builtins.insert(driver, Arc::new(factory));
        self
    }

    /// Register (or replace) a custom factory for `name`.
    ///
    /// An instance already cached for `name` is kept; call
    /// [`forget`](Self::forget) to make the new factory take effect.
    pub fn extend<F>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        F: Fn(&DriverConfig) -> VectorResult<Arc<T>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(kind = self.kind, %name, "Registering custom driver factory");
        self.custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(factory));
        self
    }

    /// Resolve `name` (or the default) to a live instance.
    ///
    /// The write lock is held while constructing, so concurrent first
    /// resolutions of one name build exactly one instance. Factories must
    /// not resolve through the same manager.
    ///
    /// A factory that panics poisons the lock but never leaves a partial
    /// entry behind, so the maps are recovered rather than rejected.
    pub fn resolve(&self, name: Option<&str>) -> VectorResult<Arc<T>> {
        let name = name.unwrap_or(self.default_name.as_str());

        if let Some(instance) = self.cached(name) {
            debug!(kind = self.kind, name, "Using cached driver");
            return Ok(instance);
        }

        let mut instances = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(name) {
            return Ok(Arc::clone(instance));
        }

        let instance = self.construct(name)?;
        instances.insert(name.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Drop the cached instance for `name`; returns whether one existed.
    pub fn forget(&self, name: &str) -> bool {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Static configuration block for `name`
    pub fn config(&self, name: &str) -> VectorResult<&DriverConfig> {
        self.configs
            .get(name)
            .ok_or_else(|| VectorError::ConfigNotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.cached(name).is_some()
    }

    fn cached(&self, name: &str) -> Option<Arc<T>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn construct(&self, name: &str) -> VectorResult<Arc<T>> {
        let config = self.config(name)?;

        let custom = self
            .custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(factory) = custom {
            info!(kind = self.kind, name, "Constructing custom driver");
            return factory(config);
        }

        let driver = config.driver().unwrap_or(name);
        match self.builtins.get(driver) {
            Some(factory) => {
                info!(kind = self.kind, name, driver, "Constructing built-in driver");
                factory(config)
            }
            None => Err(VectorError::DriverNotSupported {
                kind: self.kind,
                name: name.to_string(),
            }),
        }
    }
}
