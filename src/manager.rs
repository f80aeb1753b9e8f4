//! Explicit manager composition.
//!
//! Instead of auto-injecting a manager onto every model type, a
//! [`Manager`] is constructed for a model type with a configuration, and
//! hands out fresh resource sets. [`objects`] is the shorthand factory for
//! one-off query expressions.

use std::marker::PhantomData;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::Model;
use crate::resource::{Lookup, ResourceSet};

/// Resource-set factory for a model type, with pass-through CRUD shortcuts.
#[derive(Debug, Clone)]
pub struct Manager<M: Model> {
    config: ClientConfig,
    _model: PhantomData<M>,
}

impl<M: Model> Manager<M> {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            _model: PhantomData,
        }
    }

    /// A fresh, unresolved resource set. Each query expression gets its own;
    /// sets are never reused across expressions.
    pub fn resource(&self) -> ResourceSet<M> {
        ResourceSet::new(self.config.clone())
    }

    pub fn get(&self, lookup: impl Into<Option<Lookup>>) -> Result<M> {
        self.resource().get(lookup)
    }

    pub fn filter(&self, key: &str, value: impl ToString) -> ResourceSet<M> {
        self.resource().filter(key, value)
    }

    pub fn all(&self) -> ResourceSet<M> {
        self.resource().all()
    }

    pub fn delete(&self, instance: &M) -> Result<()> {
        self.resource().delete(instance)
    }
}

/// Shorthand factory: the resource set for a model type under a
/// configuration.
pub fn objects<M: Model>(config: &ClientConfig) -> ResourceSet<M> {
    ResourceSet::new(config.clone())
}
