// src/exec/driver.rs

//! Driver handles and their resolution per operation type.
//!
//! The engine never looks inside a driver. It asks a [`DriverResolver`] for
//! the driver matching a request's [`OperationType`] and hands it to
//! [`Request::execute`](crate::exec::Request::execute) unchanged.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::OperationType;

/// Type-erased, cheaply cloneable driver handle.
#[derive(Clone)]
pub struct Driver {
    inner: Arc<dyn Any + Send + Sync>,
    label: &'static str,
}

impl Driver {
    pub fn new<D: Any + Send + Sync>(driver: D) -> Self {
        Self {
            inner: Arc::new(driver),
            label: std::any::type_name::<D>(),
        }
    }

    /// Placeholder handed to requests whose operation type has no driver.
    pub fn none() -> Self {
        Self::new(())
    }

    pub fn is_none(&self) -> bool {
        self.inner.is::<()>()
    }

    /// Borrow the concrete driver, if it is a `D`.
    pub fn downcast_ref<D: Any>(&self) -> Option<&D> {
        self.inner.downcast_ref::<D>()
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver").field("type", &self.label).finish()
    }
}

/// Maps an operation type to the driver that serves it.
pub trait DriverResolver: Send + Sync {
    fn resolve(&self, op: OperationType) -> Option<Driver>;
}

/// Resolver backed by a fixed table, with an optional fallback.
///
/// Drivers are registered once and shared by every node that needs them.
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<OperationType, Driver>,
    fallback: Option<Driver>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<D: Any + Send + Sync>(mut self, op: OperationType, driver: D) -> Self {
        self.drivers.insert(op, Driver::new(driver));
        self
    }

    pub fn with_fallback<D: Any + Send + Sync>(mut self, driver: D) -> Self {
        self.fallback = Some(Driver::new(driver));
        self
    }
}

impl DriverResolver for DriverRegistry {
    fn resolve(&self, op: OperationType) -> Option<Driver> {
        self.drivers
            .get(&op)
            .or(self.fallback.as_ref())
            .cloned()
    }
}
