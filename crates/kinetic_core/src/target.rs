//! Property target contract
//!
//! The engine never reflects over host objects. Anything it animates
//! implements [`PropertyTarget`], a small explicit accessor table keyed by
//! property name. [`PropertyMap`] is a ready-made implementation for hosts
//! that simply want a bag of named values.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::value::{Value, ValueKind};

/// Named property access on an animated object
pub trait PropertyTarget {
    /// Check whether a property with this name exists
    fn has_property(&self, name: &str) -> bool;

    /// Check whether the property accepts writes
    fn is_writable(&self, name: &str) -> bool;

    /// Shape of the property, `Unsupported` if it cannot be animated
    fn value_kind(&self, name: &str) -> ValueKind;

    /// Read the current value of a property
    fn get_value(&self, name: &str) -> Option<Value>;

    /// Write a property
    fn set_value(&mut self, name: &str, value: Value);
}

/// Shared, single-threaded handle to a target
///
/// The engine only keeps a [`WeakTarget`], so the host stays the owner.
pub type SharedTarget = Rc<RefCell<dyn PropertyTarget>>;

/// Non-owning reference the engine holds on its target
pub type WeakTarget = Weak<RefCell<dyn PropertyTarget>>;

#[derive(Clone, Debug)]
struct PropertySlot {
    value: Value,
    writable: bool,
    writes: u64,
}

/// Hash-map backed [`PropertyTarget`]
///
/// Each property keeps the kind of the value it was declared with; writes of
/// another kind are converted when possible and dropped otherwise.
#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    properties: FxHashMap<String, PropertySlot>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a writable property (builder pattern)
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value, true);
        self
    }

    /// Declare a read-only property (builder pattern)
    pub fn with_read_only(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value, false);
        self
    }

    /// Declare or replace a property
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>, writable: bool) {
        self.properties.insert(
            name.into(),
            PropertySlot {
                value: value.into(),
                writable,
                writes: 0,
            },
        );
    }

    /// Current value of a property
    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties.get(name).map(|slot| slot.value)
    }

    /// Number of accepted writes to a property since it was declared
    pub fn write_count(&self, name: &str) -> u64 {
        self.properties.get(name).map_or(0, |slot| slot.writes)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Wrap into a shared handle suitable for the engine
    pub fn into_shared(self) -> Rc<RefCell<PropertyMap>> {
        Rc::new(RefCell::new(self))
    }
}

impl PropertyTarget for PropertyMap {
    fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn is_writable(&self, name: &str) -> bool {
        self.properties.get(name).is_some_and(|slot| slot.writable)
    }

    fn value_kind(&self, name: &str) -> ValueKind {
        self.properties
            .get(name)
            .map_or(ValueKind::Unsupported, |slot| slot.value.kind())
    }

    fn get_value(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn set_value(&mut self, name: &str, value: Value) {
        let Some(slot) = self.properties.get_mut(name) else {
            tracing::warn!("PropertyMap: write to unknown property '{}'", name);
            return;
        };
        if !slot.writable {
            tracing::warn!("PropertyMap: write to read-only property '{}'", name);
            return;
        }
        match value.convert(slot.value.kind()) {
            Some(converted) => {
                slot.value = converted;
                slot.writes += 1;
            }
            None => tracing::warn!(
                "PropertyMap: cannot store {} value in {} property '{}'",
                value.kind(),
                slot.value.kind(),
                name
            ),
        }
    }
}
