//! Heap instances
//!
//! An `Instance` is a class ID plus a flat vector of field slots covering
//! the whole ancestor chain. Slots are guarded by a lock so instances can be
//! shared across threads; reflective reads clone the stored value.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::ClassId;
use crate::value::Value;

/// Shared reference to a heap instance.
pub type ObjRef = Arc<Instance>;

/// Object instance: class ID plus field slot storage.
#[derive(Debug)]
pub struct Instance {
    class: ClassId,
    fields: RwLock<Vec<Value>>,
}

impl Instance {
    /// Create an instance with all slots null.
    pub fn new(class: ClassId, field_count: usize) -> Self {
        Self {
            class,
            fields: RwLock::new(vec![Value::Null; field_count]),
        }
    }

    /// The instance's class ID.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Number of field slots.
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Read a field slot.
    pub fn read(&self, slot: usize) -> Option<Value> {
        self.fields.read().get(slot).cloned()
    }

    /// Write a field slot.
    pub fn write(&self, slot: usize, value: Value) -> Result<(), String> {
        let mut fields = self.fields.write();
        if slot < fields.len() {
            fields[slot] = value;
            Ok(())
        } else {
            Err(format!(
                "field slot {} out of bounds (instance has {} slots)",
                slot,
                fields.len()
            ))
        }
    }
}
