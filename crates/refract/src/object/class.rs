//! Class descriptors: fields, methods, visibility
//!
//! A `Class` is an immutable description of a registered type plus the
//! mutable storage for its static fields. Instance field slots are numbered
//! across the whole ancestor chain (a subclass's first own field sits after
//! the last inherited one), so a slot index resolved against any class in
//! the chain is valid for any instance of a subclass.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::object::{ClassId, ObjRef};
use crate::value::{TypeTag, Value};

/// Member visibility, enforced by the standard driver only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Accessible to every driver
    #[default]
    Public,
    /// Accessible to subclasses; privileged drivers only
    Protected,
    /// Declaring class only; privileged drivers only
    Private,
}

impl Visibility {
    /// True for [`Visibility::Public`].
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Declared field metadata.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Instance slot index (absolute across the ancestor chain), or index
    /// into the declaring class's static storage for static fields
    pub slot: usize,
    /// Declared type, if any
    pub type_tag: Option<TypeTag>,
    /// Visibility modifier
    pub visibility: Visibility,
    /// Whether this is a static (class-level) field
    pub is_static: bool,
    /// Whether writes are rejected after initialization
    pub readonly: bool,
    /// Initial value applied at instantiation (or static storage creation)
    pub initial: Option<Value>,
}

/// Host closure bound as a method body.
///
/// Receives the receiver (`None` for static methods) and the single call
/// argument, if any. An `Err` becomes an invocation failure; a body with
/// nothing to return yields [`Value::Null`].
pub type MethodBody =
    Arc<dyn Fn(Option<&ObjRef>, Option<Value>) -> Result<Value, String> + Send + Sync>;

/// Declared method metadata plus its bound body.
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Visibility modifier
    pub visibility: Visibility,
    /// Whether this is a static method
    pub is_static: bool,
    /// Declared single-parameter type (`None` for zero-parameter methods)
    pub param: Option<TypeTag>,
    /// Bound implementation
    pub body: MethodBody,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("param", &self.param)
            .finish()
    }
}

/// Class definition metadata and static storage.
pub struct Class {
    /// Class ID (index into the registry)
    pub id: ClassId,
    /// Fully-qualified class name
    pub name: String,
    /// Parent class ID (`None` for root classes)
    pub parent: Option<ClassId>,
    /// Number of instance field slots, including inherited ones
    pub field_count: usize,
    fields: Vec<FieldDef>,
    static_defs: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    statics: Mutex<Vec<Value>>,
}

impl Class {
    pub(crate) fn new(
        id: ClassId,
        name: String,
        parent: Option<ClassId>,
        field_count: usize,
        fields: Vec<FieldDef>,
        static_defs: Vec<FieldDef>,
        methods: Vec<MethodDef>,
    ) -> Self {
        let statics = static_defs
            .iter()
            .map(|def| def.initial.clone().unwrap_or_default())
            .collect();
        Self {
            id,
            name,
            parent,
            field_count,
            fields,
            static_defs,
            methods,
            statics: Mutex::new(statics),
        }
    }

    /// Find an instance field declared directly on this class.
    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a static field declared directly on this class.
    pub fn declared_static(&self, name: &str) -> Option<&FieldDef> {
        self.static_defs.iter().find(|f| f.name == name)
    }

    /// Instance field declared at the given local index.
    pub fn field_at(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    /// Static field declared at the given local index.
    pub fn static_at(&self, index: usize) -> Option<&FieldDef> {
        self.static_defs.get(index)
    }

    /// Method declared at the given local index.
    pub fn method_at(&self, index: usize) -> Option<&MethodDef> {
        self.methods.get(index)
    }

    /// Fields declared directly on this class (not inherited).
    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Index of an instance field declared directly on this class.
    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Index of a static field declared directly on this class.
    pub(crate) fn static_index(&self, name: &str) -> Option<usize> {
        self.static_defs.iter().position(|f| f.name == name)
    }

    /// Index of a method declared directly on this class, matched by name,
    /// staticness requirement, and declared single-parameter type.
    pub(crate) fn method_index(
        &self,
        name: &str,
        require_static: bool,
        arg: Option<&TypeTag>,
    ) -> Option<usize> {
        self.methods.iter().position(|m| {
            m.name == name
                && (!require_static || m.is_static)
                && m.param.as_ref() == arg
        })
    }

    /// Read a static field value by local index.
    pub fn read_static(&self, index: usize) -> Option<Value> {
        self.statics.lock().get(index).cloned()
    }

    /// Write a static field value by local index.
    pub fn write_static(&self, index: usize, value: Value) -> Result<(), String> {
        let mut statics = self.statics.lock();
        if index < statics.len() {
            statics[index] = value;
            Ok(())
        } else {
            Err(format!(
                "static field index {} out of bounds (class has {} static fields)",
                index,
                statics.len()
            ))
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("field_count", &self.field_count)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}
