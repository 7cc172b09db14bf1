//! Reflection drivers
//!
//! A driver is one concrete mechanism for resolving and acting on members
//! of the object model. All drivers share the same ancestor-chain
//! resolution (implemented here once); they differ in the gate applied
//! before touching a resolved member: the standard driver enforces
//! visibility, the slot driver bypasses it, and the hook driver delegates
//! the access itself to the host.
//!
//! Handles returned by `find_*` are opaque, scoped to the driver that
//! produced them, and meant to be consumed within the same facade call —
//! the facade never caches them.

mod hook;
mod select;
mod slot;
mod standard;

use std::sync::Arc;

use crate::error::DriverError;
use crate::object::{Class, ClassId, ClassRegistry, FieldDef, MethodDef, ObjRef};
use crate::value::{TypeTag, Value};

pub use hook::{AccessHook, HookDriver};
pub use select::{select_driver, DriverPreference, ParsePreferenceError};
pub use slot::SlotDriver;
pub use standard::StandardDriver;

/// Opaque handle to a resolved field.
#[derive(Debug, Clone, Copy)]
pub struct FieldHandle {
    pub(crate) class: ClassId,
    pub(crate) index: usize,
    pub(crate) is_static: bool,
}

/// Opaque handle to a resolved method.
#[derive(Debug, Clone, Copy)]
pub struct MethodHandle {
    pub(crate) class: ClassId,
    pub(crate) index: usize,
}

/// Capability set every reflection driver satisfies.
///
/// All methods take the registry explicitly; drivers hold no references
/// into the object model beyond construction-time capabilities.
pub trait ReflectionDriver: Send + Sync {
    /// Driver name for diagnostics.
    fn name(&self) -> &'static str;

    /// Resolve a class by fully-qualified name.
    fn find_class(&self, reg: &ClassRegistry, name: &str) -> Result<ClassId, DriverError>;

    /// Resolve a field (instance or static) by name, searching the ancestor
    /// chain most-derived first.
    fn find_field(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
    ) -> Result<FieldHandle, DriverError>;

    /// Read a field through a handle. Static-field handles read the
    /// declaring class's storage and ignore the target.
    fn read_field(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &FieldHandle,
    ) -> Result<Value, DriverError>;

    /// Read a static field through a handle.
    fn read_static(&self, reg: &ClassRegistry, handle: &FieldHandle)
        -> Result<Value, DriverError>;

    /// Write a field through a handle.
    fn write_field(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError>;

    /// Write a static field through a handle.
    fn write_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError>;

    /// Resolve a method by name and optional single-parameter type,
    /// searching the ancestor chain most-derived first.
    fn find_method(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
        arg: Option<&TypeTag>,
    ) -> Result<MethodHandle, DriverError>;

    /// Resolve a static method by name and optional single-parameter type.
    fn find_static_method(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
        arg: Option<&TypeTag>,
    ) -> Result<MethodHandle, DriverError>;

    /// Invoke a method on a target. Static methods resolved through
    /// `find_method` are invoked without a receiver.
    fn invoke(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &MethodHandle,
        arg: Option<Value>,
    ) -> Result<Value, DriverError>;

    /// Invoke a static method.
    fn invoke_static(
        &self,
        reg: &ClassRegistry,
        handle: &MethodHandle,
        arg: Option<Value>,
    ) -> Result<Value, DriverError>;
}

/// Fetch a class descriptor, mapping a dangling ID to `UnknownClass`.
pub(crate) fn lookup_class(reg: &ClassRegistry, id: ClassId) -> Result<Arc<Class>, DriverError> {
    reg.get(id)
        .ok_or_else(|| DriverError::UnknownClass(format!("#{}", id)))
}

/// Ancestor-chain field resolution shared by every driver.
pub(crate) fn resolve_field(
    reg: &ClassRegistry,
    class: ClassId,
    name: &str,
) -> Result<FieldHandle, DriverError> {
    lookup_class(reg, class)?;
    for cls in reg.ancestry(class) {
        if let Some(index) = cls.field_index(name) {
            return Ok(FieldHandle {
                class: cls.id,
                index,
                is_static: false,
            });
        }
        if let Some(index) = cls.static_index(name) {
            return Ok(FieldHandle {
                class: cls.id,
                index,
                is_static: true,
            });
        }
    }
    Err(DriverError::NotFound)
}

/// Ancestor-chain method resolution shared by every driver.
pub(crate) fn resolve_method(
    reg: &ClassRegistry,
    class: ClassId,
    name: &str,
    require_static: bool,
    arg: Option<&TypeTag>,
) -> Result<MethodHandle, DriverError> {
    lookup_class(reg, class)?;
    for cls in reg.ancestry(class) {
        if let Some(index) = cls.method_index(name, require_static, arg) {
            return Ok(MethodHandle {
                class: cls.id,
                index,
            });
        }
    }
    Err(DriverError::NotFound)
}

/// Recover the declaring class and field declaration behind a handle.
pub(crate) fn field_decl(
    reg: &ClassRegistry,
    handle: &FieldHandle,
) -> Result<(Arc<Class>, FieldDef), DriverError> {
    let cls = lookup_class(reg, handle.class)?;
    let def = if handle.is_static {
        cls.static_at(handle.index)
    } else {
        cls.field_at(handle.index)
    };
    let def = def.cloned().ok_or(DriverError::NotFound)?;
    Ok((cls, def))
}

/// Recover the declaring class and method declaration behind a handle.
pub(crate) fn method_decl(
    reg: &ClassRegistry,
    handle: &MethodHandle,
) -> Result<(Arc<Class>, MethodDef), DriverError> {
    let cls = lookup_class(reg, handle.class)?;
    let def = cls
        .method_at(handle.index)
        .cloned()
        .ok_or(DriverError::NotFound)?;
    Ok((cls, def))
}

/// Raw field read: instance slot or declaring-class static storage.
pub(crate) fn read_raw(
    cls: &Class,
    def: &FieldDef,
    target: Option<&ObjRef>,
) -> Result<Value, DriverError> {
    if def.is_static {
        cls.read_static(def.slot)
            .ok_or_else(|| DriverError::AccessDenied("static slot out of range".to_string()))
    } else {
        let obj = target
            .ok_or_else(|| DriverError::AccessDenied("instance field needs a target".to_string()))?;
        obj.read(def.slot)
            .ok_or_else(|| DriverError::AccessDenied("field slot out of range".to_string()))
    }
}

/// Raw field write, rejecting readonly fields under every driver.
pub(crate) fn write_raw(
    cls: &Class,
    def: &FieldDef,
    target: Option<&ObjRef>,
    value: Value,
) -> Result<(), DriverError> {
    if def.readonly {
        return Err(DriverError::AccessDenied(format!(
            "field {} is readonly",
            def.name
        )));
    }
    if def.is_static {
        cls.write_static(def.slot, value)
            .map_err(DriverError::AccessDenied)
    } else {
        let obj = target
            .ok_or_else(|| DriverError::AccessDenied("instance field needs a target".to_string()))?;
        obj.write(def.slot, value).map_err(DriverError::AccessDenied)
    }
}

/// Call a method body, mapping a body fault to `Invocation`. Static
/// methods never see a receiver.
pub(crate) fn call_raw(
    def: &MethodDef,
    target: Option<&ObjRef>,
    arg: Option<Value>,
) -> Result<Value, DriverError> {
    let receiver = if def.is_static { None } else { target };
    if receiver.is_none() && !def.is_static {
        return Err(DriverError::AccessDenied(
            "instance method needs a target".to_string(),
        ));
    }
    (def.body)(receiver, arg).map_err(DriverError::Invocation)
}

/// Guard for static accessors handed an instance-field handle.
pub(crate) fn require_static(def: &FieldDef) -> Result<(), DriverError> {
    if def.is_static {
        Ok(())
    } else {
        Err(DriverError::AccessDenied(format!(
            "field {} is not static",
            def.name
        )))
    }
}

/// Guard for static invocation handed an instance-method handle.
pub(crate) fn require_static_method(def: &MethodDef) -> Result<(), DriverError> {
    if def.is_static {
        Ok(())
    } else {
        Err(DriverError::AccessDenied(format!(
            "method {} is not static",
            def.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, FieldSpec, MethodSpec};

    fn hierarchy() -> (ClassRegistry, ClassId, ClassId) {
        let registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .with_field(FieldSpec::new("x").init(Value::Int(5)))
            .with_field(FieldSpec::new("shared").as_static().init(Value::Int(1)))
            .with_method(MethodSpec::new("ping", |_, _| Ok(Value::str("pong"))))
            .register(&registry)
            .unwrap();
        let child = ClassBuilder::new("Child")
            .extends(base)
            .with_field(FieldSpec::new("y"))
            .register(&registry)
            .unwrap();
        (registry, base, child)
    }

    #[test]
    fn test_resolve_field_walks_ancestors() {
        let (registry, base, child) = hierarchy();
        let h = resolve_field(&registry, child, "x").unwrap();
        assert_eq!(h.class, base);
        assert!(!h.is_static);

        let h = resolve_field(&registry, child, "y").unwrap();
        assert_eq!(h.class, child);

        assert!(matches!(
            resolve_field(&registry, child, "missing"),
            Err(DriverError::NotFound)
        ));
    }

    #[test]
    fn test_resolve_field_finds_ancestor_statics() {
        let (registry, base, child) = hierarchy();
        let h = resolve_field(&registry, child, "shared").unwrap();
        assert_eq!(h.class, base);
        assert!(h.is_static);
    }

    #[test]
    fn test_resolve_unknown_class() {
        let (registry, _, _) = hierarchy();
        assert!(matches!(
            resolve_field(&registry, 99, "x"),
            Err(DriverError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_resolve_method_walks_ancestors() {
        let (registry, base, child) = hierarchy();
        let h = resolve_method(&registry, child, "ping", false, None).unwrap();
        assert_eq!(h.class, base);

        assert!(matches!(
            resolve_method(&registry, child, "ping", true, None),
            Err(DriverError::NotFound)
        ));
    }
}
