//! Hook reflection driver (privileged alternate)
//!
//! Routes every access through a host-installed [`AccessHook`] instead of
//! touching slots itself. Like the slot driver it ignores visibility; the
//! host decides what an access means (shadow storage, remote objects,
//! instrumentation, ...). Construction fails when the policy carries no
//! hook.

use std::sync::Arc;

use crate::driver::{
    call_raw, field_decl, method_decl, read_raw, require_static, require_static_method,
    resolve_field, resolve_method, write_raw, FieldHandle, MethodHandle, ReflectionDriver,
};
use crate::error::{DriverError, DriverInitError};
use crate::object::{Class, ClassId, ClassRegistry, FieldDef, MethodDef, ObjRef};
use crate::policy::ReflectPolicy;
use crate::value::{TypeTag, Value};

/// Host-supplied access mechanism.
///
/// Default implementations perform plain slot access, so an embedder only
/// overrides the entry points it wants to intercept.
pub trait AccessHook: Send + Sync {
    /// Read a resolved field. `target` is `None` for static fields.
    fn read(
        &self,
        cls: &Class,
        def: &FieldDef,
        target: Option<&ObjRef>,
    ) -> Result<Value, String> {
        read_raw(cls, def, target).map_err(|e| e.to_string())
    }

    /// Write a resolved field. `target` is `None` for static fields.
    fn write(
        &self,
        cls: &Class,
        def: &FieldDef,
        target: Option<&ObjRef>,
        value: Value,
    ) -> Result<(), String> {
        write_raw(cls, def, target, value).map_err(|e| e.to_string())
    }

    /// Invoke a resolved method. `target` is `None` for static methods.
    fn invoke(
        &self,
        def: &MethodDef,
        target: Option<&ObjRef>,
        arg: Option<Value>,
    ) -> Result<Value, String> {
        call_raw(def, target, arg).map_err(|e| e.to_string())
    }
}

/// Driver that delegates member access to the host's [`AccessHook`].
#[derive(Clone)]
pub struct HookDriver {
    hook: Arc<dyn AccessHook>,
}

impl HookDriver {
    /// Construct the hook driver if the policy has a hook installed.
    pub fn new(policy: &ReflectPolicy) -> Result<Self, DriverInitError> {
        match policy.hook() {
            Some(hook) => Ok(Self { hook: hook.clone() }),
            None => Err(DriverInitError::NoHookInstalled),
        }
    }
}

impl std::fmt::Debug for HookDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDriver").finish()
    }
}

impl ReflectionDriver for HookDriver {
    fn name(&self) -> &'static str {
        "hook"
    }

    fn find_class(&self, reg: &ClassRegistry, name: &str) -> Result<ClassId, DriverError> {
        reg.lookup(name)
            .ok_or_else(|| DriverError::UnknownClass(name.to_string()))
    }

    fn find_field(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
    ) -> Result<FieldHandle, DriverError> {
        resolve_field(reg, class, name)
    }

    fn read_field(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &FieldHandle,
    ) -> Result<Value, DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        let target = if def.is_static { None } else { Some(target) };
        self.hook
            .read(&cls, &def, target)
            .map_err(DriverError::AccessDenied)
    }

    fn read_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
    ) -> Result<Value, DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        require_static(&def)?;
        self.hook
            .read(&cls, &def, None)
            .map_err(DriverError::AccessDenied)
    }

    fn write_field(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        if def.readonly {
            return Err(DriverError::AccessDenied(format!(
                "field {} is readonly",
                def.name
            )));
        }
        let target = if def.is_static { None } else { Some(target) };
        self.hook
            .write(&cls, &def, target, value)
            .map_err(DriverError::AccessDenied)
    }

    fn write_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        require_static(&def)?;
        if def.readonly {
            return Err(DriverError::AccessDenied(format!(
                "field {} is readonly",
                def.name
            )));
        }
        self.hook
            .write(&cls, &def, None, value)
            .map_err(DriverError::AccessDenied)
    }

    fn find_method(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
        arg: Option<&TypeTag>,
    ) -> Result<MethodHandle, DriverError> {
        resolve_method(reg, class, name, false, arg)
    }

    fn find_static_method(
        &self,
        reg: &ClassRegistry,
        class: ClassId,
        name: &str,
        arg: Option<&TypeTag>,
    ) -> Result<MethodHandle, DriverError> {
        resolve_method(reg, class, name, true, arg)
    }

    fn invoke(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &MethodHandle,
        arg: Option<Value>,
    ) -> Result<Value, DriverError> {
        let (_cls, def) = method_decl(reg, handle)?;
        let target = if def.is_static { None } else { Some(target) };
        self.hook
            .invoke(&def, target, arg)
            .map_err(DriverError::Invocation)
    }

    fn invoke_static(
        &self,
        reg: &ClassRegistry,
        handle: &MethodHandle,
        arg: Option<Value>,
    ) -> Result<Value, DriverError> {
        let (_cls, def) = method_decl(reg, handle)?;
        require_static_method(&def)?;
        self.hook
            .invoke(&def, None, arg)
            .map_err(DriverError::Invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, FieldSpec};
    use crate::policy::Permissions;

    /// Hook that uses the default direct-access behavior.
    struct RawHook;
    impl AccessHook for RawHook {}

    /// Hook that answers every read with a constant.
    struct ConstHook;
    impl AccessHook for ConstHook {
        fn read(
            &self,
            _cls: &Class,
            _def: &FieldDef,
            _target: Option<&ObjRef>,
        ) -> Result<Value, String> {
            Ok(Value::Int(77))
        }
    }

    #[test]
    fn test_construction_requires_hook() {
        assert!(matches!(
            HookDriver::new(&ReflectPolicy::default()),
            Err(DriverInitError::NoHookInstalled)
        ));
        let policy = ReflectPolicy::new(Permissions::ALL).with_hook(Arc::new(RawHook));
        assert!(HookDriver::new(&policy).is_ok());
    }

    #[test]
    fn test_default_hook_reads_slots_ignoring_visibility() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("Account")
            .with_field(FieldSpec::new("balance").private().init(Value::Int(100)))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let policy = ReflectPolicy::default().with_hook(Arc::new(RawHook));
        let driver = HookDriver::new(&policy).unwrap();

        let h = driver.find_field(&registry, id, "balance").unwrap();
        assert_eq!(
            driver.read_field(&registry, &obj, &h).unwrap(),
            Value::Int(100)
        );
    }

    #[test]
    fn test_custom_hook_intercepts_reads() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("C")
            .with_field(FieldSpec::new("x").init(Value::Int(1)))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let policy = ReflectPolicy::default().with_hook(Arc::new(ConstHook));
        let driver = HookDriver::new(&policy).unwrap();

        let h = driver.find_field(&registry, id, "x").unwrap();
        assert_eq!(
            driver.read_field(&registry, &obj, &h).unwrap(),
            Value::Int(77)
        );
    }
}
