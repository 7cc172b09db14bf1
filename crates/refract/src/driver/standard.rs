//! Standard reflection driver
//!
//! The always-available fallback. Resolution sees every member, but reads,
//! writes, and invocations are gated on `Visibility::Public`; non-public
//! members resolve and then fail with access denied. Construction has no
//! preconditions, which is what lets the selection chain terminate.

use crate::driver::{
    call_raw, field_decl, method_decl, read_raw, require_static, require_static_method,
    resolve_field, resolve_method, write_raw, FieldHandle, MethodHandle, ReflectionDriver,
};
use crate::error::DriverError;
use crate::object::{ClassId, ClassRegistry, ObjRef, Visibility};
use crate::value::{TypeTag, Value};

/// Metadata-based driver that honors member visibility.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDriver;

impl StandardDriver {
    /// Construct the standard driver. Never fails.
    pub fn new() -> Self {
        Self
    }

    fn check_visible(vis: Visibility, what: &str, name: &str) -> Result<(), DriverError> {
        if vis.is_public() {
            Ok(())
        } else {
            Err(DriverError::AccessDenied(format!(
                "{} {} is not public",
                what, name
            )))
        }
    }
}

impl ReflectionDriver for StandardDriver {
    fn name(&self) -> &'static str {
        "standard"
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
        Self::check_visible(def.visibility, "field", &def.name)?;
        read_raw(&cls, &def, Some(target))
    }

    fn read_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
    ) -> Result<Value, DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        require_static(&def)?;
        Self::check_visible(def.visibility, "field", &def.name)?;
        read_raw(&cls, &def, None)
    }

    fn write_field(
        &self,
        reg: &ClassRegistry,
        target: &ObjRef,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        Self::check_visible(def.visibility, "field", &def.name)?;
        write_raw(&cls, &def, Some(target), value)
    }

    fn write_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
        value: Value,
    ) -> Result<(), DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        require_static(&def)?;
        Self::check_visible(def.visibility, "field", &def.name)?;
        write_raw(&cls, &def, None, value)
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
        Self::check_visible(def.visibility, "method", &def.name)?;
        call_raw(&def, Some(target), arg)
    }

    fn invoke_static(
        &self,
        reg: &ClassRegistry,
        handle: &MethodHandle,
        arg: Option<Value>,
    ) -> Result<Value, DriverError> {
        let (_cls, def) = method_decl(reg, handle)?;
        require_static_method(&def)?;
        Self::check_visible(def.visibility, "method", &def.name)?;
        call_raw(&def, None, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, FieldSpec, MethodSpec};

    #[test]
    fn test_private_field_resolves_but_read_denied() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("Account")
            .with_field(FieldSpec::new("balance").private().init(Value::Int(100)))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let driver = StandardDriver::new();

        let handle = driver.find_field(&registry, id, "balance").unwrap();
        let err = driver.read_field(&registry, &obj, &handle).unwrap_err();
        assert!(matches!(err, DriverError::AccessDenied(_)));
    }

    #[test]
    fn test_public_member_access() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("Point")
            .with_field(FieldSpec::new("x").init(Value::Int(3)))
            .with_method(MethodSpec::new("zero", |_, _| Ok(Value::Int(0))))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let driver = StandardDriver::new();

        let h = driver.find_field(&registry, id, "x").unwrap();
        assert_eq!(driver.read_field(&registry, &obj, &h).unwrap(), Value::Int(3));
        driver
            .write_field(&registry, &obj, &h, Value::Int(9))
            .unwrap();
        assert_eq!(driver.read_field(&registry, &obj, &h).unwrap(), Value::Int(9));

        let m = driver.find_method(&registry, id, "zero", None).unwrap();
        assert_eq!(driver.invoke(&registry, &obj, &m, None).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_find_class() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("geom.Point").register(&registry).unwrap();
        let driver = StandardDriver::new();

        assert_eq!(driver.find_class(&registry, "geom.Point").unwrap(), id);
        assert!(matches!(
            driver.find_class(&registry, "geom.Missing"),
            Err(DriverError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_static_guard() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("C")
            .with_field(FieldSpec::new("x"))
            .register(&registry)
            .unwrap();
        let driver = StandardDriver::new();
        let h = driver.find_field(&registry, id, "x").unwrap();
        assert!(matches!(
            driver.read_static(&registry, &h),
            Err(DriverError::AccessDenied(_))
        ));
    }
}
