//! Slot reflection driver (privileged primary)
//!
//! Reaches straight into field slots and method tables, ignoring member
//! visibility. Construction is gated on the policy granting the full
//! private-access permission set; a policy that withholds any of those bits
//! makes construction fail, which the selection chain downgrades to a
//! diagnostic and a fallback.
//!
//! Readonly fields still reject writes here: readonly is a property of the
//! field, not of the access mechanism.

use crate::driver::{
    call_raw, field_decl, method_decl, read_raw, require_static, require_static_method,
    resolve_field, resolve_method, write_raw, FieldHandle, MethodHandle, ReflectionDriver,
};
use crate::error::{DriverError, DriverInitError};
use crate::object::{ClassId, ClassRegistry, ObjRef};
use crate::policy::{Permissions, ReflectPolicy};
use crate::value::{TypeTag, Value};

/// Visibility-bypassing driver with direct slot access.
#[derive(Debug, Clone, Copy)]
pub struct SlotDriver;

impl SlotDriver {
    /// Construct the slot driver if the policy grants private-member
    /// access.
    pub fn new(policy: &ReflectPolicy) -> Result<Self, DriverInitError> {
        if policy.allows(Permissions::PRIVATE_ACCESS) {
            Ok(Self)
        } else {
            Err(DriverInitError::BypassNotGranted)
        }
    }
}

impl ReflectionDriver for SlotDriver {
    fn name(&self) -> &'static str {
        "slot"
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
        read_raw(&cls, &def, Some(target))
    }

    fn read_static(
        &self,
        reg: &ClassRegistry,
        handle: &FieldHandle,
    ) -> Result<Value, DriverError> {
        let (cls, def) = field_decl(reg, handle)?;
        require_static(&def)?;
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
        call_raw(&def, None, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, FieldSpec, MethodSpec};

    #[test]
    fn test_construction_gated_on_policy() {
        assert!(SlotDriver::new(&ReflectPolicy::default()).is_ok());

        let restricted = ReflectPolicy::new(Permissions::PUBLIC_ONLY);
        assert!(matches!(
            SlotDriver::new(&restricted),
            Err(DriverInitError::BypassNotGranted)
        ));
    }

    #[test]
    fn test_bypasses_visibility() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("Account")
            .with_field(FieldSpec::new("balance").private().init(Value::Int(100)))
            .with_method(MethodSpec::new("audit", |_, _| Ok(Value::Bool(true))).private())
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let driver = SlotDriver::new(&ReflectPolicy::default()).unwrap();

        let h = driver.find_field(&registry, id, "balance").unwrap();
        assert_eq!(
            driver.read_field(&registry, &obj, &h).unwrap(),
            Value::Int(100)
        );
        driver
            .write_field(&registry, &obj, &h, Value::Int(250))
            .unwrap();
        assert_eq!(
            driver.read_field(&registry, &obj, &h).unwrap(),
            Value::Int(250)
        );

        let m = driver.find_method(&registry, id, "audit", None).unwrap();
        assert_eq!(
            driver.invoke(&registry, &obj, &m, None).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_readonly_still_rejected() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::new("Config")
            .with_field(FieldSpec::new("version").readonly().init(Value::Int(1)))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        let driver = SlotDriver::new(&ReflectPolicy::default()).unwrap();

        let h = driver.find_field(&registry, id, "version").unwrap();
        assert!(matches!(
            driver.write_field(&registry, &obj, &h, Value::Int(2)),
            Err(DriverError::AccessDenied(_))
        ));
    }
}
