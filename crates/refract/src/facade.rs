//! Reflection facade
//!
//! `Reflector` is the public call surface: it owns the registry reference,
//! the policy, and the active-driver slot, and applies the uniform
//! null-argument and error-wrapping contract around whichever driver is
//! installed. Operations are stateless pass-throughs; the only mutable
//! state is the driver slot, swapped atomically on reselection so an
//! in-flight call observes either the old or the new driver, never a
//! half-installed one.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::ReflectConfig;
use crate::driver::{select_driver, DriverPreference, ReflectionDriver};
use crate::error::{member_identity, ReflectError};
use crate::object::{ClassId, ClassRegistry, ObjRef};
use crate::policy::ReflectPolicy;
use crate::value::{TypeTag, Value};

/// Per-call failure handling, chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Surface failures as [`ReflectError`]
    Strict,
    /// Swallow failures and return the no-value result
    Lenient,
}

impl ErrorMode {
    /// True for [`ErrorMode::Strict`].
    pub fn is_strict(self) -> bool {
        matches!(self, ErrorMode::Strict)
    }
}

/// Context object holding the active reflection driver and exposing the
/// lookup/invoke API.
pub struct Reflector {
    registry: Arc<ClassRegistry>,
    policy: ReflectPolicy,
    preference: Mutex<DriverPreference>,
    driver: RwLock<Arc<dyn ReflectionDriver>>,
}

impl Reflector {
    /// Reflector over `registry` using the standard driver.
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self::with_preference(registry, DriverPreference::Standard, ReflectPolicy::default())
    }

    /// Reflector with an explicit driver preference and policy. Selection
    /// runs immediately; a privileged preference that cannot be satisfied
    /// falls back to the standard driver with a logged diagnostic.
    pub fn with_preference(
        registry: Arc<ClassRegistry>,
        preference: DriverPreference,
        policy: ReflectPolicy,
    ) -> Self {
        let driver = select_driver(preference, &policy);
        Self {
            registry,
            policy,
            preference: Mutex::new(preference),
            driver: RwLock::new(driver),
        }
    }

    /// Reflector configured from a [`ReflectConfig`].
    pub fn from_config(registry: Arc<ClassRegistry>, config: &ReflectConfig) -> Self {
        Self::with_preference(registry, config.preference, config.policy())
    }

    /// The registry this reflector operates on.
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// The policy given at construction.
    pub fn policy(&self) -> &ReflectPolicy {
        &self.policy
    }

    /// The current driver preference.
    pub fn preference(&self) -> DriverPreference {
        *self.preference.lock()
    }

    /// Name of the currently installed driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.read().name()
    }

    /// Re-run selection with the current preference and atomically swap
    /// the active driver.
    pub fn reload_driver(&self) {
        let preference = *self.preference.lock();
        let driver = select_driver(preference, &self.policy);
        *self.driver.write() = driver;
    }

    /// Change the preference and re-run selection.
    pub fn set_preference(&self, preference: DriverPreference) {
        *self.preference.lock() = preference;
        self.reload_driver();
    }

    /// Snapshot of the active driver; a concurrent swap does not affect a
    /// call already holding the snapshot.
    fn active(&self) -> Arc<dyn ReflectionDriver> {
        self.driver.read().clone()
    }

    fn identity(&self, class: ClassId, member: &str, arg: Option<&TypeTag>) -> String {
        member_identity(&self.registry.name_of(class), member, arg)
    }

    fn missing_value(&self, mode: ErrorMode, which: &'static str) -> Result<Value, ReflectError> {
        if mode.is_strict() {
            Err(ReflectError::InvalidArgument(which))
        } else {
            Ok(Value::Null)
        }
    }

    fn missing_unit(&self, mode: ErrorMode, which: &'static str) -> Result<(), ReflectError> {
        if mode.is_strict() {
            Err(ReflectError::InvalidArgument(which))
        } else {
            Ok(())
        }
    }

    fn failed_value(&self, mode: ErrorMode, err: ReflectError) -> Result<Value, ReflectError> {
        if mode.is_strict() {
            Err(err)
        } else {
            Ok(Value::Null)
        }
    }

    fn failed_unit(&self, mode: ErrorMode, err: ReflectError) -> Result<(), ReflectError> {
        if mode.is_strict() {
            Err(err)
        } else {
            Ok(())
        }
    }

    /// Read the named field of `target`'s class or any of its ancestors.
    ///
    /// In lenient mode a missing argument or any driver failure yields
    /// `Ok(Value::Null)`; in strict mode they become [`ReflectError`]s
    /// carrying the `Class.field` identity and the cause.
    pub fn get_field_val(
        &self,
        mode: ErrorMode,
        target: Option<&ObjRef>,
        field_name: Option<&str>,
    ) -> Result<Value, ReflectError> {
        let (obj, name) = match (target, field_name) {
            (Some(obj), Some(name)) => (obj, name),
            _ => return self.missing_value(mode, "target object and field name"),
        };
        let driver = self.active();
        let result = driver
            .find_field(&self.registry, obj.class(), name)
            .and_then(|h| {
                if h.is_static {
                    driver.read_static(&self.registry, &h)
                } else {
                    driver.read_field(&self.registry, obj, &h)
                }
            });
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::FieldRead {
                    target: self.identity(obj.class(), name, None),
                    source,
                },
            ),
        }
    }

    /// Write the named field of `target`'s class or any of its ancestors.
    pub fn set_field_val(
        &self,
        mode: ErrorMode,
        target: Option<&ObjRef>,
        field_name: Option<&str>,
        value: Value,
    ) -> Result<(), ReflectError> {
        let (obj, name) = match (target, field_name) {
            (Some(obj), Some(name)) => (obj, name),
            _ => return self.missing_unit(mode, "target object and field name"),
        };
        let driver = self.active();
        let result = driver
            .find_field(&self.registry, obj.class(), name)
            .and_then(|h| {
                if h.is_static {
                    driver.write_static(&self.registry, &h, value)
                } else {
                    driver.write_field(&self.registry, obj, &h, value)
                }
            });
        match result {
            Ok(()) => Ok(()),
            Err(source) => self.failed_unit(
                mode,
                ReflectError::FieldWrite {
                    target: self.identity(obj.class(), name, None),
                    source,
                },
            ),
        }
    }

    /// Read the named static field of `class` or any of its ancestors.
    pub fn get_static_field_val(
        &self,
        mode: ErrorMode,
        class: Option<ClassId>,
        field_name: Option<&str>,
    ) -> Result<Value, ReflectError> {
        let (class, name) = match (class, field_name) {
            (Some(class), Some(name)) => (class, name),
            _ => return self.missing_value(mode, "class and field name"),
        };
        let driver = self.active();
        let result = driver
            .find_field(&self.registry, class, name)
            .and_then(|h| driver.read_static(&self.registry, &h));
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::FieldRead {
                    target: self.identity(class, name, None),
                    source,
                },
            ),
        }
    }

    /// Write the named static field of `class` or any of its ancestors.
    pub fn set_static_field_val(
        &self,
        mode: ErrorMode,
        class: Option<ClassId>,
        field_name: Option<&str>,
        value: Value,
    ) -> Result<(), ReflectError> {
        let (class, name) = match (class, field_name) {
            (Some(class), Some(name)) => (class, name),
            _ => return self.missing_unit(mode, "class and field name"),
        };
        let driver = self.active();
        let result = driver
            .find_field(&self.registry, class, name)
            .and_then(|h| driver.write_static(&self.registry, &h, value));
        match result {
            Ok(()) => Ok(()),
            Err(source) => self.failed_unit(
                mode,
                ReflectError::FieldWrite {
                    target: self.identity(class, name, None),
                    source,
                },
            ),
        }
    }

    /// Invoke the named zero-argument method on `target`, searching the
    /// ancestor chain. A static method found this way is invoked without a
    /// receiver.
    pub fn invoke_method(
        &self,
        mode: ErrorMode,
        target: Option<&ObjRef>,
        method_name: Option<&str>,
    ) -> Result<Value, ReflectError> {
        let (obj, name) = match (target, method_name) {
            (Some(obj), Some(name)) => (obj, name),
            _ => return self.missing_value(mode, "target object and method name"),
        };
        let driver = self.active();
        let result = driver
            .find_method(&self.registry, obj.class(), name, None)
            .and_then(|h| driver.invoke(&self.registry, obj, &h, None));
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::MethodInvoke {
                    target: self.identity(obj.class(), name, None),
                    source,
                },
            ),
        }
    }

    /// Invoke the named single-argument method on `target`. The argument
    /// type is required and participates in overload matching; the
    /// argument value itself may be [`Value::Null`].
    pub fn invoke_method_with_arg(
        &self,
        mode: ErrorMode,
        target: Option<&ObjRef>,
        method_name: Option<&str>,
        arg_type: Option<&TypeTag>,
        arg: Value,
    ) -> Result<Value, ReflectError> {
        let (obj, name, tag) = match (target, method_name, arg_type) {
            (Some(obj), Some(name), Some(tag)) => (obj, name, tag),
            _ => return self.missing_value(mode, "target object, method name, and argument type"),
        };
        let driver = self.active();
        let result = driver
            .find_method(&self.registry, obj.class(), name, Some(tag))
            .and_then(|h| driver.invoke(&self.registry, obj, &h, Some(arg)));
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::MethodInvoke {
                    target: self.identity(obj.class(), name, Some(tag)),
                    source,
                },
            ),
        }
    }

    /// Invoke the named zero-argument static method on `class`.
    pub fn invoke_static_method(
        &self,
        mode: ErrorMode,
        class: Option<ClassId>,
        method_name: Option<&str>,
    ) -> Result<Value, ReflectError> {
        let (class, name) = match (class, method_name) {
            (Some(class), Some(name)) => (class, name),
            _ => return self.missing_value(mode, "class and method name"),
        };
        let driver = self.active();
        let result = driver
            .find_static_method(&self.registry, class, name, None)
            .and_then(|h| driver.invoke_static(&self.registry, &h, None));
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::MethodInvoke {
                    target: self.identity(class, name, None),
                    source,
                },
            ),
        }
    }

    /// Invoke the named single-argument static method on `class`.
    pub fn invoke_static_method_with_arg(
        &self,
        mode: ErrorMode,
        class: Option<ClassId>,
        method_name: Option<&str>,
        arg_type: Option<&TypeTag>,
        arg: Value,
    ) -> Result<Value, ReflectError> {
        let (class, name, tag) = match (class, method_name, arg_type) {
            (Some(class), Some(name), Some(tag)) => (class, name, tag),
            _ => return self.missing_value(mode, "class, method name, and argument type"),
        };
        let driver = self.active();
        let result = driver
            .find_static_method(&self.registry, class, name, Some(tag))
            .and_then(|h| driver.invoke_static(&self.registry, &h, Some(arg)));
        match result {
            Ok(value) => Ok(value),
            Err(source) => self.failed_value(
                mode,
                ReflectError::MethodInvoke {
                    target: self.identity(class, name, Some(tag)),
                    source,
                },
            ),
        }
    }

    /// Resolve a class by fully-qualified name, or `None` for any failure.
    /// There is no strict variant of this operation.
    pub fn class_for_name_or_null(&self, name: Option<&str>) -> Option<ClassId> {
        let name = name?;
        self.active().find_class(&self.registry, name).ok()
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("classes", &self.registry.len())
            .field("preference", &*self.preference.lock())
            .field("driver", &self.driver_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::object::{ClassBuilder, FieldSpec};
    use crate::policy::Permissions;

    fn fixture() -> (Reflector, ObjRef) {
        let registry = Arc::new(ClassRegistry::new());
        let id = ClassBuilder::new("Point")
            .with_field(FieldSpec::new("x").init(Value::Int(3)))
            .register(&registry)
            .unwrap();
        let obj = registry.instantiate(id).unwrap();
        (Reflector::new(registry), obj)
    }

    #[test]
    fn test_null_arguments() {
        let (reflector, obj) = fixture();

        let err = reflector
            .get_field_val(ErrorMode::Strict, None, Some("x"))
            .unwrap_err();
        assert!(matches!(err, ReflectError::InvalidArgument(_)));

        let err = reflector
            .get_field_val(ErrorMode::Strict, Some(&obj), None)
            .unwrap_err();
        assert!(matches!(err, ReflectError::InvalidArgument(_)));

        assert_eq!(
            reflector
                .get_field_val(ErrorMode::Lenient, None, None)
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_strict_wraps_not_found_with_identity() {
        let (reflector, obj) = fixture();
        let err = reflector
            .get_field_val(ErrorMode::Strict, Some(&obj), Some("missing"))
            .unwrap_err();
        assert!(err.to_string().contains("Point.missing"));
        assert!(matches!(err.driver_error(), Some(DriverError::NotFound)));
    }

    #[test]
    fn test_lenient_swallows_failures() {
        let (reflector, obj) = fixture();
        assert_eq!(
            reflector
                .get_field_val(ErrorMode::Lenient, Some(&obj), Some("missing"))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_set_preference_swaps_driver() {
        let (reflector, _) = fixture();
        assert_eq!(reflector.driver_name(), "standard");
        reflector.set_preference(DriverPreference::Slot);
        assert_eq!(reflector.driver_name(), "slot");
        reflector.set_preference(DriverPreference::Standard);
        assert_eq!(reflector.driver_name(), "standard");
    }

    #[test]
    fn test_restricted_policy_keeps_standard_driver() {
        let registry = Arc::new(ClassRegistry::new());
        let reflector = Reflector::with_preference(
            registry,
            DriverPreference::Slot,
            ReflectPolicy::new(Permissions::PUBLIC_ONLY),
        );
        assert_eq!(reflector.driver_name(), "standard");
        // Reloading with the same environment is idempotent
        reflector.reload_driver();
        assert_eq!(reflector.driver_name(), "standard");
    }
}
