//! Refract: runtime introspection with pluggable reflection drivers
//!
//! Refract lets a caller read and write fields and invoke methods by name
//! on objects of a registered class hierarchy, walking the inheritance
//! chain, without choosing how the access is performed. Access mechanisms
//! are **drivers** behind a common capability trait:
//!
//! - [`SlotDriver`] — direct slot access that bypasses member visibility
//!   (requires the policy to grant private access)
//! - [`HookDriver`] — delegates accesses to a host-installed [`AccessHook`]
//! - [`StandardDriver`] — visibility-enforcing fallback that always works
//!
//! A [`Reflector`] selects one driver through a fallback chain (a
//! privileged driver that cannot be constructed is logged and skipped,
//! never an error) and applies a uniform per-call contract: in
//! [`ErrorMode::Strict`] failures surface as [`ReflectError`] with the
//! member identity and cause; in [`ErrorMode::Lenient`] they collapse to
//! [`Value::Null`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use refract::{ClassBuilder, ClassRegistry, ErrorMode, FieldSpec, Reflector, Value};
//!
//! let registry = Arc::new(ClassRegistry::new());
//! let point = ClassBuilder::new("Point")
//!     .with_field(FieldSpec::new("x").init(Value::Int(5)))
//!     .register(&registry)
//!     .unwrap();
//! let obj = registry.instantiate(point).unwrap();
//!
//! let reflector = Reflector::new(registry);
//! let x = reflector.get_field_val(ErrorMode::Strict, Some(&obj), Some("x"));
//! assert_eq!(x.unwrap(), Value::Int(5));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod driver;
pub mod error;
pub mod facade;
pub mod object;
pub mod policy;
pub mod value;

pub use config::ReflectConfig;
pub use driver::{
    select_driver, AccessHook, DriverPreference, FieldHandle, HookDriver, MethodHandle,
    ParsePreferenceError, ReflectionDriver, SlotDriver, StandardDriver,
};
pub use error::{DriverError, DriverInitError, ReflectError};
pub use facade::{ErrorMode, Reflector};
pub use object::{
    Ancestry, Class, ClassBuildError, ClassBuilder, ClassId, ClassRegistry, FieldDef, FieldSpec,
    Instance, MethodBody, MethodDef, MethodSpec, ObjRef, Visibility,
};
pub use policy::{ParsePermissionsError, Permissions, ReflectPolicy};
pub use value::{TypeTag, Value};
