//! Introspectable object model
//!
//! Classes, instances, and the registry the reflection drivers operate on.
//! Refract has no ambient runtime type information to lean on, so the model
//! a host wants introspected is declared here: a class hierarchy with named
//! fields and methods, and heap instances carrying field slots.

mod builder;
mod class;
mod instance;
mod registry;

pub use builder::{ClassBuildError, ClassBuilder, FieldSpec, MethodSpec};
pub use class::{Class, FieldDef, MethodBody, MethodDef, Visibility};
pub use instance::{Instance, ObjRef};
pub use registry::{Ancestry, ClassId, ClassRegistry};
