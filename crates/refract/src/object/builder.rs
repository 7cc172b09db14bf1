//! Declarative class construction
//!
//! `ClassBuilder` assigns field slots across the ancestor chain and checks
//! member declarations before installing a class into the registry. Specs
//! use chained modifiers (`.private()`, `.as_static()`, ...) so call sites
//! read like declarations.

use std::sync::Arc;

use crate::object::class::{Class, FieldDef, MethodBody, MethodDef, Visibility};
use crate::object::registry::{ClassId, ClassRegistry};
use crate::value::{TypeTag, Value};

/// Errors raised while declaring a class.
#[derive(Debug, thiserror::Error)]
pub enum ClassBuildError {
    /// A class with this name is already registered
    #[error("class {0} is already registered")]
    DuplicateClass(String),

    /// The declared parent class ID is not registered
    #[error("unknown parent class #{0}")]
    UnknownParent(ClassId),

    /// Two members of the same kind share a name (and signature, for methods)
    #[error("duplicate member {member} on class {class}")]
    DuplicateMember {
        /// Class being declared
        class: String,
        /// Offending member name
        member: String,
    },
}

/// Declaration of a single field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    type_tag: Option<TypeTag>,
    visibility: Visibility,
    is_static: bool,
    readonly: bool,
    initial: Option<Value>,
}

impl FieldSpec {
    /// Start a public, untyped, mutable instance field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: None,
            visibility: Visibility::Public,
            is_static: false,
            readonly: false,
            initial: None,
        }
    }

    /// Declare the field's type.
    pub fn typed(mut self, tag: TypeTag) -> Self {
        self.type_tag = Some(tag);
        self
    }

    /// Mark as private.
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as protected.
    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    /// Mark as static (class-level).
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Reject writes after initialization.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Set the initial value.
    pub fn init(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}

/// Declaration of a single method.
pub struct MethodSpec {
    name: String,
    visibility: Visibility,
    is_static: bool,
    param: Option<TypeTag>,
    body: MethodBody,
}

impl MethodSpec {
    /// Start a public, zero-parameter instance method with the given body.
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(Option<&crate::object::ObjRef>, Option<Value>) -> Result<Value, String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            param: None,
            body: Arc::new(body),
        }
    }

    /// Mark as private.
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as protected.
    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    /// Mark as static.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Declare the single parameter's type.
    pub fn param(mut self, tag: TypeTag) -> Self {
        self.param = Some(tag);
        self
    }
}

impl std::fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("param", &self.param)
            .finish()
    }
}

/// Builder for registering a class.
#[derive(Debug, Default)]
pub struct ClassBuilder {
    name: String,
    parent: Option<ClassId>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassBuilder {
    /// Start building a class with the given fully-qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare the parent class.
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a field declaration.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method declaration.
    pub fn with_method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Validate the declarations and install the class.
    pub fn register(self, registry: &ClassRegistry) -> Result<ClassId, ClassBuildError> {
        let ClassBuilder {
            name,
            parent,
            fields: field_specs,
            methods: method_specs,
        } = self;

        let base_slots = match parent {
            Some(pid) => {
                registry
                    .get(pid)
                    .ok_or(ClassBuildError::UnknownParent(pid))?
                    .field_count
            }
            None => 0,
        };

        let mut fields = Vec::new();
        let mut static_defs = Vec::new();
        for spec in field_specs {
            let bucket: &mut Vec<FieldDef> = if spec.is_static {
                &mut static_defs
            } else {
                &mut fields
            };
            if bucket.iter().any(|f| f.name == spec.name) {
                return Err(ClassBuildError::DuplicateMember {
                    class: name,
                    member: spec.name,
                });
            }
            let slot = bucket.len() + if spec.is_static { 0 } else { base_slots };
            bucket.push(FieldDef {
                name: spec.name,
                slot,
                type_tag: spec.type_tag,
                visibility: spec.visibility,
                is_static: spec.is_static,
                readonly: spec.readonly,
                initial: spec.initial,
            });
        }

        let mut methods: Vec<MethodDef> = Vec::new();
        for spec in method_specs {
            let clash = methods.iter().any(|m| {
                m.name == spec.name && m.is_static == spec.is_static && m.param == spec.param
            });
            if clash {
                return Err(ClassBuildError::DuplicateMember {
                    class: name,
                    member: spec.name,
                });
            }
            methods.push(MethodDef {
                name: spec.name,
                visibility: spec.visibility,
                is_static: spec.is_static,
                param: spec.param,
                body: spec.body,
            });
        }

        let field_count = base_slots + fields.len();
        let key = name.clone();
        registry.install(&key, move |id| {
            Class::new(
                id,
                name,
                parent,
                field_count,
                fields,
                static_defs,
                methods,
            )
        })
    }
}
