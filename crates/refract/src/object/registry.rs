//! Class registry and ancestor-chain iteration
//!
//! The registry owns every registered class descriptor and the name index
//! used by `find_class`. Ancestor-chain lookups are expressed as an explicit
//! iterator over the supertype sequence, most-derived first.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::object::builder::ClassBuildError;
use crate::object::class::Class;
use crate::object::instance::{Instance, ObjRef};

/// Class identifier (index into the registry).
pub type ClassId = usize;

/// Registry of class descriptors, indexed by ID and by name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<Vec<Arc<Class>>>,
    by_name: RwLock<FxHashMap<String, ClassId>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class built by `make`, which receives the assigned ID.
    ///
    /// Lock order: name index before class table, held across the insert so
    /// concurrent installs of the same name cannot both succeed.
    pub(crate) fn install(
        &self,
        name: &str,
        make: impl FnOnce(ClassId) -> Class,
    ) -> Result<ClassId, ClassBuildError> {
        let mut by_name = self.by_name.write();
        if by_name.contains_key(name) {
            return Err(ClassBuildError::DuplicateClass(name.to_string()));
        }
        let mut classes = self.classes.write();
        let id = classes.len();
        classes.push(Arc::new(make(id)));
        by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Get a class by ID.
    pub fn get(&self, id: ClassId) -> Option<Arc<Class>> {
        self.classes.read().get(id).cloned()
    }

    /// Resolve a class ID by fully-qualified name.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.read().get(name).copied()
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// True if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Display name for a class ID, for diagnostics.
    pub fn name_of(&self, id: ClassId) -> String {
        match self.get(id) {
            Some(cls) => cls.name.clone(),
            None => format!("<class#{}>", id),
        }
    }

    /// Iterate the ancestor chain of `id`, most-derived first.
    pub fn ancestry(&self, id: ClassId) -> Ancestry<'_> {
        Ancestry {
            registry: self,
            next: Some(id),
        }
    }

    /// Allocate an instance of `id` with declared initial field values
    /// applied, ancestors first so subclass initializers win.
    pub fn instantiate(&self, id: ClassId) -> Option<ObjRef> {
        let cls = self.get(id)?;
        let obj = Arc::new(Instance::new(id, cls.field_count));
        let chain: Vec<_> = self.ancestry(id).collect();
        for cls in chain.iter().rev() {
            for def in cls.declared_fields() {
                if let Some(initial) = &def.initial {
                    // Slots exist by construction; ignore the impossible error
                    let _ = obj.write(def.slot, initial.clone());
                }
            }
        }
        Some(obj)
    }
}

/// Iterator over a class and its supertypes, most-derived first.
///
/// Terminates at the root class, or immediately if the starting ID is not
/// registered.
#[derive(Debug)]
pub struct Ancestry<'a> {
    registry: &'a ClassRegistry,
    next: Option<ClassId>,
}

impl Iterator for Ancestry<'_> {
    type Item = Arc<Class>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        let cls = self.registry.get(id)?;
        self.next = cls.parent;
        Some(cls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::builder::{ClassBuilder, FieldSpec};
    use crate::value::Value;

    #[test]
    fn test_lookup_by_name() {
        let registry = ClassRegistry::new();
        let point = ClassBuilder::new("Point").register(&registry).unwrap();
        let circle = ClassBuilder::new("Circle").register(&registry).unwrap();

        assert_eq!(registry.lookup("Point"), Some(point));
        assert_eq!(registry.lookup("Circle"), Some(circle));
        assert_eq!(registry.lookup("Unknown"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let registry = ClassRegistry::new();
        ClassBuilder::new("Point").register(&registry).unwrap();
        let err = ClassBuilder::new("Point").register(&registry).unwrap_err();
        assert!(matches!(err, ClassBuildError::DuplicateClass(_)));
    }

    #[test]
    fn test_ancestry_most_derived_first() {
        let registry = ClassRegistry::new();
        let animal = ClassBuilder::new("Animal").register(&registry).unwrap();
        let dog = ClassBuilder::new("Dog")
            .extends(animal)
            .register(&registry)
            .unwrap();
        let labrador = ClassBuilder::new("Labrador")
            .extends(dog)
            .register(&registry)
            .unwrap();

        let chain: Vec<_> = registry.ancestry(labrador).map(|c| c.name.clone()).collect();
        assert_eq!(chain, vec!["Labrador", "Dog", "Animal"]);

        let root: Vec<_> = registry.ancestry(animal).collect();
        assert_eq!(root.len(), 1);

        assert_eq!(registry.ancestry(99).count(), 0);
    }

    #[test]
    fn test_instantiate_applies_initials() {
        let registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .with_field(FieldSpec::new("x").init(Value::Int(5)))
            .register(&registry)
            .unwrap();
        let child = ClassBuilder::new("Child")
            .extends(base)
            .with_field(FieldSpec::new("y").init(Value::Int(7)))
            .register(&registry)
            .unwrap();

        let obj = registry.instantiate(child).unwrap();
        assert_eq!(obj.field_count(), 2);
        assert_eq!(obj.read(0), Some(Value::Int(5)));
        assert_eq!(obj.read(1), Some(Value::Int(7)));

        assert!(registry.instantiate(99).is_none());
    }

    #[test]
    fn test_name_of_unknown_class() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.name_of(4), "<class#4>");
    }
}
