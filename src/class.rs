//! Class objects: nodes in the model's append-only class forest.
//!
//! A class carries its own declared properties plus a flattened property
//! list computed at declaration time (parent properties first, own
//! properties appended, name-compatible overrides merged in place).

use crate::error::Result;
use crate::instance::Instance;
use crate::model::ObjectModel;
use crate::property::PropertySpec;
use crate::value::{BaseType, Value};
use indexmap::IndexMap;
use std::rc::Rc;

/// Unique identifier for a class within one `ObjectModel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Per-class invariant check: returns one message per violated constraint,
/// empty when the instance is valid. Each validator along the chain receives
/// the full instance, not just its own slice.
pub type Validator = Rc<dyn Fn(&ObjectModel, &Instance) -> Vec<String>>;

/// Custom construction logic. Replaces the default property-assignment step;
/// the validator chain still runs on the result.
pub type Constructor =
    Rc<dyn Fn(&ObjectModel, Value, IndexMap<String, Value>) -> Result<Instance>>;

/// Parent link of a class: the root object class has none, every other class
/// extends either another class or a base-type tag directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Only the bootstrap `object` class
    Root,
    Class(ClassId),
    Base(BaseType),
}

/// A declared class. Immutable after declaration; methods dispatching on it
/// may still be registered at any time.
pub struct Class {
    pub name: String,
    pub parent: Parent,
    /// Properties declared directly on this class
    pub properties: Vec<PropertySpec>,
    /// Parent's flattened properties with own properties appended/overriding
    pub flattened: Vec<PropertySpec>,
    pub validator: Option<Validator>,
    pub constructor: Option<Constructor>,
    /// Abstract classes dispatch and inherit but cannot be instantiated
    pub is_abstract: bool,
}

impl Class {
    /// Resolve a property spec by name in the flattened (inherited) list.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.flattened.iter().find(|spec| spec.name == name)
    }

    /// Ordered names of the full inherited property set.
    pub fn property_names(&self) -> Vec<&str> {
        self.flattened.iter().map(|spec| spec.name.as_str()).collect()
    }
}

/// Builder for a class declaration, consumed by [`ObjectModel::declare_class`].
pub struct ClassDecl {
    pub(crate) name: String,
    pub(crate) parent: Parent,
    pub(crate) properties: Vec<PropertySpec>,
    pub(crate) validator: Option<Validator>,
    pub(crate) constructor: Option<Constructor>,
    pub(crate) is_abstract: bool,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Parent::Root,
            properties: Vec::new(),
            validator: None,
            constructor: None,
            is_abstract: false,
        }
    }

    /// Extend another declared class. Default parent is the root object class.
    pub fn parent(mut self, class: ClassId) -> Self {
        self.parent = Parent::Class(class);
        self
    }

    /// Root the class directly on a base type; instances then wrap a base
    /// value of that type.
    pub fn base(mut self, tag: BaseType) -> Self {
        self.parent = Parent::Base(tag);
        self
    }

    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    pub fn validator(
        mut self,
        validator: impl Fn(&ObjectModel, &Instance) -> Vec<String> + 'static,
    ) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn constructor(
        mut self,
        constructor: impl Fn(&ObjectModel, Value, IndexMap<String, Value>) -> Result<Instance>
            + 'static,
    ) -> Self {
        self.constructor = Some(Rc::new(constructor));
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}
