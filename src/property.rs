//! Property specifications: named, typed, optionally accessor-backed
//! attributes attached to instances of a class and its descendants.

use crate::class::ClassId;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::ObjectModel;
use crate::union::{UnionMember, UnionSpec};
use crate::value::{BaseType, Value};
use std::fmt;
use std::rc::Rc;

/// Computed read access: invoked instead of the stored property value.
pub type Getter = Rc<dyn Fn(&ObjectModel, &Instance) -> Result<Value>>;

/// Computed write access: returns the updated instance. The validator chain
/// still runs on the result before the assignment commits.
pub type Setter = Rc<dyn Fn(&ObjectModel, &Instance, Value) -> Result<Instance>>;

/// Declared type of a property.
#[derive(Clone, PartialEq)]
pub enum PropertyType {
    /// Accepts any value
    Any,
    /// Accepts values with this base-type tag
    Base(BaseType),
    /// Accepts instances of this class or any descendant
    Class(ClassId),
    /// Accepts anything matching at least one union member
    Union(UnionSpec),
}

impl PropertyType {
    /// Human-readable description for error messages.
    pub fn describe(&self, model: &ObjectModel) -> String {
        match self {
            PropertyType::Any => "any".to_string(),
            PropertyType::Base(tag) => tag.name().to_string(),
            PropertyType::Class(id) => format!("class '{}'", model.class_name(*id)),
            PropertyType::Union(union) => {
                let names: Vec<String> = union
                    .members()
                    .iter()
                    .map(|member| match member {
                        UnionMember::Class(id) => format!("class '{}'", model.class_name(*id)),
                        UnionMember::Base(tag) => tag.name().to_string(),
                    })
                    .collect();
                format!("union of [{}]", names.join(", "))
            }
        }
    }

    /// Redeclaration compatibility: a child may keep the parent's type
    /// exactly, narrow a class to a descendant, or narrow a union so every
    /// member equals or descends from some parent member.
    pub fn is_compatible_override(&self, parent: &PropertyType, model: &ObjectModel) -> bool {
        match (self, parent) {
            (_, PropertyType::Any) => true,
            (PropertyType::Base(a), PropertyType::Base(b)) => a == b,
            (PropertyType::Class(child), PropertyType::Class(ancestor)) => {
                model.is_subclass(*child, *ancestor)
            }
            (PropertyType::Union(child), PropertyType::Union(parent_union)) => {
                child.members().iter().all(|member| match member {
                    UnionMember::Class(class) => parent_union.members().iter().any(
                        |m| matches!(m, UnionMember::Class(p) if model.is_subclass(*class, *p)),
                    ),
                    UnionMember::Base(tag) => parent_union.contains(UnionMember::Base(*tag)),
                })
            }
            (PropertyType::Class(child), PropertyType::Union(parent_union)) => parent_union
                .members()
                .iter()
                .any(|m| matches!(m, UnionMember::Class(c) if model.is_subclass(*child, *c))),
            (PropertyType::Base(tag), PropertyType::Union(parent_union)) => {
                parent_union.contains(UnionMember::Base(*tag))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Any => write!(f, "Any"),
            PropertyType::Base(tag) => write!(f, "Base({tag:?})"),
            PropertyType::Class(id) => write!(f, "Class({id:?})"),
            PropertyType::Union(union) => write!(f, "Union({:?})", union.members()),
        }
    }
}

/// Describes one named, typed property with an optional accessor pair.
///
/// Without accessors the property is stored directly in the instance's
/// property map; with accessors every get/set goes through them.
#[derive(Clone)]
pub struct PropertySpec {
    pub name: String,
    pub ty: PropertyType,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
    /// Value used when construction receives no argument for this property
    pub default: Option<Value>,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
            getter: None,
            setter: None,
            default: None,
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Any)
    }

    pub fn base(name: impl Into<String>, tag: BaseType) -> Self {
        Self::new(name, PropertyType::Base(tag))
    }

    pub fn class(name: impl Into<String>, class: ClassId) -> Self {
        Self::new(name, PropertyType::Class(class))
    }

    pub fn union(name: impl Into<String>, union: UnionSpec) -> Self {
        Self::new(name, PropertyType::Union(union))
    }

    pub fn with_getter(
        mut self,
        getter: impl Fn(&ObjectModel, &Instance) -> Result<Value> + 'static,
    ) -> Self {
        self.getter = Some(Rc::new(getter));
        self
    }

    pub fn with_setter(
        mut self,
        setter: impl Fn(&ObjectModel, &Instance, Value) -> Result<Instance> + 'static,
    ) -> Self {
        self.setter = Some(Rc::new(setter));
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("default", &self.default)
            .finish()
    }
}
