//! The object model: host-owned registries for classes and generic
//! functions, plus the collaborator hooks (legacy dispatch, version
//! comparator) the host environment supplies.
//!
//! Registries are explicit values rather than module globals so independent
//! models can coexist, one per test if need be.

use crate::class::{Class, ClassDecl, ClassId, Parent};
use crate::dispatch::{LegacyFn, VersionCheck};
use crate::error::{ObjectError, Result};
use crate::generic::{expand_signature, Dispatchable, Generic, GenericId, MethodFn, RegisteredMethod};
use crate::method_table::MethodId;
use crate::property::{PropertySpec, PropertyType};
use crate::union::UnionMember;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Registries for one independent object model.
pub struct ObjectModel {
    classes: Vec<Class>,
    class_names: HashMap<String, ClassId>,
    generics: Vec<Generic>,
    generic_names: HashMap<String, GenericId>,
    pub(crate) legacy: Option<LegacyFn>,
    version_ok: VersionCheck,
    pub(crate) cache_enabled: bool,
    root: ClassId,
}

impl ObjectModel {
    /// Create a model with the bootstrap root `object` class declared.
    pub fn new() -> Self {
        let mut model = Self {
            classes: Vec::new(),
            class_names: HashMap::new(),
            generics: Vec::new(),
            generic_names: HashMap::new(),
            legacy: None,
            version_ok: Rc::new(|_| true),
            cache_enabled: true,
            root: ClassId(0),
        };

        model.classes.push(Class {
            name: "object".to_string(),
            parent: Parent::Root,
            properties: Vec::new(),
            flattened: Vec::new(),
            validator: None,
            constructor: None,
            is_abstract: false,
        });
        model.class_names.insert("object".to_string(), model.root);
        model
    }

    /// The root object class every class descends from by default.
    pub fn root_class(&self) -> ClassId {
        self.root
    }

    // === Class registry ===

    /// Declare a class, flattening its property list against the parent's.
    pub fn declare_class(&mut self, decl: ClassDecl) -> Result<ClassId> {
        if self.class_names.contains_key(&decl.name) {
            return Err(ObjectError::declaration(format!(
                "class '{}' is already declared",
                decl.name
            )));
        }

        // A declaration without an explicit parent extends the root class.
        let parent = match decl.parent {
            Parent::Root => Parent::Class(self.root),
            other => other,
        };

        let mut flattened = match parent {
            Parent::Class(parent) => self.class(parent)?.flattened.clone(),
            Parent::Base(_) | Parent::Root => Vec::new(),
        };

        for spec in &decl.properties {
            self.check_property_type(&decl.name, spec)?;
            match flattened.iter().position(|existing| existing.name == spec.name) {
                Some(position) => {
                    let existing = &flattened[position];
                    if !spec.ty.is_compatible_override(&existing.ty, self) {
                        return Err(ObjectError::property_conflict(
                            &decl.name,
                            &spec.name,
                            format!(
                                "declared as {} but inherited as {}",
                                spec.ty.describe(self),
                                existing.ty.describe(self)
                            ),
                        ));
                    }
                    // Override in place: position is kept, definition wins.
                    flattened[position] = spec.clone();
                }
                None => flattened.push(spec.clone()),
            }
        }

        let id = ClassId(self.classes.len() as u32);
        self.classes.push(Class {
            name: decl.name.clone(),
            parent,
            properties: decl.properties,
            flattened,
            validator: decl.validator,
            constructor: decl.constructor,
            is_abstract: decl.is_abstract,
        });
        self.class_names.insert(decl.name, id);
        Ok(id)
    }

    fn check_property_type(&self, class_name: &str, spec: &PropertySpec) -> Result<()> {
        let ids = match &spec.ty {
            PropertyType::Class(id) => vec![*id],
            PropertyType::Union(union) => union
                .members()
                .iter()
                .filter_map(|member| match member {
                    UnionMember::Class(id) => Some(*id),
                    UnionMember::Base(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        for id in ids {
            if self.get_class(id).is_none() {
                return Err(ObjectError::declaration(format!(
                    "property '{}' of class '{}' references an undeclared class",
                    spec.name, class_name
                )));
            }
        }
        Ok(())
    }

    pub fn get_class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.0 as usize)
    }

    pub(crate) fn class(&self, id: ClassId) -> Result<&Class> {
        self.get_class(id).ok_or_else(|| {
            ObjectError::declaration(format!("class id {} is not declared in this model", id.0))
        })
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    pub fn class_name(&self, id: ClassId) -> String {
        self.get_class(id)
            .map(|class| class.name.clone())
            .unwrap_or_else(|| format!("<unknown class {}>", id.0))
    }

    /// The class and its ancestors, most specific first, classes only (the
    /// terminal base tag is the dispatch chain's concern).
    pub fn class_ancestry(&self, id: ClassId) -> Vec<ClassId> {
        let mut ancestry = Vec::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            let Some(class) = self.get_class(class_id) else {
                break;
            };
            ancestry.push(class_id);
            current = match class.parent {
                Parent::Class(parent) => Some(parent),
                Parent::Base(_) | Parent::Root => None,
            };
        }
        ancestry
    }

    /// The base type a class's instances are rooted on, if the chain ends
    /// at a base tag rather than the root object class.
    pub fn rooting_base(&self, id: ClassId) -> Option<crate::value::BaseType> {
        let last = *self.class_ancestry(id).last()?;
        match self.get_class(last)?.parent {
            Parent::Base(tag) => Some(tag),
            Parent::Class(_) | Parent::Root => None,
        }
    }

    pub fn is_subclass(&self, child: ClassId, ancestor: ClassId) -> bool {
        self.class_ancestry(child).contains(&ancestor)
    }

    // === Generic registry ===

    /// Declare a generic function dispatching on its first `dispatch_arity`
    /// positional arguments.
    pub fn declare_generic(
        &mut self,
        name: impl Into<String>,
        dispatch_arity: usize,
    ) -> Result<GenericId> {
        let name = name.into();
        if self.generic_names.contains_key(&name) {
            return Err(ObjectError::declaration(format!(
                "generic '{name}' is already declared"
            )));
        }
        if dispatch_arity == 0 {
            return Err(ObjectError::declaration(format!(
                "generic '{name}' must dispatch on at least one argument"
            )));
        }
        let id = GenericId(self.generics.len() as u32);
        self.generics.push(Generic::new(name.clone(), dispatch_arity));
        self.generic_names.insert(name, id);
        Ok(id)
    }

    pub(crate) fn generic(&self, id: GenericId) -> Result<&Generic> {
        self.generics.get(id.0 as usize).ok_or_else(|| {
            ObjectError::declaration(format!("generic id {} is not declared in this model", id.0))
        })
    }

    pub fn find_generic(&self, name: &str) -> Option<GenericId> {
        self.generic_names.get(name).copied()
    }

    pub fn generic_name(&self, id: GenericId) -> String {
        self.generics
            .get(id.0 as usize)
            .map(|generic| generic.name.clone())
            .unwrap_or_else(|| format!("<unknown generic {}>", id.0))
    }

    /// Register a method on a generic. The signature covers exactly the
    /// dispatched positions; unions register the method for each member.
    /// Re-registering a tuple overwrites the previous method. With
    /// `min_version` set, registration is a silent no-op when the host's
    /// version comparator reports the current version is older, so methods
    /// can stage in without version checks at call sites.
    pub fn register_method(
        &mut self,
        generic: GenericId,
        signature: &[Dispatchable],
        implementation: MethodFn,
        min_version: Option<&str>,
    ) -> Result<()> {
        if let Some(version) = min_version {
            if !(self.version_ok)(version) {
                return Ok(());
            }
        }

        for element in signature {
            for class_id in element.class_ids() {
                if self.get_class(class_id).is_none() {
                    return Err(ObjectError::declaration(format!(
                        "method signature for generic '{}' references an undeclared class",
                        self.generic_name(generic),
                    )));
                }
            }
        }

        let generic_def = self
            .generics
            .get_mut(generic.0 as usize)
            .ok_or_else(|| {
                ObjectError::declaration(format!(
                    "generic id {} is not declared in this model",
                    generic.0
                ))
            })?;

        if signature.len() != generic_def.dispatch_arity {
            return Err(ObjectError::wrong_arity(
                &generic_def.name,
                generic_def.dispatch_arity,
                signature.len(),
            ));
        }

        let method = MethodId(generic_def.methods.len() as u32);
        generic_def.methods.push(RegisteredMethod { implementation });
        for tuple in expand_signature(signature) {
            generic_def.table.insert(&tuple, method);
        }
        // A new method can change the answer for any cached tuple.
        generic_def.clear_cache();
        Ok(())
    }

    /// Convenience for closures: wraps in the method function type.
    pub fn method(
        implementation: impl Fn(
                &ObjectModel,
                &mut crate::dispatch::MethodCursor,
                &crate::generic::CallArgs,
            ) -> Result<Value>
            + 'static,
    ) -> MethodFn {
        Rc::new(implementation)
    }

    // === Collaborator hooks ===

    /// Install the legacy single-dispatch fallback capability.
    pub fn set_legacy_dispatch(
        &mut self,
        hook: impl Fn(&str, &Value) -> Option<MethodFn> + 'static,
    ) {
        self.legacy = Some(Rc::new(hook));
    }

    /// Install the host's version comparator ("current >= given").
    pub fn set_version_comparator(&mut self, comparator: impl Fn(&str) -> bool + 'static) {
        self.version_ok = Rc::new(comparator);
    }

    /// Dispatch caching toggle; resolution order is identical either way.
    pub fn set_dispatch_caching(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Class or base-type label of a value, for error messages.
    pub fn value_label(&self, value: &Value) -> String {
        match value {
            Value::Object(instance) => self.class_name(instance.class()),
            other => other.base_type().name().to_string(),
        }
    }
}

impl Default for ObjectModel {
    fn default() -> Self {
        Self::new()
    }
}
