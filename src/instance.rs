//! Instances and the operations that keep them valid: construction,
//! property access, and copy-on-write mutation.
//!
//! An instance is never observable in a state any validator along its class
//! chain would reject. Construction and assignment either commit a fully
//! validated instance or leave the caller's value untouched.

use crate::class::ClassId;
use crate::error::{ObjectError, Result};
use crate::model::ObjectModel;
use crate::value::Value;
use indexmap::IndexMap;

/// A value tagged with its defining class.
///
/// The class reference is an id into the owning model (weak: the instance
/// does not own the class). `properties` keys are exactly the flattened
/// property names of the class and its ancestors. `legacy_chain` carries a
/// legacy class-attribute chain verbatim; it prefixes the dispatch chain so
/// legacy classes dispatch exactly as under the legacy system.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class: ClassId,
    base: Box<Value>,
    properties: IndexMap<String, Value>,
    legacy_chain: Vec<String>,
}

impl Instance {
    /// Assemble an instance directly. Custom constructors use this; the
    /// validator chain still runs before [`ObjectModel::construct`] releases
    /// the result.
    pub fn new(class: ClassId, base: Value, properties: IndexMap<String, Value>) -> Self {
        Self {
            class,
            base: Box::new(base),
            properties,
            legacy_chain: Vec::new(),
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The underlying base value the instance was rooted on.
    pub fn base(&self) -> &Value {
        &self.base
    }

    pub fn legacy_chain(&self) -> &[String] {
        &self.legacy_chain
    }

    /// Attach a legacy class-attribute chain (most specific first).
    pub fn with_legacy_chain(mut self, chain: Vec<String>) -> Self {
        self.legacy_chain = chain;
        self
    }

    /// Raw stored property value, bypassing getters. Validators and accessor
    /// implementations use this to avoid re-entering themselves.
    pub fn raw_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Write a stored property value directly, bypassing setters and type
    /// checks. Setter implementations use this; the model re-validates
    /// before any assignment commits.
    pub fn set_raw_property(&mut self, name: String, value: Value) {
        self.properties.insert(name, value);
    }

    /// The full stored property map, in flattened declaration order.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }
}

impl ObjectModel {
    /// Construct an instance of `class` around `base`, assigning the given
    /// property values and running the full validator chain.
    ///
    /// Properties are assigned from the most specific class up to the root,
    /// each checked against its declared type. Missing values take the
    /// property default, else `Null`. Validators run from the constructed
    /// class up to the root, all messages accumulate, and any message at all
    /// aborts construction.
    pub fn construct<S: Into<String>>(
        &self,
        class: ClassId,
        base: Value,
        args: Vec<(S, Value)>,
    ) -> Result<Instance> {
        let class_def = self.class(class)?;
        if class_def.is_abstract {
            return Err(ObjectError::declaration(format!(
                "abstract class '{}' cannot be instantiated",
                class_def.name
            )));
        }

        // Type-check the base value against the rooting base type.
        if let Some(tag) = self.rooting_base(class) {
            if base.base_type() != tag {
                return Err(ObjectError::type_mismatch(
                    format!("base value of class '{}'", class_def.name),
                    tag.name(),
                    base.base_type().name(),
                ));
            }
        }

        let mut args_map: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in args {
            args_map.insert(name.into(), value);
        }

        let instance = match &class_def.constructor {
            Some(constructor) => constructor(self, base, args_map)?,
            None => self.default_construct(class, base, args_map)?,
        };

        self.ensure_valid(class, &instance)?;
        Ok(instance)
    }

    fn default_construct(
        &self,
        class: ClassId,
        base: Value,
        mut args_map: IndexMap<String, Value>,
    ) -> Result<Instance> {
        let class_def = self.class(class)?;
        let mut properties: IndexMap<String, Value> = IndexMap::new();

        // Assign each class's own declared properties, most specific class
        // first; an overriding child declaration wins over its ancestor's.
        for ancestor_id in self.class_ancestry(class) {
            let ancestor = self.class(ancestor_id)?;
            for own_spec in &ancestor.properties {
                if properties.contains_key(&own_spec.name) {
                    continue;
                }
                // The effective (most-derived) spec governs the type check
                // and the default, even when an ancestor declared the slot.
                let spec = class_def
                    .property(&own_spec.name)
                    .unwrap_or(own_spec);
                let value = match args_map.shift_remove(&spec.name) {
                    Some(value) => {
                        if !self.type_accepts(&spec.ty, &value) {
                            return Err(ObjectError::type_mismatch(
                                format!("property '{}' of class '{}'", spec.name, class_def.name),
                                spec.ty.describe(self),
                                self.value_label(&value),
                            ));
                        }
                        value
                    }
                    None => spec.default.clone().unwrap_or(Value::Null),
                };
                properties.insert(spec.name.clone(), value);
            }
        }

        if let Some(unknown) = args_map.keys().next() {
            return Err(ObjectError::unknown_property(&class_def.name, unknown));
        }

        // Keep declaration order: flattened order is parent-first.
        let mut ordered = IndexMap::new();
        for spec in &class_def.flattened {
            if let Some(value) = properties.shift_remove(&spec.name) {
                ordered.insert(spec.name.clone(), value);
            }
        }

        Ok(Instance::new(class, base, ordered))
    }

    /// Read a property, via its getter when one is declared.
    pub fn get_property(&self, instance: &Instance, name: &str) -> Result<Value> {
        let class_def = self.class(instance.class())?;
        let spec = class_def
            .property(name)
            .ok_or_else(|| ObjectError::unknown_property(&class_def.name, name))?;
        match &spec.getter {
            Some(getter) => getter(self, instance),
            None => Ok(instance
                .raw_property(name)
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    /// Assign a property, returning the updated instance.
    ///
    /// Copy-on-write: the caller's instance is untouched; on a type or
    /// validation failure no new instance is released.
    pub fn set_property(
        &self,
        instance: &Instance,
        name: &str,
        value: Value,
    ) -> Result<Instance> {
        let updated = self.apply_property(instance, name, value)?;
        self.ensure_valid(instance.class(), &updated)?;
        Ok(updated)
    }

    /// Assign several properties, then validate once. Either every
    /// assignment commits or none does.
    pub fn update_properties<S: Into<String>>(
        &self,
        instance: &Instance,
        updates: Vec<(S, Value)>,
    ) -> Result<Instance> {
        let mut working = instance.clone();
        for (name, value) in updates {
            working = self.apply_property(&working, &name.into(), value)?;
        }
        self.ensure_valid(instance.class(), &working)?;
        Ok(working)
    }

    /// Type-check and write one property into a copy, without validating.
    fn apply_property(&self, instance: &Instance, name: &str, value: Value) -> Result<Instance> {
        let class_def = self.class(instance.class())?;
        let spec = class_def
            .property(name)
            .ok_or_else(|| ObjectError::unknown_property(&class_def.name, name))?;

        if !self.type_accepts(&spec.ty, &value) {
            return Err(ObjectError::type_mismatch(
                format!("property '{}' of class '{}'", name, class_def.name),
                spec.ty.describe(self),
                self.value_label(&value),
            ));
        }

        match &spec.setter {
            Some(setter) => setter(self, instance, value),
            None => {
                let mut updated = instance.clone();
                updated.set_raw_property(name.to_string(), value);
                Ok(updated)
            }
        }
    }

    /// Run the full validator chain, most specific class first, each
    /// validator receiving the whole instance. Returned messages are ordered
    /// root to most specific.
    pub fn validate(&self, instance: &Instance) -> Vec<String> {
        let mut per_class: Vec<Vec<String>> = Vec::new();
        for ancestor_id in self.class_ancestry(instance.class()) {
            if let Ok(ancestor) = self.class(ancestor_id) {
                if let Some(validator) = &ancestor.validator {
                    per_class.push(validator(self, instance));
                }
            }
        }
        per_class.reverse();
        per_class.into_iter().flatten().collect()
    }

    fn ensure_valid(&self, class: ClassId, instance: &Instance) -> Result<()> {
        let messages = self.validate(instance);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ObjectError::validation(self.class_name(class), messages))
        }
    }
}
