//! The dispatch engine: class-chain computation, greedy method resolution,
//! caching, the legacy single-dispatch fallback, and next-method chaining.

use crate::error::{ObjectError, Result};
use crate::generic::{CachedResolution, CallArgs, Generic, GenericId, MethodFn};
use crate::method_table::{DispatchKey, MethodId};
use crate::model::ObjectModel;
use crate::property::PropertyType;
use crate::union::UnionMember;
use crate::value::Value;
use std::rc::Rc;

/// Host-supplied legacy single-dispatch hook. Queried only after native
/// multi-argument resolution fails, with the generic's name and the first
/// dispatched argument; its internals are opaque to the core.
pub type LegacyFn = Rc<dyn Fn(&str, &Value) -> Option<MethodFn>>;

/// Host-supplied version comparator: "is the current package version at
/// least this one". Gates method registration, never dispatch.
pub type VersionCheck = Rc<dyn Fn(&str) -> bool>;

/// A resumable cursor over the remaining applicable methods of a call.
///
/// The cursor walks the lexicographic product of each dispatched position's
/// remaining chain candidates, starting strictly after the tuple the current
/// method matched on. It never revisits a method, even one reachable through
/// several tuples.
pub struct MethodCursor {
    generic: Option<GenericId>,
    generic_name: String,
    candidates: Vec<MethodId>,
    next: usize,
}

impl MethodCursor {
    pub(crate) fn after_resolution(
        generic: GenericId,
        generic_name: String,
        candidates: Vec<MethodId>,
    ) -> Self {
        Self {
            generic: Some(generic),
            generic_name,
            candidates,
            next: 0,
        }
    }

    /// Cursor with nothing left; legacy-dispatched methods get this.
    pub(crate) fn exhausted(generic_name: String) -> Self {
        Self {
            generic: None,
            generic_name,
            candidates: Vec::new(),
            next: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next < self.candidates.len()
    }

    /// Invoke the next applicable method with the same arguments, extra
    /// arguments passing through unchanged.
    pub fn call_next(&mut self, model: &ObjectModel, args: &CallArgs) -> Result<Value> {
        let Some(generic) = self.generic else {
            return Err(ObjectError::no_next_method(&self.generic_name));
        };
        if self.next >= self.candidates.len() {
            return Err(ObjectError::no_next_method(&self.generic_name));
        }
        let method = self.candidates[self.next];
        self.next += 1;
        model.invoke_method(generic, method, self, args)
    }
}

impl ObjectModel {
    /// The ordered dispatch chain of a value: legacy class-attribute entries
    /// verbatim, then the class and its ancestors most specific first, then
    /// the base-type tag, then `Any`.
    pub fn dispatch_chain(&self, value: &Value) -> Vec<DispatchKey> {
        let mut chain = Vec::new();
        if let Value::Object(instance) = value {
            for name in instance.legacy_chain() {
                chain.push(DispatchKey::Legacy(name.clone()));
            }
            for class in self.class_ancestry(instance.class()) {
                chain.push(DispatchKey::Class(class));
            }
        }
        chain.push(DispatchKey::Base(value.base_type()));
        chain.push(DispatchKey::Any);
        chain
    }

    /// Membership test used for property assignment and signature checking.
    pub(crate) fn type_accepts(&self, ty: &PropertyType, value: &Value) -> bool {
        match ty {
            PropertyType::Any => true,
            PropertyType::Base(tag) => value.base_type() == *tag,
            PropertyType::Class(class) => value
                .as_object()
                .is_some_and(|instance| self.is_subclass(instance.class(), *class)),
            PropertyType::Union(union) => union.members().iter().any(|member| match member {
                UnionMember::Class(class) => value
                    .as_object()
                    .is_some_and(|instance| self.is_subclass(instance.class(), *class)),
                UnionMember::Base(tag) => value.base_type() == *tag,
            }),
        }
    }

    /// Call a generic with dispatched arguments only.
    pub fn call(&self, generic: GenericId, args: Vec<Value>) -> Result<Value> {
        self.call_with_extra(generic, args, Vec::new())
    }

    /// Call a generic; `extra` arguments are forwarded to the chosen method
    /// unchanged and never influence dispatch.
    pub fn call_with_extra(
        &self,
        generic: GenericId,
        dispatched: Vec<Value>,
        extra: Vec<Value>,
    ) -> Result<Value> {
        let generic_def = self.generic(generic)?;
        if dispatched.len() != generic_def.dispatch_arity {
            return Err(ObjectError::wrong_arity(
                &generic_def.name,
                generic_def.dispatch_arity,
                dispatched.len(),
            ));
        }

        let chains: Vec<Vec<DispatchKey>> = dispatched
            .iter()
            .map(|value| self.dispatch_chain(value))
            .collect();

        let args = CallArgs::new(dispatched, extra);

        if let Some(resolution) = self.resolve_native(generic_def, &chains) {
            let mut cursor = self.cursor_after(generic, generic_def, &chains, &resolution);
            return self.invoke_method(generic, resolution.method, &mut cursor, &args);
        }

        // Native resolution exhausted: single-argument legacy fallback, then
        // failure naming every dispatched argument's class.
        if let (Some(hook), Some(first)) = (&self.legacy, args.dispatched.first()) {
            if let Some(implementation) = hook(&generic_def.name, first) {
                let mut cursor = MethodCursor::exhausted(generic_def.name.clone());
                return implementation(self, &mut cursor, &args);
            }
        }

        let labels: Vec<String> = args
            .dispatched
            .iter()
            .map(|value| self.value_label(value))
            .collect();
        Err(ObjectError::method_not_found(
            &generic_def.name,
            labels.join(", "),
        ))
    }

    /// Greedy per-position resolution with the generic's cache in front.
    fn resolve_native(
        &self,
        generic: &Generic,
        chains: &[Vec<DispatchKey>],
    ) -> Option<CachedResolution> {
        if self.cache_enabled {
            if let Some(hit) = generic.cache.borrow().get(chains).cloned() {
                return Some(hit);
            }
        }
        let (method, tuple) = generic.table.resolve(chains)?;
        let resolution = CachedResolution { method, tuple };
        if self.cache_enabled {
            generic
                .cache
                .borrow_mut()
                .insert(chains.to_vec(), resolution.clone());
        }
        Some(resolution)
    }

    /// Build the next-method cursor: the ordered leaves of the table after
    /// the matched tuple, deduplicated so no method runs twice.
    fn cursor_after(
        &self,
        generic: GenericId,
        generic_def: &Generic,
        chains: &[Vec<DispatchKey>],
        resolution: &CachedResolution,
    ) -> MethodCursor {
        let applicable = generic_def.table.enumerate(chains);
        let start = applicable
            .iter()
            .position(|(_, tuple)| *tuple == resolution.tuple)
            .map(|index| index + 1)
            .unwrap_or(applicable.len());

        let mut candidates = Vec::new();
        for (method, _) in applicable.into_iter().skip(start) {
            if method == resolution.method || candidates.contains(&method) {
                continue;
            }
            candidates.push(method);
        }
        MethodCursor::after_resolution(generic, generic_def.name.clone(), candidates)
    }

    pub(crate) fn invoke_method(
        &self,
        generic: GenericId,
        method: MethodId,
        cursor: &mut MethodCursor,
        args: &CallArgs,
    ) -> Result<Value> {
        let implementation = {
            let generic_def = self.generic(generic)?;
            generic_def
                .methods
                .get(method.0 as usize)
                .map(|registered| registered.implementation.clone())
                .ok_or_else(|| {
                    ObjectError::declaration(format!(
                        "method id {} out of range for generic '{}'",
                        method.0, generic_def.name
                    ))
                })?
        };
        implementation(self, cursor, args)
    }
}
