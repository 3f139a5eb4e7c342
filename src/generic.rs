//! Generic functions: a name, a dispatch signature, a method table, and a
//! dispatch cache. Methods may be registered at any time, including after
//! the generic has been called (no closed-world assumption).

use crate::class::ClassId;
use crate::dispatch::MethodCursor;
use crate::error::Result;
use crate::method_table::{DispatchKey, MethodId, MethodTable};
use crate::model::ObjectModel;
use crate::union::{UnionMember, UnionSpec};
use crate::value::{BaseType, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Unique identifier for a generic function within one `ObjectModel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericId(pub u32);

/// Arguments delivered to a method body. Dispatched arguments selected the
/// method; extra arguments passed through without influencing dispatch.
/// Promises among them arrive unevaluated.
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub dispatched: Vec<Value>,
    pub extra: Vec<Value>,
}

impl CallArgs {
    pub fn new(dispatched: Vec<Value>, extra: Vec<Value>) -> Self {
        Self { dispatched, extra }
    }
}

/// A method implementation. The cursor lets the body continue to the next
/// applicable method.
pub type MethodFn = Rc<dyn Fn(&ObjectModel, &mut MethodCursor, &CallArgs) -> Result<Value>>;

/// One element of a registration signature.
#[derive(Clone)]
pub enum Dispatchable {
    /// Matches every value (default method position)
    Any,
    /// Matches values with this base-type tag
    Base(BaseType),
    /// Matches instances of this class or any descendant
    Class(ClassId),
    /// Registers the method for every member of the union
    Union(UnionSpec),
    /// Matches the named legacy class-attribute entry
    Legacy(String),
}

impl Dispatchable {
    /// Table keys this signature element expands to. Unions expand to one
    /// key per member; everything else maps one-to-one.
    pub(crate) fn expand(&self) -> Vec<DispatchKey> {
        match self {
            Dispatchable::Any => vec![DispatchKey::Any],
            Dispatchable::Base(tag) => vec![DispatchKey::Base(*tag)],
            Dispatchable::Class(id) => vec![DispatchKey::Class(*id)],
            Dispatchable::Legacy(name) => vec![DispatchKey::Legacy(name.clone())],
            Dispatchable::Union(union) => union
                .members()
                .iter()
                .map(|member| match member {
                    UnionMember::Class(id) => DispatchKey::Class(*id),
                    UnionMember::Base(tag) => DispatchKey::Base(*tag),
                })
                .collect(),
        }
    }

    /// Class ids named by this element, for declaration checking.
    pub(crate) fn class_ids(&self) -> Vec<ClassId> {
        match self {
            Dispatchable::Class(id) => vec![*id],
            Dispatchable::Union(union) => union
                .members()
                .iter()
                .filter_map(|member| match member {
                    UnionMember::Class(id) => Some(*id),
                    UnionMember::Base(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) struct RegisteredMethod {
    pub implementation: MethodFn,
}

/// A resolution the dispatch cache remembers: the winning method and the
/// tuple it matched on, which seeds the next-method cursor.
#[derive(Clone)]
pub(crate) struct CachedResolution {
    pub method: MethodId,
    pub tuple: Vec<DispatchKey>,
}

/// A generic function with multiple dispatch over its leading arguments.
pub struct Generic {
    pub name: String,
    /// How many leading positional arguments participate in dispatch;
    /// trailing arguments never do.
    pub dispatch_arity: usize,
    pub(crate) table: MethodTable,
    /// Append-only method arena; `MethodId` indexes stay stable across
    /// overwrites, displaced methods simply become unreachable.
    pub(crate) methods: Vec<RegisteredMethod>,
    /// Resolved calls keyed by the concrete chain tuple. Cleared on every
    /// registration, since a new method can change the right answer for a
    /// previously-cached tuple.
    pub(crate) cache: RefCell<HashMap<Vec<Vec<DispatchKey>>, CachedResolution>>,
}

impl Generic {
    pub(crate) fn new(name: String, dispatch_arity: usize) -> Self {
        Self {
            name,
            dispatch_arity,
            table: MethodTable::new(dispatch_arity),
            methods: Vec::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn has_methods(&self) -> bool {
        !self.table.is_empty()
    }

    pub(crate) fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

/// Cartesian product of the per-position key expansions of a signature.
pub(crate) fn expand_signature(signature: &[Dispatchable]) -> Vec<Vec<DispatchKey>> {
    let mut tuples: Vec<Vec<DispatchKey>> = vec![Vec::new()];
    for element in signature {
        let keys = element.expand();
        let mut next = Vec::with_capacity(tuples.len() * keys.len());
        for tuple in &tuples {
            for key in &keys {
                let mut extended = tuple.clone();
                extended.push(key.clone());
                next.push(extended);
            }
        }
        tuples = next;
    }
    tuples
}
