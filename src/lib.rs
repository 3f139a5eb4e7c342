//! Manifold - a runtime object model with multiple dispatch
//!
//! Classes carry typed properties and validators; generic functions dispatch
//! over one or more argument classes through a per-position method table.
//! The model interoperates with legacy single-dispatch object systems in a
//! host environment, falling back to them when no native method is found.
//!
//! Everything is dynamic: checks happen at construction, assignment, and
//! dispatch time, and classes or methods may be declared at any point during
//! a program's life. An [`ObjectModel`] owns all registries, so independent
//! models can coexist within one process.

pub mod class;
pub mod dispatch;
pub mod error;
pub mod generic;
pub mod instance;
pub mod method_table;
pub mod model;
pub mod property;
pub mod union;
pub mod value;

// Include tests directory with all test modules
#[cfg(test)]
#[path = "tests/mod.rs"]
pub mod tests;

// Re-export public API
pub use class::{Class, ClassDecl, ClassId, Constructor, Parent, Validator};
pub use dispatch::{LegacyFn, MethodCursor, VersionCheck};
pub use error::{ObjectError, Result};
pub use generic::{CallArgs, Dispatchable, Generic, GenericId, MethodFn};
pub use instance::Instance;
pub use method_table::{DispatchKey, MethodId, MethodTable};
pub use model::ObjectModel;
pub use property::{Getter, PropertySpec, PropertyType, Setter};
pub use union::{UnionMember, UnionSpec};
pub use value::{BaseType, NativeFn, Promise, Value};
