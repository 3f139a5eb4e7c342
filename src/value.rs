//! Runtime value representation for the object model.
//!
//! `Value` covers the base values an instance can be rooted on, plus
//! instances themselves and opaque promises forwarded to methods unevaluated.

use crate::error::Result;
use crate::instance::Instance;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Signature for built-in function values
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// Tag identifying the base type of a value, used as the terminal entry of
/// every dispatch chain and as a member of union types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Map,
    Function,
    Promise,
}

impl BaseType {
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Null => "null",
            BaseType::Boolean => "boolean",
            BaseType::Integer => "integer",
            BaseType::Float => "float",
            BaseType::String => "string",
            BaseType::List => "list",
            BaseType::Map => "map",
            BaseType::Function => "function",
            BaseType::Promise => "promise",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unevaluated argument expression, forwarded to method bodies untouched.
///
/// The core never forces a promise; `force` exists for host environments
/// that implement non-standard evaluation on top of the model.
#[derive(Clone)]
pub struct Promise {
    thunk: Rc<dyn Fn() -> Result<Value>>,
}

impl Promise {
    pub fn new(thunk: impl Fn() -> Result<Value> + 'static) -> Self {
        Self {
            thunk: Rc::new(thunk),
        }
    }

    /// Evaluate the promise. Host-side only; dispatch never calls this.
    pub fn force(&self) -> Result<Value> {
        (self.thunk)()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Promise(<unevaluated>)")
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.thunk, &other.thunk)
    }
}

/// Runtime values in the object model
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value; also the default property value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Ordered map with string keys
    Map(IndexMap<String, Value>),
    /// Built-in function value
    Function(NativeFn),
    /// Opaque unevaluated argument (non-standard evaluation collaborator)
    Promise(Promise),
    /// Instance of a declared class
    Object(Instance),
}

impl Value {
    /// Base-type tag for this value. Objects report the tag of their
    /// underlying base value.
    pub fn base_type(&self) -> BaseType {
        match self {
            Value::Null => BaseType::Null,
            Value::Boolean(_) => BaseType::Boolean,
            Value::Integer(_) => BaseType::Integer,
            Value::Float(_) => BaseType::Float,
            Value::String(_) => BaseType::String,
            Value::List(_) => BaseType::List,
            Value::Map(_) => BaseType::Map,
            Value::Function(_) => BaseType::Function,
            Value::Promise(_) => BaseType::Promise,
            Value::Object(instance) => instance.base().base_type(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => *a as usize == *b as usize,
            (Value::Promise(a), Value::Promise(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}
