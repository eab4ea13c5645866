//! Core value and resource types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{LazyError, LazyResult};
use crate::lazy::placeholder::Handle;

/// Function signature for members that can be invoked.
pub type NativeFn = fn(args: Vec<Value>) -> LazyResult<Value>;

/// A fully constructed resource, as produced by a [`Loader`](super::loader::Loader).
///
/// Member lookup is by plain string so that placeholders can intercept any
/// member name before the resource exists.
pub trait Resource: Send + Sync {
    /// The dotted name this resource was loaded under.
    fn name(&self) -> &str;

    /// Look up a member. `None` means the resource has no such member.
    fn member(&self, member: &str) -> Option<Value>;

    /// Invoke the resource itself.
    fn call(&self, _args: Vec<Value>) -> LazyResult<Value> {
        Err(LazyError::NotCallable(self.name().to_string()))
    }

    /// Names of the members this resource exposes, for inspection.
    fn member_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Anything a member access can produce.
#[derive(Clone)]
pub enum Value {
    /// Neutral answer to introspection probes on an unresolved placeholder.
    Absent,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Function(NativeFn),
    Resource(Arc<dyn Resource>),
    /// A lazy handle, returned for ignored children.
    Handle(Handle),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Call this value with `args`. Functions are called directly, resources
    /// and handles through their own call contract.
    #[track_caller]
    pub fn invoke(&self, args: Vec<Value>) -> LazyResult<Value> {
        match self {
            Value::Function(f) => f(args),
            Value::Resource(r) => r.call(args),
            Value::Handle(h) => h.call(args),
            other => Err(LazyError::NotCallable(format!("{:?}", other))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => *a as usize == *b as usize,
            (Value::Resource(a), Value::Resource(b)) => same_resource(a, b),
            (Value::Handle(a), Value::Handle(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "Absent"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Function(_) => write!(f, "Function"),
            Value::Resource(r) => write!(f, "Resource({})", r.name()),
            Value::Handle(h) => write!(f, "Handle({})", h),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Identity comparison for shared resources.
pub fn same_resource(a: &Arc<dyn Resource>, b: &Arc<dyn Resource>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// A plain table-backed resource.
///
/// Members are fixed at construction; an optional call function makes the
/// namespace itself invocable.
#[derive(Clone)]
pub struct Namespace {
    name: String,
    members: HashMap<String, Value>,
    call: Option<NativeFn>,
}

impl Namespace {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Namespace {
            name: name.into(),
            members: HashMap::new(),
            call: None,
        }
    }

    pub fn with_member<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    pub fn with_function<S: Into<String>>(mut self, name: S, func: NativeFn) -> Self {
        self.members.insert(name.into(), Value::Function(func));
        self
    }

    pub fn with_resource<S: Into<String>>(mut self, name: S, resource: Arc<dyn Resource>) -> Self {
        self.members.insert(name.into(), Value::Resource(resource));
        self
    }

    pub fn with_call(mut self, func: NativeFn) -> Self {
        self.call = Some(func);
        self
    }

    pub fn into_resource(self) -> Arc<dyn Resource> {
        Arc::new(self)
    }
}

impl Resource for Namespace {
    fn name(&self) -> &str {
        &self.name
    }

    fn member(&self, member: &str) -> Option<Value> {
        self.members.get(member).cloned()
    }

    fn call(&self, args: Vec<Value>) -> LazyResult<Value> {
        match self.call {
            Some(f) => f(args),
            None => Err(LazyError::NotCallable(self.name.clone())),
        }
    }

    fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("members", &self.member_names())
            .finish()
    }
}
