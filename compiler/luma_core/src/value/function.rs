//! Function values: native entry points and evaluator-owned closures.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeResult;
use crate::runtime::Runtime;
use crate::stack::Stack;

/// Native function ABI.
///
/// Arguments are the values above the stack floor; the function pops them,
/// pushes its results, and returns how many results it pushed.
pub type NativeFn = fn(&mut Runtime, &mut Stack) -> RuntimeResult<usize>;

/// A named native function.
pub struct NativeFunction {
    name: &'static str,
    func: NativeFn,
}

impl NativeFunction {
    /// The name the function was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invoke the function against `stack`.
    ///
    /// Callers are expected to have locked the floor at the argument base;
    /// [`Runtime::call`] does that bookkeeping.
    #[inline]
    pub fn invoke(&self, runtime: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
        (self.func)(runtime, stack)
    }
}

/// A script closure.
///
/// The body is opaque to the core: only the evaluator that created it knows
/// how to run it (see [`crate::Evaluator`]).
pub struct Closure {
    name: Option<Rc<str>>,
    body: Rc<dyn Any>,
}

impl Closure {
    /// Wrap an evaluator-specific body.
    pub fn new(name: Option<&str>, body: impl Any) -> Self {
        Closure {
            name: name.map(Rc::from),
            body: Rc::new(body),
        }
    }

    /// The name the closure was defined with, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Downcast the body to the evaluator's representation.
    pub fn body<T: Any>(&self) -> Option<&T> {
        self.body.downcast_ref::<T>()
    }
}

/// A callable script value.
///
/// Cloning shares the underlying function; equality is identity.
#[derive(Clone)]
pub enum Function {
    Native(Rc<NativeFunction>),
    Closure(Rc<Closure>),
}

impl Function {
    /// Create a native function value.
    pub fn native(name: &'static str, func: NativeFn) -> Self {
        Function::Native(Rc::new(NativeFunction { name, func }))
    }

    /// Create a closure value.
    pub fn closure(closure: Closure) -> Self {
        Function::Closure(Rc::new(closure))
    }

    /// Human-readable name, `?` for anonymous closures.
    pub fn name(&self) -> &str {
        match self {
            Function::Native(native) => native.name,
            Function::Closure(closure) => closure.name().unwrap_or("?"),
        }
    }

    /// Address-derived identity, unique while the function is alive.
    pub fn identity(&self) -> usize {
        match self {
            Function::Native(native) => Rc::as_ptr(native).cast::<()>() as usize,
            Function::Closure(closure) => Rc::as_ptr(closure).cast::<()>() as usize,
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => Rc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => write!(f, "Native({})", native.name),
            Function::Closure(closure) => {
                write!(f, "Closure({})", closure.name().unwrap_or("?"))
            }
        }
    }
}
