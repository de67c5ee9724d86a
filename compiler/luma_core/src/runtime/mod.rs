//! Runtime state and the native calling convention.
//!
//! A [`Runtime`] owns the globals table, the scope [`Environment`], the
//! print handler and configuration. Stacks are separate values so an
//! evaluator can keep one per execution; the runtime only borrows them for
//! the duration of a call.
//!
//! # Calling convention
//!
//! [`Runtime::call`] pushes the arguments, locks the stack floor at the
//! argument base, invokes the native function, collects the results it
//! reports in push order, and then restores the stack to exactly the shape
//! it had before the call. The restore also happens when the call fails.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::baselib;
use crate::environment::Environment;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::stack::{Stack, STACK_INCREMENT};
use crate::table::{Table, INDEX_EVENT, TOSTRING_EVENT};
use crate::value::{format_number, Closure, Function, NativeFn, NativeFunction, Value};

/// Default bound on `__index` delegation chains.
pub const DEFAULT_MAX_INDEX_DEPTH: usize = 100;

/// Runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How many tables an `__index` chain may pass through before failing.
    pub max_index_depth: usize,
    /// Growth step for stacks created with [`Runtime::new_stack`].
    pub stack_increment: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_index_depth: DEFAULT_MAX_INDEX_DEPTH,
            stack_increment: STACK_INCREMENT,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn with_max_index_depth(mut self, depth: usize) -> Self {
        self.max_index_depth = depth;
        self
    }

    #[must_use]
    pub fn with_stack_increment(mut self, increment: usize) -> Self {
        self.stack_increment = increment;
        self
    }
}

/// Executes script closures on behalf of the runtime.
///
/// The core never interprets closure bodies. When a native function (for
/// example `pcall`) calls a closure, the runtime hands it to the installed
/// evaluator together with the stack, so the evaluator can call back into
/// native functions through the same convention.
pub trait Evaluator {
    fn call_closure(
        &self,
        runtime: &mut Runtime,
        stack: &mut Stack,
        closure: &Closure,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>>;
}

/// State shared by every native function call.
pub struct Runtime {
    globals: Table,
    environment: Environment,
    print_handler: SharedPrintHandler,
    evaluator: Option<Rc<dyn Evaluator>>,
    config: RuntimeConfig,
}

impl Runtime {
    /// Create a runtime with the base library registered and output on stdout.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let globals = Table::new();
        baselib::register(&globals);
        Runtime {
            globals,
            environment: Environment::new(),
            print_handler: stdout_handler(),
            evaluator: None,
            config,
        }
    }

    /// Replace the print handler.
    #[must_use]
    pub fn with_print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = handler;
        self
    }

    /// Install the evaluator used to run closures.
    pub fn set_evaluator(&mut self, evaluator: Rc<dyn Evaluator>) {
        self.evaluator = Some(evaluator);
    }

    // Accessors

    pub fn globals(&self) -> &Table {
        &self.globals
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// A stack using the configured growth step.
    pub fn new_stack(&self) -> Stack {
        Stack::with_increment(self.config.stack_increment)
    }

    /// Read a global variable.
    pub fn global(&self, name: &str) -> Value {
        self.globals.get_field(name)
    }

    /// Write a global variable.
    pub fn set_global(&self, name: &str, value: impl Into<Value>) {
        self.globals.set_field(name, value);
    }

    /// Bind a native function as a global.
    pub fn register(&self, name: &'static str, func: NativeFn) {
        self.globals
            .set_field(name, Value::Function(Function::native(name, func)));
    }

    /// Resolve a variable through the environment, falling back to globals.
    pub fn lookup(&self, name: &str) -> Value {
        self.environment.lookup(&self.globals, name).value
    }

    // Calls

    /// Call `function` with `args`, returning its results in push order.
    pub fn call(
        &mut self,
        stack: &mut Stack,
        function: &Value,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        let Value::Function(function) = function else {
            return Err(RuntimeError::NotCallable {
                type_name: function.type_name(),
            });
        };
        match function {
            Function::Native(native) => self.call_native(stack, native, args),
            Function::Closure(closure) => {
                let Some(evaluator) = self.evaluator.clone() else {
                    return Err(RuntimeError::NoEvaluator {
                        name: closure.name().unwrap_or("?").to_owned(),
                    });
                };
                evaluator.call_closure(self, stack, closure, args)
            }
        }
    }

    fn call_native(
        &mut self,
        stack: &mut Stack,
        native: &NativeFunction,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        let base = stack.top();
        let floor = stack.bottom();
        for arg in args {
            stack.push(arg);
        }

        let result = stack
            .lock(base)
            .and_then(|()| native.invoke(self, stack))
            .and_then(|count| {
                let pushed = stack.frame_len();
                if count > pushed {
                    return Err(RuntimeError::ResultCountMismatch {
                        function: native.name(),
                        count,
                        pushed,
                    });
                }
                let mut results = stack.pop_n(count);
                results.reverse();
                Ok(results)
            });

        stack.unlock();
        stack.truncate(base);
        stack.lock(floor.min(stack.top()))?;
        result
    }

    /// Call `function`, restoring the stack and the environment depth if it fails.
    pub fn protected_call(
        &mut self,
        stack: &mut Stack,
        function: &Value,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        let top = stack.top();
        let floor = stack.bottom();
        let depth = self.environment.depth();

        let result = self.call(stack, function, args);
        if let Err(error) = &result {
            debug!(%error, "protected call caught error");
            stack.unlock();
            stack.truncate(top);
            stack.lock(floor.min(stack.top()))?;
            self.environment.truncate(depth);
        }
        result
    }

    // Metatable dispatch

    /// Index `target` with `key`: own lookup first, then `__index` delegation.
    ///
    /// A function handler is called with `(table, key)` and its first result
    /// is used; a table handler is searched in turn. Any other handler, or
    /// none, yields `nil`.
    pub fn index(&mut self, stack: &mut Stack, target: &Value, key: &Value) -> RuntimeResult<Value> {
        let mut current = target.clone();
        for depth in 0..=self.config.max_index_depth {
            let Value::Table(table) = &current else {
                return Err(RuntimeError::NotIndexable {
                    type_name: current.type_name(),
                });
            };
            let own = table.get_value(key);
            if !own.is_nil() {
                return Ok(own);
            }
            let handler = table.meta_field(INDEX_EVENT);
            match handler {
                Value::Function(_) => {
                    trace!(depth, %key, "delegating index to function");
                    let results = self.call(stack, &handler, vec![current.clone(), key.clone()])?;
                    return Ok(results.into_iter().next().unwrap_or_default());
                }
                Value::Table(_) => {
                    trace!(depth, %key, "delegating index to table");
                    current = handler;
                }
                _ => return Ok(Value::Nil),
            }
        }
        Err(RuntimeError::IndexDepthExceeded {
            limit: self.config.max_index_depth,
        })
    }

    /// Convert `value` to text, honouring a table's `__tostring` handler.
    pub fn tostring(&mut self, stack: &mut Stack, value: &Value) -> RuntimeResult<String> {
        if let Value::Table(table) = value {
            let handler = table.meta_field(TOSTRING_EVENT);
            if let Value::Function(_) = handler {
                let results = self.call(stack, &handler, vec![value.clone()])?;
                return match results.into_iter().next() {
                    Some(Value::String(s)) => Ok(s.to_string()),
                    Some(Value::Number(n)) => Ok(format_number(n)),
                    _ => Err(RuntimeError::InvalidToStringResult),
                };
            }
        }
        Ok(value.to_string())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
