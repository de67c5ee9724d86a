//! Lexical scope frames for variable resolution.
//!
//! Each frame owns one table of bindings plus the set of names declared in
//! it; the frame below it on the stack is its parent. A declared name stays
//! bound even while its value is `nil`. Lookup walks from the innermost
//! frame outward and finally falls back to a globals table supplied by the
//! caller.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::errors::{RuntimeError, RuntimeResult};
use crate::table::Table;
use crate::value::Value;

/// Result of resolving a name: the value and the table that holds it.
///
/// `owner` is the frame table (or the globals table) the name resolved in,
/// so assignment can update the binding in place.
#[derive(Clone, Debug)]
pub struct Lookup {
    pub value: Value,
    pub owner: Table,
}

/// Stack of scope frames with a root frame that is never popped.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

#[derive(Debug, Default)]
struct Frame {
    bindings: Table,
    declared: FxHashSet<Rc<str>>,
}

impl Environment {
    /// Create an environment holding just the root frame.
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::default()],
        }
    }

    /// Number of frames, including the root.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The innermost frame's bindings.
    pub fn current(&self) -> &Table {
        &self.frames[self.frames.len() - 1].bindings
    }

    /// Push a child frame.
    pub fn new_frame(&mut self) {
        self.frames.push(Frame::default());
        trace!(depth = self.frames.len(), "pushed scope frame");
    }

    /// Pop the innermost frame, restoring its parent.
    pub fn pop_frame(&mut self) -> RuntimeResult<()> {
        if self.frames.len() <= 1 {
            return Err(RuntimeError::UnbalancedFrames);
        }
        self.frames.pop();
        trace!(depth = self.frames.len(), "popped scope frame");
        Ok(())
    }

    /// Pop frames until `depth` remain. The root frame always survives.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Bind `name` in the innermost frame, shadowing outer bindings.
    ///
    /// A `nil` binding shadows too, until the frame is popped.
    pub fn define(&mut self, name: &str, value: impl Into<Value>) {
        let last = self.frames.len() - 1;
        let frame = &mut self.frames[last];
        if !frame.declared.contains(name) {
            frame.declared.insert(Rc::from(name));
        }
        frame.bindings.set_field(name, value);
    }

    /// Resolve `name`, innermost frame first, then `globals`.
    ///
    /// An unbound name resolves to `nil` owned by `globals`, which is where
    /// an assignment to it lands.
    pub fn lookup(&self, globals: &Table, name: &str) -> Lookup {
        for frame in self.frames.iter().rev() {
            let value = frame.bindings.get_field(name);
            if !value.is_nil() || frame.declared.contains(name) {
                return Lookup {
                    value,
                    owner: frame.bindings.clone(),
                };
            }
        }
        Lookup {
            value: globals.get_field(name),
            owner: globals.clone(),
        }
    }

    /// Assign to `name` wherever it currently resolves.
    pub fn assign(&mut self, globals: &Table, name: &str, value: impl Into<Value>) {
        self.lookup(globals, name).owner.set_field(name, value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
