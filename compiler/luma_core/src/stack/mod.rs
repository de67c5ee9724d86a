//! Value stack used to pass arguments to and results from native functions.
//!
//! The stack has a movable floor (`bottom`) that scopes the current native
//! call: values below it belong to outer frames and cannot be popped.
//!
//! ```text
//!   0          bottom              top      capacity
//!   | outer ... | arg1 arg2 ... argN |  free  |
//! ```
//!
//! Capacity grows by a fixed increment when full and never shrinks.

use crate::errors::{RuntimeError, RuntimeResult};
use crate::value::Value;

/// Default capacity growth step, in slots.
pub const STACK_INCREMENT: usize = 32;

/// Growable, lockable value stack.
#[derive(Debug)]
pub struct Stack {
    slots: Vec<Value>,
    bottom: usize,
    increment: usize,
}

impl Stack {
    /// Create an empty stack with the default growth step.
    pub fn new() -> Self {
        Self::with_increment(STACK_INCREMENT)
    }

    /// Create an empty stack that grows `increment` slots at a time.
    pub fn with_increment(increment: usize) -> Self {
        let increment = increment.max(1);
        Stack {
            slots: Vec::with_capacity(increment),
            bottom: 0,
            increment,
        }
    }

    /// Index of the next free slot.
    #[inline]
    pub fn top(&self) -> usize {
        self.slots.len()
    }

    /// Current floor.
    #[inline]
    pub fn bottom(&self) -> usize {
        self.bottom
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of values above the floor.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.slots.len() - self.bottom
    }

    #[inline]
    pub fn is_frame_empty(&self) -> bool {
        self.frame_len() == 0
    }

    /// Push a value, growing capacity by the fixed increment when full.
    pub fn push(&mut self, value: Value) {
        if self.slots.len() == self.slots.capacity() {
            self.slots.reserve_exact(self.increment);
        }
        self.slots.push(value);
    }

    /// Pop the top value.
    pub fn pop(&mut self) -> RuntimeResult<Value> {
        if self.slots.len() == self.bottom {
            return Err(self.underflow());
        }
        self.slots.pop().ok_or_else(|| self.underflow())
    }

    /// Pop up to `count` values, top-first, padding with `nil` when the frame runs out.
    pub fn pop_n(&mut self, count: usize) -> Vec<Value> {
        let available = count.min(self.frame_len());
        let start = self.slots.len() - available;
        let mut values: Vec<Value> = self.slots.drain(start..).rev().collect();
        values.resize(count, Value::Nil);
        values
    }

    /// Read the top value without removing it.
    pub fn peek(&self) -> RuntimeResult<Value> {
        if self.slots.len() == self.bottom {
            return Err(self.underflow());
        }
        self.slots.last().cloned().ok_or_else(|| self.underflow())
    }

    /// Pop the top value, or `nil` when the frame is empty.
    pub fn pop_or_nil(&mut self) -> Value {
        self.pop().unwrap_or_default()
    }

    /// Remove every value above the floor, returned in push order.
    ///
    /// This is how native functions read their argument list.
    pub fn drain_frame(&mut self) -> Vec<Value> {
        self.slots.split_off(self.bottom)
    }

    /// Move the floor to `at`.
    ///
    /// Fails if `at` is above the current top. The floor may also be lowered.
    pub fn lock(&mut self, at: usize) -> RuntimeResult<()> {
        if at > self.slots.len() {
            return Err(RuntimeError::LockAboveTop {
                at,
                top: self.slots.len(),
            });
        }
        self.bottom = at;
        Ok(())
    }

    /// Reset the floor to zero.
    pub fn unlock(&mut self) {
        self.bottom = 0;
    }

    /// Discard the bottom `count` values of the current frame and compact the rest down.
    pub fn shift_left(&mut self, count: usize) {
        let count = count.min(self.frame_len());
        self.slots.drain(self.bottom..self.bottom + count);
    }

    /// Drop everything at or above `at`, never going below the floor.
    pub fn truncate(&mut self, at: usize) {
        self.slots.truncate(at.max(self.bottom));
    }

    #[cold]
    fn underflow(&self) -> RuntimeError {
        RuntimeError::StackUnderflow {
            bottom: self.bottom,
        }
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
