//! Hybrid array/hash tables.
//!
//! A table has two segments:
//!
//! - an **array segment** holding keys `1..=n`
//! - a **mapping segment** holding every other key in insertion order
//!
//! The mapping segment is a slot vector plus an `FxHashMap` from key to
//! slot. Removing a key never moves other entries, so a traversal with
//! [`Table::next`] can continue past the removed key: a cleared array
//! position stays behind as a `nil` hole and a cleared field as a vacant
//! slot. Both are reclaimed only when a new key is inserted.
//!
//! Tables are shared, mutable handles: cloning a `Table` clones the handle.
//! The metatable lives in its own slot and is never visible as a user key.

mod key;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

pub use key::Key;

use crate::errors::{RuntimeError, RuntimeResult};
use crate::value::Value;

/// Metatable field consulted when a lookup misses.
pub const INDEX_EVENT: &str = "__index";
/// Metatable field consulted for string conversion.
pub const TOSTRING_EVENT: &str = "__tostring";

/// Vacant slots are only reclaimed once the segment is at least this long.
const COMPACT_MIN_SLOTS: usize = 8;

/// A shared handle to a script table.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<TableData>>);

#[derive(Default)]
struct TableData {
    array: Vec<Value>,
    /// Number of `nil` holes in the array segment.
    holes: usize,
    slots: Vec<Slot>,
    index: FxHashMap<Key, usize>,
    /// Number of slots holding a non-nil value.
    live: usize,
    metatable: Option<Table>,
}

struct Slot {
    key: Key,
    value: Value,
}

/// Where a traversal resumes.
enum Cursor {
    /// 0-based position in the array segment.
    Array(usize),
    /// Position in the slot vector.
    Slot(usize),
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `array` sequence items and `hash` other keys.
    pub fn with_capacity(array: usize, hash: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(hash);
        Table(Rc::new(RefCell::new(TableData {
            array: Vec::with_capacity(array),
            holes: 0,
            slots: Vec::with_capacity(hash),
            index,
            live: 0,
            metatable: None,
        })))
    }

    /// Create an array-shaped table from a sequence (1-based).
    ///
    /// `nil` items end the array segment; later items are stored by key.
    pub fn from_sequence(items: impl IntoIterator<Item = Value>) -> Self {
        let table = Table::new();
        for (i, item) in items.into_iter().enumerate() {
            table.set(Key::index(i + 1), item);
        }
        table
    }

    // Raw access

    /// Look up `key` in the table's own segments.
    pub fn get(&self, key: &Key) -> Value {
        self.0.borrow().get(key)
    }

    /// Look up an arbitrary value; keys that cannot exist read as `nil`.
    pub fn get_value(&self, key: &Value) -> Value {
        Key::try_from(key).map_or(Value::Nil, |k| self.get(&k))
    }

    /// Look up a string field.
    pub fn get_field(&self, name: &str) -> Value {
        self.get(&Key::from(name))
    }

    /// Store `value` under `key`; `nil` removes the key.
    pub fn set(&self, key: Key, value: Value) {
        self.0.borrow_mut().set(key, value);
    }

    /// Store under an arbitrary value key, rejecting `nil`, NaN and reference keys.
    pub fn set_value(&self, key: &Value, value: Value) -> RuntimeResult<()> {
        let key = Key::try_from(key)?;
        self.set(key, value);
        Ok(())
    }

    /// Store a string field.
    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        self.set(Key::from(name), value.into());
    }

    /// Append to the array segment.
    pub fn push(&self, value: Value) {
        let next = self.len() + 1;
        self.set(Key::index(next), value);
    }

    // Traversal

    /// The entry following `key` in traversal order.
    ///
    /// `nil` starts the traversal; `Ok(None)` ends it. The order is the array
    /// segment `1..=n` followed by the mapping segment in insertion order, and
    /// is stable as long as no new keys are added. Keys may be cleared during
    /// a traversal.
    pub fn next(&self, key: &Value) -> RuntimeResult<Option<(Key, Value)>> {
        let data = self.0.borrow();
        let cursor = if key.is_nil() {
            Cursor::Array(0)
        } else {
            let key = Key::try_from(key).map_err(|_| RuntimeError::InvalidNextKey)?;
            match key.array_index() {
                Some(i) if i <= data.array.len() => Cursor::Array(i),
                _ => match data.index.get(&key) {
                    Some(&slot) => Cursor::Slot(slot + 1),
                    None => return Err(RuntimeError::InvalidNextKey),
                },
            }
        };
        Ok(data.scan(cursor))
    }

    /// Snapshot of every entry in traversal order.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        let data = self.0.borrow();
        let mut out = Vec::with_capacity(data.array.len() + data.live);
        out.extend(
            data.array
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_nil())
                .map(|(i, v)| (Key::index(i + 1), v.clone())),
        );
        out.extend(
            data.slots
                .iter()
                .filter(|slot| !slot.value.is_nil())
                .map(|slot| (slot.key.clone(), slot.value.clone())),
        );
        out
    }

    // Shape

    /// The table's border: the length of the gap-free prefix `1..=n`.
    pub fn len(&self) -> usize {
        self.0.borrow().border()
    }

    pub fn is_empty(&self) -> bool {
        let data = self.0.borrow();
        data.array.len() == data.holes && data.live == 0
    }

    /// True when every entry lives in the gap-free prefix of the array segment.
    pub fn is_array(&self) -> bool {
        let data = self.0.borrow();
        data.live == 0 && data.border() == data.array.len() - data.holes
    }

    // Metatable

    pub fn metatable(&self) -> Option<Table> {
        self.0.borrow().metatable.clone()
    }

    pub fn set_metatable(&self, metatable: Option<Table>) {
        self.0.borrow_mut().metatable = metatable;
    }

    /// Look up a metatable event handler (`__index`, `__tostring`).
    ///
    /// Returns `nil` when there is no metatable or it has no such field.
    pub fn meta_field(&self, event: &str) -> Value {
        self.metatable()
            .map_or(Value::Nil, |metatable| metatable.get_field(event))
    }

    // Identity

    /// Address-derived identity, unique while the table is alive.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl TableData {
    fn get(&self, key: &Key) -> Value {
        if let Some(i) = key.array_index() {
            if let Some(value) = self.array.get(i - 1) {
                return value.clone();
            }
        }
        self.index
            .get(key)
            .map_or(Value::Nil, |&slot| self.slots[slot].value.clone())
    }

    fn border(&self) -> usize {
        if self.holes == 0 {
            return self.array.len();
        }
        self.array
            .iter()
            .position(Value::is_nil)
            .unwrap_or(self.array.len())
    }

    fn set(&mut self, key: Key, value: Value) {
        if let Some(i) = key.array_index() {
            if i <= self.array.len() {
                self.set_array(i, value);
                return;
            }
            if !value.is_nil() && !self.index.contains_key(&key) {
                self.trim_array();
                if i == self.array.len() + 1 {
                    self.array.push(value);
                    self.migrate_into_array();
                    return;
                }
            }
        }
        self.set_slot(key, value);
    }

    /// Overwrite array position `i` (1-based); `nil` leaves a hole.
    fn set_array(&mut self, i: usize, value: Value) {
        let slot = &mut self.array[i - 1];
        match (slot.is_nil(), value.is_nil()) {
            (false, true) => self.holes += 1,
            (true, false) => self.holes -= 1,
            _ => {}
        }
        *slot = value;
    }

    /// Drop trailing holes from the array segment.
    ///
    /// Only called when a new key is inserted.
    fn trim_array(&mut self) {
        while self.array.last().is_some_and(Value::is_nil) {
            self.array.pop();
            self.holes -= 1;
        }
    }

    /// Append a slot for a key known to be absent from the index.
    fn push_slot(&mut self, key: Key, value: Value) {
        self.index.insert(key.clone(), self.slots.len());
        self.slots.push(Slot { key, value });
    }

    /// Pull keys that now continue the array segment out of the mapping segment.
    fn migrate_into_array(&mut self) {
        loop {
            let next = Key::index(self.array.len() + 1);
            match self.remove_slot(&next) {
                Some(value) => self.array.push(value),
                None => break,
            }
        }
    }

    /// Detach `key` from the mapping segment, returning its live value.
    fn remove_slot(&mut self, key: &Key) -> Option<Value> {
        let slot = self.index.remove(key)?;
        let value = std::mem::take(&mut self.slots[slot].value);
        if value.is_nil() {
            None
        } else {
            self.live -= 1;
            Some(value)
        }
    }

    fn set_slot(&mut self, key: Key, value: Value) {
        if let Some(&slot) = self.index.get(&key) {
            let was_live = !self.slots[slot].value.is_nil();
            match (was_live, value.is_nil()) {
                (true, true) => self.live -= 1,
                (false, false) => self.live += 1,
                _ => {}
            }
            self.slots[slot].value = value;
            return;
        }
        if value.is_nil() {
            return;
        }
        self.trim_array();
        self.compact_if_sparse();
        self.push_slot(key, value);
        self.live += 1;
    }

    /// Drop vacant slots once they outnumber live ones.
    ///
    /// Only called when a new key is inserted, which already invalidates any
    /// traversal in progress.
    fn compact_if_sparse(&mut self) {
        let vacant = self.slots.len() - self.live;
        if self.slots.len() < COMPACT_MIN_SLOTS || vacant <= self.live {
            return;
        }
        self.slots.retain(|slot| !slot.value.is_nil());
        self.index.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            self.index.insert(slot.key.clone(), i);
        }
    }

    fn scan(&self, cursor: Cursor) -> Option<(Key, Value)> {
        let start = match cursor {
            Cursor::Array(i) => {
                let item = self
                    .array
                    .iter()
                    .enumerate()
                    .skip(i)
                    .find(|(_, value)| !value.is_nil());
                if let Some((at, value)) = item {
                    return Some((Key::index(at + 1), value.clone()));
                }
                0
            }
            Cursor::Slot(slot) => slot,
        };
        self.slots
            .iter()
            .skip(start)
            .find(|slot| !slot.value.is_nil())
            .map(|slot| (slot.key.clone(), slot.value.clone()))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Table")
            .field("identity", &format_args!("{:#x}", self.identity()))
            .field("border", &data.border())
            .field("fields", &data.live)
            .field("has_metatable", &data.metatable.is_some())
            .finish()
    }
}
