use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::slot::{typed_mut, Slot, SlotId, SlotValue};
use crate::strategy::{SlotAccess, SlotStrategy};

type SlotKey = (u64, SlotId);

thread_local! {
    /// Values of every `ThreadLocalSlots` store touched by this thread.
    static SLOT_MAP: RefCell<HashMap<SlotKey, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// General-purpose strategy backed by `thread_local!` storage.
///
/// Every thread owns one hash map keyed by `(store id, slot id)`. Each access
/// goes through the `LocalKey`, a `RefCell` borrow, a hash lookup and a
/// downcast, which is the price paid for storage that works for any number
/// of stores and slots without coordination.
///
/// # Thread Safety
///
/// Values are never shared between threads: a worker only ever sees the map
/// of the thread it runs on. No locks are involved.
///
/// # Cleanup
///
/// Several stores can live on the same thread, so each gets a unique id.
/// Dropping a [`ThreadLocalContext`] removes that store's entries from the
/// current thread, which keeps successive runs on a reused thread apart.
///
/// # Examples
///
/// ```
/// use slotbench_core::{SlotAccess, SlotRegistry, SlotStrategy, ThreadLocalSlots};
///
/// let mut registry = SlotRegistry::new();
/// let name = registry.declare("name", || String::from("anonymous"));
/// let strategy = ThreadLocalSlots::new();
///
/// {
///     let mut ctx = strategy.context();
///     assert_eq!(ctx.get(&name), "anonymous");
///     ctx.set(&name, "worker-0".to_string());
///     assert_eq!(ctx.get(&name), "worker-0");
/// }
///
/// // a new context on the same thread starts fresh
/// let mut ctx = strategy.context();
/// assert!(!ctx.is_initialized(&name));
/// ```
#[derive(Debug)]
pub struct ThreadLocalSlots {
    store: u64,
}

impl ThreadLocalSlots {
    pub const NAME: &'static str = "ThreadLocalSlots";

    pub fn new() -> Self {
        Self {
            store: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Number of entries this store holds on the calling thread.
    #[cfg(test)]
    fn local_len(&self) -> usize {
        SLOT_MAP.with(|m| m.borrow().keys().filter(|(store, _)| *store == self.store).count())
    }
}

impl Default for ThreadLocalSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStrategy for ThreadLocalSlots {
    type Context = ThreadLocalContext;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn context(&self) -> ThreadLocalContext {
        ThreadLocalContext {
            store: self.store,
            _not_send: PhantomData,
        }
    }
}

/// A worker's handle on the current thread's slot map.
///
/// The context is pinned to the thread that created it.
pub struct ThreadLocalContext {
    store: u64,
    _not_send: PhantomData<*const ()>,
}

impl ThreadLocalContext {
    #[inline]
    fn key<T>(&self, slot: &Slot<T>) -> SlotKey {
        (self.store, slot.id())
    }
}

impl SlotAccess for ThreadLocalContext {
    fn update<T: SlotValue, R>(&mut self, slot: &Slot<T>, f: impl FnOnce(&mut T) -> R) -> R {
        let key = self.key(slot);
        SLOT_MAP.with(|m| {
            let mut m = m.borrow_mut();
            let cell = m
                .entry(key)
                .or_insert_with(|| Box::new(slot.initial_value()));
            f(typed_mut(cell, slot))
        })
    }

    fn set<T: SlotValue>(&mut self, slot: &Slot<T>, value: T) {
        let key = self.key(slot);
        SLOT_MAP.with(|m| {
            m.borrow_mut().insert(key, Box::new(value));
        });
    }

    fn clear<T: SlotValue>(&mut self, slot: &Slot<T>) {
        let key = self.key(slot);
        SLOT_MAP.with(|m| {
            m.borrow_mut().remove(&key);
        });
    }

    fn is_initialized<T: SlotValue>(&self, slot: &Slot<T>) -> bool {
        let key = self.key(slot);
        SLOT_MAP.with(|m| m.borrow().contains_key(&key))
    }
}

impl Drop for ThreadLocalContext {
    fn drop(&mut self) {
        let store = self.store;
        // try_with: the map may already be gone during thread teardown
        let _ = SLOT_MAP.try_with(|m| {
            if let Ok(mut m) = m.try_borrow_mut() {
                m.retain(|(owner, _), _| *owner != store);
            }
        });
    }
}
