//! Per-worker slot storage strategies.
//!
//! A [`SlotStrategy`] is shared by every worker of a run. Each worker asks it
//! for its own [`SlotAccess`] context and performs all slot operations through
//! that context, so per-worker state is passed explicitly instead of being
//! reached through ambient globals.

mod indexed;
mod thread_local;

pub use indexed::{IndexedContext, IndexedSlots};
pub use thread_local::{ThreadLocalContext, ThreadLocalSlots};

use crate::slot::{Slot, SlotValue};

/// A storage strategy for per-worker slots.
///
/// Implementations must be shareable between worker threads. The context
/// they hand out is created on, and stays on, the worker's own thread.
pub trait SlotStrategy: Send + Sync + 'static {
    type Context: SlotAccess;

    /// Human-readable name used in reports.
    fn name(&self) -> &'static str;

    /// Creates the slot context for one worker.
    ///
    /// Must be called from the worker's own thread.
    fn context(&self) -> Self::Context;
}

/// Slot operations available to a single worker.
///
/// Every accessor initialises the slot lazily: the first access from a
/// worker stores the slot's initial value.
pub trait SlotAccess {
    /// Runs `f` on the current value of `slot`, initialising it if needed.
    fn update<T: SlotValue, R>(&mut self, slot: &Slot<T>, f: impl FnOnce(&mut T) -> R) -> R;

    /// Replaces the value of `slot`.
    fn set<T: SlotValue>(&mut self, slot: &Slot<T>, value: T);

    /// Drops the value of `slot`. The next access re-initialises it.
    fn clear<T: SlotValue>(&mut self, slot: &Slot<T>);

    /// Returns `true` if this worker currently holds a value for `slot`.
    fn is_initialized<T: SlotValue>(&self, slot: &Slot<T>) -> bool;

    /// Returns a copy of the current value of `slot`.
    #[inline]
    fn get<T: SlotValue + Clone>(&mut self, slot: &Slot<T>) -> T {
        self.update(slot, |value| value.clone())
    }
}

#[cfg(test)]
pub(crate) mod conformance {
    //! Behaviour every strategy must share; run from each strategy's tests.

    use super::*;
    use crate::slot::SlotSet;

    pub fn lazy_initialisation<S: SlotStrategy>(strategy: &S, slots: &SlotSet) {
        let mut ctx = strategy.context();
        assert!(!ctx.is_initialized(&slots.text));
        assert_eq!(ctx.get(&slots.text), SlotSet::INITIAL_TEXT);
        assert!(ctx.is_initialized(&slots.text));
        assert!(!ctx.is_initialized(&slots.number));
    }

    pub fn set_get_clear<S: SlotStrategy>(strategy: &S, slots: &SlotSet) {
        let mut ctx = strategy.context();
        ctx.set(&slots.number, 42);
        assert_eq!(ctx.get(&slots.number), 42);

        ctx.set(&slots.text, "changed".to_string());
        ctx.clear(&slots.text);
        assert!(!ctx.is_initialized(&slots.text));
        assert_eq!(ctx.get(&slots.text), SlotSet::INITIAL_TEXT);

        // clearing an untouched slot is a no-op
        ctx.clear(&slots.sequence);
        assert!(!ctx.is_initialized(&slots.sequence));
    }

    pub fn update_in_place<S: SlotStrategy>(strategy: &S, slots: &SlotSet) {
        let mut ctx = strategy.context();
        for i in 0..3 {
            ctx.update(&slots.sequence, |items| items.push(format!("item-{i}")));
            ctx.update(&slots.mapping, |map| map.insert(format!("key{i}"), i));
        }
        assert_eq!(ctx.update(&slots.sequence, |items| items.len()), 3);
        assert_eq!(ctx.update(&slots.mapping, |map| map.get("key2").copied()), Some(2));
    }

    pub fn workers_are_isolated<S: SlotStrategy>(strategy: std::sync::Arc<S>, slots: SlotSet) {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let strategy = std::sync::Arc::clone(&strategy);
                std::thread::spawn(move || {
                    let mut ctx = strategy.context();
                    for round in 0..200 {
                        let tag = format!("worker-{n}-round-{round}");
                        ctx.set(&slots.text, tag.clone());
                        std::thread::yield_now();
                        assert_eq!(ctx.get(&slots.text), tag);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
