use std::any::Any;

use crate::slot::{typed_mut, Slot, SlotRegistry, SlotValue};
use crate::strategy::{SlotAccess, SlotStrategy};

/// Optimized strategy: slot values live in a vector owned by the worker's
/// context and are addressed directly by slot index.
///
/// Access cost is one bounds check and one downcast. No hashing and no
/// thread-local lookup is involved. The vector is pre-sized to the number of
/// slots declared when the strategy was built and grows if later slots show up.
///
/// # Examples
///
/// ```
/// use slotbench_core::{IndexedSlots, SlotAccess, SlotRegistry, SlotStrategy};
///
/// let mut registry = SlotRegistry::new();
/// let hits = registry.declare("hits", || 0u64);
/// let strategy = IndexedSlots::new(&registry);
///
/// let mut ctx = strategy.context();
/// ctx.update(&hits, |n| *n += 1);
/// assert_eq!(ctx.get(&hits), 1);
/// ```
#[derive(Debug, Clone)]
pub struct IndexedSlots {
    capacity: usize,
}

impl IndexedSlots {
    pub const NAME: &'static str = "IndexedSlots";

    pub fn new(registry: &SlotRegistry) -> Self {
        Self {
            capacity: registry.len(),
        }
    }
}

impl SlotStrategy for IndexedSlots {
    type Context = IndexedContext;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn context(&self) -> IndexedContext {
        IndexedContext {
            cells: Vec::with_capacity(self.capacity),
        }
    }
}

/// One worker's indexed slot table.
pub struct IndexedContext {
    cells: Vec<Option<Box<dyn Any>>>,
}

impl IndexedContext {
    fn cell<T: SlotValue>(&mut self, slot: &Slot<T>) -> &mut Option<Box<dyn Any>> {
        let index = slot.id().index();
        if index >= self.cells.len() {
            self.cells.resize_with(index + 1, || None);
        }
        &mut self.cells[index]
    }
}

impl SlotAccess for IndexedContext {
    #[inline]
    fn update<T: SlotValue, R>(&mut self, slot: &Slot<T>, f: impl FnOnce(&mut T) -> R) -> R {
        let cell = self
            .cell(slot)
            .get_or_insert_with(|| Box::new(slot.initial_value()));
        f(typed_mut(cell, slot))
    }

    #[inline]
    fn set<T: SlotValue>(&mut self, slot: &Slot<T>, value: T) {
        *self.cell(slot) = Some(Box::new(value));
    }

    #[inline]
    fn clear<T: SlotValue>(&mut self, slot: &Slot<T>) {
        if let Some(cell) = self.cells.get_mut(slot.id().index()) {
            *cell = None;
        }
    }

    fn is_initialized<T: SlotValue>(&self, slot: &Slot<T>) -> bool {
        matches!(self.cells.get(slot.id().index()), Some(Some(_)))
    }
}
