use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Marker for values that can live in a slot.
///
/// Slot values are stored type-erased, so they must be `'static`. They never
/// cross worker boundaries, which is why `Send` is not required.
pub trait SlotValue: Any {}

impl<T: Any> SlotValue for T {}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a declared slot.
///
/// `index` is dense within its registry (0, 1, 2, ...) so indexed storage can
/// address it directly. `registry` keeps ids from different registries apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId {
    registry: u64,
    index: usize,
}

impl SlotId {
    /// Position of the slot inside its registry.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A named per-worker variable of type `T`.
///
/// A `Slot` is only a key: the values themselves are held by a
/// [`SlotAccess`](crate::SlotAccess) context, one per worker. The first access
/// from a worker initialises the value with the slot's initialiser.
///
/// # Examples
///
/// ```
/// use slotbench_core::SlotRegistry;
///
/// let mut registry = SlotRegistry::new();
/// let greeting = registry.declare("greeting", || String::from("hello"));
/// let counter = registry.declare("counter", || 0u32);
///
/// assert_eq!(greeting.name(), "greeting");
/// assert_eq!(greeting.initial_value(), "hello");
/// assert_ne!(greeting.id(), counter.id());
/// ```
pub struct Slot<T> {
    id: SlotId,
    name: &'static str,
    init: fn() -> T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a fresh initial value for a worker's first access.
    #[inline]
    pub fn initial_value(&self) -> T {
        (self.init)()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

/// Declares slots for one benchmark run.
///
/// Each registry has its own id, so two runs never share slot identities.
/// Declaring the same name twice yields two distinct slots.
#[derive(Debug)]
pub struct SlotRegistry {
    id: u64,
    len: usize,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            len: 0,
        }
    }

    /// Declares a new slot with the given name and initialiser.
    pub fn declare<T: SlotValue>(&mut self, name: &'static str, init: fn() -> T) -> Slot<T> {
        let id = SlotId {
            registry: self.id,
            index: self.len,
        };
        self.len += 1;
        Slot {
            id,
            name,
            init,
            _marker: PhantomData,
        }
    }

    /// Number of slots declared so far.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The five standard slots the workload operates on.
///
/// | slot        | type                      | initial value |
/// |-------------|---------------------------|---------------|
/// | `text`      | `String`                  | `"value1"`    |
/// | `number`    | `i32`                     | `1`           |
/// | `mapping`   | `HashMap<String, i32>`    | empty         |
/// | `sequence`  | `Vec<String>`             | empty         |
/// | `timestamp` | `Instant`                 | now           |
#[derive(Clone, Copy, Debug)]
pub struct SlotSet {
    pub text: Slot<String>,
    pub number: Slot<i32>,
    pub mapping: Slot<HashMap<String, i32>>,
    pub sequence: Slot<Vec<String>>,
    pub timestamp: Slot<Instant>,
}

impl SlotSet {
    pub const INITIAL_TEXT: &'static str = "value1";
    pub const INITIAL_NUMBER: i32 = 1;

    /// Declares the standard slots in `registry`.
    pub fn declare(registry: &mut SlotRegistry) -> Self {
        Self {
            text: registry.declare("text", || Self::INITIAL_TEXT.to_string()),
            number: registry.declare("number", || Self::INITIAL_NUMBER),
            mapping: registry.declare("mapping", HashMap::new),
            sequence: registry.declare("sequence", Vec::new),
            timestamp: registry.declare("timestamp", Instant::now),
        }
    }
}

/// Returns the `&mut T` stored in a type-erased cell.
///
/// A cell holding another type (a slot id reused across registries) is reset
/// to the slot's initial value first.
pub(crate) fn typed_mut<'a, T: SlotValue>(
    cell: &'a mut Box<dyn Any>,
    slot: &Slot<T>,
) -> &'a mut T {
    if !cell.is::<T>() {
        *cell = Box::new(slot.initial_value());
    }
    match cell.downcast_mut::<T>() {
        Some(value) => value,
        None => unreachable!("slot cell was just reset to its declared type"),
    }
}
