//! Integration tests for per-worker slot isolation through the public API

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use slotbench::{
    FixedPool, IndexedSlots, Interrupt, SlotAccess, SlotRegistry, SlotSet, SlotStrategy,
    ThreadLocalSlots,
};

fn assert_isolated<S: SlotStrategy>(strategy: Arc<S>, slots: SlotSet) {
    let mismatches = Arc::new(Mutex::new(Vec::new()));
    let pool = FixedPool::new("isolation", NonZeroUsize::new(12).unwrap());

    let dispatch = pool.dispatch({
        let strategy = Arc::clone(&strategy);
        let mismatches = Arc::clone(&mismatches);
        move |worker, _stop| {
            let mut ctx = strategy.context();
            for round in 0..500 {
                let tag = format!("{worker}/{round}");
                ctx.set(&slots.text, tag.clone());
                ctx.set(&slots.number, worker.get() as i32);
                std::thread::yield_now();
                if ctx.get(&slots.text) != tag || ctx.get(&slots.number) != worker.get() as i32 {
                    mismatches.lock().unwrap().push((worker, round));
                }
            }
        }
    });

    assert_eq!(dispatch.wait(Duration::from_secs(30), &Interrupt::new()), Ok(true));
    dispatch.join().unwrap();
    assert!(mismatches.lock().unwrap().is_empty());
}

#[test]
fn test_thread_local_slots_are_isolated() {
    let mut registry = SlotRegistry::new();
    let slots = SlotSet::declare(&mut registry);
    assert_isolated(Arc::new(ThreadLocalSlots::new()), slots);
}

#[test]
fn test_indexed_slots_are_isolated() {
    let mut registry = SlotRegistry::new();
    let slots = SlotSet::declare(&mut registry);
    assert_isolated(Arc::new(IndexedSlots::new(&registry)), slots);
}

#[test]
fn test_fresh_worker_sees_initial_values() {
    let mut registry = SlotRegistry::new();
    let slots = SlotSet::declare(&mut registry);
    let strategy = Arc::new(IndexedSlots::new(&registry));

    let pool = FixedPool::new("fresh", NonZeroUsize::new(2).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatch = pool.dispatch({
        let strategy = Arc::clone(&strategy);
        let seen = Arc::clone(&seen);
        move |worker, _stop| {
            let mut ctx = strategy.context();
            if worker.get() == 0 {
                ctx.set(&slots.number, 99);
            }
            seen.lock().unwrap().push((worker.get(), ctx.get(&slots.number)));
        }
    });
    assert_eq!(dispatch.wait(Duration::from_secs(10), &Interrupt::new()), Ok(true));
    dispatch.join().unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![(0, 99), (1, SlotSet::INITIAL_NUMBER)]);
}
