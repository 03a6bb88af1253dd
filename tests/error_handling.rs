//! Error handling and listener fault tests.

use microstore::{create_store, run_pending, Store, StoreError, StoreOptions, TickQueue};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counter(store: &Store<i64>) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    store.subscribe_to_state(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

/// Listener that panics while the state is negative.
fn panic_on_negative(store: &Store<i64>) {
    let weak = store.downgrade();
    store.subscribe_to_state(move || {
        if let Some(store) = weak.upgrade() {
            if *store.get_state() < 0 {
                panic!("negative state");
            }
        }
    });
}

// --- Configuration Errors ---

#[test]
fn test_dispatch_without_reducer() {
    let store = create_store(0i64, StoreOptions::<i64, i64>::default()).unwrap();
    let calls = counter_with_actions(&store);
    let before = store.get_state();

    let result = store.dispatch(5);

    assert!(matches!(result, Err(StoreError::NoReducer)));
    assert!(Arc::ptr_eq(&before, &store.get_state()));
    assert_eq!(run_pending(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_store_usable_after_dispatch_error() {
    let store = create_store(0i64, StoreOptions::<i64, i64>::default()).unwrap();

    assert!(store.dispatch(1).is_err());
    store.replace(7);

    assert_eq!(*store.get_state(), 7);
}

#[test]
fn test_no_reducer_message() {
    assert_eq!(
        StoreError::NoReducer.to_string(),
        "dispatch() requires a reducer configured in StoreOptions"
    );
}

// --- Listener Faults ---

#[test]
fn test_immediate_mode_panic_escapes_and_skips_rest_of_pass() {
    let store = create_store(0i64, StoreOptions::<i64, ()>::default().batch(false)).unwrap();
    let before = counter(&store);
    panic_on_negative(&store);
    let after = counter(&store);

    let result = catch_unwind(AssertUnwindSafe(|| store.replace(-1)));

    assert!(result.is_err());
    // The commit happened before the pass started.
    assert_eq!(*store.get_state(), -1);
    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 0);

    // The store keeps working once the faulty condition is gone.
    store.replace(1);
    assert_eq!(before.load(Ordering::SeqCst), 2);
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

#[test]
fn test_batched_mode_panic_escapes_tick() {
    let queue = TickQueue::new();
    let store = create_store(
        0i64,
        StoreOptions::<i64, ()>::default().with_scheduler(queue.clone()),
    )
    .unwrap();
    panic_on_negative(&store);
    let after = counter(&store);

    store.replace(-1);
    let result = catch_unwind(AssertUnwindSafe(|| queue.tick()));
    assert!(result.is_err());
    assert_eq!(after.load(Ordering::SeqCst), 0);

    // Flags were reset before the failed pass, so a new change flushes again.
    store.replace(2);
    assert_eq!(queue.pending(), 1);
    assert_eq!(queue.tick(), 1);
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

// --- Middleware Faults ---

#[test]
fn test_middleware_error_aborts_construction() {
    let result = create_store(
        0i64,
        StoreOptions::<i64, ()>::default().with_middleware(microstore::from_fn(
            |_: &Store<i64>| Err(StoreError::Middleware("refused".to_string())),
        )),
    );

    match result {
        Err(StoreError::Middleware(msg)) => assert_eq!(msg, "refused"),
        Err(other) => panic!("Expected Middleware error, got {:?}", other),
        Ok(_) => panic!("Expected construction to fail"),
    }
}

fn counter_with_actions(store: &Store<i64, i64>) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    store.subscribe_to_state(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });
    calls
}
