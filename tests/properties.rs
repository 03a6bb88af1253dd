//! Property tests for notification, merge and slice semantics.

use microstore::{create_store, merge_field, Merge, Store, StoreOptions, TickQueue};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
struct Counter {
    count: i64,
    label: String,
}

#[derive(Clone, Debug, Default)]
struct CounterPatch {
    count: Option<i64>,
    label: Option<String>,
}

impl Merge for Counter {
    type Partial = CounterPatch;

    fn merge(&self, patch: CounterPatch) -> Option<Self> {
        let mut next = self.clone();
        let changed = merge_field(&mut next.count, patch.count)
            | merge_field(&mut next.label, patch.label);
        changed.then_some(next)
    }
}

fn counter_store(batch: bool, queue: &TickQueue) -> Store<Counter> {
    create_store(
        Counter::default(),
        StoreOptions::default()
            .batch(batch)
            .with_scheduler(queue.clone()),
    )
    .unwrap()
}

fn count_patch(count: i64) -> CounterPatch {
    CounterPatch {
        count: Some(count),
        label: None,
    }
}

fn counting_listener(store: &Store<Counter>) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    store.subscribe_to_state(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

proptest! {
    #[test]
    fn batched_writes_coalesce_into_one_pass(values in prop::collection::vec(-5i64..5, 1..20)) {
        let queue = TickQueue::new();
        let store = counter_store(true, &queue);
        let calls = counting_listener(&store);

        let mut current = 0;
        let mut changed = false;
        for value in &values {
            changed |= *value != current;
            current = *value;
            store.set_state(count_patch(*value));
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);

        queue.tick();
        prop_assert_eq!(calls.load(Ordering::SeqCst), usize::from(changed));
        prop_assert_eq!(store.get_state().count, *values.last().unwrap());
    }

    #[test]
    fn immediate_writes_notify_once_per_change(values in prop::collection::vec(-5i64..5, 0..20)) {
        let queue = TickQueue::new();
        let store = counter_store(false, &queue);
        let calls = counting_listener(&store);

        let mut current = 0;
        let mut expected = 0;
        for value in &values {
            if *value != current {
                expected += 1;
            }
            current = *value;
            store.set_state(count_patch(*value));
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
        prop_assert!(queue.is_idle());
    }

    #[test]
    fn identical_partial_keeps_state_and_stays_silent(count in any::<i64>(), label in "[a-z]{0,8}") {
        let queue = TickQueue::new();
        let store = create_store(
            Counter { count, label: label.clone() },
            StoreOptions::<Counter, ()>::default().with_scheduler(queue.clone()),
        )
        .unwrap();
        let calls = counting_listener(&store);
        let before = store.get_state();

        store.set_state(CounterPatch { count: Some(count), label: Some(label) });
        queue.tick();

        prop_assert!(Arc::ptr_eq(&before, &store.get_state()));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn slice_listener_sees_each_count_change(
        writes in prop::collection::vec((any::<bool>(), -3i64..3), 0..30)
    ) {
        let queue = TickQueue::new();
        let store = counter_store(false, &queue);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe_to_slice(
            |s: &Counter| s.count,
            move |next, prev| sink.lock().push((*next, *prev)),
        );

        let mut expected = Vec::new();
        let mut current = 0;
        for (touch_label, value) in &writes {
            if *touch_label {
                // Label-only writes never reach a count listener.
                store.set_state(CounterPatch {
                    count: None,
                    label: Some(value.to_string()),
                });
            } else {
                if *value != current {
                    expected.push((*value, current));
                }
                current = *value;
                store.set_state(count_patch(*value));
            }
        }

        prop_assert_eq!(&*seen.lock(), &expected);
    }

    #[test]
    fn unsubscribe_stops_all_later_calls(
        before in 0usize..5,
        after in 1usize..5,
    ) {
        let queue = TickQueue::new();
        let store = counter_store(false, &queue);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let unsubscribe = store.subscribe_to_state(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut next = 0;
        for _ in 0..before {
            next += 1;
            store.set_state(count_patch(next));
        }
        unsubscribe.unsubscribe();
        unsubscribe.unsubscribe();
        for _ in 0..after {
            next += 1;
            store.set_state(count_patch(next));
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), before);
        prop_assert_eq!(store.listener_count(), Some(0));
    }
}
