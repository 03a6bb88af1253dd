//! Selector-scoped subscriptions.

use crate::equality::EqualityFn;
use parking_lot::Mutex;

type Selector<S, T> = Box<dyn Fn(&S) -> T + Send + Sync>;
type SliceListener<T> = Box<dyn Fn(&T, &T) + Send + Sync>;

/// A selector, a `(next, prev)` listener, an equality function and the last
/// slice the listener saw.
pub struct SliceSubscription<S, T> {
    selector: Selector<S, T>,
    listener: SliceListener<T>,
    equality: EqualityFn<T>,
    last: Mutex<T>,
}

impl<S, T: Clone> SliceSubscription<S, T> {
    /// Build a subscription, seeding the cached slice from `state`. The
    /// listener is not called here.
    pub fn new(
        state: &S,
        selector: impl Fn(&S) -> T + Send + Sync + 'static,
        listener: impl Fn(&T, &T) + Send + Sync + 'static,
        equality: EqualityFn<T>,
    ) -> Self {
        let last = Mutex::new(selector(state));
        Self {
            selector: Box::new(selector),
            listener: Box::new(listener),
            equality,
            last,
        }
    }

    /// Re-evaluate the slice against `state`. If it differs from the cached
    /// slice, the cache takes the new slice and the listener runs with
    /// `(next, prev)`. Returns whether the listener ran.
    ///
    /// The cache is swapped before the listener runs, so a listener that
    /// mutates the store re-entrantly compares against the slice it was just
    /// handed.
    pub fn check(&self, state: &S) -> bool {
        let next = (self.selector)(state);

        let prev = {
            let mut last = self.last.lock();
            if (self.equality)(&next, &*last) {
                return false;
            }
            std::mem::replace(&mut *last, next.clone())
        };

        (self.listener)(&next, &prev);
        true
    }

    /// The slice the subscription currently compares against.
    pub fn last(&self) -> T {
        self.last.lock().clone()
    }
}
