//! Store engine and the public store handle.

use crate::equality::{self, EqualityFn, StrictEq};
use crate::error::{Result, StoreError};
use crate::middleware::{apply_middleware, Middleware};
use crate::scheduler::{CurrentThread, Scheduler};
use crate::subscriptions::{ListenerRegistry, SliceSubscription};
use crate::types::{Listener, Merge, Reducer, Unsubscribe, Updater};
use parking_lot::{ReentrantMutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Store construction options.
pub struct StoreOptions<S, A> {
    /// Reducer used by `dispatch`. Without one, `dispatch` fails with
    /// [`StoreError::NoReducer`].
    pub reducer: Option<Reducer<S, A>>,

    /// Middleware applied in order once the base store is built.
    pub middleware: Vec<Box<dyn Middleware<S, A>>>,

    /// Coalesce notifications per scheduling tick.
    /// Default: true
    pub batch: bool,

    /// Where batched flushes are queued. None = the tick queue of the thread
    /// that builds the store, drained by [`run_pending`](crate::run_pending)
    /// on that thread. Ignored when `batch` is false.
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl<S, A> Default for StoreOptions<S, A> {
    fn default() -> Self {
        Self {
            reducer: None,
            middleware: Vec::new(),
            batch: true,
            scheduler: None,
        }
    }
}

impl<S, A> StoreOptions<S, A> {
    /// Configure the reducer.
    pub fn with_reducer(
        mut self,
        reducer: impl Fn(&Arc<S>, A) -> Arc<S> + Send + Sync + 'static,
    ) -> Self {
        self.reducer = Some(Arc::new(reducer));
        self
    }

    /// Append a middleware to the pipeline.
    pub fn with_middleware(mut self, middleware: impl Middleware<S, A> + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Toggle batched notification.
    pub fn batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Queue batched flushes on `scheduler` instead of the current thread.
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }
}

/// The replaceable store contract.
///
/// [`Store`] derives the rest of its surface (partial merges, slice
/// subscriptions, action binding) from these methods, so a middleware that
/// swaps the store only implements this trait and wraps it with
/// [`Store::from_api`].
pub trait StoreApi<S, A>: Send + Sync {
    /// Current state. No side effects.
    fn get_state(&self) -> Arc<S>;

    /// Compute the next state from the current one. If the result is the same
    /// `Arc` the call is a no-op; otherwise it commits and notifies.
    fn update_state(&self, updater: Updater<'_, S>);

    /// Run the reducer on `action`, with the same commit rules as
    /// `update_state`.
    fn dispatch(&self, action: A) -> Result<()>;

    /// Register a whole-state listener.
    fn subscribe_to_state(&self, listener: Listener) -> Unsubscribe;

    /// Number of registered listeners. None if the implementation does not
    /// track them.
    fn listener_count(&self) -> Option<usize> {
        None
    }
}

/// The base store: owns the state, the listener registry and the
/// notification scheduling flags.
pub struct StoreEngine<S, A> {
    /// Current state.
    state: RwLock<Arc<S>>,

    /// Serializes read-compute-commit. Re-entrant so an updater may call
    /// back into the store on the same thread.
    write_lock: ReentrantMutex<()>,

    reducer: Option<Reducer<S, A>>,

    /// Shared with unsubscribe handles.
    listeners: Arc<ListenerRegistry>,

    batch: bool,
    scheduler: Arc<dyn Scheduler>,

    /// A flush task is queued and has not started yet.
    scheduled: AtomicBool,

    /// A change was committed since the last flush started.
    dirty: AtomicBool,

    /// Handle to ourselves for queued flush tasks.
    this: Weak<Self>,
}

impl<S, A> StoreEngine<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Create an engine holding `initial`.
    pub fn new(
        initial: Arc<S>,
        reducer: Option<Reducer<S, A>>,
        batch: bool,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: RwLock::new(initial),
            write_lock: ReentrantMutex::new(()),
            reducer,
            listeners: Arc::new(ListenerRegistry::new()),
            batch,
            scheduler,
            scheduled: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
            this: this.clone(),
        })
    }

    /// Request a notification pass: immediately, or as a single queued flush.
    fn schedule_notify(&self) {
        if !self.batch {
            self.notify();
            return;
        }

        self.dirty.store(true, Ordering::SeqCst);
        if self.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let pending = PendingFlush {
            engine: Some(self.this.clone()),
        };
        self.scheduler.schedule(Box::new(move || pending.run()));
    }

    /// Body of the queued flush. The pending flag is cleared before the dirty
    /// check so a mutation made by a listener during this pass queues a fresh
    /// flush instead of being folded into the running one.
    fn flush(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.notify();
        }
    }

    fn notify(&self) {
        let invoked = self.listeners.notify_all();
        tracing::trace!(listeners = invoked, "notification pass complete");
    }
}

/// A queued flush. If the scheduler drops it without running it (its queue
/// went away with its thread), the pending flag is released so the next
/// change can queue a new flush. The dirty flag is left alone, so that flush
/// still notifies.
struct PendingFlush<S, A> {
    engine: Option<Weak<StoreEngine<S, A>>>,
}

impl<S, A> PendingFlush<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    fn run(mut self) {
        if let Some(engine) = self.engine.take().and_then(|weak| weak.upgrade()) {
            engine.flush();
        }
    }
}

impl<S, A> Drop for PendingFlush<S, A> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take().and_then(|weak| weak.upgrade()) {
            tracing::trace!("queued flush dropped without running");
            engine.scheduled.store(false, Ordering::SeqCst);
        }
    }
}

impl<S, A> StoreApi<S, A> for StoreEngine<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    fn get_state(&self) -> Arc<S> {
        Arc::clone(&self.state.read())
    }

    fn update_state(&self, updater: Updater<'_, S>) {
        let guard = self.write_lock.lock();

        let current = self.get_state();
        let next = updater(&current);
        if Arc::ptr_eq(&current, &next) {
            return;
        }

        *self.state.write() = next;
        drop(guard);

        tracing::trace!(batched = self.batch, "state committed");
        self.schedule_notify();
    }

    fn dispatch(&self, action: A) -> Result<()> {
        let reducer = self.reducer.as_ref().ok_or(StoreError::NoReducer)?;
        self.update_state(Box::new(move |state: &Arc<S>| reducer(state, action)));
        Ok(())
    }

    fn subscribe_to_state(&self, listener: Listener) -> Unsubscribe {
        let id = self.listeners.subscribe(listener);
        let registry = Arc::downgrade(&self.listeners);
        Unsubscribe::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.unsubscribe(id);
            }
        })
    }

    fn listener_count(&self) -> Option<usize> {
        Some(self.listeners.len())
    }
}

/// Handle to a store. Clones share the same store.
pub struct Store<S, A = ()> {
    inner: Arc<dyn StoreApi<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning store handle, for listeners that must not keep the store alive.
pub struct WeakStore<S, A = ()> {
    inner: Weak<dyn StoreApi<S, A>>,
}

impl<S, A> Clone for WeakStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S, A> WeakStore<S, A> {
    /// The store, if it is still alive.
    pub fn upgrade(&self) -> Option<Store<S, A>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Wrap a store implementation, typically a middleware replacement.
    pub fn from_api(api: impl StoreApi<S, A> + 'static) -> Self {
        Self {
            inner: Arc::new(api),
        }
    }

    /// Wrap an already shared implementation.
    pub fn from_arc(api: Arc<dyn StoreApi<S, A>>) -> Self {
        Self { inner: api }
    }

    /// True if both handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    pub fn downgrade(&self) -> WeakStore<S, A> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current state.
    pub fn get_state(&self) -> Arc<S> {
        self.inner.get_state()
    }

    /// Shallow-merge `partial` onto the current state. A partial that changes
    /// nothing commits nothing and notifies nobody.
    pub fn set_state(&self, partial: S::Partial)
    where
        S: Merge,
    {
        self.update(move |state| match state.merge(partial) {
            Some(next) => Arc::new(next),
            None => Arc::clone(state),
        });
    }

    /// Derive the next state from the current one. Return the same `Arc` to
    /// leave the state untouched.
    pub fn update<'a>(&self, updater: impl FnOnce(&Arc<S>) -> Arc<S> + 'a) {
        self.inner.update_state(Box::new(updater));
    }

    /// Replace the whole state.
    pub fn replace(&self, next: S) {
        let next = Arc::new(next);
        self.update(move |_| next);
    }

    /// Run the configured reducer. Fails with [`StoreError::NoReducer`]
    /// before touching the state if none is configured.
    pub fn dispatch(&self, action: A) -> Result<()> {
        self.inner.dispatch(action)
    }

    /// Call `listener` after every committed change.
    pub fn subscribe_to_state(&self, listener: impl Fn() + Send + Sync + 'static) -> Unsubscribe {
        self.inner.subscribe_to_state(Arc::new(listener))
    }

    /// Call `listener(next, prev)` when `selector`'s output changes under
    /// [`StrictEq`]: pointer identity for `Arc`s, value equality for plain
    /// values.
    pub fn subscribe_to_slice<T>(
        &self,
        selector: impl Fn(&S) -> T + Send + Sync + 'static,
        listener: impl Fn(&T, &T) + Send + Sync + 'static,
    ) -> Unsubscribe
    where
        T: StrictEq + Clone + Send + 'static,
    {
        self.subscribe_to_slice_with(selector, listener, equality::strict::<T>)
    }

    /// Like [`subscribe_to_slice`](Self::subscribe_to_slice) with a custom
    /// equality, e.g. [`equality::shallow_equal`].
    ///
    /// The selector runs once right away to seed the comparison; the listener
    /// does not.
    pub fn subscribe_to_slice_with<T>(
        &self,
        selector: impl Fn(&S) -> T + Send + Sync + 'static,
        listener: impl Fn(&T, &T) + Send + Sync + 'static,
        equality: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Unsubscribe
    where
        T: Clone + Send + 'static,
    {
        let equality: EqualityFn<T> = Arc::new(equality);
        let subscription =
            SliceSubscription::new(&*self.get_state(), selector, listener, equality);

        let store = Arc::downgrade(&self.inner);
        self.inner.subscribe_to_state(Arc::new(move || {
            if let Some(store) = store.upgrade() {
                subscription.check(&*store.get_state());
            }
        }))
    }

    /// Bind a set of actions. `factory` runs once with a context that can
    /// only read, write and dispatch; whatever it returns is handed back.
    pub fn actions<T>(&self, factory: impl FnOnce(ActionContext<S, A>) -> T) -> T {
        factory(ActionContext {
            store: self.clone(),
        })
    }

    /// Number of registered listeners, or None behind a replacement store
    /// that does not count them.
    pub fn listener_count(&self) -> Option<usize> {
        self.inner.listener_count()
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.get_state())
            .finish()
    }
}

/// Restricted store view handed to [`Store::actions`] factories.
pub struct ActionContext<S, A = ()> {
    store: Store<S, A>,
}

impl<S, A> Clone for ActionContext<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S, A> ActionContext<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    pub fn get_state(&self) -> Arc<S> {
        self.store.get_state()
    }

    pub fn set_state(&self, partial: S::Partial)
    where
        S: Merge,
    {
        self.store.set_state(partial)
    }

    pub fn update<'a>(&self, updater: impl FnOnce(&Arc<S>) -> Arc<S> + 'a) {
        self.store.update(updater)
    }

    pub fn replace(&self, next: S) {
        self.store.replace(next)
    }

    pub fn dispatch(&self, action: A) -> Result<()> {
        self.store.dispatch(action)
    }
}

/// Build a store from an initial state.
///
/// Middleware runs in order before this returns; a middleware error aborts
/// construction and is returned as is.
pub fn create_store<S, A>(initial: S, options: StoreOptions<S, A>) -> Result<Store<S, A>>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    create_store_shared(Arc::new(initial), options)
}

/// Like [`create_store`], keeping the caller's `Arc` as the initial state so
/// `get_state()` is pointer-identical to it.
pub fn create_store_shared<S, A>(
    initial: Arc<S>,
    options: StoreOptions<S, A>,
) -> Result<Store<S, A>>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    let StoreOptions {
        reducer,
        middleware,
        batch,
        scheduler,
    } = options;

    // Pin the default to the creating thread's queue so writes from other
    // threads still flush where `run_pending` is called.
    let scheduler: Arc<dyn Scheduler> = match scheduler {
        Some(scheduler) => scheduler,
        None => match CurrentThread::queue() {
            Some(queue) => Arc::new(queue),
            None => Arc::new(CurrentThread),
        },
    };
    let engine: Arc<dyn StoreApi<S, A>> = StoreEngine::new(initial, reducer, batch, scheduler);

    apply_middleware(Store::from_arc(engine), middleware)
}
