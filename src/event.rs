//! # Event Dispatcher
//!
//! Typed observer registries used by every component to announce state
//! transitions.
//!
//! A [`Callback<T>`] holds any number of subscribers. Each subscriber is
//! registered explicitly as either:
//!
//! - **immediate**: runs on the thread that fires the event (the polling
//!   thread for controller events), or
//! - **scheduled**: handed to a consumer supplied [`Scheduler`] which decides
//!   where the call runs (a UI queue, a worker thread, a tokio runtime).
//!
//! A panicking subscriber is caught and logged; the remaining subscribers of
//! the same event still run and the caller never sees the panic.
//!
//! ## Usage
//!
//! ```
//! use dualsense_link::event::Callback;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let presses = Arc::new(AtomicU32::new(0));
//! let callback: Callback<bool> = Callback::new();
//!
//! let counter = Arc::clone(&presses);
//! let id = callback.register(move |pressed| {
//!     if pressed {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//!
//! assert_eq!(callback.len(), 1);
//! assert!(callback.unregister(id));
//! assert!(callback.is_empty());
//! ```

use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

/// Unit of work handed to a [`Scheduler`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs deferred callbacks somewhere other than the polling thread.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler: Send + Sync {
    /// Queue `job` for execution. Must not block for long.
    fn schedule(&self, job: Job);
}

impl Scheduler for tokio::runtime::Handle {
    fn schedule(&self, job: Job) {
        // Callbacks are plain synchronous closures
        self.spawn_blocking(job);
    }
}

impl Scheduler for std::sync::mpsc::Sender<Job> {
    fn schedule(&self, job: Job) {
        if self.send(job).is_err() {
            warn!("Scheduled callback dropped: receiver is gone");
        }
    }
}

/// Handle identifying one registration, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Handler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

#[derive(Clone)]
enum Dispatch {
    Immediate,
    Scheduled(Arc<dyn Scheduler>),
}

struct Subscriber<T> {
    id: SubscriptionId,
    handler: Handler<T>,
    dispatch: Dispatch,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
            dispatch: self.dispatch.clone(),
        }
    }
}

/// Registry of subscribers for one event carrying a `T`.
pub struct Callback<T> {
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T> Default for Callback<T> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> std::fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl<T> Callback<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber that runs on the firing thread.
    ///
    /// Controller events fire on the polling thread: a slow subscriber
    /// stalls the read/write cadence of that controller.
    pub fn register<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.push(Arc::new(handler), Dispatch::Immediate)
    }

    /// Register a subscriber that runs through `scheduler`.
    pub fn register_scheduled<F>(&self, scheduler: Arc<dyn Scheduler>, handler: F) -> SubscriptionId
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.push(Arc::new(handler), Dispatch::Scheduled(scheduler))
    }

    /// Remove a subscriber. Returns `false` if `id` was not registered here.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, handler: Handler<T>, dispatch: Dispatch) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscribers.lock().push(Subscriber {
            id,
            handler,
            dispatch,
        });
        id
    }

    /// Invoke every subscriber with `value`.
    ///
    /// The subscriber list is copied before invoking, so subscribers may
    /// register or unregister from inside their own call.
    pub(crate) fn fire(&self, value: T) {
        let snapshot: Vec<Subscriber<T>> = self.subscribers.lock().clone();

        for subscriber in snapshot {
            match subscriber.dispatch {
                Dispatch::Immediate => {
                    invoke_isolated(subscriber.id, &subscriber.handler, value.clone());
                }
                Dispatch::Scheduled(scheduler) => {
                    let handler = subscriber.handler;
                    let id = subscriber.id;
                    let value = value.clone();
                    scheduler.schedule(Box::new(move || invoke_isolated(id, &handler, value)));
                }
            }
        }
    }
}

fn invoke_isolated<T>(id: SubscriptionId, handler: &Handler<T>, value: T) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(value))) {
        error!(
            subscription = id.0,
            "Callback panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
