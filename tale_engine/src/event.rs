//! Event bus --
//!
//! A process-wide, type-indexed publish/subscribe router. Producers publish plain event
//! values; consumers subscribe by concrete event type and never learn who published.
//! Dispatch is exact-type: a subscriber to `DoorOpened` never sees `ChestOpened`.
//!
//! Subscriptions are only ever removed by disposing the [`SubscriptionToken`] returned
//! from `subscribe`, or wholesale with [`EventBus::clear`].
//!
//! ### Threading
//! Ambient timers and time-gated triggers publish from outside the turn loop, so the
//! registry sits behind an `RwLock`. Publishing snapshots the handler list and invokes
//! it with no lock held, which lets a handler subscribe, dispose or publish in turn.
//!
//! ### Faults
//! A handler that returns `Err` or panics is logged and recorded in the
//! [`PublishReport`]; the remaining handlers still run and the publisher never sees
//! the fault.

pub mod events;
pub mod token;

pub use events::*;
pub use token::{CompositeToken, Disposable, SubscriptionToken};

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use futures_util::future::{BoxFuture, join_all};
use futures_util::FutureExt;
use lazy_static::lazy_static;
use log::{debug, error, info};
use parking_lot::RwLock;

lazy_static! {
    static ref GLOBAL_BUS: EventBus = EventBus::new();
}

/// A value that can be broadcast on the bus.
///
/// Types that only make sense to broadcast once (e.g. "session started") set
/// `ONE_TIME`; after the first publish of such a type every subscription to it is gone.
pub trait Event: Send + Sync + 'static {
    const ONE_TIME: bool = false;
}

/// Unique id of one subscription. Ids are never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

type ErasedEvent = dyn Any + Send + Sync;
type SyncHandler = Arc<dyn Fn(&ErasedEvent) -> Result<()> + Send + Sync>;
type AsyncHandler = Arc<dyn Fn(Arc<ErasedEvent>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// All subscriptions for one event type.
#[derive(Default, Clone)]
struct Topic {
    sync: Vec<(SubscriptionId, SyncHandler)>,
    asynchronous: Vec<(SubscriptionId, AsyncHandler)>,
}

impl Topic {
    fn len(&self) -> usize {
        self.sync.len() + self.asynchronous.len()
    }
}

/// Shared subscriber registry. Tokens hold a weak reference to it.
pub(crate) struct Registry {
    topics: RwLock<HashMap<TypeId, Topic>>,
}

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

impl Registry {
    /// Remove one subscription. Returns false if it was already gone.
    pub(crate) fn remove(&self, event_type: TypeId, id: SubscriptionId) -> bool {
        let mut topics = self.topics.write();
        let Some(topic) = topics.get_mut(&event_type) else {
            return false;
        };
        let before = topic.len();
        topic.sync.retain(|(sub, _)| *sub != id);
        topic.asynchronous.retain(|(sub, _)| *sub != id);
        let removed = topic.len() < before;
        if topic.len() == 0 {
            topics.remove(&event_type);
        }
        removed
    }
}

/// A handler that failed while an event was being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    pub subscription: SubscriptionId,
    pub message: String,
}

/// What happened during one publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Number of handlers invoked, faulted or not.
    pub invoked: usize,
    pub faults: Vec<HandlerFault>,
}

impl PublishReport {
    /// Handlers that ran to completion without error.
    pub fn delivered(&self) -> usize {
        self.invoked - self.faults.len()
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Typed publish/subscribe router.
///
/// Cloning an `EventBus` yields another handle to the same registry.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.registry.topics.read();
        f.debug_struct("EventBus")
            .field("event_types", &topics.len())
            .field("subscriptions", &topics.values().map(Topic::len).sum::<usize>())
            .finish()
    }
}

impl EventBus {
    /// Create an independent bus with its own registry.
    pub fn new() -> EventBus {
        EventBus {
            registry: Arc::new(Registry {
                topics: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide bus shared by every system that doesn't carry its own.
    pub fn global() -> &'static EventBus {
        &GLOBAL_BUS
    }

    /// Register a synchronous handler for events of exactly type `E`.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionToken
    where
        E: Event,
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let erased: SyncHandler = Arc::new(move |event: &ErasedEvent| match event.downcast_ref::<E>() {
            Some(event) => handler(event),
            None => Err(anyhow!("event routed to wrong handler (expected {})", type_name::<E>())),
        });
        let id = next_id();
        self.registry
            .topics
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .sync
            .push((id, erased));
        debug!("{id} subscribed to {}", type_name::<E>());
        SubscriptionToken::new::<E>(id, Arc::downgrade(&self.registry))
    }

    /// Register an asynchronous handler for events of exactly type `E`.
    ///
    /// Async handlers only run from [`EventBus::publish_async`].
    pub fn subscribe_async<E, F, Fut>(&self, handler: F) -> SubscriptionToken
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let erased: AsyncHandler = Arc::new(move |event: Arc<ErasedEvent>| match event.downcast::<E>() {
            Ok(event) => handler(event).boxed(),
            Err(_) => {
                futures_util::future::ready(Err(anyhow!(
                    "event routed to wrong handler (expected {})",
                    type_name::<E>()
                )))
                .boxed()
            },
        });
        let id = next_id();
        self.registry
            .topics
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .asynchronous
            .push((id, erased));
        debug!("{id} subscribed (async) to {}", type_name::<E>());
        SubscriptionToken::new::<E>(id, Arc::downgrade(&self.registry))
    }

    /// Deliver `event` to every synchronous handler registered for `E`, in
    /// registration order, before returning.
    pub fn publish<E: Event>(&self, event: E) -> PublishReport {
        let topic = self.snapshot::<E>();
        if !topic.asynchronous.is_empty() {
            debug!(
                "{} async subscriber(s) to {} not run by a synchronous publish",
                topic.asynchronous.len(),
                type_name::<E>()
            );
        }
        let mut report = PublishReport::default();
        run_sync_handlers::<E>(&topic.sync, &event, &mut report);
        self.retire::<E>();
        report
    }

    /// Deliver `event` to the synchronous handlers, then run every asynchronous handler
    /// concurrently and wait for all of them.
    pub async fn publish_async<E: Event>(&self, event: E) -> PublishReport {
        let topic = self.snapshot::<E>();
        let mut report = PublishReport::default();
        run_sync_handlers::<E>(&topic.sync, &event, &mut report);

        let event: Arc<ErasedEvent> = Arc::new(event);
        let pending = topic.asynchronous.into_iter().map(|(id, handler)| {
            let event = Arc::clone(&event);
            // the handler call itself happens inside the future so a panic there is caught too
            let run = async move { handler(event).await };
            AssertUnwindSafe(run).catch_unwind().map(move |outcome| (id, outcome))
        });
        for (id, outcome) in join_all(pending).await {
            report.invoked += 1;
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => panic_message(payload.as_ref()),
            };
            record_fault::<E>(&mut report, id, failure);
        }
        self.retire::<E>();
        report
    }

    /// Number of live subscriptions (sync and async) for `E`.
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.registry
            .topics
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Topic::len)
    }

    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscriber_count::<E>() > 0
    }

    /// Drop every subscription of every event type.
    pub fn clear(&self) {
        let mut topics = self.registry.topics.write();
        let dropped: usize = topics.values().map(Topic::len).sum();
        topics.clear();
        debug!("event bus cleared ({dropped} subscriptions dropped)");
    }

    /// Copy out the handlers for `E`. One-time event types are taken out of the registry
    /// in the same step, so concurrent publishes can't both deliver or both clean up.
    fn snapshot<E: Event>(&self) -> Topic {
        if E::ONE_TIME {
            let taken = self.registry.topics.write().remove(&TypeId::of::<E>());
            match taken {
                Some(topic) => {
                    info!(
                        "one-time event {} published; {} subscription(s) retired",
                        type_name::<E>(),
                        topic.len()
                    );
                    topic
                },
                None => Topic::default(),
            }
        } else {
            self.registry
                .topics
                .read()
                .get(&TypeId::of::<E>())
                .cloned()
                .unwrap_or_default()
        }
    }

    /// Drop subscriptions to a one-time type that were added while it was being published.
    fn retire<E: Event>(&self) {
        if !E::ONE_TIME {
            return;
        }
        if let Some(late) = self.registry.topics.write().remove(&TypeId::of::<E>()) {
            debug!(
                "{} subscription(s) to one-time event {} added during publish retired",
                late.len(),
                type_name::<E>()
            );
        }
    }
}

fn next_id() -> SubscriptionId {
    SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
}

fn run_sync_handlers<E: Event>(handlers: &[(SubscriptionId, SyncHandler)], event: &E, report: &mut PublishReport) {
    let erased: &ErasedEvent = event;
    for (id, handler) in handlers {
        report.invoked += 1;
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| handler(erased))) {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => panic_message(payload.as_ref()),
        };
        record_fault::<E>(report, *id, failure);
    }
}

fn record_fault<E: Event>(report: &mut PublishReport, id: SubscriptionId, message: String) {
    error!("{id} failed handling {}: {message}", type_name::<E>());
    report.faults.push(HandlerFault {
        subscription: id,
        message,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_string()
    }
}
