//! Cross-surface event bus.
//!
//! The host owns one [`EventBus`] and hands every surface a [`SurfaceBus`]
//! scoped to that surface's lifetime. Publishing is fire-and-forget: events are
//! broadcast to every subscriber on every surface, including the publisher.
//! Every topic has its own broadcast channel and each subscription drains its
//! own ordered queue, so all handlers of a surface observe one topic's events
//! in publication order. A subscriber that falls behind only ever loses older
//! events of its own topic; the newest one is always delivered.
//!
//! The bus carries no schema. Payloads are optional JSON values and each
//! protocol decides how to read them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::util::lock;

/// Topic names shared by the surfaces and the backend.
pub mod topics {
    /// The durable note collection changed. No payload.
    pub const NOTES_CHANGED: &str = "notes-changed";
    /// The capture surface was (re)shown. No payload.
    pub const CAPTURE_OPENED: &str = "capture-opened";
    /// A surface switched theme. Payload: `"light"` or `"dark"`.
    pub const THEME_CHANGED: &str = "theme-changed";
}

/// Label of the persistent list surface.
pub const MAIN_SURFACE: &str = "main";
/// Label of the transient capture surface.
pub const CAPTURE_SURFACE: &str = "capture";

/// A single broadcast message.
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    pub topic: String,
    pub payload: Option<Value>,
    /// Label of the publishing surface, `None` when the host published it.
    pub source: Option<String>,
}

/// Host-level event router shared by all surfaces.
#[derive(Clone)]
pub struct EventBus {
    capacity: usize,
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<BusEvent>>>>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` undelivered events per
    /// subscriber and topic.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Publish an event on behalf of the host (e.g. the storage backend).
    pub fn publish(&self, topic: &str, payload: Option<Value>) {
        self.send(BusEvent {
            topic: topic.to_string(),
            payload,
            source: None,
        });
    }

    /// Create a handle for a newly mounted surface.
    pub fn surface(&self, label: impl Into<String>) -> SurfaceBus {
        let (signal, _) = watch::channel(false);
        SurfaceBus {
            label: Arc::from(label.into()),
            bus: self.clone(),
            lifecycle: Arc::new(Lifecycle {
                torn_down: Arc::new(AtomicBool::new(false)),
                signal,
            }),
        }
    }

    fn receiver(&self, topic: &str) -> broadcast::Receiver<BusEvent> {
        lock(&self.channels)
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    fn send(&self, event: BusEvent) {
        let sender = lock(&self.channels).get(&event.topic).cloned();
        let Some(sender) = sender else {
            tracing::trace!("No subscribers for bus topic '{}'", event.topic);
            return;
        };
        match sender.send(event) {
            Ok(receivers) => tracing::trace!("Bus event delivered to {receivers} subscriber(s)"),
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!("No subscribers for bus topic '{}'", event.topic);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BUS_CAPACITY)
    }
}

struct Lifecycle {
    torn_down: Arc<AtomicBool>,
    signal: watch::Sender<bool>,
}

/// A surface's view of the bus.
///
/// Clones share one lifecycle: after [`SurfaceBus::teardown`] no handler
/// registered through any clone runs again, and new subscriptions are inert.
#[derive(Clone)]
pub struct SurfaceBus {
    label: Arc<str>,
    bus: EventBus,
    lifecycle: Arc<Lifecycle>,
}

impl SurfaceBus {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Publish an event tagged with this surface's label.
    pub fn publish(&self, topic: &str, payload: Option<Value>) {
        self.bus.send(BusEvent {
            topic: topic.to_string(),
            payload,
            source: Some(self.label.to_string()),
        });
    }

    /// Register `handler` for `topic`.
    ///
    /// Must be called from within a Tokio runtime. Events published after this
    /// call returns are delivered. Dropping the returned [`Subscription`]
    /// deregisters the handler.
    pub fn subscribe<F>(&self, topic: &str, mut handler: F) -> Subscription
    where
        F: FnMut(BusEvent) + Send + 'static,
    {
        if self.is_torn_down() {
            tracing::debug!(
                "Surface '{}' is torn down; ignoring subscription to '{topic}'",
                self.label
            );
            return Subscription::inert(topic);
        }

        let mut events = self.bus.receiver(topic);
        let mut closed = self.lifecycle.signal.subscribe();
        let torn_down = Arc::clone(&self.lifecycle.torn_down);
        let revoked = Arc::new(AtomicBool::new(false));
        let task_revoked = Arc::clone(&revoked);
        let task_topic = topic.to_string();
        let surface = Arc::clone(&self.label);

        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = closed.wait_for(|torn| *torn).await;
            };
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    biased;
                    () = &mut shutdown => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            if torn_down.load(Ordering::SeqCst) || task_revoked.load(Ordering::SeqCst) {
                                break;
                            }
                            handler(event);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "Surface '{surface}' skipped {skipped} older '{task_topic}' event(s)"
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        // A teardown racing with the spawn above is caught either by the
        // watch signal or by the flag check before each handler call.
        Subscription {
            topic: topic.to_string(),
            revoked,
            task: Some(task),
        }
    }

    /// Tear the surface down: every subscription stops and no handler runs again.
    pub fn teardown(&self) {
        if self.lifecycle.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lifecycle.signal.send_replace(true);
        tracing::debug!("Surface '{}' torn down", self.label);
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle.torn_down.load(Ordering::SeqCst)
    }

    /// A future that resolves once this surface is torn down.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.lifecycle.signal.subscribe();
        async move {
            let _ = receiver.wait_for(|torn| *torn).await;
        }
    }
}

/// Registration token returned by [`SurfaceBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    topic: String,
    revoked: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    fn inert(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            revoked: Arc::new(AtomicBool::new(true)),
            task: None,
        }
    }

    /// Whether the handler can still be invoked.
    pub fn is_active(&self) -> bool {
        !self.revoked.load(Ordering::SeqCst)
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Deregister the handler.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.revoked.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
