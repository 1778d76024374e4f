//! Audit event bus
//!
//! Fans out one audit record per call attempt to every connected audit
//! stream. A single owner task holds the subscriber registry and processes
//! subscribe / unsubscribe / notify commands in arrival order, so every
//! notify sees a consistent snapshot of the registry and nothing on the
//! call path ever waits on a subscriber.
//!
//! Each subscriber gets a bounded queue. A subscriber whose queue is full
//! when an event arrives is disconnected (its channel is closed) instead of
//! slowing everyone else down; subscribers that stay registered receive every
//! event in publish order.

use crate::common::error::EventBusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// Audit event
///
/// Emitted for every call made by a recognized consumer, whether the call
/// was permitted or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Calling consumer
    pub consumer: String,
    /// Full method name
    pub method: String,
    /// Peer address of the caller (empty when unknown)
    pub host: String,
    /// Time the call was authorized
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates an event stamped with the current time
    pub fn new(
        consumer: impl Into<String>,
        method: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            method: method.into(),
            host: host.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One event instance shared by every subscriber
pub type SharedEvent = Arc<Event>;

enum Command {
    Subscribe {
        reply: oneshot::Sender<(u64, mpsc::Receiver<SharedEvent>)>,
    },
    Unsubscribe(u64),
    Notify(SharedEvent),
    SubscriberCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Handle to the event bus owner task
///
/// Cloning is cheap; all clones talk to the same registry.
#[derive(Clone, Debug)]
pub struct EventBus {
    commands: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscribe { .. } => f.write_str("Subscribe"),
            Self::Unsubscribe(id) => write!(f, "Unsubscribe({id})"),
            Self::Notify(event) => write!(f, "Notify({})", event.method),
            Self::SubscriberCount(_) => f.write_str("SubscriberCount"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl EventBus {
    /// Creates the bus and spawns its owner task
    ///
    /// `subscriber_capacity` is the queue length of every subscriber.
    pub fn new(subscriber_capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Registry {
            next_id: 0,
            capacity: subscriber_capacity.max(1),
            subscribers: BTreeMap::new(),
        };
        tokio::spawn(registry.run(rx));
        Self { commands: tx }
    }

    /// Registers a new subscriber
    ///
    /// Events published after this returns are delivered; earlier events are
    /// never replayed. The returned guard unsubscribes when dropped.
    pub async fn subscribe(&self) -> Result<Subscription, EventBusError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe { reply })
            .map_err(|_| EventBusError::Closed)?;
        let (id, receiver) = rx.await.map_err(|_| EventBusError::Closed)?;
        Ok(Subscription {
            id,
            receiver,
            bus: self.clone(),
        })
    }

    /// Removes a subscriber and closes its channel
    ///
    /// Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: u64) {
        let _ = self.commands.send(Command::Unsubscribe(id));
    }

    /// Publishes an event to every subscriber registered right now
    ///
    /// Never blocks. Dropped silently once the bus has shut down.
    pub fn notify(&self, event: Event) {
        if self
            .commands
            .send(Command::Notify(Arc::new(event)))
            .is_err()
        {
            trace!("event bus closed, audit event dropped");
        }
    }

    /// Current number of registered subscribers (0 after shutdown)
    pub async fn subscriber_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::SubscriberCount(reply)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Unsubscribes everyone and stops the owner task
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Returns true once the owner task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Registration of one audit stream
///
/// Dropping the subscription unsubscribes it, so every exit path of the
/// consumer releases its slot exactly once.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<SharedEvent>,
    bus: EventBus,
}

impl Subscription {
    /// Subscriber id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next event
    ///
    /// Returns `None` once the bus closed this subscriber's channel
    /// (unsubscribe, overflow or shutdown) and the queue is drained.
    pub async fn recv(&mut self) -> Option<SharedEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

struct Registry {
    next_id: u64,
    capacity: usize,
    subscribers: BTreeMap<u64, mpsc::Sender<SharedEvent>>,
}

impl Registry {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!(capacity = self.capacity, "event bus started");

        while let Some(command) = commands.recv().await {
            match command {
                Command::Subscribe { reply } => self.subscribe(reply),
                Command::Unsubscribe(id) => {
                    if self.subscribers.remove(&id).is_some() {
                        debug!(subscriber_id = id, "audit subscriber removed");
                    }
                }
                Command::Notify(event) => self.notify(event),
                Command::SubscriberCount(reply) => {
                    let _ = reply.send(self.subscribers.len());
                }
                Command::Shutdown => {
                    info!(
                        subscribers = self.subscribers.len(),
                        "event bus shutting down, closing audit subscribers"
                    );
                    self.subscribers.clear();
                    break;
                }
            }
        }

        debug!("event bus stopped");
    }

    fn subscribe(&mut self, reply: oneshot::Sender<(u64, mpsc::Receiver<SharedEvent>)>) {
        self.next_id += 1;
        let id = self.next_id;
        let (tx, rx) = mpsc::channel(self.capacity);

        // the caller may have given up waiting
        if reply.send((id, rx)).is_err() {
            return;
        }
        self.subscribers.insert(id, tx);
        debug!(subscriber_id = id, "audit subscriber added");
    }

    fn notify(&mut self, event: SharedEvent) {
        trace!(
            consumer = %event.consumer,
            method = %event.method,
            subscribers = self.subscribers.len(),
            "fanning out audit event"
        );
        self.subscribers
            .retain(|id, tx| match tx.try_send(Arc::clone(&event)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        subscriber_id = *id,
                        capacity = tx.max_capacity(),
                        "audit subscriber queue full, disconnecting"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber_id = *id, "audit subscriber gone");
                    false
                }
            });
    }
}
