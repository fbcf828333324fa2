//! Fan-out of committed session documents to subscribers.
//!
//! Each subscriber owns a bounded queue. Publishing never blocks: a
//! subscriber whose queue is full, or whose receiver is gone, is evicted.
//! Documents may be published out of order from different threads, so each
//! session keeps a reorder buffer and releases documents strictly by
//! version. Channels are independent: the map lock is only shared for
//! lookup, and each session's channel has its own mutex.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use strictly_board::{Session, SessionId};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, info, instrument, warn};

/// One delivery: the committed document, or `None` for an unknown session.
pub type SessionUpdate = Option<Arc<Session>>;

#[derive(Debug)]
struct Listener {
    id: u64,
    tx: mpsc::Sender<SessionUpdate>,
    seen: Option<u64>,
}

#[derive(Debug, Default)]
struct Channel {
    /// Version the session was opened at.
    base: Option<u64>,
    latest: Option<Arc<Session>>,
    pending: BTreeMap<u64, Arc<Session>>,
    listeners: Vec<Listener>,
}

impl Channel {
    fn next_version(&self) -> u64 {
        match &self.latest {
            Some(doc) => *doc.version() + 1,
            None => self.base.unwrap_or(0),
        }
    }

    fn is_idle(&self) -> bool {
        self.listeners.is_empty()
            && self.latest.is_none()
            && self.pending.is_empty()
            && self.base.is_none()
    }

    /// Buffers `doc` and releases every document now in sequence.
    fn release(&mut self, session_id: &str, doc: Arc<Session>) {
        let version = *doc.version();
        if version < self.next_version() {
            debug!(session_id, version, "Stale publication ignored");
            return;
        }
        self.pending.insert(version, doc);

        loop {
            let next = self.next_version();
            let Some(doc) = self.pending.remove(&next) else {
                break;
            };
            self.deliver(session_id, &doc);
            self.latest = Some(doc);
        }
        if !self.pending.is_empty() {
            debug!(session_id, buffered = self.pending.len(), "Waiting for earlier versions");
        }
    }

    /// Delivers `doc` to every listener that has not seen it, evicting the
    /// ones that cannot take it.
    fn deliver(&mut self, session_id: &str, doc: &Arc<Session>) {
        let version = *doc.version();
        self.listeners.retain_mut(|listener| {
            if listener.seen.is_some_and(|seen| seen >= version) {
                return true;
            }
            match listener.tx.try_send(Some(Arc::clone(doc))) {
                Ok(()) => {
                    listener.seen = Some(version);
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(
                        session_id,
                        listener = listener.id,
                        version,
                        "Listener queue full, evicting"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(session_id, listener = listener.id, "Listener gone, removing");
                    false
                }
            }
        });
    }
}

type SharedChannel = Arc<Mutex<Channel>>;

#[derive(Debug)]
struct BusInner {
    channels: RwLock<HashMap<SessionId, SharedChannel>>,
    capacity: usize,
    next_listener: AtomicU64,
}

impl BusInner {
    /// Runs `f` on the channel for `session_id`, creating it if needed.
    ///
    /// The map lock is held, shared when the channel exists, until `f`
    /// returns, so an idle channel cannot be removed underneath `f`.
    fn with_channel<T>(&self, session_id: &str, f: impl FnOnce(&mut Channel) -> T) -> T {
        {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(channel) = channels.get(session_id) {
                let mut channel = channel.lock().unwrap_or_else(PoisonError::into_inner);
                return f(&mut channel);
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let channel = channels.entry(session_id.to_string()).or_default();
        let mut channel = channel.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut channel)
    }

    /// Drops a listener, and its channel too once nothing references it.
    fn remove(&self, session_id: &str, listener_id: u64) {
        let idle = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            let Some(channel) = channels.get(session_id) else {
                return;
            };
            let mut channel = channel.lock().unwrap_or_else(PoisonError::into_inner);
            channel.listeners.retain(|l| l.id != listener_id);
            channel.is_idle()
        };
        if !idle {
            return;
        }

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let still_idle = channels
            .get(session_id)
            .is_some_and(|c| c.lock().unwrap_or_else(PoisonError::into_inner).is_idle());
        if still_idle {
            channels.remove(session_id);
            debug!(session_id, "Removed idle channel");
        }
    }

    fn channel_count(&self) -> usize {
        self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Per-session publish/subscribe hub.
#[derive(Debug, Clone)]
pub struct SubscriptionBus {
    inner: Arc<BusInner>,
}

impl SubscriptionBus {
    /// Creates a bus whose listeners queue at most `capacity` documents.
    ///
    /// A capacity of zero is raised to one so the initial snapshot fits.
    #[instrument]
    pub fn new(capacity: usize) -> Self {
        info!("Creating subscription bus");
        Self {
            inner: Arc::new(BusInner {
                channels: RwLock::new(HashMap::new()),
                capacity: capacity.max(1),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Queue capacity of each listener.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Registers a listener for `session_id`.
    ///
    /// The first item queued is the latest released document, or `None` if
    /// nothing has been published for that id. Every later document follows
    /// in version order.
    #[instrument(skip(self))]
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);

        self.inner.with_channel(session_id, |channel| {
            let latest = channel.latest.clone();
            let seen = latest.as_ref().map(|doc| *doc.version());

            // Fresh queue with capacity >= 1, so the snapshot always fits.
            if tx.try_send(latest).is_ok() {
                channel.listeners.push(Listener { id, tx, seen });
            }
            debug!(listener = id, ?seen, listeners = channel.listeners.len(), "Subscribed");
        });

        Subscription {
            id,
            session_id: session_id.to_string(),
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Publishes the first document of a session.
    ///
    /// Its version becomes the start of the sequence, so a document stored
    /// at any version is released immediately. Later versions that arrived
    /// first are released right after it; anything older is discarded.
    #[instrument(skip(self, doc), fields(session_id = %doc.id(), version = doc.version()))]
    pub fn open(&self, doc: Arc<Session>) {
        let session_id = doc.id().clone();
        let version = *doc.version();
        self.inner.with_channel(&session_id, |channel| {
            if channel.latest.is_none() {
                channel.base = Some(version);
                channel.pending = channel.pending.split_off(&version);
            }
            channel.release(&session_id, doc);
        });
    }

    /// Publishes a committed document.
    ///
    /// Documents older than the last release are ignored. Documents ahead of
    /// the next expected version wait in the reorder buffer.
    #[instrument(skip(self, doc), fields(session_id = %doc.id(), version = doc.version()))]
    pub fn publish(&self, doc: Arc<Session>) {
        let session_id = doc.id().clone();
        self.inner
            .with_channel(&session_id, |channel| channel.release(&session_id, doc));
    }

    /// Number of live listeners on `session_id`.
    pub fn listener_count(&self, session_id: &str) -> usize {
        let channels = self.inner.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels.get(session_id).map_or(0, |c| {
            c.lock().unwrap_or_else(PoisonError::into_inner).listeners.len()
        })
    }

    /// Number of sessions with a channel.
    pub fn channel_count(&self) -> usize {
        self.inner.channel_count()
    }
}

/// A registered listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    session_id: SessionId,
    rx: mpsc::Receiver<SessionUpdate>,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Session this subscription follows.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Waits for the next document.
    ///
    /// Returns `None` once the subscription has been evicted and its queue
    /// drained.
    pub async fn recv(&mut self) -> Option<SessionUpdate> {
        self.rx.recv().await
    }

    /// Takes the next queued document without waiting.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] if nothing is queued,
    /// [`TryRecvError::Disconnected`] after eviction.
    pub fn try_recv(&mut self) -> Result<SessionUpdate, TryRecvError> {
        self.rx.try_recv()
    }

    /// Stops delivery. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&self.session_id, self.id);
            debug!(session_id = %self.session_id, listener = self.id, "Unsubscribed");
        }
    }
}
