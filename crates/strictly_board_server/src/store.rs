//! Concurrent store of session documents.
//!
//! The map lock is held only to find or insert a session. Each session has
//! its own mutex, held for the whole read-compute-write of [`SessionStore::mutate`],
//! so turn checks and turn advances cannot interleave. Committed documents
//! are published after that mutex is released.

use crate::SubscriptionBus;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use strictly_board::{GameError, Session, SessionId, check_session};
use tracing::{debug, info, instrument, warn};

type Slot = Arc<Mutex<Arc<Session>>>;

/// Result of a committed mutation.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    /// The document as committed.
    pub document: Arc<Session>,
    /// Whatever the mutation returned.
    pub output: T,
}

/// Manages all sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Slot>>>,
    sequence: Arc<AtomicU64>,
    bus: SubscriptionBus,
}

impl SessionStore {
    /// Creates an empty store publishing to `bus`.
    #[instrument(skip(bus))]
    pub fn new(bus: SubscriptionBus) -> Self {
        info!("Creating session store");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(1)),
            bus,
        }
    }

    /// The bus this store publishes to.
    pub fn bus(&self) -> &SubscriptionBus {
        &self.bus
    }

    /// A fresh id of the form `game-<unix-millis>-<seq>`.
    pub fn next_id(&self) -> SessionId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("game-{millis}-{seq}")
    }

    /// Stores a new session and publishes it.
    ///
    /// The document keeps its version, so a session reloaded from storage
    /// continues its sequence; its subscribers start from that version.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionExists`] if the id is already stored
    /// - [`GameError::InvariantViolation`] if the document is inconsistent
    #[instrument(
        skip(self, session),
        fields(session_id = %session.id(), version = session.version())
    )]
    pub fn create(&self, session: Session) -> Result<Arc<Session>, GameError> {
        check_session(&session)?;
        let doc = Arc::new(session);
        {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            match sessions.entry(doc.id().clone()) {
                Entry::Occupied(_) => {
                    warn!("Session id already taken");
                    return Err(GameError::SessionExists {
                        session_id: doc.id().clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(Arc::clone(&doc))));
                }
            }
            info!(total = sessions.len(), "Session stored");
        }
        self.bus.open(Arc::clone(&doc));
        Ok(doc)
    }

    fn slot(&self, id: &str) -> Result<Slot, GameError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned().ok_or_else(|| {
            debug!(session_id = id, "Session not found");
            GameError::not_found(id)
        })
    }

    /// Current document of a session.
    ///
    /// # Errors
    ///
    /// [`GameError::SessionNotFound`] if no such session exists.
    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<Arc<Session>, GameError> {
        let slot = self.slot(id)?;
        let doc = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(&doc))
    }

    /// Applies `f` to a draft of the session and commits it on success.
    ///
    /// The draft is discarded if `f` fails or leaves an invariant broken;
    /// the stored document and its version are then untouched. On commit
    /// the version is bumped by one and the document published.
    ///
    /// # Errors
    ///
    /// [`GameError::SessionNotFound`], whatever `f` returns, or
    /// [`GameError::InvariantViolation`].
    #[instrument(skip(self, f))]
    pub fn mutate<T, F>(&self, id: &str, f: F) -> Result<Mutation<T>, GameError>
    where
        F: FnOnce(&mut Session) -> Result<T, GameError>,
    {
        let slot = self.slot(id)?;
        let (document, output) = {
            let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let mut draft = Session::clone(&current);
            let output = f(&mut draft).inspect_err(|e| {
                debug!(error = %e, "Mutation rejected");
            })?;
            check_session(&draft).inspect_err(|e| {
                warn!(error = %e, "Mutation broke an invariant, discarded");
            })?;
            draft.bump_version();
            let document = Arc::new(draft);
            *current = Arc::clone(&document);
            (document, output)
        };

        debug!(version = document.version(), "Mutation committed");
        self.bus.publish(Arc::clone(&document));
        Ok(Mutation { document, output })
    }

    /// Every session, oldest first.
    #[instrument(skip(self))]
    pub fn list(&self) -> Vec<Arc<Session>> {
        let slots: Vec<Slot> = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.values().cloned().collect()
        };
        let mut docs: Vec<_> = slots
            .iter()
            .map(|slot| Arc::clone(&slot.lock().unwrap_or_else(PoisonError::into_inner)))
            .collect();
        docs.sort_by(|a, b| {
            a.created_at()
                .cmp(b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        debug!(count = docs.len(), "Listed sessions");
        docs
    }

    /// Sessions in which `player_id` is seated, oldest first.
    #[instrument(skip(self))]
    pub fn sessions_for_player(&self, player_id: &str) -> Vec<Arc<Session>> {
        self.list()
            .into_iter()
            .filter(|doc| doc.has_player(player_id))
            .collect()
    }
}
