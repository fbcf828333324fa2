//! Error types for session, roster and turn operations.

use crate::{PlayerId, SessionId, SessionStatus};

/// Error raised when an operation on a session is rejected.
///
/// Every variant is a local validation failure. A rejected operation leaves
/// the session document untouched.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// No session exists with the given id.
    #[display("Session {session_id} not found")]
    SessionNotFound {
        /// The requested session.
        session_id: SessionId,
    },

    /// A session with this id is already stored.
    #[display("Session {session_id} already exists")]
    SessionExists {
        /// The id that is taken.
        session_id: SessionId,
    },

    /// The session has left the waiting phase.
    #[display("Session {session_id} has already started")]
    SessionAlreadyStarted {
        /// The session that was already started.
        session_id: SessionId,
    },

    /// The roster already holds the maximum number of players.
    #[display("Session {session_id} is full ({capacity} players)")]
    SessionFull {
        /// The full session.
        session_id: SessionId,
        /// Maximum roster size.
        capacity: usize,
    },

    /// The player is already seated in the session.
    #[display("Player {player_id} is already in session {session_id}")]
    DuplicatePlayer {
        /// The session joined.
        session_id: SessionId,
        /// The player that tried to join twice.
        player_id: PlayerId,
    },

    /// Someone other than the current player tried to act.
    #[display("Not your turn. Waiting for player {expected}")]
    NotYourTurn {
        /// Player whose turn it is.
        expected: PlayerId,
        /// Player that attempted the action.
        actual: PlayerId,
    },

    /// The action kind is not known to the dispatcher.
    #[display("Unknown action kind '{kind}'")]
    UnknownActionKind {
        /// The kind tag as received.
        kind: String,
    },

    /// Actions and endings require an active session.
    #[display("Session {session_id} is {status}, not active")]
    SessionNotActive {
        /// The session acted upon.
        session_id: SessionId,
        /// Its current status.
        status: SessionStatus,
    },

    /// Too few players to start.
    #[display("Session {session_id} needs {required} players to start, has {actual}")]
    NotEnoughPlayers {
        /// The session being started.
        session_id: SessionId,
        /// Configured minimum.
        required: usize,
        /// Players currently seated.
        actual: usize,
    },

    /// The referenced player is not part of the session.
    #[display("Player {player_id} is not in session {session_id}")]
    UnknownPlayer {
        /// The session searched.
        session_id: SessionId,
        /// The missing player.
        player_id: PlayerId,
    },

    /// A mutation would have broken a session invariant.
    #[display("Invariant violation: {violations}")]
    InvariantViolation {
        /// Descriptions of every violated invariant, `; `-separated.
        violations: String,
    },
}

impl std::error::Error for GameError {}

impl GameError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound { .. } => "session_not_found",
            Self::SessionExists { .. } => "session_exists",
            Self::SessionAlreadyStarted { .. } => "session_already_started",
            Self::SessionFull { .. } => "session_full",
            Self::DuplicatePlayer { .. } => "duplicate_player",
            Self::NotYourTurn { .. } => "not_your_turn",
            Self::UnknownActionKind { .. } => "unknown_action_kind",
            Self::SessionNotActive { .. } => "session_not_active",
            Self::NotEnoughPlayers { .. } => "not_enough_players",
            Self::UnknownPlayer { .. } => "unknown_player",
            Self::InvariantViolation { .. } => "invariant_violation",
        }
    }

    /// Shorthand for [`GameError::SessionNotFound`].
    pub fn not_found(session_id: impl Into<SessionId>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}
