//! First-class invariants for session documents.
//!
//! Invariants are logical properties that must hold after every committed
//! mutation. The store checks [`SessionInvariants`] before it commits, and
//! they are testable on their own.

use crate::{BOARD_SIZE, GameError, MAX_PLAYERS, Session, SessionStatus};
use std::collections::HashSet;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>),+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);

/// The turn pointer indexes a seated player.
pub struct TurnPointerInBounds;

impl Invariant<Session> for TurnPointerInBounds {
    fn holds(session: &Session) -> bool {
        *session.current_player_index() < session.players().len()
    }

    fn description() -> &'static str {
        "Turn pointer indexes a seated player"
    }
}

/// Roster size stays within the palette and player ids are unique.
pub struct RosterWithinCapacity;

impl Invariant<Session> for RosterWithinCapacity {
    fn holds(session: &Session) -> bool {
        let players = session.players();
        let ids: HashSet<_> = players.iter().map(|p| p.id()).collect();
        (1..=MAX_PLAYERS).contains(&players.len()) && ids.len() == players.len()
    }

    fn description() -> &'static str {
        "Roster holds 1 to 4 players with unique ids"
    }
}

/// No two players share a token color.
pub struct DistinctColors;

impl Invariant<Session> for DistinctColors {
    fn holds(session: &Session) -> bool {
        let colors: HashSet<_> = session.players().iter().map(|p| p.color()).collect();
        colors.len() == session.players().len()
    }

    fn description() -> &'static str {
        "Players have distinct colors"
    }
}

/// Every token sits on the board.
pub struct PositionsOnBoard;

impl Invariant<Session> for PositionsOnBoard {
    fn holds(session: &Session) -> bool {
        session.players().iter().all(|p| *p.position() < BOARD_SIZE)
    }

    fn description() -> &'static str {
        "Positions lie within the board"
    }
}

/// Lifecycle timestamps and winner match the status.
pub struct LifecycleConsistent;

impl Invariant<Session> for LifecycleConsistent {
    fn holds(session: &Session) -> bool {
        let started = session.started_at().is_some();
        let ended = session.ended_at().is_some();
        match session.status() {
            SessionStatus::Waiting => !started && !ended && session.winner().is_none(),
            SessionStatus::Active => started && !ended && session.winner().is_none(),
            SessionStatus::Ended => started && ended,
        }
    }

    fn description() -> &'static str {
        "Timestamps and winner match the lifecycle status"
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (
    TurnPointerInBounds,
    RosterWithinCapacity,
    DistinctColors,
    PositionsOnBoard,
    LifecycleConsistent,
);

/// Checks [`SessionInvariants`], folding violations into one error.
///
/// # Errors
///
/// Returns [`GameError::InvariantViolation`] listing every violation.
pub fn check_session(session: &Session) -> Result<(), GameError> {
    SessionInvariants::check_all(session).map_err(|violations| GameError::InvariantViolation {
        violations: violations
            .into_iter()
            .map(|v| v.description)
            .collect::<Vec<_>>()
            .join("; "),
    })
}
