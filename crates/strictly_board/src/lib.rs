//! Strictly Board - pure session logic for a dice-and-move board game.
//!
//! This crate has no I/O. It models the session document and every rule
//! that changes it; the server crate wraps it in a concurrent store.
//!
//! # Architecture
//!
//! - **Board**: the 40-space circular board and position arithmetic
//! - **Roster**: players, color palette, join/start/end lifecycle
//! - **Turns**: turn ownership and round-robin advance
//! - **Actions**: action kinds, the handler registry, dice
//! - **Invariants**: properties checked after every mutation
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strictly_board::{Action, ActionRegistry, Board, ScriptedDice, Session};
//!
//! let dice = Arc::new(ScriptedDice::new([(3, 4)]).unwrap());
//! let registry = ActionRegistry::standard(dice);
//!
//! let mut session = Session::create("game-1".to_string(), "alice", "Alice");
//! session.join("bob", "Bob").unwrap();
//! session.start(2).unwrap();
//!
//! session
//!     .submit_action("alice", &Action::roll_dice(), &registry, Board::classic())
//!     .unwrap();
//! assert_eq!(*session.players()[0].position(), 7);
//! assert_eq!(*session.current_player_index(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod dice;
mod dispatch;
mod error;
mod invariants;
mod player;
mod session;
mod turn;

pub use action::{Action, ActionKind, ActionResult, Delta, LastAction, RollOutcome};
pub use board::{
    Advance, BOARD_SIZE, Board, ColorGroup, PASS_START_BONUS, START_SPACE, Space, SpaceKind,
};
pub use dice::{DIE_FACES, DiceError, DiceRoll, DiceRoller, RandomDice, ScriptedDice};
pub use dispatch::{ActionHandler, ActionRegistry, RollDiceHandler};
pub use error::GameError;
pub use invariants::{
    DistinctColors, Invariant, InvariantSet, InvariantViolation, LifecycleConsistent,
    PositionsOnBoard, RosterWithinCapacity, SessionInvariants, TurnPointerInBounds, check_session,
};
pub use player::{Player, PlayerColor, PlayerId, STARTING_MONEY};
pub use session::{MAX_PLAYERS, Session, SessionId, SessionOutcome, SessionStatus, Standing};
