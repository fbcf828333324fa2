//! Registry mapping action kinds to their handlers.
//!
//! Handlers are pure evaluators: they see the acting player and the board and
//! return a [`Delta`]. Adding an action kind means registering a handler; the
//! turn engine that applies deltas does not change.

use crate::{
    Action, ActionKind, ActionResult, Board, DiceRoller, Delta, GameError, PASS_START_BONUS,
    Player, RollOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Evaluates one kind of action.
pub trait ActionHandler: Send + Sync + std::fmt::Debug {
    /// The kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Computes the effect of `action` for `player` without applying it.
    fn evaluate(&self, action: &Action, player: &Player, board: &Board) -> Result<Delta, GameError>;
}

/// Rolls two dice and moves the player, paying the pass-start bonus.
#[derive(Debug, Clone)]
pub struct RollDiceHandler {
    dice: Arc<dyn DiceRoller>,
}

impl RollDiceHandler {
    /// Creates a handler drawing from `dice`.
    pub fn new(dice: Arc<dyn DiceRoller>) -> Self {
        Self { dice }
    }
}

impl ActionHandler for RollDiceHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::RollDice
    }

    #[instrument(skip(self, _action, player, board), fields(player_id = %player.id()))]
    fn evaluate(
        &self,
        _action: &Action,
        player: &Player,
        board: &Board,
    ) -> Result<Delta, GameError> {
        let roll = self.dice.roll();
        let old_position = *player.position();
        let advance = board.advance(old_position, roll.total());
        let money_change = if advance.passed_start {
            PASS_START_BONUS
        } else {
            0
        };

        debug!(
            die1 = roll.die1(),
            die2 = roll.die2(),
            old_position,
            new_position = advance.position,
            passed_start = advance.passed_start,
            "Dice rolled"
        );

        Ok(Delta::new(
            advance.position,
            money_change,
            ActionResult::RollDice(RollOutcome {
                die1: roll.die1(),
                die2: roll.die2(),
                old_position,
                new_position: advance.position,
                passed_start: advance.passed_start,
                space: board.space(advance.position).name().clone(),
            }),
        ))
    }
}

/// Table of action kind to handler.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler.
    pub fn standard(dice: Arc<dyn DiceRoller>) -> Self {
        let mut registry = Self::new();
        registry.register(RollDiceHandler::new(dice));
        registry
    }

    /// Registers `handler` under its kind, returning any handler it replaced.
    #[instrument(skip(self, handler), fields(kind = %handler.kind()))]
    pub fn register(
        &mut self,
        handler: impl ActionHandler + 'static,
    ) -> Option<Box<dyn ActionHandler>> {
        let replaced = self.handlers.insert(handler.kind(), Box::new(handler));
        if replaced.is_some() {
            warn!("Replaced existing action handler");
        }
        replaced
    }

    /// Kinds that can currently be played.
    pub fn kinds(&self) -> Vec<ActionKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.to_string());
        kinds
    }

    /// Evaluates `action` for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownActionKind`] if the kind is unknown or has
    /// no handler, or whatever the handler itself rejects.
    #[instrument(skip(self, player, board), fields(kind = %action.kind, player_id = %player.id()))]
    pub fn dispatch(
        &self,
        action: &Action,
        player: &Player,
        board: &Board,
    ) -> Result<Delta, GameError> {
        let kind = action.parse_kind()?;
        let handler = self.handlers.get(&kind).ok_or_else(|| {
            debug!("No handler registered for action kind");
            GameError::UnknownActionKind {
                kind: action.kind.clone(),
            }
        })?;
        handler.evaluate(action, player, board)
    }
}
