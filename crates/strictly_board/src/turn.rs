//! Turn engine: who may act, and what acting does to the session.

use crate::{
    Action, ActionRegistry, ActionResult, Board, GameError, LastAction, Session, SessionStatus,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

impl Session {
    /// Applies one action by the current player and passes the turn on.
    ///
    /// Turn ownership is checked against this document. Callers must run
    /// this inside the store's per-session critical section so the check and
    /// the turn advance form one unit. On error the session is unchanged.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionNotActive`] unless the session is active
    /// - [`GameError::NotYourTurn`] if `player_id` is not the current player
    /// - [`GameError::UnknownActionKind`] if the action cannot be dispatched
    #[instrument(skip(self, registry, board), fields(session_id = %self.id(), kind = %action.kind))]
    pub fn submit_action(
        &mut self,
        player_id: &str,
        action: &Action,
        registry: &ActionRegistry,
        board: &Board,
    ) -> Result<ActionResult, GameError> {
        if *self.status() != SessionStatus::Active {
            warn!(status = %self.status(), "Action rejected, session not active");
            return Err(GameError::SessionNotActive {
                session_id: self.id().clone(),
                status: *self.status(),
            });
        }

        let index = *self.current_player_index();
        let current = self.current_player().ok_or_else(|| GameError::InvariantViolation {
            violations: format!("turn pointer {index} has no player"),
        })?;

        if current.id() != player_id {
            warn!(expected = %current.id(), "Action rejected, not player's turn");
            return Err(GameError::NotYourTurn {
                expected: current.id().clone(),
                actual: player_id.to_string(),
            });
        }

        let delta = registry.dispatch(action, current, board)?;

        let player_count = self.players().len();
        self.players_mut()[index].apply(&delta);
        self.set_last_action(LastAction::new(
            delta.result.kind(),
            player_id.to_string(),
            delta.result.clone(),
            Utc::now(),
        ));
        let next = (index + 1) % player_count;
        self.set_current_player_index(next);

        info!(
            new_position = delta.new_position,
            money_change = delta.money_change,
            next_player = next,
            "Action applied"
        );
        Ok(delta.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PASS_START_BONUS, STARTING_MONEY, ScriptedDice};
    use std::sync::Arc;

    fn active_session(players: &[&str]) -> Session {
        let mut session = Session::create("game-t".to_string(), players[0], players[0]);
        for id in &players[1..] {
            session.join(id, id).unwrap();
        }
        session.start(1).unwrap();
        session
    }

    fn registry(rolls: &[(u8, u8)]) -> ActionRegistry {
        ActionRegistry::standard(Arc::new(ScriptedDice::new(rolls.iter().copied()).unwrap()))
    }

    #[test]
    fn test_turn_rotates_round_robin() {
        let mut session = active_session(&["a", "b"]);
        let registry = registry(&[(2, 3)]);
        let board = Board::classic();

        let expected = ["a", "b", "a", "b", "a"];
        for (turn, player) in expected.iter().enumerate() {
            assert_eq!(*session.current_player_index(), turn % 2);
            session
                .submit_action(player, &Action::roll_dice(), &registry, board)
                .unwrap();
        }
        assert_eq!(*session.current_player_index(), 1);
    }

    #[test]
    fn test_wrong_player_leaves_session_unchanged() {
        let mut session = active_session(&["a", "b"]);
        let before = serde_json::to_vec(&session).unwrap();

        let err = session
            .submit_action("b", &Action::roll_dice(), &registry(&[(1, 1)]), Board::classic())
            .unwrap_err();
        assert_eq!(
            err,
            GameError::NotYourTurn {
                expected: "a".to_string(),
                actual: "b".to_string(),
            }
        );
        assert_eq!(serde_json::to_vec(&session).unwrap(), before);
    }

    #[test]
    fn test_unknown_kind_leaves_session_unchanged() {
        let mut session = active_session(&["a", "b"]);
        let before = session.clone();
        let err = session
            .submit_action("a", &Action::new("JUMP"), &registry(&[(1, 1)]), Board::classic())
            .unwrap_err();
        assert!(matches!(err, GameError::UnknownActionKind { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn test_action_in_waiting_session_rejected() {
        let mut session = Session::create("game-w".to_string(), "a", "A");
        let err = session
            .submit_action("a", &Action::roll_dice(), &registry(&[(1, 1)]), Board::classic())
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::SessionNotActive {
                status: SessionStatus::Waiting,
                ..
            }
        ));
    }

    #[test]
    fn test_passing_start_credits_bonus() {
        let mut session = active_session(&["a"]);
        session.players_mut()[0].set_position(38);

        let result = session
            .submit_action("a", &Action::roll_dice(), &registry(&[(1, 1)]), Board::classic())
            .unwrap();
        let ActionResult::RollDice(outcome) = result;
        assert!(outcome.passed_start);
        assert_eq!(outcome.new_position, 0);

        let player = &session.players()[0];
        assert_eq!(*player.position(), 0);
        assert_eq!(*player.money(), STARTING_MONEY + PASS_START_BONUS);
    }

    #[test]
    fn test_last_action_recorded() {
        let mut session = active_session(&["a", "b"]);
        session
            .submit_action("a", &Action::roll_dice(), &registry(&[(3, 4)]), Board::classic())
            .unwrap();

        let last = session.last_action().as_ref().unwrap();
        assert_eq!(last.player_id(), "a");
        assert_eq!(*last.kind(), crate::ActionKind::RollDice);
        let ActionResult::RollDice(outcome) = last.result();
        assert_eq!((outcome.die1, outcome.die2), (3, 4));
        assert_eq!(outcome.new_position, 7);
        assert_eq!(*session.players()[0].position(), 7);
    }
}
