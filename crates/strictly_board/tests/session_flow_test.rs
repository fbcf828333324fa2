//! Tests for roster and turn flow through the public API.

use std::sync::Arc;
use strictly_board::{
    Action, ActionRegistry, ActionResult, Board, GameError, PASS_START_BONUS, PlayerColor,
    STARTING_MONEY, ScriptedDice, Session, SessionStatus, check_session,
};

fn registry(rolls: &[(u8, u8)]) -> ActionRegistry {
    ActionRegistry::standard(Arc::new(ScriptedDice::new(rolls.iter().copied()).unwrap()))
}

#[test]
fn test_four_joiners_get_distinct_palette_colors() {
    let mut session = Session::create("game-c".to_string(), "p1", "One");
    for id in ["p2", "p3", "p4"] {
        session.join(id, id).expect("Join failed");
    }

    let mut colors: Vec<_> = session.players().iter().map(|p| *p.color()).collect();
    colors.sort();
    let mut palette = PlayerColor::PALETTE.to_vec();
    palette.sort();
    assert_eq!(colors, palette);

    let err = session.join("p5", "Five").unwrap_err();
    assert!(matches!(err, GameError::SessionFull { .. }));
}

#[test]
fn test_walk_to_start_space_pays_bonus() {
    // 36 spaces in three double sixes, then 2 more lands on 38.
    let registry = registry(&[(6, 6), (6, 6), (6, 6), (1, 1), (1, 1)]);
    let mut session = Session::create("game-go".to_string(), "solo", "Solo");
    session.start(1).unwrap();

    for _ in 0..4 {
        session
            .submit_action("solo", &Action::roll_dice(), &registry, Board::classic())
            .unwrap();
    }
    assert_eq!(*session.players()[0].position(), 38);
    assert_eq!(*session.players()[0].money(), STARTING_MONEY);

    let result = session
        .submit_action("solo", &Action::roll_dice(), &registry, Board::classic())
        .unwrap();
    let ActionResult::RollDice(outcome) = result;
    assert!(outcome.passed_start);
    assert_eq!(outcome.new_position, 0);
    assert_eq!(outcome.space, "GO");
    assert_eq!(*session.players()[0].money(), STARTING_MONEY + PASS_START_BONUS);
}

#[test]
fn test_three_player_rotation_cycles() {
    let registry = registry(&[(1, 2)]);
    let mut session = Session::create("game-r".to_string(), "a", "A");
    session.join("b", "B").unwrap();
    session.join("c", "C").unwrap();
    session.start(2).unwrap();

    let order = ["a", "b", "c", "a", "b", "c"];
    for player in order {
        let current = session.current_player().unwrap().id().clone();
        assert_eq!(current, player);
        session
            .submit_action(player, &Action::roll_dice(), &registry, Board::classic())
            .unwrap();
        assert!(check_session(&session).is_ok());
    }
    assert_eq!(*session.current_player_index(), 0);
}

#[test]
fn test_ended_session_rejects_actions() {
    let registry = registry(&[(1, 2)]);
    let mut session = Session::create("game-e".to_string(), "a", "A");
    session.join("b", "B").unwrap();
    session.start(2).unwrap();
    let outcome = session.end(None).unwrap();
    assert!(outcome.winner.is_none());
    assert_eq!(outcome.standings.len(), 2);

    let err = session
        .submit_action("a", &Action::roll_dice(), &registry, Board::classic())
        .unwrap_err();
    assert_eq!(
        err,
        GameError::SessionNotActive {
            session_id: "game-e".to_string(),
            status: SessionStatus::Ended,
        }
    );
}
