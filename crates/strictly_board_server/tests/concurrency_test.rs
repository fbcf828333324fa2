//! Concurrent submissions against one session.

use std::sync::{Arc, Barrier};
use std::thread;
use strictly_board::{Action, GameError, RandomDice};
use strictly_board_server::{EngineConfig, GameEngine};

fn engine() -> GameEngine {
    GameEngine::new(EngineConfig::new(2, 4096), Arc::new(RandomDice::seeded(42)))
}

fn active_session(engine: &GameEngine, players: &[&str]) -> String {
    let id = engine.create_session(players[0], players[0]).unwrap();
    for player in &players[1..] {
        engine.join_session(&id, player, player).unwrap();
    }
    engine.start_session(&id).unwrap();
    id
}

#[test]
fn test_simultaneous_submissions_same_turn() {
    let engine = engine();

    for _ in 0..50 {
        let id = active_session(&engine, &["a", "b"]);
        let barrier = Arc::new(Barrier::new(2));

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    let engine = engine.clone();
                    let id = id.clone();
                    scope.spawn(move || {
                        barrier.wait();
                        engine.submit_action(&id, "a", &Action::roll_dice())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        let rejected = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(rejected, GameError::NotYourTurn { .. }));

        let session = engine.get_session(&id).unwrap();
        assert_eq!(*session.current_player_index(), 1);
        assert_eq!(*session.version(), 3);
    }
}

#[test]
fn test_players_racing_keep_round_robin() {
    let engine = engine();
    let players = ["p1", "p2", "p3", "p4"];
    let id = active_session(&engine, &players);
    let mut subscription = engine.subscribe(&id);
    let start_version = *engine.get_session(&id).unwrap().version();

    const TURNS_EACH: usize = 25;
    thread::scope(|scope| {
        for player in players {
            let engine = engine.clone();
            let id = id.clone();
            scope.spawn(move || {
                let mut taken = 0;
                while taken < TURNS_EACH {
                    match engine.submit_action(&id, player, &Action::roll_dice()) {
                        Ok(_) => taken += 1,
                        Err(GameError::NotYourTurn { .. }) => thread::yield_now(),
                        Err(e) => panic!("Unexpected error: {e}"),
                    }
                }
            });
        }
    });

    let session = engine.get_session(&id).unwrap();
    assert_eq!(*session.version(), start_version + (TURNS_EACH * players.len()) as u64);
    assert_eq!(*session.current_player_index(), 0);

    let snapshot = subscription.try_recv().unwrap().unwrap();
    assert_eq!(*snapshot.version(), start_version);

    let mut expected_version = start_version;
    let mut turn = 0;
    while let Ok(update) = subscription.try_recv() {
        let doc = update.unwrap();
        expected_version += 1;
        assert_eq!(*doc.version(), expected_version);

        let actor = doc.last_action().as_ref().unwrap().player_id().clone();
        assert_eq!(actor, players[turn % players.len()]);
        turn += 1;
    }
    assert_eq!(turn, TURNS_EACH * players.len());
}

#[test]
fn test_independent_sessions_in_parallel() {
    let engine = engine();
    let ids: Vec<_> = (0..8).map(|_| active_session(&engine, &["a", "b"])).collect();

    thread::scope(|scope| {
        for id in &ids {
            let engine = engine.clone();
            scope.spawn(move || {
                for turn in 0..20 {
                    let player = if turn % 2 == 0 { "a" } else { "b" };
                    engine.submit_action(id, player, &Action::roll_dice()).unwrap();
                }
            });
        }
    });

    for id in &ids {
        let session = engine.get_session(id).unwrap();
        assert_eq!(*session.version(), 2 + 20);
        assert!(session.players().iter().all(|p| *p.position() < 40));
    }
}
