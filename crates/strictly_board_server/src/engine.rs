//! The game engine: roster, turns, and subscriptions over the store.

use crate::{ServerConfig, SessionStore, Subscription, SubscriptionBus};
use derive_getters::Getters;
use derive_new::new;
use std::sync::Arc;
use strictly_board::{
    Action, ActionRegistry, ActionResult, Board, DiceRoller, GameError, Player, RandomDice,
    Session, SessionId, SessionOutcome,
};
use tracing::{info, instrument};

/// Tunables for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct EngineConfig {
    /// Players required to start a session.
    min_players: usize,
    /// Queue length of each subscriber.
    listener_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(2, 64)
    }
}

impl From<&ServerConfig> for EngineConfig {
    fn from(config: &ServerConfig) -> Self {
        Self::new(*config.min_players(), *config.listener_capacity())
    }
}

/// Entry point for every session operation.
///
/// Cloning is cheap; clones share the same store and registry.
#[derive(Debug, Clone)]
pub struct GameEngine {
    store: SessionStore,
    registry: Arc<ActionRegistry>,
    board: &'static Board,
    config: EngineConfig,
}

impl GameEngine {
    /// Engine on the classic board with the standard action registry.
    #[instrument(skip(dice))]
    pub fn new(config: EngineConfig, dice: Arc<dyn DiceRoller>) -> Self {
        Self::with_registry(config, ActionRegistry::standard(dice))
    }

    /// Engine using a custom action registry.
    #[instrument(skip(registry), fields(kinds = ?registry.kinds()))]
    pub fn with_registry(config: EngineConfig, registry: ActionRegistry) -> Self {
        info!("Creating game engine");
        Self {
            store: SessionStore::new(SubscriptionBus::new(*config.listener_capacity())),
            registry: Arc::new(registry),
            board: Board::classic(),
            config,
        }
    }

    /// Engine built from server configuration, seeding dice if requested.
    pub fn from_config(config: &ServerConfig) -> Self {
        let dice = match config.dice_seed() {
            Some(seed) => RandomDice::seeded(*seed),
            None => RandomDice::new(),
        };
        Self::new(EngineConfig::from(config), Arc::new(dice))
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The board every session plays on.
    pub fn board(&self) -> &'static Board {
        self.board
    }

    /// Engine tunables.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a waiting session with the creator seated first.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] only if the new document is broken.
    #[instrument(skip(self, creator_name))]
    pub fn create_session(
        &self,
        creator_id: &str,
        creator_name: &str,
    ) -> Result<SessionId, GameError> {
        let session = Session::create(self.store.next_id(), creator_id, creator_name);
        let doc = self.store.create(session)?;
        Ok(doc.id().clone())
    }

    /// Seats a player in a waiting session.
    #[instrument(skip(self, name))]
    pub fn join_session(
        &self,
        session_id: &str,
        player_id: &str,
        name: &str,
    ) -> Result<Player, GameError> {
        Ok(self.store.mutate(session_id, |s| s.join(player_id, name))?.output)
    }

    /// Starts a waiting session.
    #[instrument(skip(self))]
    pub fn start_session(&self, session_id: &str) -> Result<(), GameError> {
        let min_players = self.config.min_players;
        self.store.mutate(session_id, |s| s.start(min_players))?;
        Ok(())
    }

    /// Applies an action for the acting player.
    ///
    /// The turn check and the turn advance happen under the session's lock,
    /// so two submissions can never both pass for the same turn.
    #[instrument(skip(self, action), fields(kind = %action.kind))]
    pub fn submit_action(
        &self,
        session_id: &str,
        player_id: &str,
        action: &Action,
    ) -> Result<ActionResult, GameError> {
        let registry = &self.registry;
        let board = self.board;
        let mutation = self
            .store
            .mutate(session_id, |s| s.submit_action(player_id, action, registry, board))?;
        Ok(mutation.output)
    }

    /// Ends an active session.
    #[instrument(skip(self))]
    pub fn end_session(
        &self,
        session_id: &str,
        winner: Option<&str>,
    ) -> Result<SessionOutcome, GameError> {
        let outcome = self.store.mutate(session_id, |s| s.end(winner))?.output;
        info!(winner = ?outcome.winner, players = outcome.standings.len(), "Outcome recorded");
        Ok(outcome)
    }

    /// Current document of a session.
    pub fn get_session(&self, session_id: &str) -> Result<Arc<Session>, GameError> {
        self.store.get(session_id)
    }

    /// Every session, oldest first.
    pub fn list_sessions(&self) -> Vec<Arc<Session>> {
        self.store.list()
    }

    /// Sessions `player_id` is seated in.
    pub fn sessions_for_player(&self, player_id: &str) -> Vec<Arc<Session>> {
        self.store.sessions_for_player(player_id)
    }

    /// Follows a session's committed documents.
    ///
    /// The first item is the current document, or `None` for an unknown id.
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        self.store.bus().subscribe(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_board::ScriptedDice;

    fn engine(min_players: usize) -> GameEngine {
        let dice = ScriptedDice::new([(2, 2)]).unwrap();
        GameEngine::new(EngineConfig::new(min_players, 8), Arc::new(dice))
    }

    #[test]
    fn test_start_requires_min_players() {
        let engine = engine(2);
        let id = engine.create_session("a", "A").unwrap();
        let err = engine.start_session(&id).unwrap_err();
        assert!(matches!(err, GameError::NotEnoughPlayers { required: 2, actual: 1, .. }));

        engine.join_session(&id, "b", "B").unwrap();
        engine.start_session(&id).unwrap();
    }

    #[test]
    fn test_single_player_when_allowed() {
        let engine = engine(1);
        let id = engine.create_session("a", "A").unwrap();
        engine.start_session(&id).unwrap();
        engine.submit_action(&id, "a", &Action::roll_dice()).unwrap();
        engine.submit_action(&id, "a", &Action::roll_dice()).unwrap();
        assert_eq!(*engine.get_session(&id).unwrap().players()[0].position(), 8);
    }

    #[test]
    fn test_version_counts_commits() {
        let engine = engine(2);
        let id = engine.create_session("a", "A").unwrap();
        engine.join_session(&id, "b", "B").unwrap();
        let _ = engine.join_session(&id, "b", "B");
        engine.start_session(&id).unwrap();
        engine.submit_action(&id, "a", &Action::roll_dice()).unwrap();
        assert_eq!(*engine.get_session(&id).unwrap().version(), 3);
    }

    #[test]
    fn test_from_config_uses_min_players() {
        let config = ServerConfig::default().with_min_players(3).with_dice_seed(7);
        let engine = GameEngine::from_config(&config);
        assert_eq!(*engine.config().min_players(), 3);
    }
}
