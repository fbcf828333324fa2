//! The session document and its roster lifecycle.

use crate::{GameError, LastAction, Player, PlayerColor, PlayerId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Opaque session identifier.
pub type SessionId = String;

/// Roster capacity, one seat per palette color.
pub const MAX_PLAYERS: usize = PlayerColor::PALETTE.len();

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting players.
    Waiting,
    /// Turns are being played.
    Active,
    /// Finished; no further changes.
    Ended,
}

/// Authoritative state of one game.
///
/// Players are kept in join order, which is also turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Session {
    id: SessionId,
    created_by: PlayerId,
    players: Vec<Player>,
    current_player_index: usize,
    status: SessionStatus,
    last_action: Option<LastAction>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    winner: Option<PlayerId>,
    version: u64,
}

/// Final standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Final balance.
    pub money: i64,
    /// Final board position.
    pub position: usize,
}

/// Summary of an ended session, handed to the statistics collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// The ended session.
    pub session_id: SessionId,
    /// Winner, if one was declared.
    pub winner: Option<PlayerId>,
    /// Players ordered by balance, richest first; ties keep turn order.
    pub standings: Vec<Standing>,
    /// When the session ended.
    pub ended_at: DateTime<Utc>,
}

impl Session {
    /// Creates a waiting session with the creator seated first, in red.
    #[instrument(skip(id, creator_name), fields(session_id = %id))]
    pub fn create(id: SessionId, creator_id: &str, creator_name: &str) -> Self {
        let creator = Player::new(creator_id, creator_name, PlayerColor::Red);
        let session = Self {
            id,
            created_by: creator_id.to_string(),
            players: vec![creator],
            current_player_index: 0,
            status: SessionStatus::Waiting,
            last_action: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            winner: None,
            version: 0,
        };
        info!(session_id = %session.id, "Created session");
        session
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Looks up a seated player.
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == player_id)
    }

    /// Whether `player_id` is seated.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    /// Seats a new player with the first free palette color.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionAlreadyStarted`] unless the session is waiting
    /// - [`GameError::SessionFull`] if every seat is taken
    /// - [`GameError::DuplicatePlayer`] if the player is already seated
    #[instrument(skip(self, name), fields(session_id = %self.id))]
    pub fn join(&mut self, player_id: &str, name: &str) -> Result<Player, GameError> {
        if self.status != SessionStatus::Waiting {
            warn!(status = %self.status, "Join rejected, session already started");
            return Err(GameError::SessionAlreadyStarted {
                session_id: self.id.clone(),
            });
        }

        let full = || GameError::SessionFull {
            session_id: self.id.clone(),
            capacity: MAX_PLAYERS,
        };
        if self.players.len() >= MAX_PLAYERS {
            warn!(players = self.players.len(), "Join rejected, session full");
            return Err(full());
        }

        if self.has_player(player_id) {
            warn!("Join rejected, player already seated");
            return Err(GameError::DuplicatePlayer {
                session_id: self.id.clone(),
                player_id: player_id.to_string(),
            });
        }

        let color = PlayerColor::first_unused(self.players.iter().map(Player::color))
            .ok_or_else(full)?;
        let player = Player::new(player_id, name, color);
        self.players.push(player.clone());

        info!(%color, seat = self.players.len(), "Player joined");
        Ok(player)
    }

    /// Moves the session from waiting to active.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionAlreadyStarted`] unless the session is waiting
    /// - [`GameError::NotEnoughPlayers`] if fewer than `min_players` are seated
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start(&mut self, min_players: usize) -> Result<(), GameError> {
        if self.status != SessionStatus::Waiting {
            warn!(status = %self.status, "Start rejected");
            return Err(GameError::SessionAlreadyStarted {
                session_id: self.id.clone(),
            });
        }

        if self.players.len() < min_players {
            warn!(players = self.players.len(), "Start rejected, not enough players");
            return Err(GameError::NotEnoughPlayers {
                session_id: self.id.clone(),
                required: min_players,
                actual: self.players.len(),
            });
        }

        self.status = SessionStatus::Active;
        self.started_at = Some(Utc::now());
        info!(players = self.players.len(), "Session started");
        Ok(())
    }

    /// Ends an active session, optionally declaring a winner.
    ///
    /// # Errors
    ///
    /// - [`GameError::SessionNotActive`] unless the session is active
    /// - [`GameError::UnknownPlayer`] if the winner is not seated
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn end(&mut self, winner: Option<&str>) -> Result<SessionOutcome, GameError> {
        if self.status != SessionStatus::Active {
            warn!(status = %self.status, "End rejected");
            return Err(GameError::SessionNotActive {
                session_id: self.id.clone(),
                status: self.status,
            });
        }

        if let Some(winner) = winner
            && !self.has_player(winner)
        {
            warn!(winner, "End rejected, winner not seated");
            return Err(GameError::UnknownPlayer {
                session_id: self.id.clone(),
                player_id: winner.to_string(),
            });
        }

        let ended_at = Utc::now();
        self.status = SessionStatus::Ended;
        self.ended_at = Some(ended_at);
        self.winner = winner.map(str::to_string);

        info!(winner = ?self.winner, "Session ended");
        Ok(self.outcome(ended_at))
    }

    fn outcome(&self, ended_at: DateTime<Utc>) -> SessionOutcome {
        let mut standings: Vec<_> = self
            .players
            .iter()
            .map(|p| Standing {
                player_id: p.id().clone(),
                name: p.name().clone(),
                money: *p.money(),
                position: *p.position(),
            })
            .collect();
        standings.sort_by(|a, b| b.money.cmp(&a.money));

        SessionOutcome {
            session_id: self.id.clone(),
            winner: self.winner.clone(),
            standings,
            ended_at,
        }
    }

    /// Marks one committed mutation. Called by the store on commit.
    pub fn bump_version(&mut self) {
        self.version += 1;
        debug!(session_id = %self.id, version = self.version, "Version bumped");
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub(crate) fn set_current_player_index(&mut self, index: usize) {
        self.current_player_index = index;
    }

    pub(crate) fn set_last_action(&mut self, action: LastAction) {
        self.last_action = Some(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_session() -> Session {
        Session::create("game-1".to_string(), "alice", "Alice")
    }

    #[test]
    fn test_create_seats_creator_in_red() {
        let session = waiting_session();
        assert_eq!(session.status(), &SessionStatus::Waiting);
        assert_eq!(session.players().len(), 1);
        assert_eq!(session.players()[0].color(), &PlayerColor::Red);
        assert_eq!(session.created_by(), "alice");
        assert_eq!(*session.current_player_index(), 0);
        assert_eq!(*session.version(), 0);
        assert!(session.started_at().is_none());
    }

    #[test]
    fn test_join_assigns_palette_colors_in_order() {
        let mut session = waiting_session();
        let bob = session.join("bob", "Bob").unwrap();
        let carol = session.join("carol", "Carol").unwrap();
        let dave = session.join("dave", "Dave").unwrap();
        assert_eq!(*bob.color(), PlayerColor::Blue);
        assert_eq!(*carol.color(), PlayerColor::Green);
        assert_eq!(*dave.color(), PlayerColor::Yellow);
    }

    #[test]
    fn test_join_full_session_fails() {
        let mut session = waiting_session();
        for id in ["b", "c", "d"] {
            session.join(id, id).unwrap();
        }
        let err = session.join("e", "Eve").unwrap_err();
        assert!(matches!(err, GameError::SessionFull { capacity: 4, .. }));
        assert_eq!(session.players().len(), 4);
    }

    #[test]
    fn test_join_duplicate_fails() {
        let mut session = waiting_session();
        let err = session.join("alice", "Alice again").unwrap_err();
        assert!(matches!(err, GameError::DuplicatePlayer { .. }));
    }

    #[test]
    fn test_join_after_start_fails() {
        let mut session = waiting_session();
        session.join("bob", "Bob").unwrap();
        session.start(2).unwrap();
        let err = session.join("carol", "Carol").unwrap_err();
        assert!(matches!(err, GameError::SessionAlreadyStarted { .. }));
    }

    #[test]
    fn test_start_requires_min_players() {
        let mut session = waiting_session();
        let err = session.start(2).unwrap_err();
        assert_eq!(
            err,
            GameError::NotEnoughPlayers {
                session_id: "game-1".to_string(),
                required: 2,
                actual: 1,
            }
        );
        assert!(session.start(1).is_ok());
        assert!(session.started_at().is_some());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = waiting_session();
        session.start(1).unwrap();
        let started_at = *session.started_at();
        assert!(matches!(
            session.start(1),
            Err(GameError::SessionAlreadyStarted { .. })
        ));
        assert_eq!(*session.started_at(), started_at);
    }

    #[test]
    fn test_end_records_winner_and_standings() {
        let mut session = waiting_session();
        session.join("bob", "Bob").unwrap();
        session.start(2).unwrap();
        session.players_mut()[1].apply(&crate::Delta::new(
            5,
            300,
            crate::ActionResult::RollDice(crate::RollOutcome {
                die1: 2,
                die2: 3,
                old_position: 0,
                new_position: 5,
                passed_start: false,
                space: String::new(),
            }),
        ));

        let outcome = session.end(Some("bob")).unwrap();
        assert_eq!(session.status(), &SessionStatus::Ended);
        assert_eq!(session.winner().as_deref(), Some("bob"));
        assert!(session.ended_at().is_some());
        assert_eq!(outcome.standings[0].player_id, "bob");
        assert_eq!(outcome.standings[0].money, 1800);
        assert_eq!(outcome.standings[1].player_id, "alice");
    }

    #[test]
    fn test_end_requires_active_and_known_winner() {
        let mut session = waiting_session();
        assert!(matches!(
            session.end(None),
            Err(GameError::SessionNotActive { .. })
        ));

        session.start(1).unwrap();
        assert!(matches!(
            session.end(Some("mallory")),
            Err(GameError::UnknownPlayer { .. })
        ));
        assert_eq!(session.status(), &SessionStatus::Active);
    }

    #[test]
    fn test_session_serializes_as_flat_record() {
        let session = waiting_session();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["current_player_index"], 0);
        assert_eq!(json["players"][0]["color"], "red");
        assert_eq!(json["players"][0]["money"], 1500);
        assert!(json["winner"].is_null());
    }
}
