//! Players seated in a session.

use crate::Delta;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier supplied by the identity provider.
pub type PlayerId = String;

/// Balance every player starts with.
pub const STARTING_MONEY: i64 = 1500;

/// Token color. Each color is held by at most one player per session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerColor {
    /// Always the session creator.
    Red,
    /// Second seat.
    Blue,
    /// Third seat.
    Green,
    /// Fourth seat.
    Yellow,
}

impl PlayerColor {
    /// Colors in assignment order. Its length caps the roster size.
    pub const PALETTE: [PlayerColor; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// First palette color not present in `used`.
    pub fn first_unused<'a>(
        used: impl IntoIterator<Item = &'a PlayerColor> + Clone,
    ) -> Option<Self> {
        Self::PALETTE
            .into_iter()
            .find(|color| !used.clone().into_iter().any(|u| u == color))
    }
}

/// A player and their token state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    /// Stable id from the identity provider.
    id: PlayerId,
    /// Display name.
    name: String,
    /// Board index of the token.
    position: usize,
    /// Cash balance.
    money: i64,
    /// Owned space indices. Not touched by dice rolls.
    properties: BTreeSet<usize>,
    /// Token color.
    color: PlayerColor,
    /// Whether the player is still taking part.
    is_active: bool,
}

impl Player {
    /// Creates a player on the start space with the starting balance.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, color: PlayerColor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: crate::START_SPACE,
            money: STARTING_MONEY,
            properties: BTreeSet::new(),
            color,
            is_active: true,
        }
    }

    /// Applies an evaluated action to this player.
    pub(crate) fn apply(&mut self, delta: &Delta) {
        self.position = delta.new_position;
        self.money += delta.money_change;
    }

    #[cfg(test)]
    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new("p1", "Alice", PlayerColor::Red);
        assert_eq!(*player.position(), 0);
        assert_eq!(*player.money(), STARTING_MONEY);
        assert!(player.properties().is_empty());
        assert!(*player.is_active());
    }

    #[test]
    fn test_first_unused_follows_palette_order() {
        let used = [PlayerColor::Red, PlayerColor::Green];
        assert_eq!(PlayerColor::first_unused(&used), Some(PlayerColor::Blue));

        let used = [PlayerColor::Red, PlayerColor::Blue];
        assert_eq!(PlayerColor::first_unused(&used), Some(PlayerColor::Green));

        assert_eq!(PlayerColor::first_unused(&PlayerColor::PALETTE), None);
        assert_eq!(PlayerColor::first_unused(&[]), Some(PlayerColor::Red));
    }

    #[test]
    fn test_color_serializes_lowercase() {
        let json = serde_json::to_string(&PlayerColor::Yellow).unwrap();
        assert_eq!(json, "\"yellow\"");
        assert_eq!(PlayerColor::Blue.to_string(), "blue");
    }
}
