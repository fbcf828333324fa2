//! Actions players submit and the effects they produce.
//!
//! An [`Action`] is a request: a kind tag plus kind-specific fields. It is
//! evaluated into a [`Delta`] without touching the session, and only then
//! applied by the turn engine.

use crate::{GameError, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Every action kind the game knows about.
///
/// Only kinds with a registered handler can be played; the others are
/// reserved for the full rule set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Roll two dice and move.
    RollDice,
    /// Buy the space the player stands on.
    BuyProperty,
    /// Pay rent to a space owner.
    PayRent,
    /// Draw a chance or community chest card.
    DrawCard,
}

/// A request from a player to affect session state.
///
/// Serialized flat: `{"kind": "ROLL_DICE", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Kind tag as sent by the client.
    pub kind: String,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Action {
    /// Creates an action with no extra fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// The dice roll action.
    pub fn roll_dice() -> Self {
        Self::new(ActionKind::RollDice.to_string())
    }

    /// Adds a kind-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Resolves the kind tag.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownActionKind`] if the tag names no kind.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn parse_kind(&self) -> Result<ActionKind, GameError> {
        ActionKind::from_str(&self.kind).map_err(|_| {
            debug!("Unrecognized action kind");
            GameError::UnknownActionKind {
                kind: self.kind.clone(),
            }
        })
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind.to_string())
    }
}

/// Outcome of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// First die.
    pub die1: u8,
    /// Second die.
    pub die2: u8,
    /// Position before moving.
    pub old_position: usize,
    /// Position after moving.
    pub new_position: usize,
    /// Whether the move passed or landed on start.
    pub passed_start: bool,
    /// Name of the space landed on.
    pub space: String,
}

impl RollOutcome {
    /// Sum of both dice.
    pub fn total(&self) -> usize {
        usize::from(self.die1) + usize::from(self.die2)
    }
}

/// Descriptive result of an applied action, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionResult {
    /// Result of [`ActionKind::RollDice`].
    RollDice(RollOutcome),
}

impl ActionResult {
    /// The kind of action that produced this result.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::RollDice(_) => ActionKind::RollDice,
        }
    }
}

/// Pure, not yet applied effect of an action on the acting player.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct Delta {
    /// Position the player ends on.
    pub new_position: usize,
    /// Signed change to the player's balance.
    pub money_change: i64,
    /// What happened, for the caller and the audit record.
    pub result: ActionResult,
}

/// Audit record of the most recently applied action.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
pub struct LastAction {
    /// Kind of action.
    kind: ActionKind,
    /// Player who acted.
    player_id: PlayerId,
    /// Result reported to the player.
    result: ActionResult,
    /// When the action was applied.
    timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kind() {
        assert_eq!(Action::roll_dice().parse_kind(), Ok(ActionKind::RollDice));
        assert_eq!(
            Action::new("BUY_PROPERTY").parse_kind(),
            Ok(ActionKind::BuyProperty)
        );
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = Action::new("TELEPORT").parse_kind().unwrap_err();
        assert_eq!(
            err,
            GameError::UnknownActionKind {
                kind: "TELEPORT".to_string()
            }
        );
    }

    #[test]
    fn test_action_wire_format_is_flat() {
        let action: Action =
            serde_json::from_str(r#"{"kind":"PAY_RENT","owner":"p2","amount":50}"#).unwrap();
        assert_eq!(action.kind, "PAY_RENT");
        assert_eq!(action.fields["owner"], "p2");

        let json = serde_json::to_value(Action::roll_dice().with_field("note", "hi")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "ROLL_DICE", "note": "hi"}));
    }

    #[test]
    fn test_result_is_tagged_with_kind() {
        let result = ActionResult::RollDice(RollOutcome {
            die1: 3,
            die2: 4,
            old_position: 0,
            new_position: 7,
            passed_start: false,
            space: "Chance".to_string(),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "ROLL_DICE");
        assert_eq!(json["die1"], 3);
        assert_eq!(json["passed_start"], false);
        assert_eq!(result.kind(), ActionKind::RollDice);
    }
}
