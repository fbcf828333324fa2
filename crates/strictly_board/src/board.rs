//! The circular game board and its position arithmetic.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::instrument;

/// Number of spaces on the board.
pub const BOARD_SIZE: usize = 40;

/// Index of the start space ("GO").
pub const START_SPACE: usize = 0;

/// Credit awarded for passing or landing on the start space.
pub const PASS_START_BONUS: i64 = 200;

/// Color group of a street property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorGroup {
    /// Brown streets.
    Brown,
    /// Light blue streets.
    LightBlue,
    /// Pink streets.
    Pink,
    /// Orange streets.
    Orange,
    /// Red streets.
    Red,
    /// Yellow streets.
    Yellow,
    /// Green streets.
    Green,
    /// Dark blue streets.
    DarkBlue,
}

/// What kind of space a board index holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpaceKind {
    /// The start corner.
    Go,
    /// A street in a color group.
    Property {
        /// Color group.
        group: ColorGroup,
        /// Purchase price.
        price: u32,
    },
    /// A railroad.
    Railroad {
        /// Purchase price.
        price: u32,
    },
    /// A utility.
    Utility {
        /// Purchase price.
        price: u32,
    },
    /// A tax space.
    Tax {
        /// Amount owed when landing.
        amount: u32,
    },
    /// Draw a chance card.
    Chance,
    /// Draw a community chest card.
    CommunityChest,
    /// Jail (or just visiting).
    Jail,
    /// Free parking corner.
    FreeParking,
    /// Go-to-jail corner.
    GoToJail,
}

/// A single space on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Space {
    index: usize,
    name: String,
    kind: SpaceKind,
}

impl Space {
    fn new(index: usize, name: &str, kind: SpaceKind) -> Self {
        Self {
            index,
            name: name.to_string(),
            kind,
        }
    }

    /// Whether the space can be owned by a player.
    pub fn is_ownable(&self) -> bool {
        matches!(
            self.kind,
            SpaceKind::Property { .. } | SpaceKind::Railroad { .. } | SpaceKind::Utility { .. }
        )
    }
}

/// Result of moving a token forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    /// Position after the move, in `[0, BOARD_SIZE)`.
    pub position: usize,
    /// Whether the move crossed or landed on the start space.
    pub passed_start: bool,
    /// Number of times the move wrapped past the start space.
    pub laps: usize,
}

static CLASSIC: LazyLock<Board> = LazyLock::new(Board::build_classic);

/// Fixed-size circular board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    spaces: Vec<Space>,
}

impl Board {
    /// The classic 40-space layout.
    pub fn classic() -> &'static Board {
        &CLASSIC
    }

    fn build_classic() -> Self {
        use ColorGroup::*;
        use SpaceKind::*;

        let street = |group, price| Property { group, price };
        let layout: [(&str, SpaceKind); BOARD_SIZE] = [
            ("GO", Go),
            ("Mediterranean Avenue", street(Brown, 60)),
            ("Community Chest", CommunityChest),
            ("Baltic Avenue", street(Brown, 60)),
            ("Income Tax", Tax { amount: 200 }),
            ("Reading Railroad", Railroad { price: 200 }),
            ("Oriental Avenue", street(LightBlue, 100)),
            ("Chance", Chance),
            ("Vermont Avenue", street(LightBlue, 100)),
            ("Connecticut Avenue", street(LightBlue, 120)),
            ("Jail", Jail),
            ("St. Charles Place", street(Pink, 140)),
            ("Electric Company", Utility { price: 150 }),
            ("States Avenue", street(Pink, 140)),
            ("Virginia Avenue", street(Pink, 160)),
            ("Pennsylvania Railroad", Railroad { price: 200 }),
            ("St. James Place", street(Orange, 180)),
            ("Community Chest", CommunityChest),
            ("Tennessee Avenue", street(Orange, 180)),
            ("New York Avenue", street(Orange, 200)),
            ("Free Parking", FreeParking),
            ("Kentucky Avenue", street(Red, 220)),
            ("Chance", Chance),
            ("Indiana Avenue", street(Red, 220)),
            ("Illinois Avenue", street(Red, 240)),
            ("B. & O. Railroad", Railroad { price: 200 }),
            ("Atlantic Avenue", street(Yellow, 260)),
            ("Ventnor Avenue", street(Yellow, 260)),
            ("Water Works", Utility { price: 150 }),
            ("Marvin Gardens", street(Yellow, 280)),
            ("Go To Jail", GoToJail),
            ("Pacific Avenue", street(Green, 300)),
            ("North Carolina Avenue", street(Green, 300)),
            ("Community Chest", CommunityChest),
            ("Pennsylvania Avenue", street(Green, 320)),
            ("Short Line", Railroad { price: 200 }),
            ("Chance", Chance),
            ("Park Place", street(DarkBlue, 350)),
            ("Luxury Tax", Tax { amount: 100 }),
            ("Boardwalk", street(DarkBlue, 400)),
        ];

        Self {
            spaces: layout
                .iter()
                .enumerate()
                .map(|(index, (name, kind))| Space::new(index, name, *kind))
                .collect(),
        }
    }

    /// Number of spaces.
    pub fn size(&self) -> usize {
        self.spaces.len()
    }

    /// Looks up a space. Indices wrap around the board.
    pub fn space(&self, index: usize) -> &Space {
        &self.spaces[index % self.size()]
    }

    /// All spaces in board order.
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Moves a token `steps` spaces forward from `from`.
    ///
    /// Passing start is detected by counting wraps, so moves of a full lap
    /// or more are reported correctly. A zero-step move never passes start.
    #[instrument(skip(self))]
    pub fn advance(&self, from: usize, steps: usize) -> Advance {
        let size = self.size();
        let from = from % size;
        let partial = from + steps % size;
        let laps = steps / size + partial / size;

        Advance {
            position: partial % size,
            passed_start: laps > 0,
            laps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_board_layout() {
        let board = Board::classic();
        assert_eq!(board.size(), BOARD_SIZE);
        assert_eq!(*board.space(START_SPACE).kind(), SpaceKind::Go);
        assert_eq!(*board.space(10).kind(), SpaceKind::Jail);
        assert_eq!(*board.space(20).kind(), SpaceKind::FreeParking);
        assert_eq!(*board.space(30).kind(), SpaceKind::GoToJail);
        assert_eq!(board.space(39).name(), "Boardwalk");
    }

    #[test]
    fn test_space_indices_match_positions() {
        let board = Board::classic();
        for (i, space) in board.spaces().iter().enumerate() {
            assert_eq!(*space.index(), i);
        }
        assert_eq!(board.space(41).name(), board.space(1).name());
    }

    #[test]
    fn test_advance_without_wrap() {
        let advance = Board::classic().advance(10, 2);
        assert_eq!(advance.position, 12);
        assert!(!advance.passed_start);
        assert_eq!(advance.laps, 0);
    }

    #[test]
    fn test_advance_landing_on_start() {
        let board = Board::classic();
        let advance = board.advance(38, 2);
        assert_eq!(advance.position, 0);
        assert!(advance.passed_start);

        let advance = board.advance(39, 1);
        assert_eq!(advance.position, 0);
        assert!(advance.passed_start);
    }

    #[test]
    fn test_advance_multiple_laps() {
        let advance = Board::classic().advance(5, 85);
        assert_eq!(advance.position, 10);
        assert_eq!(advance.laps, 2);
        assert!(advance.passed_start);
    }

    #[test]
    fn test_zero_step_from_start_does_not_pass() {
        let advance = Board::classic().advance(0, 0);
        assert_eq!(advance.position, 0);
        assert!(!advance.passed_start);
    }

    #[test]
    fn test_ownable_spaces() {
        let board = Board::classic();
        assert!(board.space(1).is_ownable());
        assert!(board.space(5).is_ownable());
        assert!(!board.space(7).is_ownable());
        assert!(!board.space(0).is_ownable());
    }
}
