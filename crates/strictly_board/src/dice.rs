//! Six-sided dice and the rollers that produce them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// Faces of a die.
pub const DIE_FACES: std::ops::RangeInclusive<u8> = 1..=6;

/// Error constructing dice from explicit faces.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DiceError {
    /// A face value outside `1..=6`.
    #[display("Die face {value} is outside 1..=6")]
    FaceOutOfRange {
        /// The rejected value.
        value: u8,
    },
    /// A scripted roller needs at least one roll.
    #[display("Dice script is empty")]
    EmptyScript,
}

/// The two faces of one roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    die1: u8,
    die2: u8,
}

impl DiceRoll {
    /// Creates a roll, rejecting faces outside `1..=6`.
    pub fn new(die1: u8, die2: u8) -> Result<Self, DiceError> {
        for value in [die1, die2] {
            if !DIE_FACES.contains(&value) {
                return Err(DiceError::FaceOutOfRange { value });
            }
        }
        Ok(Self { die1, die2 })
    }

    /// First die.
    pub fn die1(&self) -> u8 {
        self.die1
    }

    /// Second die.
    pub fn die2(&self) -> u8 {
        self.die2
    }

    /// Sum of both faces.
    pub fn total(&self) -> usize {
        usize::from(self.die1) + usize::from(self.die2)
    }

    /// Both faces show the same value.
    pub fn is_double(&self) -> bool {
        self.die1 == self.die2
    }
}

/// Source of dice rolls.
///
/// Implementations are shared between sessions, so they take `&self`.
pub trait DiceRoller: Send + Sync + std::fmt::Debug {
    /// Rolls two independent dice.
    fn roll(&self) -> DiceRoll;
}

/// Uniform random dice.
///
/// Unseeded dice draw from the calling thread's generator, so sessions
/// rolling in parallel share no lock. Seeded dice share one generator to
/// keep the sequence reproducible.
#[derive(Debug, Default)]
pub struct RandomDice {
    seeded: Option<Mutex<StdRng>>,
}

impl RandomDice {
    /// Dice drawing from the thread-local generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible dice.
    #[instrument]
    pub fn seeded(seed: u64) -> Self {
        debug!(seed, "Seeding dice");
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Whether rolls follow a fixed seed.
    pub fn is_seeded(&self) -> bool {
        self.seeded.is_some()
    }

    fn draw(rng: &mut impl Rng) -> DiceRoll {
        let die1 = rng.gen_range(DIE_FACES);
        let die2 = rng.gen_range(DIE_FACES);
        DiceRoll { die1, die2 }
    }
}

impl DiceRoller for RandomDice {
    fn roll(&self) -> DiceRoll {
        match &self.seeded {
            Some(rng) => Self::draw(&mut *rng.lock().unwrap_or_else(PoisonError::into_inner)),
            None => Self::draw(&mut rand::thread_rng()),
        }
    }
}

/// Dice that replay a fixed script, cycling when it runs out.
#[derive(Debug)]
pub struct ScriptedDice {
    script: Mutex<VecDeque<DiceRoll>>,
}

impl ScriptedDice {
    /// Creates dice from `(die1, die2)` pairs.
    pub fn new(rolls: impl IntoIterator<Item = (u8, u8)>) -> Result<Self, DiceError> {
        let script = rolls
            .into_iter()
            .map(|(a, b)| DiceRoll::new(a, b))
            .collect::<Result<VecDeque<_>, _>>()?;
        if script.is_empty() {
            return Err(DiceError::EmptyScript);
        }
        Ok(Self {
            script: Mutex::new(script),
        })
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&self) -> DiceRoll {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        // Never empty: checked in `new` and every pop is pushed back.
        match script.pop_front() {
            Some(roll) => {
                script.push_back(roll);
                roll
            }
            None => DiceRoll { die1: 1, die2: 1 },
        }
    }
}
