//! Rules engine for a Minesweeper board.
//!
//! A [`Board`] owns a grid of [`Cell`]s, wires their neighborhoods, sows
//! mines, and turns per-cell events into win/loss notifications. Rendering is
//! left to whoever subscribes to those events.

#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use error::*;
pub use event::*;
pub use types::*;

mod board;
mod cell;
mod error;
mod event;
mod types;

/// Board dimensions and mine count, valid by construction.
///
/// Deserialization goes through [`GameConfig::new`] as well.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGameConfig")]
pub struct GameConfig {
    size: Coord2,
    mines: CellCount,
}

#[derive(Deserialize)]
struct RawGameConfig {
    size: Coord2,
    mines: CellCount,
}

impl TryFrom<RawGameConfig> for GameConfig {
    type Error = GameError;

    fn try_from(raw: RawGameConfig) -> Result<Self> {
        Self::new(raw.size, raw.mines)
    }
}

impl GameConfig {
    pub(crate) const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Rejects empty boards and layouts without a single safe cell, so mine
    /// sowing always terminates.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        if mines >= mult(size.0, size.1) {
            return Err(GameError::TooManyMines);
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((16, 30), 99)
    }

    /// `(rows, columns)`
    pub const fn size(&self) -> Coord2 {
        self.size
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
    Won,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
            Self::Won => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_full_boards() {
        assert_eq!(GameConfig::new((2, 2), 4), Err(GameError::TooManyMines));
        assert_eq!(GameConfig::new((2, 2), 5), Err(GameError::TooManyMines));
        assert!(GameConfig::new((2, 2), 3).is_ok());
    }

    #[test]
    fn config_rejects_empty_boards() {
        assert_eq!(GameConfig::new((0, 5), 0), Err(GameError::EmptyBoard));
        assert_eq!(GameConfig::new((5, 0), 0), Err(GameError::EmptyBoard));
    }

    #[test]
    fn config_allows_no_mines() {
        let config = GameConfig::new((1, 2), 0).unwrap();

        assert_eq!(config.total_cells(), 2);
        assert_eq!(config.safe_cells(), 2);
    }

    #[test]
    fn presets_pass_validation() {
        for preset in [
            GameConfig::beginner(),
            GameConfig::intermediate(),
            GameConfig::expert(),
        ] {
            assert_eq!(GameConfig::new(preset.size(), preset.mines()), Ok(preset));
        }
        assert_eq!(GameConfig::expert().total_cells(), 480);
    }

    #[test]
    fn deserialize_validates() {
        let config: GameConfig = serde_json::from_str(r#"{"size":[3,4],"mines":2}"#).unwrap();
        assert_eq!(config, GameConfig::new((3, 4), 2).unwrap());

        assert!(serde_json::from_str::<GameConfig>(r#"{"size":[0,3],"mines":1}"#).is_err());
        assert!(serde_json::from_str::<GameConfig>(r#"{"size":[2,2],"mines":4}"#).is_err());
    }

    #[test]
    fn serialized_config_reads_back() {
        let json = serde_json::to_string(&GameConfig::expert()).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back, GameConfig::expert());
    }

    #[test]
    fn outcomes_report_updates() {
        assert!(!RevealOutcome::NoChange.has_update());
        assert!(RevealOutcome::HitMine.has_update());
        assert!(!MarkOutcome::NoChange.has_update());
        assert!(MarkOutcome::Changed.has_update());
    }
}
