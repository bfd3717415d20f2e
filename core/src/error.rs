use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines, at least one cell must stay safe")]
    TooManyMines,
    #[error("Board must have at least one row and one column")]
    EmptyBoard,
}

pub type Result<T> = core::result::Result<T, GameError>;
