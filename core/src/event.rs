use serde::{Deserialize, Serialize};

use crate::*;

/// Transition reported by a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellEventKind {
    Opened,
    Flagged,
    Unflagged,
    Exploded,
    Reset,
}

/// Plain copy of a cell's own state, taken when an event is emitted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub mined: bool,
    pub opened: bool,
    pub flagged: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEvent {
    pub coords: Coord2,
    pub kind: CellEventKind,
    pub cell: CellState,
    pub mined_neighbors: u8,
}

/// Round outcome reported by the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardEvent {
    Win,
    Loss,
}

/// Receives every event emitted by the cell it is subscribed to.
///
/// Listeners run synchronously inside the action that caused the event, in
/// registration order. The board is borrowed for the whole action, so a
/// listener observes but never re-enters it.
pub trait CellListener {
    fn on_cell_event(&mut self, event: &CellEvent);
}

impl<F> CellListener for F
where
    F: FnMut(&CellEvent),
{
    fn on_cell_event(&mut self, event: &CellEvent) {
        self(event)
    }
}

/// Receives win/loss notifications from a board.
pub trait BoardListener {
    fn on_board_event(&mut self, event: BoardEvent);
}

impl<F> BoardListener for F
where
    F: FnMut(BoardEvent),
{
    fn on_board_event(&mut self, event: BoardEvent) {
        self(event)
    }
}
