use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use smallvec::SmallVec;

use crate::*;

/// One grid position.
///
/// A cell knows its own state and the coordinates of its neighbors; anything
/// that has to look at the neighbors themselves (mined-neighbor count,
/// cascade) goes through the [`Board`] that owns the grid.
pub struct Cell {
    coords: Coord2,
    mined: bool,
    opened: bool,
    flagged: bool,
    neighbors: SmallVec<[Coord2; 8]>,
    listeners: Vec<Box<dyn CellListener>>,
}

impl Cell {
    pub(crate) fn new(coords: Coord2) -> Self {
        Self {
            coords,
            mined: false,
            opened: false,
            flagged: false,
            neighbors: SmallVec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn coords(&self) -> Coord2 {
        self.coords
    }

    pub fn is_mined(&self) -> bool {
        self.mined
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn is_closed(&self) -> bool {
        !self.opened
    }

    pub fn is_unflagged(&self) -> bool {
        !self.flagged
    }

    pub fn is_safe(&self) -> bool {
        !self.mined
    }

    /// Safe cells must be open and mined cells must be flagged.
    pub fn goal_reached(&self) -> bool {
        (self.is_safe() && self.opened) || (self.mined && self.flagged)
    }

    pub fn neighbors(&self) -> &[Coord2] {
        &self.neighbors
    }

    pub fn state(&self) -> CellState {
        CellState {
            mined: self.mined,
            opened: self.opened,
            flagged: self.flagged,
        }
    }

    /// No symmetry or duplicate checks, the board links each ordered pair once.
    pub(crate) fn add_neighbor(&mut self, other: Coord2) {
        self.neighbors.push(other);
    }

    pub(crate) fn subscribe(&mut self, listener: impl CellListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Opens the cell, returning the event to emit or `None` if it was open
    /// already. Flags do not block opening.
    pub(crate) fn open(&mut self) -> Option<CellEventKind> {
        if self.opened {
            return None;
        }
        self.opened = true;
        Some(if self.mined {
            CellEventKind::Exploded
        } else {
            CellEventKind::Opened
        })
    }

    pub(crate) fn toggle_flag(&mut self) -> Option<CellEventKind> {
        if self.opened {
            return None;
        }
        self.flagged = !self.flagged;
        Some(if self.flagged {
            CellEventKind::Flagged
        } else {
            CellEventKind::Unflagged
        })
    }

    pub(crate) fn plant_mine(&mut self) {
        self.mined = true;
    }

    /// Keeps neighbors and listeners.
    pub(crate) fn reset(&mut self) -> CellEventKind {
        self.opened = false;
        self.mined = false;
        self.flagged = false;
        CellEventKind::Reset
    }

    pub(crate) fn emit(&mut self, event: &CellEvent) {
        for listener in self.listeners.iter_mut() {
            listener.on_cell_event(event);
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("coords", &self.coords)
            .field("mined", &self.mined)
            .field("opened", &self.opened)
            .field("flagged", &self.flagged)
            .field("neighbors", &self.neighbors)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    #[test]
    fn open_is_guarded() {
        let mut cell = Cell::new((0, 0));

        assert_eq!(cell.open(), Some(CellEventKind::Opened));
        assert!(cell.is_opened());
        assert_eq!(cell.open(), None);
    }

    #[test]
    fn open_mined_cell_explodes() {
        let mut cell = Cell::new((0, 0));
        cell.plant_mine();

        assert_eq!(cell.open(), Some(CellEventKind::Exploded));
        assert!(cell.is_opened());
        assert!(!cell.goal_reached());
    }

    #[test]
    fn toggle_flag_alternates_until_opened() {
        let mut cell = Cell::new((0, 0));

        assert_eq!(cell.toggle_flag(), Some(CellEventKind::Flagged));
        assert_eq!(cell.toggle_flag(), Some(CellEventKind::Unflagged));
        assert_eq!(cell.toggle_flag(), Some(CellEventKind::Flagged));

        cell.open();
        assert_eq!(cell.toggle_flag(), None);
        assert!(cell.is_flagged());
    }

    #[test]
    fn flag_does_not_block_open() {
        let mut cell = Cell::new((0, 0));
        cell.toggle_flag();

        assert_eq!(cell.open(), Some(CellEventKind::Opened));
        assert!(cell.is_flagged());
        assert!(cell.goal_reached());
    }

    #[test]
    fn goal_reached_per_cell() {
        let mut safe = Cell::new((0, 0));
        assert!(!safe.goal_reached());
        safe.toggle_flag();
        assert!(!safe.goal_reached());
        safe.open();
        assert!(safe.goal_reached());

        let mut mined = Cell::new((0, 1));
        mined.plant_mine();
        assert!(!mined.goal_reached());
        mined.toggle_flag();
        assert!(mined.goal_reached());
    }

    #[test]
    fn reset_clears_state_but_keeps_links() {
        let mut cell = Cell::new((0, 0));
        cell.add_neighbor((0, 1));
        cell.subscribe(|_: &CellEvent| {});
        cell.plant_mine();
        cell.toggle_flag();
        cell.open();

        assert_eq!(cell.reset(), CellEventKind::Reset);
        assert_eq!(cell.state(), CellState::default());
        assert_eq!(cell.neighbors(), [(0, 1)]);
        assert_eq!(cell.listeners.len(), 1);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut cell = Cell::new((2, 3));
        for id in 0..3 {
            let seen = seen.clone();
            cell.subscribe(move |event: &CellEvent| seen.borrow_mut().push((id, event.kind)));
        }

        let kind = cell.toggle_flag().unwrap();
        cell.emit(&CellEvent {
            coords: cell.coords(),
            kind,
            cell: cell.state(),
            mined_neighbors: 0,
        });

        assert_eq!(
            *seen.borrow(),
            [
                (0, CellEventKind::Flagged),
                (1, CellEventKind::Flagged),
                (2, CellEventKind::Flagged),
            ]
        );
    }
}
