use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl BoardState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Grid of cells plus the win/loss bookkeeping built on their events.
///
/// The board is the first listener of every cell: each cell event is checked
/// against the round outcome before the cell's own listeners see it.
pub struct Board {
    config: GameConfig,
    cells: Array2<Cell>,
    listeners: Vec<Box<dyn BoardListener>>,
    rng: SmallRng,
    state: BoardState,
}

impl Board {
    /// Builds the grid and sows `config.mines()` mines using `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut board = Self::build(config, seed);
        board.sow_mines();
        board
    }

    /// Builds a board whose first round uses the given mine positions.
    ///
    /// Duplicate positions count once. Rounds started by [`Board::reset`]
    /// sow randomly from `seed`.
    pub fn with_mines(size: Coord2, mines: &[Coord2], seed: u64) -> Result<Self> {
        let empty = GameConfig::new(size, 0)?;
        let mut board = Self::build(empty, seed);
        for &coords in mines {
            let coords = board.validate_coords(coords)?;
            board.cells[coords.to_nd_index()].plant_mine();
        }
        let planted = board.cells.iter().filter(|cell| cell.is_mined()).count();
        board.config = GameConfig::new(size, planted as CellCount)?;
        Ok(board)
    }

    fn build(config: GameConfig, seed: u64) -> Self {
        let size = config.size();
        let mut cells = Array2::from_shape_fn(size.to_nd_index(), |(row, col)| {
            Cell::new((row as Coord, col as Coord))
        });

        for cell in cells.iter_mut() {
            for neighbor in NeighborIter::new(cell.coords(), size) {
                cell.add_neighbor(neighbor);
            }
        }
        log::debug!("Built {}x{} board", size.0, size.1);

        Self {
            config,
            cells,
            listeners: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
            state: BoardState::default(),
        }
    }

    /// Rejection sampling: picks already mined are rolled again.
    fn sow_mines(&mut self) {
        let (rows, cols) = self.config.size();
        let mut planted: CellCount = 0;
        let mut rejected: usize = 0;

        while planted < self.config.mines() {
            let coords = (
                self.rng.random_range(0..rows),
                self.rng.random_range(0..cols),
            );
            let cell = &mut self.cells[coords.to_nd_index()];
            if cell.is_safe() {
                cell.plant_mine();
                planted += 1;
            } else {
                rejected += 1;
            }
        }
        log::debug!("Sowed {} mines, {} picks rejected", planted, rejected);
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn rows(&self) -> Coord {
        self.config.size().0
    }

    pub fn columns(&self) -> Coord {
        self.config.size().1
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines()
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn flag_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_flagged()).count() as CellCount
    }

    pub fn mines_left(&self) -> isize {
        (self.config.mines() as isize) - (self.flag_count() as isize)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (rows, cols) = self.config.size();
        if coords.0 < rows && coords.1 < cols {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell(&self, coords: Coord2) -> Option<&Cell> {
        let coords = self.validate_coords(coords).ok()?;
        Some(&self.cells[coords.to_nd_index()])
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn for_each_cell(&self, callback: impl FnMut(&Cell)) {
        self.cells.iter().for_each(callback)
    }

    pub fn mined_neighbor_count(&self, coords: Coord2) -> Result<u8> {
        let coords = self.validate_coords(coords)?;
        Ok(self.count_mined_neighbors(&self.cells[coords.to_nd_index()]))
    }

    /// True when no neighbor of the cell holds a mine.
    pub fn neighborhood_safe(&self, coords: Coord2) -> Result<bool> {
        let coords = self.validate_coords(coords)?;
        Ok(self.is_neighborhood_safe(&self.cells[coords.to_nd_index()]))
    }

    /// Every safe cell is open and every mine is flagged.
    pub fn goal_reached(&self) -> bool {
        self.cells.iter().all(Cell::goal_reached)
    }

    pub fn subscribe(&mut self, listener: impl BoardListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn subscribe_cell(
        &mut self,
        coords: Coord2,
        listener: impl CellListener + 'static,
    ) -> Result<()> {
        let coords = self.validate_coords(coords)?;
        self.cells[coords.to_nd_index()].subscribe(listener);
        Ok(())
    }

    /// Subscribes one listener per cell, built by `make_listener` in
    /// row-major order.
    pub fn subscribe_each_cell<L>(&mut self, mut make_listener: impl FnMut(Coord2) -> L)
    where
        L: CellListener + 'static,
    {
        for cell in self.cells.iter_mut() {
            let listener = make_listener(cell.coords());
            cell.subscribe(listener);
        }
    }

    /// Opens the cell at `coords` and cascades through mine-free
    /// neighborhoods.
    ///
    /// A cell passes the cascade on only when none of its own neighbors is
    /// mined, so cells bordering a mine open but stay a boundary. Cells are
    /// marked open before anything is pushed past them, which is what keeps
    /// the walk over the symmetric neighbor graph finite. Eligible neighbors
    /// go on the stack in reverse so events come out depth-first in neighbor
    /// order.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        if self.cells[coords.to_nd_index()].is_opened() {
            return Ok(RevealOutcome::NoChange);
        }

        let mut pending = vec![coords];
        let mut opened = 0usize;
        while let Some(pos) = pending.pop() {
            let Some(kind) = self.cells[pos.to_nd_index()].open() else {
                continue;
            };
            opened += 1;
            log::trace!("{:?} {:?}", pos, kind);
            self.emit_cell_event(pos, kind);

            // only the starting cell can be mined, the cascade skips mines
            if kind == CellEventKind::Exploded {
                continue;
            }

            let cell = &self.cells[pos.to_nd_index()];
            if self.is_neighborhood_safe(cell) {
                pending.extend(cell.neighbors().iter().rev().copied().filter(|&neighbor| {
                    let neighbor = &self.cells[neighbor.to_nd_index()];
                    neighbor.is_closed() && neighbor.is_safe()
                }));
            }
        }

        if opened > 1 {
            log::debug!("Cascade from {:?} opened {} cells", coords, opened);
        }

        Ok(if self.cells[coords.to_nd_index()].is_mined() {
            RevealOutcome::HitMine
        } else if self.goal_reached() {
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        let Some(kind) = self.cells[coords.to_nd_index()].toggle_flag() else {
            return Ok(MarkOutcome::NoChange);
        };
        log::trace!("{:?} {:?}", coords, kind);
        self.emit_cell_event(coords, kind);

        Ok(if self.goal_reached() {
            MarkOutcome::Won
        } else {
            MarkOutcome::Changed
        })
    }

    /// Starts a new round on the same cells and neighbor graph.
    ///
    /// Only `Reset` events go out and sowing emits nothing, so no win/loss
    /// check runs against the half-reset grid.
    pub fn reset(&mut self) {
        for coords in self.iter_coords() {
            let kind = self.cells[coords.to_nd_index()].reset();
            self.emit_cell_event(coords, kind);
        }
        self.sow_mines();
        self.state = BoardState::InProgress;
        log::debug!("Board reset");
    }

    fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (rows, cols) = self.config.size();
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    fn count_mined_neighbors(&self, cell: &Cell) -> u8 {
        cell.neighbors()
            .iter()
            .filter(|&&pos| self.cells[pos.to_nd_index()].is_mined())
            .count() as u8
    }

    fn is_neighborhood_safe(&self, cell: &Cell) -> bool {
        cell.neighbors()
            .iter()
            .all(|&pos| self.cells[pos.to_nd_index()].is_safe())
    }

    fn emit_cell_event(&mut self, coords: Coord2, kind: CellEventKind) {
        let cell = &self.cells[coords.to_nd_index()];
        let event = CellEvent {
            coords,
            kind,
            cell: cell.state(),
            mined_neighbors: self.count_mined_neighbors(cell),
        };
        self.handle_cell_event(&event);
        self.cells[coords.to_nd_index()].emit(&event);
    }

    fn handle_cell_event(&mut self, event: &CellEvent) {
        use CellEventKind::*;

        match event.kind {
            Exploded => self.finish_round(BoardEvent::Loss),
            Opened | Flagged | Unflagged => {
                if self.goal_reached() {
                    self.finish_round(BoardEvent::Win);
                }
            }
            Reset => {}
        }
    }

    /// The round keeps its first outcome, listeners hear every detection.
    fn finish_round(&mut self, event: BoardEvent) {
        if !self.state.is_finished() {
            self.state = match event {
                BoardEvent::Win => BoardState::Won,
                BoardEvent::Loss => BoardState::Lost,
            };
            log::info!("Round finished: {:?}", self.state);
        }

        for listener in self.listeners.iter_mut() {
            listener.on_board_event(event);
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
