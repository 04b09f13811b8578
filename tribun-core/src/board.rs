//! Hex board geometry with axial coordinates and the cell-indexed board

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::unit::{Color, Unit};

/// Board radius (distance from center to edge)
pub const BOARD_RADIUS: i8 = 5;

/// Width of the square index space that cell ids are drawn from
const SPAN: i8 = 2 * BOARD_RADIUS + 1;

/// Number of cell-id slots (11 x 11). Only 91 of them are on the hexagon.
pub const CELLS: usize = (SPAN as usize) * (SPAN as usize);

/// Neighbor vectors (dx, dy), in rotational order
pub const DIRECTIONS: [(i8, i8); 6] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
];

/// Diagonal vectors between two neighbor directions, distance 2
pub const DIAGONALS: [(i8, i8); 6] = [
    (2, 1),
    (1, 2),
    (-1, 1),
    (-2, -1),
    (-1, -2),
    (1, -1),
];

/// Distance-3 cells that lie on no straight line or diagonal
pub const KNIGHT_JUMPS: [(i8, i8); 12] = [
    (1, 3),
    (2, 3),
    (3, 1),
    (3, 2),
    (2, -1),
    (1, -2),
    (-1, -3),
    (-2, -3),
    (-3, -1),
    (-3, -2),
    (-2, 1),
    (-1, 2),
];

/// Axial hex coordinates; the third axis is `z = y - x`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
}

impl Coord {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub fn z(&self) -> i8 {
        self.y - self.x
    }

    /// Check if this coordinate is on the board
    pub fn on_board(&self) -> bool {
        on_board(self.x, self.y)
    }

    /// Distance from center (0,0)
    pub fn distance_to_center(&self) -> i8 {
        self.x.abs().max(self.y.abs()).max(self.z().abs())
    }

    pub fn offset(&self, (dx, dy): (i8, i8)) -> Coord {
        Coord::new(self.x + dx, self.y + dy)
    }
}

/// True iff `max(|x|, |y|, |y - x|) <= 5`
pub fn on_board(x: i8, y: i8) -> bool {
    let (x, y) = (i16::from(x), i16::from(y));
    let limit = i16::from(BOARD_RADIUS);
    x.abs() <= limit && y.abs() <= limit && (y - x).abs() <= limit
}

/// Compact cell handle, `(x + 5) * 11 + (y + 5)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Cid(u8);

impl Cid {
    /// Encode an on-board coordinate
    pub fn encode(x: i8, y: i8) -> Result<Cid, Error> {
        if !on_board(x, y) {
            return Err(Error::OutOfRange { x, y });
        }
        Ok(Cid(((x + BOARD_RADIUS) * SPAN + (y + BOARD_RADIUS)) as u8))
    }

    pub fn from_coord(coord: Coord) -> Result<Cid, Error> {
        Cid::encode(coord.x, coord.y)
    }

    /// Validate a raw index
    pub fn new(index: u8) -> Result<Cid, Error> {
        if usize::from(index) >= CELLS {
            return Err(Error::CidOutOfRange(index));
        }
        let coord = raw_coord(index);
        if !coord.on_board() {
            return Err(Error::CidOutOfRange(index));
        }
        Ok(Cid(index))
    }

    pub fn coord(self) -> Coord {
        raw_coord(self.0)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    /// Cell reached by adding `offset`, if it is on the board
    pub fn step(self, offset: (i8, i8)) -> Option<Cid> {
        Cid::from_coord(self.coord().offset(offset)).ok()
    }

    /// Neighbor in direction (0-5)
    pub fn neighbor(self, direction: u8) -> Option<Cid> {
        DIRECTIONS
            .get(usize::from(direction))
            .and_then(|&offset| self.step(offset))
    }

    /// Every on-board cell in ascending index order
    pub fn all() -> impl Iterator<Item = Cid> {
        (0..CELLS as u8).filter_map(|index| Cid::new(index).ok())
    }
}

/// Decode a cell id into coordinates
pub fn decode(cid: u8) -> Result<(i8, i8), Error> {
    let coord = Cid::new(cid)?.coord();
    Ok((coord.x, coord.y))
}

fn raw_coord(index: u8) -> Coord {
    let index = index as i8;
    Coord::new(index / SPAN - BOARD_RADIUS, index % SPAN - BOARD_RADIUS)
}

impl TryFrom<u8> for Cid {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Cid::new(index)
    }
}

impl From<Cid> for u8 {
    fn from(cid: Cid) -> u8 {
        cid.0
    }
}

/// Fixed array of unit-or-empty slots indexed by cell id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Unit>; CELLS],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub const fn empty() -> Self {
        Self {
            cells: [None; CELLS],
        }
    }

    /// Default opening: black holds the low corner, white the mirrored
    /// high corner, each with a height-1 tribun on its corner cell.
    pub fn opening() -> Self {
        // (x, y, height), black side; white is the point mirror
        const LAYOUT: [(i8, i8, u8); 10] = [
            (-5, -5, 1),
            (-5, -4, 2),
            (-4, -5, 2),
            (-5, -3, 3),
            (-4, -4, 4),
            (-3, -5, 3),
            (-5, -2, 1),
            (-4, -3, 1),
            (-3, -4, 1),
            (-2, -5, 1),
        ];

        let mut board = Board::empty();
        for (i, &(x, y, height)) in LAYOUT.iter().enumerate() {
            for (color, sign) in [(Color::Black, 1), (Color::White, -1)] {
                let unit = if i == 0 {
                    Unit::tribun(color, height)
                } else {
                    Unit::new(color, height)
                };
                if let Ok(cid) = Cid::encode(sign * x, sign * y) {
                    board.set(cid, Some(unit));
                }
            }
        }
        board
    }

    pub fn get(&self, cid: Cid) -> Option<Unit> {
        self.cells[cid.index()]
    }

    pub fn set(&mut self, cid: Cid, unit: Option<Unit>) {
        self.cells[cid.index()] = unit;
    }

    pub fn is_empty(&self, cid: Cid) -> bool {
        self.cells[cid.index()].is_none()
    }

    /// Occupied cells in ascending index order
    pub fn units(&self) -> impl Iterator<Item = (Cid, Unit)> + '_ {
        Cid::all().filter_map(move |cid| self.get(cid).map(|unit| (cid, unit)))
    }

    pub fn tribun_of(&self, color: Color) -> Option<Cid> {
        self.units()
            .find(|(_, unit)| unit.tribun && unit.color == color)
            .map(|(cid, _)| cid)
    }

    /// Sum of primary heights owned by `color`
    pub fn material(&self, color: Color) -> u32 {
        self.units()
            .filter(|(_, unit)| unit.color == color)
            .map(|(_, unit)| u32::from(unit.primary))
            .sum()
    }

    /// One packed unit byte per cell-id slot (0 = empty)
    pub fn pack(&self) -> [u8; CELLS] {
        let mut bytes = [0u8; CELLS];
        for (slot, cell) in bytes.iter_mut().zip(self.cells.iter()) {
            *slot = cell.map_or(0, |unit| unit.to_byte());
        }
        bytes
    }

    /// Inverse of `pack`. Off-board slots must be zero and every unit
    /// must already be in normal form.
    pub fn unpack(bytes: &[u8]) -> Result<Board, Error> {
        if bytes.len() != CELLS {
            return Err(Error::InvalidBoard(format!(
                "expected {} bytes, got {}",
                CELLS,
                bytes.len()
            )));
        }

        let mut board = Board::empty();
        for (index, &byte) in bytes.iter().enumerate() {
            let unit = Unit::from_byte(byte)?;
            let Some(unit) = unit else {
                continue;
            };
            let cid = Cid::new(index as u8)
                .map_err(|_| Error::InvalidBoard(format!("unit on off-board slot {}", index)))?;
            if !unit.is_normal() {
                return Err(Error::InvalidBoard(format!(
                    "unit {:?} at slot {} is not in normal form",
                    unit, index
                )));
            }
            board.set(cid, Some(unit));
        }
        Ok(board)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.pack())
    }

    pub fn from_base64(text: &str) -> Result<Board, Error> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| Error::InvalidBoard(format!("bad base64: {}", e)))?;
        Board::unpack(&bytes)
    }
}

/// Pack a board for transport
pub fn pack_board(board: &Board) -> String {
    board.to_base64()
}

/// Unpack a transport board
pub fn unpack_board(text: &str) -> Result<Board, Error> {
    Board::from_base64(text)
}
