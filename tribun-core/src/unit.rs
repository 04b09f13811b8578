//! Stacked units, the height table and normalization

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Legal sub-unit heights, indexed by their 3-bit code
pub const HEIGHTS: [u8; 7] = [0, 1, 2, 3, 4, 6, 8];

/// Largest legal height
pub const MAX_HEIGHT: u8 = 8;

/// Highest primary that may still hold a secondary
pub const MAX_MASTER_HEIGHT: u8 = 4;

const TRIBUN_BIT: u8 = 1 << 7;
const COLOR_BIT: u8 = 1 << 6;
const RESERVED_CODE: u8 = 7;

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn bit(self) -> u32 {
        self as u32
    }

    pub fn from_bit(bit: u32) -> Self {
        if bit & 1 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }
}

/// 3-bit code of a legal height
pub fn height_index(height: u8) -> Option<u8> {
    HEIGHTS.iter().position(|&h| h == height).map(|i| i as u8)
}

pub fn is_legal_height(height: u8) -> bool {
    height_index(height).is_some()
}

/// Round down to the nearest legal height (5 -> 4, 7 -> 6, 9+ -> 8)
pub fn round_height(height: u8) -> u8 {
    match height {
        0..=4 => height,
        5 => 4,
        6 | 7 => 6,
        _ => MAX_HEIGHT,
    }
}

/// Slave property: a primary may only carry `secondary` if it is small
/// enough to be a master and at least half the secondary's height.
pub fn satisfies_sp(primary: u8, secondary: u8) -> bool {
    secondary == 0 || (primary <= MAX_MASTER_HEIGHT && 2 * primary >= secondary)
}

/// A stack on one cell. The secondary, if any, is an enslaved unit
/// carried by the primary and moves with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub color: Color,
    pub tribun: bool,
    pub primary: u8,
    pub secondary: u8,
}

impl Unit {
    pub const fn new(color: Color, primary: u8) -> Self {
        Self {
            color,
            tribun: false,
            primary,
            secondary: 0,
        }
    }

    pub const fn tribun(color: Color, primary: u8) -> Self {
        Self {
            color,
            tribun: true,
            primary,
            secondary: 0,
        }
    }

    pub const fn with_secondary(mut self, secondary: u8) -> Self {
        self.secondary = secondary;
        self
    }

    /// Height of the primary or secondary sub-unit
    pub fn height(&self, part: crate::action::Part) -> u8 {
        match part {
            crate::action::Part::Primary => self.primary,
            crate::action::Part::Secondary => self.secondary,
        }
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary > 0
    }

    /// True if this unit is exactly what normalization would produce
    pub fn is_normal(&self) -> bool {
        normalize(*self) == Some(*self)
    }

    /// Pack into one byte: bit 7 tribun, bit 6 color, bits 5-3 secondary
    /// code, bits 2-0 primary code. Heights are rounded onto the table.
    pub fn to_byte(&self) -> u8 {
        let code = |h: u8| height_index(round_height(h)).unwrap_or(0);
        let mut byte = code(self.primary) | (code(self.secondary) << 3);
        if self.color == Color::Black {
            byte |= COLOR_BIT;
        }
        if self.tribun {
            byte |= TRIBUN_BIT;
        }
        byte
    }

    /// Unpack a byte; `Ok(None)` is an empty cell
    pub fn from_byte(byte: u8) -> Result<Option<Unit>, Error> {
        if byte == 0 {
            return Ok(None);
        }

        let primary_code = byte & 0x07;
        let secondary_code = (byte >> 3) & 0x07;
        if primary_code == RESERVED_CODE || secondary_code == RESERVED_CODE {
            return Err(Error::InvalidUnitByte(byte));
        }

        let primary = HEIGHTS[primary_code as usize];
        let secondary = HEIGHTS[secondary_code as usize];
        if primary == 0 && secondary == 0 {
            return Ok(None);
        }

        Ok(Some(Unit {
            color: if byte & COLOR_BIT != 0 { Color::Black } else { Color::White },
            tribun: byte & TRIBUN_BIT != 0,
            primary,
            secondary,
        }))
    }
}

/// Canonicalize a hypothetical unit whose heights may be illegal.
///
/// Heights are rounded down onto the table, a primary that cannot carry
/// its secondary is dropped to zero, and a secondary left without a
/// primary is liberated: it becomes an opposite-color, non-tribun primary.
/// `None` means the cell is empty.
pub fn normalize(unit: Unit) -> Option<Unit> {
    let mut primary = round_height(unit.primary);
    let secondary = round_height(unit.secondary);

    if !satisfies_sp(primary, secondary) {
        primary = 0;
    }

    if primary == 0 && secondary > 0 {
        return Some(Unit {
            color: unit.color.opponent(),
            tribun: false,
            primary: secondary,
            secondary: 0,
        });
    }

    if primary == 0 {
        return None;
    }

    Some(Unit {
        color: unit.color,
        tribun: unit.tribun,
        primary,
        secondary,
    })
}
