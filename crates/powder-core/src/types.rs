//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a record held in a partitioned store.
///
/// A handle keeps resolving to the same record no matter how the store
/// reorders its slots, until the record is removed. Released handles may be
/// handed out again by later insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u32);

impl Handle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A powder is addressed by its store handle.
pub type Powder = Handle;

/// Cell coordinate on the simulation grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
}

impl GridPos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Apply a signed offset. Returns `None` if either axis would go negative
    /// or overflow.
    pub fn offset(&self, delta: Offset) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(delta.dx)?,
            y: self.y.checked_add_signed(delta.dy)?,
        })
    }

    /// Chebyshev distance, so the 8 surrounding cells are all at distance 1.
    pub fn chebyshev_distance(&self, other: &GridPos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Signed translation between two grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// True if `pos` lies at least `margin` cells away from every edge.
    pub fn contains_interior(&self, pos: GridPos, margin: u32) -> bool {
        pos.x >= margin
            && pos.y >= margin
            && pos.x.saturating_add(margin) < self.width
            && pos.y.saturating_add(margin) < self.height
    }

    /// Row-major iterator over the cells at least `margin` away from every edge.
    pub fn interior(&self, margin: u32) -> impl Iterator<Item = GridPos> {
        let x_end = self.width.saturating_sub(margin);
        let y_end = self.height.saturating_sub(margin);
        (margin..y_end).flat_map(move |y| (margin..x_end).map(move |x| GridPos::new(x, y)))
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 8-bit RGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Direction to one of the 8 surrounding cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Grid rows grow downwards, so north is `dy = -1`.
    pub fn to_offset(&self) -> Offset {
        match self {
            Direction::North => Offset::new(0, -1),
            Direction::South => Offset::new(0, 1),
            Direction::East => Offset::new(1, 0),
            Direction::West => Offset::new(-1, 0),
            Direction::NorthEast => Offset::new(1, -1),
            Direction::NorthWest => Offset::new(-1, -1),
            Direction::SouthEast => Offset::new(1, 1),
            Direction::SouthWest => Offset::new(-1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::NorthEast,
            Direction::NorthWest,
            Direction::SouthEast,
            Direction::SouthWest,
        ]
    }
}
