//! # Level Data
//!
//! The boundary with the dungeon-generation collaborator. A generator hands
//! the simulation a [`LevelData`] tile grid; the simulation instantiates
//! terrain entities from it once and keeps a small [`LevelInfo`] record
//! (bounds and stairs) for pathfinding and level transitions.

use serde::{Deserialize, Serialize};

use delve_core::{LocationKey, TileKind};

use crate::error::{SimError, SimResult};

/// Width and height of a level. Cells are `0..width` by `0..height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBounds {
    /// Columns.
    pub width: i32,
    /// Rows.
    pub height: i32,
}

impl LevelBounds {
    /// Creates new bounds.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if `(x, y)` lies inside the level.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        if self.width > 0 && self.height > 0 {
            self.width as usize * self.height as usize
        } else {
            0
        }
    }
}

/// Bookkeeping kept per loaded level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Level extent.
    pub bounds: LevelBounds,
    /// Where arrivals from below are placed.
    pub stairs_up: Option<LocationKey>,
    /// Where arrivals from above are placed.
    pub stairs_down: Option<LocationKey>,
}

/// Tile grid for one dungeon level, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelData {
    level: i32,
    bounds: LevelBounds,
    tiles: Vec<TileKind>,
}

impl LevelData {
    /// A level of the given size filled with one tile kind.
    #[must_use]
    pub fn filled(level: i32, width: i32, height: i32, kind: TileKind) -> Self {
        let bounds = LevelBounds::new(width, height);
        Self {
            level,
            bounds,
            tiles: vec![kind; bounds.area()],
        }
    }

    /// Parses an ASCII map: `#` wall, `.` floor, `<` stairs up, `>` stairs
    /// down. Short rows are padded with wall.
    ///
    /// # Errors
    ///
    /// [`SimError::BadTile`] for any other character.
    pub fn from_ascii(level: i32, map: &str) -> SimResult<Self> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut data = Self::filled(level, width as i32, rows.len() as i32, TileKind::Wall);

        for (row, line) in rows.iter().enumerate() {
            for (column, glyph) in line.chars().enumerate() {
                let kind = match glyph {
                    '#' | ' ' => TileKind::Wall,
                    '.' => TileKind::Floor,
                    '<' => TileKind::StairsUp,
                    '>' => TileKind::StairsDown,
                    _ => return Err(SimError::BadTile { glyph, row, column }),
                };
                data.set(column as i32, row as i32, kind);
            }
        }
        Ok(data)
    }

    /// Dungeon level number.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    /// Level extent.
    #[must_use]
    pub const fn bounds(&self) -> LevelBounds {
        self.bounds
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        self.bounds
            .contains(x, y)
            .then(|| (y * self.bounds.width + x) as usize)
    }

    /// Tile at `(x, y)`; `None` outside the level.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Option<TileKind> {
        self.offset(x, y).map(|i| self.tiles[i])
    }

    /// Overwrites one tile. Ignored outside the level.
    pub fn set(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some(i) = self.offset(x, y) {
            self.tiles[i] = kind;
        }
    }

    /// Every tile with its location key, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (LocationKey, TileKind)> + '_ {
        let width = self.bounds.width.max(1);
        self.tiles.iter().enumerate().map(move |(i, &kind)| {
            let i = i as i32;
            (LocationKey::new(i % width, i / width, self.level), kind)
        })
    }

    /// Non-wall cells, row by row.
    #[must_use]
    pub fn open_cells(&self) -> Vec<LocationKey> {
        self.tiles()
            .filter(|(_, kind)| !kind.is_blocking())
            .map(|(key, _)| key)
            .collect()
    }

    /// Plain floor cells, row by row. Candidates for spawning.
    #[must_use]
    pub fn floor_cells(&self) -> Vec<LocationKey> {
        self.tiles()
            .filter(|(_, kind)| *kind == TileKind::Floor)
            .map(|(key, _)| key)
            .collect()
    }

    fn first_of(&self, wanted: TileKind) -> Option<LocationKey> {
        self.tiles().find(|(_, kind)| *kind == wanted).map(|(key, _)| key)
    }

    /// Bookkeeping record for this level.
    #[must_use]
    pub fn info(&self) -> LevelInfo {
        LevelInfo {
            bounds: self.bounds,
            stairs_up: self.first_of(TileKind::StairsUp),
            stairs_down: self.first_of(TileKind::StairsDown),
        }
    }
}

/// Supplies tile data for a level the first time it is entered.
pub trait LevelSource {
    /// Produces the tiles for `level` (numbered downward from -1).
    ///
    /// # Errors
    ///
    /// [`SimError::MissingLevel`] if the source has nothing for `level`.
    fn generate(&mut self, level: i32) -> SimResult<LevelData>;
}

/// Level source backed by fixed ASCII maps. Level -1 uses the first map,
/// -2 the second, and so on; levels past the end reuse the last map.
#[derive(Clone, Debug, Default)]
pub struct AsciiLevels {
    maps: Vec<String>,
}

impl AsciiLevels {
    /// Creates a source from maps in descending-level order.
    #[must_use]
    pub fn new<S: Into<String>>(maps: impl IntoIterator<Item = S>) -> Self {
        Self {
            maps: maps.into_iter().map(Into::into).collect(),
        }
    }
}

impl LevelSource for AsciiLevels {
    fn generate(&mut self, level: i32) -> SimResult<LevelData> {
        if level >= 0 {
            return Err(SimError::MissingLevel(level));
        }
        let depth = (-level - 1) as usize;
        let map = self
            .maps
            .get(depth)
            .or_else(|| self.maps.last())
            .ok_or(SimError::MissingLevel(level))?;
        LevelData::from_ascii(level, map)
    }
}

/// Level source with no levels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLevels;

impl LevelSource for NoLevels {
    fn generate(&mut self, level: i32) -> SimResult<LevelData> {
        Err(SimError::MissingLevel(level))
    }
}
