//! Grid model parsed from a level's text map
//!
//! Map symbols:
//! - `#` wall, ` ` void (neither can be entered)
//! - `S` spawn (exactly one)
//! - `+` switch
//! - `-` / `|` corridor (both are traversable in every direction)
//! - any palette tag, e.g. `G`, delivery target of that colour
//!
//! Rows shorter than the widest row are padded with void, so the grid is
//! always rectangular once loaded.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::level::LevelError;

/// Cardinal directions, in the order switches evaluate them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit step on the grid (y grows downward)
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, -1),
            Direction::East => IVec2::new(1, 0),
            Direction::South => IVec2::new(0, 1),
            Direction::West => IVec2::new(-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

/// Colour/kind tag shared by carts and delivery targets (the map symbol)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTag(pub char);

impl ColorTag {
    /// Symbols the map grammar already uses; a palette can't claim them
    pub const RESERVED: [char; 6] = ['#', ' ', 'S', '+', '-', '|'];

    pub fn is_reserved(&self) -> bool {
        Self::RESERVED.contains(&self.0)
    }
}

impl std::fmt::Display for ColorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Wall,
    Void,
    Corridor,
    Spawn,
    Switch,
    Target(ColorTag),
}

impl CellKind {
    fn parse(symbol: char, palette: &[ColorTag]) -> Option<Self> {
        let kind = match symbol {
            '#' => CellKind::Wall,
            ' ' => CellKind::Void,
            'S' => CellKind::Spawn,
            '+' => CellKind::Switch,
            '-' | '|' => CellKind::Corridor,
            c if palette.contains(&ColorTag(c)) => CellKind::Target(ColorTag(c)),
            _ => return None,
        };
        Some(kind)
    }

    /// Walls and void block movement; everything else can be entered
    pub fn is_traversable(&self) -> bool {
        !matches!(self, CellKind::Wall | CellKind::Void)
    }
}

/// A delivery target cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub pos: IVec2,
    pub color: ColorTag,
}

/// Parsed, immutable level grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    /// Row-major cell kinds
    cells: Vec<CellKind>,
    /// Original symbols, kept for text rendering
    symbols: Vec<char>,
    spawn: IVec2,
    switches: Vec<IVec2>,
    targets: Vec<Target>,
}

impl Grid {
    /// Parse map rows into a grid.
    ///
    /// Exactly one spawn is accepted; a second `S` is a load error rather
    /// than "first wins", so a typo in a level file can't go unnoticed.
    pub fn load<S: AsRef<str>>(rows: &[S], palette: &[ColorTag]) -> Result<Self, LevelError> {
        let width = rows
            .iter()
            .map(|r| r.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        if width == 0 {
            return Err(LevelError::EmptyMap);
        }
        let height = rows.len();

        let mut cells = Vec::with_capacity(width * height);
        let mut symbols = Vec::with_capacity(width * height);
        let mut spawn: Option<IVec2> = None;
        let mut switches = Vec::new();
        let mut targets = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let mut chars = row.as_ref().chars();
            for x in 0..width {
                let symbol = chars.next().unwrap_or(' ');
                let pos = IVec2::new(x as i32, y as i32);
                let kind = CellKind::parse(symbol, palette).ok_or(LevelError::UnknownSymbol {
                    symbol,
                    x: pos.x,
                    y: pos.y,
                })?;

                match kind {
                    CellKind::Spawn => {
                        if let Some(first) = spawn {
                            return Err(LevelError::MultipleSpawns { first, second: pos });
                        }
                        spawn = Some(pos);
                    }
                    CellKind::Switch => switches.push(pos),
                    CellKind::Target(color) => targets.push(Target { pos, color }),
                    _ => {}
                }

                cells.push(kind);
                symbols.push(symbol);
            }
        }

        let spawn = spawn.ok_or(LevelError::MissingSpawn)?;
        if targets.is_empty() {
            return Err(LevelError::NoDeliveryTargets);
        }

        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells,
            symbols,
            spawn,
            switches,
            targets,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: IVec2) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Cell kind at a position; anything outside the map reads as void
    pub fn kind(&self, pos: IVec2) -> CellKind {
        self.index(pos)
            .map(|i| self.cells[i])
            .unwrap_or(CellKind::Void)
    }

    /// Map symbol at a position (space outside the map)
    pub fn symbol(&self, pos: IVec2) -> char {
        self.index(pos).map(|i| self.symbols[i]).unwrap_or(' ')
    }

    /// True iff the position is in bounds and neither wall nor void
    pub fn is_traversable(&self, pos: IVec2) -> bool {
        self.kind(pos).is_traversable()
    }

    pub fn spawn(&self) -> IVec2 {
        self.spawn
    }

    /// Switch positions in map scan order
    pub fn switches(&self) -> &[IVec2] {
        &self.switches
    }

    /// Delivery targets in map scan order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Colour of the delivery target at a position, if there is one
    pub fn target_at(&self, pos: IVec2) -> Option<ColorTag> {
        match self.kind(pos) {
            CellKind::Target(color) => Some(color),
            _ => None,
        }
    }

    pub fn is_switch(&self, pos: IVec2) -> bool {
        self.kind(pos) == CellKind::Switch
    }

    /// Iterate all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, CellKind)> + '_ {
        self.cells.iter().enumerate().map(|(i, kind)| {
            let i = i as i32;
            (IVec2::new(i % self.width, i / self.width), *kind)
        })
    }
}
