//! Level descriptors and load-time validation
//!
//! Descriptors are plain data (JSON-friendly, camelCase keys). A
//! [`LevelSet`] compiles every descriptor up front, so a malformed level is
//! rejected before a session starts rather than mid-run.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::difficulty::SpeedFloors;
use super::grid::{ColorTag, Direction, Grid};
use super::routing::{Switch, colors_reachable};

/// Reasons a level or level set fails to load
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level map is empty")]
    EmptyMap,
    #[error("level map has no spawn cell 'S'")]
    MissingSpawn,
    #[error(
        "level map has more than one spawn cell: ({}, {}) and ({}, {})",
        .first.x, .first.y, .second.x, .second.y
    )]
    MultipleSpawns { first: IVec2, second: IVec2 },
    #[error("level map has no delivery targets")]
    NoDeliveryTargets,
    #[error("unknown map symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: i32, y: i32 },
    #[error("switch at ({x}, {y}) has no traversable neighbour")]
    IsolatedSwitch { x: i32, y: i32 },
    #[error("colour palette is empty")]
    EmptyPalette,
    #[error("colour tag {0:?} is a reserved map symbol")]
    ReservedColorTag(char),
    #[error("colour tag {0:?} appears twice in the palette")]
    DuplicateColorTag(char),
    #[error("attempt quota must be at least 1")]
    ZeroQuota,
    #[error("{field} must be a positive number of milliseconds, got {value}")]
    NonPositiveTiming { field: &'static str, value: f32 },
    #[error("{field} floor factor must be in (0, 1], got {value}")]
    InvalidFloor { field: &'static str, value: f32 },
    #[error("level set is empty")]
    NoLevels,
    #[error("level index {index} out of range ({count} levels)")]
    LevelOutOfRange { index: usize, count: usize },
    #[error("level {}: {source}", .index + 1)]
    InLevel {
        index: usize,
        #[source]
        source: Box<LevelError>,
    },
    #[error("failed to decode level set: {0}")]
    Json(#[from] serde_json::Error),
}

/// How spawned carts pick their colour from the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorOrder {
    /// Palette order, wrapping
    #[default]
    Cycle,
    /// Seeded random draw
    Random,
}

/// Static configuration for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    /// Delivery attempts that complete the level
    pub attempts: u32,
    /// Base time between spawns (ms)
    pub spawn_interval: f32,
    /// Base time for a cart to cross one cell (ms)
    pub move_speed: f32,
    pub colors: Vec<ColorTag>,
    pub map: Vec<String>,
    #[serde(default)]
    pub floors: SpeedFloors,
    /// Mistakes cost no lives
    #[serde(default)]
    pub forgiving: bool,
    /// Most carts allowed in flight at once
    #[serde(default)]
    pub max_carts: Option<usize>,
    #[serde(default)]
    pub color_order: ColorOrder,
    #[serde(default)]
    pub hint: Option<String>,
}

impl LevelDescriptor {
    fn validate_settings(&self) -> Result<(), LevelError> {
        if self.attempts == 0 {
            return Err(LevelError::ZeroQuota);
        }
        for (field, value) in [
            ("spawnInterval", self.spawn_interval),
            ("moveSpeed", self.move_speed),
        ] {
            // NaN fails this too
            if !(value > 0.0) {
                return Err(LevelError::NonPositiveTiming { field, value });
            }
        }
        for (field, value) in [
            ("move", self.floors.move_factor),
            ("spawn", self.floors.spawn_factor),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LevelError::InvalidFloor { field, value });
            }
        }
        if self.colors.is_empty() {
            return Err(LevelError::EmptyPalette);
        }
        for (i, tag) in self.colors.iter().enumerate() {
            if tag.is_reserved() {
                return Err(LevelError::ReservedColorTag(tag.0));
            }
            if self.colors[..i].contains(tag) {
                return Err(LevelError::DuplicateColorTag(tag.0));
            }
        }
        Ok(())
    }
}

/// A validated level: descriptor plus its parsed grid and initial switches
#[derive(Debug, Clone)]
pub struct Level {
    pub descriptor: LevelDescriptor,
    pub grid: Grid,
    pub switches: Vec<Switch>,
}

impl Level {
    pub fn compile(descriptor: LevelDescriptor) -> Result<Self, LevelError> {
        descriptor.validate_settings()?;
        let grid = Grid::load(&descriptor.map, &descriptor.colors)?;
        let switches = grid
            .switches()
            .iter()
            .map(|&pos| Switch::new(&grid, pos))
            .collect::<Result<Vec<_>, _>>()?;

        let level = Self {
            descriptor,
            grid,
            switches,
        };
        level.warn_unreachable_colors();
        Ok(level)
    }

    fn warn_unreachable_colors(&self) {
        let reachable = colors_reachable(
            &self.grid,
            &self.switches,
            self.grid.spawn(),
            spawn_facing(&self.grid),
        );
        for color in &self.descriptor.colors {
            if !reachable.contains(color) {
                log::warn!(
                    "Level {:?}: no route from the spawn reaches colour {}",
                    self.descriptor.name.as_deref().unwrap_or("unnamed"),
                    color
                );
            }
        }
    }
}

/// Direction a freshly spawned cart faces: east if open, else the first
/// open direction.
pub fn spawn_facing(grid: &Grid) -> Direction {
    let spawn = grid.spawn();
    if grid.is_traversable(spawn + Direction::East.offset()) {
        return Direction::East;
    }
    Direction::ALL
        .into_iter()
        .find(|d| grid.is_traversable(spawn + d.offset()))
        .unwrap_or(Direction::East)
}

/// An ordered, validated run of levels
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<Level>,
}

impl LevelSet {
    pub fn new(descriptors: Vec<LevelDescriptor>) -> Result<Self, LevelError> {
        if descriptors.is_empty() {
            return Err(LevelError::NoLevels);
        }
        let levels = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, d)| {
                Level::compile(d).map_err(|e| LevelError::InLevel {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { levels })
    }

    /// Decode a JSON array of level descriptors
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let descriptors: Vec<LevelDescriptor> = serde_json::from_str(json)?;
        Self::new(descriptors)
    }

    /// The five shipped levels
    pub fn builtin() -> Result<Self, LevelError> {
        Self::new(builtin_descriptors())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }
}

fn level(
    attempts: u32,
    spawn_interval: f32,
    move_speed: f32,
    colors: &str,
    map: &[&str],
) -> LevelDescriptor {
    LevelDescriptor {
        name: None,
        attempts,
        spawn_interval,
        move_speed,
        colors: colors.chars().map(ColorTag).collect(),
        map: map.iter().map(|r| r.to_string()).collect(),
        floors: SpeedFloors::default(),
        forgiving: false,
        max_carts: None,
        color_order: ColorOrder::Cycle,
        hint: None,
    }
}

fn builtin_descriptors() -> Vec<LevelDescriptor> {
    vec![
        LevelDescriptor {
            name: Some("First shift".into()),
            floors: SpeedFloors::TUTORIAL,
            forgiving: true,
            hint: Some("Click a switch to change where carts go. Match each cart to its colour.".into()),
            ..level(
                10,
                3000.0,
                400.0,
                "GB",
                &[
                    "############",
                    "#S--+--G  ##",
                    "#   |  |  ##",
                    "#   |  |  ##",
                    "#   +--B  ##",
                    "#          #",
                    "#          #",
                    "############",
                ],
            )
        },
        LevelDescriptor {
            name: Some("Second corridor".into()),
            floors: SpeedFloors::TUTORIAL,
            ..level(
                10,
                2800.0,
                380.0,
                "GB",
                &[
                    "############",
                    "#S--+--G  ##",
                    "#   |  |  ##",
                    "#   +--+  ##",
                    "#   |  B  ##",
                    "#   |     ##",
                    "#         ##",
                    "############",
                ],
            )
        },
        LevelDescriptor {
            name: Some("Three clinics".into()),
            ..level(
                10,
                3200.0,
                450.0,
                "GBO",
                &[
                    "##############",
                    "#S--+----+G ##",
                    "#   |    |  ##",
                    "#   +----+--O#",
                    "#   |        #",
                    "#   +----B   #",
                    "#            #",
                    "#            #",
                    "##############",
                ],
            )
        },
        LevelDescriptor {
            name: Some("Back ward".into()),
            color_order: ColorOrder::Random,
            ..level(
                10,
                2400.0,
                340.0,
                "GBO",
                &[
                    "##############",
                    "#S---+---G  ##",
                    "#    |   |  ##",
                    "#    +---+--O#",
                    "#    |       #",
                    "# B--+       #",
                    "#            #",
                    "#            #",
                    "##############",
                ],
            )
        },
        LevelDescriptor {
            name: Some("Rush hour".into()),
            color_order: ColorOrder::Random,
            ..level(
                10,
                2200.0,
                320.0,
                "GBO",
                &[
                    "##############",
                    "#S--+---G   ##",
                    "#   |   |   ##",
                    "#   +---+--O##",
                    "#       |   ##",
                    "#   B---+    #",
                    "#            #",
                    "#            #",
                    "##############",
                ],
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_compile() {
        let set = LevelSet::builtin().unwrap();
        assert_eq!(set.len(), 5);
        assert!(set.is_last(4));
        assert!(!set.is_last(3));
        for i in 0..set.len() {
            let level = set.get(i).unwrap();
            assert_eq!(level.descriptor.attempts, 10);
            assert_eq!(level.switches.len(), level.grid.switches().len());
        }
        assert!(set.get(0).unwrap().descriptor.forgiving);
        assert!(!set.get(2).unwrap().descriptor.forgiving);
    }

    #[test]
    fn test_from_json_with_defaults() {
        let json = r########"[{
            "attempts": 3,
            "spawnInterval": 1000,
            "moveSpeed": 100,
            "colors": ["G", "B"],
            "map": ["#######", "#S-+-G#", "#  |  #", "#  B  #", "#######"]
        }]"########;
        let set = LevelSet::from_json_str(json).unwrap();
        let level = set.get(0).unwrap();
        assert_eq!(level.descriptor.floors, SpeedFloors::default());
        assert!(!level.descriptor.forgiving);
        assert_eq!(level.descriptor.max_carts, None);
        assert_eq!(level.descriptor.color_order, ColorOrder::Cycle);
        assert_eq!(level.switches[0].direction(), Direction::East);
    }

    #[test]
    fn test_json_decode_error() {
        let err = LevelSet::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, LevelError::Json(_)));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(LevelSet::new(Vec::new()), Err(LevelError::NoLevels)));
    }

    #[test]
    fn test_error_names_level() {
        let bad = level(10, 1000.0, 100.0, "G", &["#--G#"]);
        let err = LevelSet::new(vec![builtin_descriptors().remove(0), bad]).unwrap_err();
        match &err {
            LevelError::InLevel { index, source } => {
                assert_eq!(*index, 1);
                assert!(matches!(**source, LevelError::MissingSpawn));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "level 2: level map has no spawn cell 'S'");
    }

    #[test]
    fn test_settings_validation() {
        let map = ["S-G"];
        assert!(matches!(
            Level::compile(level(0, 1000.0, 100.0, "G", &map)),
            Err(LevelError::ZeroQuota)
        ));
        assert!(matches!(
            Level::compile(level(1, 0.0, 100.0, "G", &map)),
            Err(LevelError::NonPositiveTiming { field: "spawnInterval", .. })
        ));
        assert!(matches!(
            Level::compile(level(1, 1000.0, f32::NAN, "G", &map)),
            Err(LevelError::NonPositiveTiming { field: "moveSpeed", .. })
        ));
        assert!(matches!(
            Level::compile(level(1, 1000.0, 100.0, "", &map)),
            Err(LevelError::EmptyPalette)
        ));
        assert!(matches!(
            Level::compile(level(1, 1000.0, 100.0, "GG", &map)),
            Err(LevelError::DuplicateColorTag('G'))
        ));
        assert!(matches!(
            Level::compile(level(1, 1000.0, 100.0, "S", &map)),
            Err(LevelError::ReservedColorTag('S'))
        ));

        let mut steep = level(1, 1000.0, 100.0, "G", &map);
        steep.floors.move_factor = 1.5;
        assert!(matches!(
            Level::compile(steep),
            Err(LevelError::InvalidFloor { field: "move", .. })
        ));
    }

    #[test]
    fn test_spawn_facing() {
        let east = Grid::load(&["S-G"], &[ColorTag('G')]).unwrap();
        assert_eq!(spawn_facing(&east), Direction::East);
        let south = Grid::load(&["S#", "|#", "G#"], &[ColorTag('G')]).unwrap();
        assert_eq!(spawn_facing(&south), Direction::South);
    }
}
