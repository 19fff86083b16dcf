/// Level catalog: the ordered set of playable levels.
///
/// ## Sources (priority order):
///   1. Level file named by `[general] levels_file` (TOML)
///   2. Built-in levels
///
/// A level file that cannot be read or fails validation is logged and the
/// built-in levels are used instead.
///
/// ## Level file format:
///   ```toml
///   [[level]]
///   name = "First Steps"
///   start = [200, 621]
///   goal = [600, 540]
///   colliders = [[0, 620, 800, 180]]   # [x, y, width, height]
///   ```
///
/// Levels are addressed 1-based in file order. Index 0 means "no level".

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::error::ValidationError;
use crate::domain::rect::Rect;

/// Logical playfield size in pixels. Geometry may extend past it.
pub const PLAYFIELD_WIDTH: i32 = 800;
pub const PLAYFIELD_HEIGHT: i32 = 800;

/// Goal rectangles are always this many pixels square.
pub const GOAL_SIZE: i32 = 80;

/// A body overlapping this band (or anywhere below it) has fallen out of
/// the level.
pub const FAIL_BOUNDARY: Rect = Rect::from_raw(-800, 900, 2400, 80);

/// The level select screen has six slots.
pub const MAX_LEVELS: usize = 6;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("level file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("level file defines no levels")]
    Empty,

    #[error("level file defines {found} levels, at most {max} are supported")]
    TooManyLevels { found: usize, max: usize },

    #[error("level {level}, collider {index}: {source}")]
    InvalidCollider {
        level: usize,
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// Runtime level data.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDescriptor {
    pub name: String,
    pub colliders: Vec<Rect>,
    pub start: (i32, i32),
    pub goal: (i32, i32),
}

impl LevelDescriptor {
    pub fn goal_rect(&self) -> Rect {
        Rect::from_raw(self.goal.0, self.goal.1, GOAL_SIZE, GOAL_SIZE)
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    levels: Vec<LevelDescriptor>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl Catalog {
    pub fn builtin() -> Self {
        let levels = BUILTIN_LEVELS
            .iter()
            .map(|l| LevelDescriptor {
                name: l.name.to_string(),
                colliders: l.colliders.to_vec(),
                start: l.start,
                goal: l.goal,
            })
            .collect();
        Catalog { levels }
    }

    /// Load the configured level file, falling back to the built-in levels.
    pub fn load(levels_file: Option<&Path>) -> Self {
        let Some(path) = levels_file else {
            debug!("no level file configured, using built-in levels");
            return Catalog::builtin();
        };

        match Catalog::from_file(path) {
            Ok(catalog) => {
                info!(path = %path.display(), levels = catalog.len(), "loaded level file");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "level file rejected, using built-in levels");
                Catalog::builtin()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Catalog::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: TomlLevelFile = toml::from_str(text)?;

        if file.level.is_empty() {
            return Err(CatalogError::Empty);
        }
        if file.level.len() > MAX_LEVELS {
            return Err(CatalogError::TooManyLevels { found: file.level.len(), max: MAX_LEVELS });
        }

        let mut levels = Vec::with_capacity(file.level.len());
        for (i, raw) in file.level.into_iter().enumerate() {
            let number = i + 1;
            let colliders = raw
                .colliders
                .iter()
                .enumerate()
                .map(|(index, &[x, y, w, h])| {
                    Rect::new(x, y, w, h).map_err(|source| CatalogError::InvalidCollider {
                        level: number,
                        index,
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            levels.push(LevelDescriptor {
                name: raw.name.unwrap_or_else(|| format!("Level {number}")),
                colliders,
                start: (raw.start[0], raw.start[1]),
                goal: (raw.goal[0], raw.goal[1]),
            });
        }

        Ok(Catalog { levels })
    }

    /// 1-based lookup. `None` for 0 and for anything past the last level.
    pub fn get(&self, index: usize) -> Option<&LevelDescriptor> {
        index.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════
// Level file schema
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct TomlLevelFile {
    #[serde(default)]
    level: Vec<TomlLevel>,
}

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default)]
    name: Option<String>,
    start: [i32; 2],
    goal: [i32; 2],
    #[serde(default)]
    colliders: Vec<[i32; 4]>,
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

struct BuiltinLevel {
    name: &'static str,
    colliders: &'static [Rect],
    start: (i32, i32),
    goal: (i32, i32),
}

const fn r(x: i32, y: i32, w: i32, h: i32) -> Rect {
    Rect::from_raw(x, y, w, h)
}

static BUILTIN_LEVELS: [BuiltinLevel; 6] = [
    BuiltinLevel {
        name: "First Steps",
        colliders: &[r(0, 620, 800, 180)],
        start: (200, 621),
        goal: (600, 540),
    },
    BuiltinLevel {
        name: "Staircase",
        colliders: &[
            r(0, 620, 800, 180),
            r(240, 520, 560, 100),
            r(400, 420, 400, 100),
        ],
        start: (200, 621),
        goal: (600, 340),
    },
    BuiltinLevel {
        name: "Mind the Gap",
        colliders: &[r(0, 620, 300, 180), r(400, 620, 450, 180)],
        start: (200, 621),
        goal: (600, 540),
    },
    BuiltinLevel {
        name: "Kick Off the Ledge",
        colliders: &[
            r(0, 620, 300, 180),
            r(400, 400, 450, 480),
            r(150, 470, 150, 50),
        ],
        start: (200, 621),
        goal: (600, 320),
    },
    BuiltinLevel {
        name: "Floating Steps",
        colliders: &[
            r(50, 400, 200, 25),
            r(350, 350, 300, 25),
            r(200, 200, 200, 25),
            r(0, 120, 160, 25),
        ],
        start: (80, 300),
        goal: (0, 0),
    },
    BuiltinLevel {
        name: "The Tower",
        colliders: &[
            r(0, 720, 240, 80),
            r(240, 620, 100, 180),
            r(440, 620, 360, 180),
            r(700, 240, 100, 560),
            r(440, 420, 200, 25),
            r(140, 420, 200, 25),
            r(115, 0, 25, 380),
            r(240, 240, 100, 25),
            r(440, 240, 360, 25),
        ],
        start: (80, 620),
        goal: (600, 160),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::BodyBuilder;
    use crate::domain::input::FrameInput;

    #[test]
    fn builtin_has_six_levels() {
        let c = Catalog::builtin();
        assert_eq!(c.len(), 6);
        assert_eq!(c.names().count(), 6);
    }

    #[test]
    fn lookup_is_one_based() {
        let c = Catalog::builtin();
        assert!(c.get(0).is_none());
        assert!(c.get(7).is_none());

        let first = c.get(1).unwrap();
        assert_eq!(first.start, (200, 621));
        assert_eq!(first.goal, (600, 540));
        assert_eq!(first.colliders, vec![r(0, 620, 800, 180)]);

        let fifth = c.get(5).unwrap();
        assert_eq!(fifth.start, (80, 300));
        assert_eq!(fifth.goal_rect(), r(0, 0, 80, 80));

        assert_eq!(c.get(6).unwrap().colliders.len(), 9);
    }

    #[test]
    fn builtin_spawns_settle_on_a_platform() {
        let c = Catalog::builtin();
        for index in 1..=c.len() {
            let level = c.get(index).unwrap();
            let mut body = BodyBuilder::new()
                .position(level.start.0, level.start.1)
                .build()
                .unwrap();
            for _ in 0..90 {
                body.update(&FrameInput::none(), &level.colliders);
            }
            let bottom = body.rect().bottom();
            assert!(
                level.colliders.iter().any(|c| c.top() == bottom),
                "level {index}: body did not come to rest on a platform (bottom = {bottom})"
            );
            assert!(level.colliders.iter().all(|c| !c.overlaps(&body.rect())));
        }
    }

    #[test]
    fn parses_level_file() {
        let text = r#"
            [[level]]
            name = "Flat"
            start = [10, 20]
            goal = [300, 40]
            colliders = [[0, 100, 400, 20], [380, 0, 20, 100]]

            [[level]]
            start = [0, 0]
            goal = [50, 50]
        "#;
        let c = Catalog::from_toml_str(text).unwrap();
        assert_eq!(c.len(), 2);
        let flat = c.get(1).unwrap();
        assert_eq!(flat.name, "Flat");
        assert_eq!(flat.colliders[1], r(380, 0, 20, 100));
        let second = c.get(2).unwrap();
        assert_eq!(second.name, "Level 2");
        assert!(second.colliders.is_empty());
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(Catalog::from_toml_str(""), Err(CatalogError::Empty)));
    }

    #[test]
    fn rejects_degenerate_collider() {
        let text = r#"
            [[level]]
            start = [0, 0]
            goal = [0, 0]
            colliders = [[0, 0, 10, 10], [0, 0, 0, 10]]
        "#;
        match Catalog::from_toml_str(text) {
            Err(CatalogError::InvalidCollider { level, index, .. }) => {
                assert_eq!((level, index), (1, 1));
            }
            other => panic!("expected InvalidCollider, got {other:?}"),
        }
    }

    #[test]
    fn rejects_too_many_levels() {
        let one = "[[level]]\nstart = [0, 0]\ngoal = [0, 0]\n";
        let text = one.repeat(MAX_LEVELS + 1);
        assert!(matches!(
            Catalog::from_toml_str(&text),
            Err(CatalogError::TooManyLevels { found: 7, max: 6 })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let text = "[[level]]\nstart = [0]\ngoal = [0, 0]\n";
        assert!(matches!(Catalog::from_toml_str(text), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let c = Catalog::load(Some(Path::new("/nonexistent/wallhop/levels.toml")));
        assert_eq!(c.len(), 6);
        assert_eq!(c.get(1).unwrap().name, "First Steps");
    }
}
