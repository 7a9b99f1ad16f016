use serde::{Deserialize, Serialize};

use crate::tiles::{Tile, TileGrid, TILE_SIZE};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Walker,
    Coin,
    Mushroom,
    Goal,
    /// Catch-all for spawn kinds this build does not know. Sanitation
    /// drops these instead of failing the whole level.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EntitySpawn {
    pub kind: SpawnKind,
    pub tx: i32,
    pub ty: i32,
    /// Walkers only: turn around at ledges instead of walking off.
    #[serde(default)]
    pub ledge_turn: bool,
}

/// Static level description: tile grid, entity spawn list, start cell.
/// Runs deep-copy this; nothing in here mutates during play.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LevelData {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<u8>,
    pub start: (i32, i32),
    #[serde(default)]
    pub spawns: Vec<EntitySpawn>,
}

impl LevelData {
    /// Clamp malformed fields into a playable shape rather than rejecting
    /// the level. Returns notes describing every fix so the caller can log
    /// them.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut notes = Vec::new();

        if self.width == 0 || self.height == 0 {
            notes.push(format!(
                "level dimensions {}x{} invalid, clamping to 1x1 minimum",
                self.width, self.height
            ));
            self.width = self.width.max(1);
            self.height = self.height.max(1);
        }

        let expected = self.width * self.height;
        if self.tiles.len() != expected {
            notes.push(format!(
                "tile buffer holds {} entries for a {}x{} grid, resizing to {}",
                self.tiles.len(),
                self.width,
                self.height,
                expected
            ));
            self.tiles.resize(expected, Tile::Empty as u8);
        }

        let cx = self.start.0.clamp(0, self.width as i32 - 1);
        let cy = self.start.1.clamp(0, self.height as i32 - 1);
        if (cx, cy) != self.start {
            notes.push(format!(
                "start cell {:?} outside grid, clamped to {:?}",
                self.start,
                (cx, cy)
            ));
            self.start = (cx, cy);
        }

        let w = self.width as i32;
        let h = self.height as i32;
        self.spawns.retain(|spawn| {
            if spawn.kind == SpawnKind::Unknown {
                notes.push(format!(
                    "unknown spawn kind at ({}, {}), skipped",
                    spawn.tx, spawn.ty
                ));
                return false;
            }
            let inside = spawn.tx >= 0 && spawn.ty >= 0 && spawn.tx < w && spawn.ty < h;
            if !inside {
                notes.push(format!(
                    "spawn {:?} at ({}, {}) outside grid, skipped",
                    spawn.kind, spawn.tx, spawn.ty
                ));
            }
            inside
        });

        notes
    }

    /// Fresh mutable grid for a run.
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.width, self.height, self.tiles.clone())
    }

    /// Bottom-center pixel of the start cell. Entities stand with their
    /// feet here.
    pub fn start_pixel(&self) -> (f32, f32) {
        (
            self.start.0 as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            (self.start.1 + 1) as f32 * TILE_SIZE,
        )
    }

    /// Built-in demo level exercising the whole tile set: block row, pipe,
    /// climbing vine, spike strip, pit, stair climb, goal column.
    pub fn demo() -> Self {
        let width = 64usize;
        let height = 16usize;
        let mut tiles = vec![Tile::Empty as u8; width * height];
        let mut set = |x: usize, y: usize, t: Tile| {
            tiles[y * width + x] = t as u8;
        };

        // Ground: bottom two rows, with a void pit at x=30..33
        for x in 0..width {
            if (30..33).contains(&x) {
                continue;
            }
            set(x, 14, Tile::Ground);
            set(x, 15, Tile::Ground);
        }

        // Block row at head height
        set(7, 10, Tile::CoinBlock);
        for x in 8..12 {
            set(x, 10, Tile::Brick);
        }
        set(12, 10, Tile::QuestionBlock);

        // Pipe, two tiles tall
        for y in 12..14 {
            set(20, y, Tile::PipeLeft);
            set(21, y, Tile::PipeRight);
        }

        // Authored vine
        for y in 10..14 {
            set(26, y, Tile::VineBase);
        }

        // Spike strip on the ground past the pit
        for x in 38..41 {
            set(x, 13, Tile::Spike);
        }

        // Stairs up to the goal shelf
        for (i, x) in (44..48).enumerate() {
            for step in 0..=i {
                set(x, 13 - step, Tile::HardBlock);
            }
        }

        // Goal column
        set(60, 12, Tile::Goal);
        set(60, 13, Tile::Goal);

        LevelData {
            width,
            height,
            tiles,
            start: (2, 13),
            spawns: vec![
                EntitySpawn {
                    kind: SpawnKind::Walker,
                    tx: 16,
                    ty: 13,
                    ledge_turn: false,
                },
                EntitySpawn {
                    kind: SpawnKind::Walker,
                    tx: 35,
                    ty: 13,
                    ledge_turn: true,
                },
                EntitySpawn {
                    kind: SpawnKind::Coin,
                    tx: 9,
                    ty: 8,
                    ledge_turn: false,
                },
                EntitySpawn {
                    kind: SpawnKind::Coin,
                    tx: 10,
                    ty: 8,
                    ledge_turn: false,
                },
                EntitySpawn {
                    kind: SpawnKind::Coin,
                    tx: 22,
                    ty: 11,
                    ledge_turn: false,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_resizes_mismatched_tile_buffer() {
        let mut level = LevelData {
            width: 4,
            height: 3,
            tiles: vec![1u8; 5],
            start: (0, 0),
            spawns: Vec::new(),
        };
        let notes = level.sanitize();
        assert_eq!(level.tiles.len(), 12);
        assert_eq!(level.tiles[11], Tile::Empty as u8);
        assert_eq!(notes.len(), 1);

        level.tiles = vec![1u8; 40];
        let notes = level.sanitize();
        assert_eq!(level.tiles.len(), 12);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn sanitize_clamps_out_of_bounds_start() {
        let mut level = LevelData {
            width: 4,
            height: 4,
            tiles: vec![0u8; 16],
            start: (9, -2),
            spawns: Vec::new(),
        };
        level.sanitize();
        assert_eq!(level.start, (3, 0));
    }

    #[test]
    fn sanitize_drops_bad_spawns() {
        let mut level = LevelData {
            width: 4,
            height: 4,
            tiles: vec![0u8; 16],
            start: (0, 0),
            spawns: vec![
                EntitySpawn {
                    kind: SpawnKind::Walker,
                    tx: 1,
                    ty: 1,
                    ledge_turn: false,
                },
                EntitySpawn {
                    kind: SpawnKind::Coin,
                    tx: 10,
                    ty: 1,
                    ledge_turn: false,
                },
                EntitySpawn {
                    kind: SpawnKind::Unknown,
                    tx: 2,
                    ty: 2,
                    ledge_turn: false,
                },
            ],
        };
        let notes = level.sanitize();
        assert_eq!(level.spawns.len(), 1);
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn level_json_with_unknown_spawn_kind_still_parses() {
        let raw = r#"{
            "width": 2,
            "height": 2,
            "tiles": [0, 0, 1, 1],
            "start": [0, 0],
            "spawns": [
                {"kind": "walker", "tx": 1, "ty": 0},
                {"kind": "dragon", "tx": 0, "ty": 0}
            ]
        }"#;
        let mut level: LevelData = serde_json::from_str(raw).unwrap();
        assert_eq!(level.spawns[1].kind, SpawnKind::Unknown);
        level.sanitize();
        assert_eq!(level.spawns.len(), 1);
        assert_eq!(level.spawns[0].kind, SpawnKind::Walker);
    }

    #[test]
    fn demo_level_is_well_formed() {
        let mut demo = LevelData::demo();
        assert!(demo.sanitize().is_empty());
        let grid = demo.grid();
        assert!(grid.tiles.iter().any(|&t| Tile::from_u8(t) == Tile::Goal));
        assert!(grid.is_solid(demo.start.0, demo.start.1 + 1));
    }

    #[test]
    fn start_pixel_is_bottom_center_of_cell() {
        let level = LevelData {
            width: 8,
            height: 8,
            tiles: vec![0u8; 64],
            start: (2, 3),
            spawns: Vec::new(),
        };
        assert_eq!(level.start_pixel(), (40.0, 64.0));
    }
}
