use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// World-units edge length of one grid cell.
pub const TILE_SIZE: f32 = 16.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    Empty = 0,
    Ground = 1,
    Brick = 2,
    QuestionBlock = 3,
    HardBlock = 4,
    PipeLeft = 5,
    PipeRight = 6,
    Spike = 7,
    Goal = 8,
    CoinBlock = 9,
    VineBase = 10,
}

impl Tile {
    /// Unknown ids decode to Empty so levels authored against a newer tile
    /// set stay passable instead of walling the player in.
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Tile::Ground,
            2 => Tile::Brick,
            3 => Tile::QuestionBlock,
            4 => Tile::HardBlock,
            5 => Tile::PipeLeft,
            6 => Tile::PipeRight,
            7 => Tile::Spike,
            8 => Tile::Goal,
            9 => Tile::CoinBlock,
            10 => Tile::VineBase,
            _ => Tile::Empty,
        }
    }

    pub fn is_solid(self) -> bool {
        matches!(
            self,
            Tile::Ground
                | Tile::Brick
                | Tile::QuestionBlock
                | Tile::HardBlock
                | Tile::PipeLeft
                | Tile::PipeRight
                | Tile::CoinBlock
        )
    }

    pub fn is_hazard(self) -> bool {
        self == Tile::Spike
    }

    pub fn is_climbable(self) -> bool {
        self == Tile::VineBase
    }
}

/// Mutable tile grid for one run. Row-major with row 0 at the top of the
/// level; block strikes rewrite cells in place.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<u8>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tiles: Vec<u8>) -> Self {
        debug_assert_eq!(tiles.len(), width * height);
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Raw tile id, with everything outside the grid reading as Empty so
    /// levels are open at their edges.
    pub fn get_tile(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Tile::Empty as u8;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    pub fn get(&self, x: i32, y: i32) -> Tile {
        Tile::from_u8(self.get_tile(x, y))
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile_id: u8) {
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            self.tiles[y as usize * self.width + x as usize] = tile_id;
        }
    }

    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        self.set_tile(x, y, tile as u8);
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_solid()
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }
}

/// World-space rect of one grid cell.
pub fn cell_rect(tx: i32, ty: i32) -> Rect {
    Rect::new(
        tx as f32 * TILE_SIZE,
        ty as f32 * TILE_SIZE,
        TILE_SIZE,
        TILE_SIZE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tile_id_decodes_to_empty() {
        assert_eq!(Tile::from_u8(200), Tile::Empty);
        assert!(!Tile::from_u8(200).is_solid());
        assert!(!Tile::from_u8(200).is_hazard());
    }

    #[test]
    fn solidity_table() {
        assert!(Tile::Ground.is_solid());
        assert!(Tile::QuestionBlock.is_solid());
        assert!(Tile::CoinBlock.is_solid());
        assert!(!Tile::Empty.is_solid());
        assert!(!Tile::Spike.is_solid());
        assert!(!Tile::Goal.is_solid());
        assert!(!Tile::VineBase.is_solid());
    }

    #[test]
    fn out_of_bounds_reads_empty() {
        let grid = TileGrid::new(2, 2, vec![Tile::Ground as u8; 4]);
        assert_eq!(grid.get(-1, 0), Tile::Empty);
        assert_eq!(grid.get(0, 5), Tile::Empty);
        assert_eq!(grid.get(0, 0), Tile::Ground);
    }

    #[test]
    fn out_of_bounds_write_is_ignored() {
        let mut grid = TileGrid::new(2, 2, vec![0u8; 4]);
        grid.set(-1, 0, Tile::Ground);
        grid.set(2, 0, Tile::Ground);
        assert!(grid.tiles.iter().all(|&t| t == 0));
        grid.set(1, 1, Tile::Brick);
        assert_eq!(grid.get(1, 1), Tile::Brick);
    }

    #[test]
    fn cell_rect_matches_grid_position() {
        let r = cell_rect(3, 2);
        assert_eq!(r.x, 48.0);
        assert_eq!(r.y, 32.0);
        assert_eq!(r.w, TILE_SIZE);
        assert_eq!(r.h, TILE_SIZE);
    }
}
