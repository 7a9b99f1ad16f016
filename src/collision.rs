use crate::entity::Velocity;
use crate::geometry::{overlaps, Rect};
use crate::tiles::{cell_rect, Tile, TileGrid, TILE_SIZE};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

/// What one axis pass did to the mover.
#[derive(Default, Debug)]
pub struct AxisContact {
    pub hit: bool,
    /// Downward motion was stopped by a floor this pass.
    pub landed: bool,
    /// Upward motion bonked this cell. At most one cell per pass; when the
    /// mover spans two, the one nearest its center wins.
    pub struck_overhead: Option<(i32, i32)>,
}

/// Push the mover out of any solid cell it entered on one axis and zero
/// that velocity component. Callers advance position on the axis first,
/// X fully before Y, so every overlap seen here was caused by this axis'
/// motion.
pub fn resolve_axis(
    grid: &TileGrid,
    rect: &mut Rect,
    vel: &mut Velocity,
    axis: Axis,
) -> AxisContact {
    let mut contact = AxisContact::default();
    if !overlaps_solid(grid, rect) {
        return contact;
    }
    contact.hit = true;
    match axis {
        Axis::X => {
            if vel.x > 0.0 {
                let tile_x = (rect.right() / TILE_SIZE).floor() as i32;
                rect.x = tile_x as f32 * TILE_SIZE - rect.w - 0.01;
            } else if vel.x < 0.0 {
                let tile_x = (rect.left() / TILE_SIZE).floor() as i32;
                rect.x = (tile_x + 1) as f32 * TILE_SIZE + 0.01;
            }
            vel.x = 0.0;
        }
        Axis::Y => {
            if vel.y > 0.0 {
                let tile_y = (rect.bottom() / TILE_SIZE).floor() as i32;
                rect.y = tile_y as f32 * TILE_SIZE - rect.h;
                contact.landed = true;
            } else if vel.y < 0.0 {
                let row = (rect.top() / TILE_SIZE).floor() as i32;
                contact.struck_overhead = closest_solid_in_row(grid, rect, row);
                rect.y = (row + 1) as f32 * TILE_SIZE + 0.01;
            }
            vel.y = 0.0;
        }
    }
    contact
}

/// What striking a block from below did to the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StrikeOutcome {
    /// QuestionBlock hardened; a mushroom emerges in the named cell.
    MushroomOut { tx: i32, ty: i32 },
    /// CoinBlock hardened; a coin pops into the named cell.
    CoinOut { tx: i32, ty: i32 },
    /// Brick shattered to Empty.
    Break,
    /// Plain solid block, nothing changed.
    Thud,
}

/// The only place tile cells are rewritten. QuestionBlock and CoinBlock
/// pay out once and harden; Brick shatters only under a Big player.
pub fn strike_block(grid: &mut TileGrid, tx: i32, ty: i32, big: bool) -> StrikeOutcome {
    match grid.get(tx, ty) {
        Tile::QuestionBlock => {
            grid.set(tx, ty, Tile::HardBlock);
            StrikeOutcome::MushroomOut { tx, ty: ty - 1 }
        }
        Tile::CoinBlock => {
            grid.set(tx, ty, Tile::HardBlock);
            StrikeOutcome::CoinOut { tx, ty: ty - 1 }
        }
        Tile::Brick if big => {
            grid.set(tx, ty, Tile::Empty);
            StrikeOutcome::Break
        }
        _ => StrikeOutcome::Thud,
    }
}

pub fn overlaps_solid(grid: &TileGrid, rect: &Rect) -> bool {
    let (min_tx, max_tx, min_ty, max_ty) = cell_span(rect);
    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if grid.is_solid(tx, ty) && overlaps(rect, &cell_rect(tx, ty)) {
                return true;
            }
        }
    }
    false
}

pub fn overlaps_tile(grid: &TileGrid, rect: &Rect, target: Tile) -> bool {
    let (min_tx, max_tx, min_ty, max_ty) = cell_span(rect);
    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if grid.get(tx, ty) == target && overlaps(rect, &cell_rect(tx, ty)) {
                return true;
            }
        }
    }
    false
}

/// Floor probe half a pixel under the feet, inset a pixel from each side
/// so brushing a wall does not read as standing on it.
pub fn probe_grounded(grid: &TileGrid, rect: &Rect) -> bool {
    let check_y = rect.bottom() + 0.5;
    let ty = (check_y / TILE_SIZE).floor() as i32;
    let min_tx = ((rect.left() + 1.0) / TILE_SIZE).floor() as i32;
    let max_tx = ((rect.right() - 1.0) / TILE_SIZE).floor() as i32;
    for tx in min_tx..=max_tx {
        if grid.is_solid(tx, ty) {
            return true;
        }
    }
    false
}

/// True when the floor just past the mover's leading edge is missing.
/// Walkers with ledge_turn reverse on this.
pub fn ledge_ahead(grid: &TileGrid, rect: &Rect, dir: i8) -> bool {
    let probe_x = if dir > 0 {
        rect.right() + 1.0
    } else {
        rect.left() - 1.0
    };
    let tx = (probe_x / TILE_SIZE).floor() as i32;
    let ty = ((rect.bottom() + 0.5) / TILE_SIZE).floor() as i32;
    !grid.is_solid(tx, ty)
}

/// First solid cell at or below the given cell in its column.
pub fn first_solid_below(grid: &TileGrid, tx: i32, ty_start: i32) -> Option<i32> {
    for ty in ty_start.max(0)..grid.height as i32 {
        if grid.is_solid(tx, ty) {
            return Some(ty);
        }
    }
    None
}

fn cell_span(rect: &Rect) -> (i32, i32, i32, i32) {
    (
        (rect.left() / TILE_SIZE).floor() as i32,
        ((rect.right() - 0.01) / TILE_SIZE).floor() as i32,
        (rect.top() / TILE_SIZE).floor() as i32,
        ((rect.bottom() - 0.01) / TILE_SIZE).floor() as i32,
    )
}

fn closest_solid_in_row(grid: &TileGrid, rect: &Rect, row: i32) -> Option<(i32, i32)> {
    let min_tx = (rect.left() / TILE_SIZE).floor() as i32;
    let max_tx = ((rect.right() - 0.01) / TILE_SIZE).floor() as i32;
    let mut best: Option<(i32, f32)> = None;
    for tx in min_tx..=max_tx {
        if grid.is_solid(tx, row) {
            let center = tx as f32 * TILE_SIZE + TILE_SIZE / 2.0;
            let dist = (center - rect.center_x()).abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((tx, dist));
            }
        }
    }
    best.map(|(tx, _)| (tx, row))
}
