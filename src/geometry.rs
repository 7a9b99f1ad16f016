use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, top-left anchored. World y grows downward,
/// so `bottom()` is the larger coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }
}

/// Which edge of the moving rect made contact. `Bottom` means the moving
/// rect's bottom edge (a landing), `Top` a head bump, `Left`/`Right` wall
/// contact on that side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Positive-area overlap test. Edge or corner touching does not count,
/// and zero-extent rects never overlap anything.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    if a.w <= 0.0 || a.h <= 0.0 || b.w <= 0.0 || b.h <= 0.0 {
        return false;
    }
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Classify the contact between an overlapping pair by minimum penetration
/// axis. Returns None when the rects do not overlap. Ties prefer the
/// vertical axis, and downward contact over upward, so a perfectly
/// diagonal corner hit reads as a landing.
pub fn collision_side(moving: &Rect, fixed: &Rect) -> Option<Side> {
    if !overlaps(moving, fixed) {
        return None;
    }
    let down_pen = moving.bottom() - fixed.top();
    let up_pen = fixed.bottom() - moving.top();
    let right_pen = moving.right() - fixed.left();
    let left_pen = fixed.right() - moving.left();

    let v_pen = down_pen.min(up_pen);
    let h_pen = right_pen.min(left_pen);

    if v_pen <= h_pen {
        if down_pen <= up_pen {
            Some(Side::Bottom)
        } else {
            Some(Side::Top)
        }
    } else if right_pen <= left_pen {
        Some(Side::Right)
    } else {
        Some(Side::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_detected_both_ways() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(8.0, 8.0, 16.0, 16.0);
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn edge_touching_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let right_edge = Rect::new(16.0, 0.0, 16.0, 16.0);
        let corner = Rect::new(16.0, 16.0, 16.0, 16.0);
        assert!(!overlaps(&a, &right_edge));
        assert!(!overlaps(&a, &corner));
    }

    #[test]
    fn degenerate_rect_never_overlaps() {
        let a = Rect::new(4.0, 4.0, 0.0, 16.0);
        let b = Rect::new(0.0, 0.0, 16.0, 16.0);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn collision_side_none_when_separated() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(40.0, 0.0, 16.0, 16.0);
        assert_eq!(collision_side(&a, &b), None);
    }

    #[test]
    fn falling_onto_block_reads_as_bottom() {
        // Shallow vertical penetration from above, wide horizontal overlap.
        let moving = Rect::new(2.0, 10.0, 12.0, 14.0);
        let fixed = Rect::new(0.0, 22.0, 16.0, 16.0);
        assert_eq!(collision_side(&moving, &fixed), Some(Side::Bottom));
    }

    #[test]
    fn head_bump_reads_as_top() {
        let moving = Rect::new(2.0, 14.0, 12.0, 14.0);
        let fixed = Rect::new(0.0, 0.0, 16.0, 16.0);
        assert_eq!(collision_side(&moving, &fixed), Some(Side::Top));
    }

    #[test]
    fn wall_contact_reads_as_left_or_right() {
        let into_right_wall = Rect::new(10.0, 0.0, 12.0, 14.0);
        let wall = Rect::new(20.0, -8.0, 16.0, 32.0);
        assert_eq!(collision_side(&into_right_wall, &wall), Some(Side::Right));

        let into_left_wall = Rect::new(10.0, 0.0, 12.0, 14.0);
        let left_wall = Rect::new(0.0, -8.0, 16.0, 32.0);
        assert_eq!(collision_side(&into_left_wall, &left_wall), Some(Side::Left));
    }

    #[test]
    fn equal_penetration_prefers_bottom() {
        // Square moving rect clipping the fixed rect's top-left corner by
        // the same amount on both axes.
        let moving = Rect::new(-8.0, -8.0, 16.0, 16.0);
        let fixed = Rect::new(0.0, 0.0, 16.0, 16.0);
        assert_eq!(collision_side(&moving, &fixed), Some(Side::Bottom));
    }
}
