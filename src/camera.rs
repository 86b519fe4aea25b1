use crate::components::Position;

/// Top-left corner of the viewport in map coordinates, plus the viewport
/// size in tiles. Recomputed from the actor's position; never
/// independently authoritative.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub viewport_w: i32,
    pub viewport_h: i32,
}

impl Camera {
    pub fn new(viewport_w: i32, viewport_h: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            viewport_w,
            viewport_h,
        }
    }

    /// Center the viewport on a position. Follow with `clamp_to` once the
    /// map bounds are known.
    pub fn center_on(&mut self, pos: Position) {
        self.x = pos.x - self.viewport_w / 2;
        self.y = pos.y - self.viewport_h / 2;
    }

    /// Clamp to [0, map_w - viewport_w] x [0, map_h - viewport_h]. Maps
    /// smaller than the viewport pin the camera to 0.
    pub fn clamp_to(&mut self, map_w: i32, map_h: i32) {
        let max_x = (map_w - self.viewport_w).max(0);
        let max_y = (map_h - self.viewport_h).max(0);
        self.x = self.x.clamp(0, max_x);
        self.y = self.y.clamp(0, max_y);
    }
}
