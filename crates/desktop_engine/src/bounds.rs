//! Pure window geometry: constraint clamping and edge/corner resize math.

use serde::{Deserialize, Serialize};

/// Fallback minimum width applied during resize when no constraint is given.
pub const DEFAULT_MIN_WIDTH: f64 = 100.0;
/// Fallback minimum height applied during resize when no constraint is given.
pub const DEFAULT_MIN_HEIGHT: f64 = 50.0;

/// Window geometry in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 100.0,
            y: 100.0,
            width: 400.0,
            height: 300.0,
        }
    }
}

/// Optional min/max size limits for a window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
}

/// Edge or corner being dragged during a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeDirection {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeDirection {
    fn has_east(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    fn has_west(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    fn has_north(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    fn has_south(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

/// Clamps width and height to the given constraints. Position and
/// unconstrained dimensions pass through unchanged.
pub fn apply_constraints(bounds: Bounds, constraints: Option<&Constraints>) -> Bounds {
    let Some(constraints) = constraints else {
        return bounds;
    };

    let mut width = bounds.width;
    let mut height = bounds.height;

    if let Some(min) = constraints.min_width {
        width = width.max(min);
    }
    if let Some(max) = constraints.max_width {
        width = width.min(max);
    }
    if let Some(min) = constraints.min_height {
        height = height.max(min);
    }
    if let Some(max) = constraints.max_height {
        height = height.min(max);
    }

    Bounds {
        width,
        height,
        ..bounds
    }
}

/// Computes the bounds resulting from dragging `direction` by `(dx, dy)`
/// starting from `start`.
///
/// Dimensions are clamped to the constraints (or the 100x50 fallback
/// minimums). When clamping alters a west or north resize, the position is
/// recomputed so the opposite edge stays fixed; without that anchor the
/// window would jump once the pointer passes the size limit.
pub fn calc_resize(
    direction: ResizeDirection,
    start: Bounds,
    dx: f64,
    dy: f64,
    constraints: Option<&Constraints>,
) -> Bounds {
    let mut x = start.x;
    let mut y = start.y;
    let mut width = start.width;
    let mut height = start.height;

    if direction.has_east() {
        width = start.width + dx;
    } else if direction.has_west() {
        width = start.width - dx;
        x = start.x + dx;
    }

    if direction.has_south() {
        height = start.height + dy;
    } else if direction.has_north() {
        height = start.height - dy;
        y = start.y + dy;
    }

    let min_width = constraints.and_then(|c| c.min_width).unwrap_or(DEFAULT_MIN_WIDTH);
    let min_height = constraints
        .and_then(|c| c.min_height)
        .unwrap_or(DEFAULT_MIN_HEIGHT);
    let max_width = constraints.and_then(|c| c.max_width).unwrap_or(f64::INFINITY);
    let max_height = constraints
        .and_then(|c| c.max_height)
        .unwrap_or(f64::INFINITY);

    let clamped_width = width.clamp(min_width, max_width);
    let clamped_height = height.clamp(min_height, max_height);

    if direction.has_west() && clamped_width != width {
        x = start.x + start.width - clamped_width;
    }
    if direction.has_north() && clamped_height != height {
        y = start.y + start.height - clamped_height;
    }

    Bounds {
        x,
        y,
        width: clamped_width,
        height: clamped_height,
    }
}
