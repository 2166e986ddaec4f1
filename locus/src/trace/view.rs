use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Visible region of the plane, with its pixel density
///
/// `origin` is the corner with the smallest coordinates; the region extends
/// by `width` along `x` and `height` along `y`.  `scale` is the number of
/// pixels per unit along each axis, which sets the tracing resolution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Minimum corner of the region
    pub origin: Point2<f64>,
    /// Width of the region, in world units
    pub width: f64,
    /// Height of the region, in world units
    pub height: f64,
    /// Pixels per world unit along `x` and `y`
    pub scale: Vector2<f64>,
}

/// Bounds used when none (or degenerate ones) are provided
pub const DEFAULT_BOUNDS: [f64; 6] = [-10.0, 10.0, -10.0, 10.0, 10.0, 10.0];

impl Default for Viewport {
    fn default() -> Self {
        Self::from_valid_bounds(DEFAULT_BOUNDS)
    }
}

impl Viewport {
    /// Builds a viewport from `[xmin, xmax, ymin, ymax, scale_x, scale_y]`
    ///
    /// Non-finite, empty or inverted bounds, and non-positive scales, fall
    /// back to [`DEFAULT_BOUNDS`].
    pub fn from_bounds(b: [f64; 6]) -> Self {
        let valid = b.iter().all(|v| v.is_finite())
            && b[1] > b[0]
            && b[3] > b[2]
            && b[4] > 0.0
            && b[5] > 0.0;
        if valid {
            Self::from_valid_bounds(b)
        } else {
            log::debug!("invalid viewport bounds {b:?}, using defaults");
            Self::default()
        }
    }

    fn from_valid_bounds(b: [f64; 6]) -> Self {
        Self {
            origin: Point2::new(b[0], b[2]),
            width: b[1] - b[0],
            height: b[3] - b[2],
            scale: Vector2::new(b[4], b[5]),
        }
    }

    /// Returns `[xmin, xmax, ymin, ymax, scale_x, scale_y]`
    pub fn bounds(&self) -> [f64; 6] {
        [
            self.origin.x,
            self.origin.x + self.width,
            self.origin.y,
            self.origin.y + self.height,
            self.scale.x,
            self.scale.y,
        ]
    }

    /// Returns the maximum corner of the region
    pub fn max(&self) -> Point2<f64> {
        self.origin + Vector2::new(self.width, self.height)
    }

    /// Returns the center of the region
    pub fn center(&self) -> Point2<f64> {
        self.origin + Vector2::new(self.width, self.height) * 0.5
    }

    /// Checks whether a point lies within the region (inclusive)
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let max = self.max();
        p.x >= self.origin.x
            && p.x <= max.x
            && p.y >= self.origin.y
            && p.y <= max.y
    }

    /// Checks that every field is finite, and the size and scale positive
    ///
    /// Viewports from [`from_bounds`](Self::from_bounds) are always valid,
    /// but the fields are public.
    pub fn is_valid(&self) -> bool {
        self.origin.coords.iter().all(|v| v.is_finite())
            && [self.width, self.height, self.scale.x, self.scale.y]
                .iter()
                .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Side length of the square region traced by every tracer
    pub fn side(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Size of the region in pixels along its longer axis
    pub fn pixels(&self) -> f64 {
        (self.width * self.scale.x).max(self.height * self.scale.y)
    }

    /// Returns the overlap of two viewports, or `None` if they are disjoint
    ///
    /// The result uses the finer of the two scales.
    pub fn intersection(&self, other: &Viewport) -> Option<Viewport> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        let (a, b) = (self.max(), other.max());
        let lo = Point2::new(
            self.origin.x.max(other.origin.x),
            self.origin.y.max(other.origin.y),
        );
        let hi = Point2::new(a.x.min(b.x), a.y.min(b.y));
        if hi.x <= lo.x || hi.y <= lo.y {
            return None;
        }
        Some(Viewport {
            origin: lo,
            width: hi.x - lo.x,
            height: hi.y - lo.y,
            scale: Vector2::new(
                self.scale.x.max(other.scale.x),
                self.scale.y.max(other.scale.y),
            ),
        })
    }
}
