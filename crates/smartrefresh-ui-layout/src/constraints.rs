//! Layout constraints.

/// Bounds a child must fit when measured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraints {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl Constraints {
    /// Exact width and height.
    pub fn tight(width: f32, height: f32) -> Self {
        Self {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
        }
    }

    /// Minimums at zero, maximums as given.
    pub fn loose(max_width: f32, max_height: f32) -> Self {
        Self {
            min_width: 0.0,
            max_width,
            min_height: 0.0,
            max_height,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.max_width.is_finite() && self.max_height.is_finite()
    }

    #[inline]
    pub fn has_bounded_height(&self) -> bool {
        self.max_height.is_finite()
    }

    /// Clamps a size into these bounds.
    pub fn constrain(&self, width: f32, height: f32) -> (f32, f32) {
        (
            width.clamp(self.min_width, self.max_width),
            height.clamp(self.min_height, self.max_height),
        )
    }

    /// Keeps the width bounds and lets the height be anything.
    ///
    /// Indicators measure at their natural height under this.
    pub fn with_unbounded_height(self) -> Self {
        Self {
            min_height: 0.0,
            max_height: f32::INFINITY,
            ..self
        }
    }

    /// Drops the minimum width.
    pub fn loosen_width(self) -> Self {
        Self {
            min_width: 0.0,
            ..self
        }
    }
}
