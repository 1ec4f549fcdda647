use crate::{Constraints, Size};

/// Something the layout pass can ask for a size.
pub trait Measurable {
    fn measure(&self, constraints: Constraints) -> Size;
}

/// A measurable with a preferred size, clamped into the constraints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSize {
    pub width: f32,
    pub height: f32,
}

impl FixedSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Fills the available width at a fixed height.
    pub fn fill_width(height: f32) -> Self {
        Self {
            width: f32::INFINITY,
            height,
        }
    }
}

impl Measurable for FixedSize {
    fn measure(&self, constraints: Constraints) -> Size {
        let width = if self.width.is_finite() {
            self.width
        } else {
            constraints.max_width
        };
        let (width, height) = constraints.constrain(width, self.height);
        Size::new(width, height)
    }
}
