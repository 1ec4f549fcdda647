//! Density-independent units.

/// Density-independent pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Dp(pub f32);

impl Dp {
    pub const ZERO: Dp = Dp(0.0);

    pub fn to_px(self, density: Density) -> f32 {
        self.0 * density.density
    }

    pub fn from_px(px: f32, density: Density) -> Self {
        Self(px / density.density)
    }
}

/// Pixels per dp of the host surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    pub density: f32,
}

impl Density {
    pub fn new(density: f32) -> Self {
        Self { density }
    }
}

impl Default for Density {
    fn default() -> Self {
        Self::new(1.0)
    }
}
