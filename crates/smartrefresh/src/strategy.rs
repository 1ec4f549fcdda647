/// How far an edge's indicator may be pulled out, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThresholdStrategy {
    /// The edge never reveals.
    None,
    /// Clamp the offset at this height.
    Fixed(f32),
    Unlimited,
}

impl ThresholdStrategy {
    pub fn bound(self) -> f32 {
        match self {
            ThresholdStrategy::None => 0.0,
            ThresholdStrategy::Fixed(height) => height,
            ThresholdStrategy::Unlimited => f32::INFINITY,
        }
    }
}

/// Strategies per edge and per interaction mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorStrategies {
    pub drag_header: ThresholdStrategy,
    pub drag_footer: ThresholdStrategy,
    pub fling_header: ThresholdStrategy,
    pub fling_footer: ThresholdStrategy,
}

impl Default for IndicatorStrategies {
    fn default() -> Self {
        Self {
            drag_header: ThresholdStrategy::Unlimited,
            drag_footer: ThresholdStrategy::Unlimited,
            fling_header: ThresholdStrategy::None,
            fling_footer: ThresholdStrategy::None,
        }
    }
}
