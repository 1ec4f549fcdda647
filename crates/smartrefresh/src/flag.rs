/// Where one edge of the container is in its refresh cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SmartSwipeStateFlag {
    #[default]
    Idle,
    /// Dragged out, short of the threshold.
    TipsDown,
    /// Past the threshold; releasing commits.
    TipsRelease,
    Refreshing,
    Success,
    Error,
}

impl SmartSwipeStateFlag {
    /// Set only by a committed release or by the caller; drags leave these alone.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Refreshing | Self::Success | Self::Error)
    }

    pub fn is_tips(self) -> bool {
        matches!(self, Self::TipsDown | Self::TipsRelease)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}
