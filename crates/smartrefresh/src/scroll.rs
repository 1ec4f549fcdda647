//! Scroll position of the inner list.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smartrefresh_core::{MutableState, Subscription};

static NEXT_SCROLL_STATE_ID: AtomicU64 = AtomicU64::new(1);

/// Scroll offset of a vertically scrolling list, clamped to `[0, max_value]`.
///
/// Holds only the position; gestures reach it through
/// [`NestedScrollDispatcher`](crate::NestedScrollDispatcher).
#[derive(Clone)]
pub struct ScrollState {
    inner: Rc<ScrollStateInner>,
}

struct ScrollStateInner {
    id: u64,
    value: MutableState<f32>,
    /// Content extent minus viewport extent.
    max_value: Cell<f32>,
}

impl ScrollState {
    pub fn new(initial: f32) -> Self {
        let id = NEXT_SCROLL_STATE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            inner: Rc::new(ScrollStateInner {
                id,
                value: MutableState::new(initial.max(0.0)),
                max_value: Cell::new(0.0),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn value(&self) -> f32 {
        self.inner.value.get()
    }

    pub fn max_value(&self) -> f32 {
        self.inner.max_value.get()
    }

    pub fn is_at_top(&self) -> bool {
        self.value() <= 0.0
    }

    pub fn is_at_bottom(&self) -> bool {
        self.value() >= self.max_value()
    }

    /// Set by whoever lays out the list. Pulls the position back in range.
    pub fn set_max_value(&self, max: f32) {
        let max = max.max(0.0);
        self.inner.max_value.set(max);
        if self.value() > max {
            self.inner.value.set(max);
        }
    }

    /// Scrolls by `delta`, clamping to `[0, max_value]`.
    /// Returns the amount actually scrolled.
    pub fn dispatch_raw_delta(&self, delta: f32) -> f32 {
        let current = self.value();
        let new_value = (current + delta).clamp(0.0, self.max_value());
        let actual_delta = new_value - current;
        if actual_delta.abs() > 0.001 {
            self.inner.value.set(new_value);
            actual_delta
        } else {
            0.0
        }
    }

    pub fn scroll_to(&self, position: f32) {
        self.inner.value.set(position.clamp(0.0, self.max_value()));
    }

    pub fn subscribe(&self, observer: impl Fn(&f32) + 'static) -> Subscription {
        self.inner.value.subscribe(observer)
    }
}

impl std::fmt::Debug for ScrollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollState")
            .field("id", &self.inner.id)
            .field("value", &self.value())
            .field("max_value", &self.max_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_delta_clamps_to_range() {
        let scroll = ScrollState::new(0.0);
        scroll.set_max_value(100.0);

        assert_eq!(scroll.dispatch_raw_delta(-10.0), 0.0);
        assert_eq!(scroll.dispatch_raw_delta(60.0), 60.0);
        assert_eq!(scroll.dispatch_raw_delta(60.0), 40.0);
        assert!(scroll.is_at_bottom());
    }

    #[test]
    fn shrinking_content_pulls_position_back() {
        let scroll = ScrollState::new(0.0);
        scroll.set_max_value(300.0);
        scroll.scroll_to(250.0);

        scroll.set_max_value(120.0);

        assert_eq!(scroll.value(), 120.0);
    }
}
