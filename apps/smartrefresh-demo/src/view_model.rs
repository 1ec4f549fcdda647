//! Simulated data source for the demo list.

use std::cell::Cell;
use std::fmt;

use chrono::Local;
use log::{info, warn};
use smartrefresh_core::{MutableState, RuntimeHandle, Subscription};

use crate::topics::{catalogue, Topic};

/// How long a simulated fetch takes, in frame-clock milliseconds.
pub const FETCH_DELAY_MILLIS: u64 = 2000;

#[derive(Clone, Debug, PartialEq)]
pub struct MainUiState {
    pub data: Vec<Topic>,
    pub is_load_more: bool,
    pub succeeded: bool,
    // Bumped per result so two identical failures still notify.
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    Simulated { is_refresh: bool },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Simulated { is_refresh: true } => write!(f, "simulated refresh failure"),
            FetchError::Simulated { is_refresh: false } => write!(f, "simulated load failure"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Produces the list content. Every other fetch fails.
pub struct MainViewModel {
    runtime: RuntimeHandle,
    ui_state: MutableState<Option<MainUiState>>,
    next_succeeds: Cell<bool>,
    version: Cell<u64>,
}

impl MainViewModel {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            ui_state: MutableState::new(None),
            next_succeeds: Cell::new(true),
            version: Cell::new(0),
        }
    }

    pub fn ui_state(&self) -> Option<MainUiState> {
        self.ui_state.get()
    }

    pub fn item_count(&self) -> usize {
        self.ui_state
            .with(|state| state.as_ref().map_or(0, |state| state.data.len()))
    }

    pub fn first_title(&self) -> Option<String> {
        self.ui_state.with(|state| {
            state
                .as_ref()
                .and_then(|state| state.data.first())
                .map(|topic| topic.title.clone())
        })
    }

    pub fn subscribe(&self, observer: impl Fn(&Option<MainUiState>) + 'static) -> Subscription {
        self.ui_state.subscribe(observer)
    }

    fn current_data(&self) -> Vec<Topic> {
        self.ui_state
            .with(|state| state.as_ref().map(|state| state.data.clone()))
            .unwrap_or_default()
    }

    async fn fetch(&self, is_refresh: bool) -> Result<Vec<Topic>, FetchError> {
        self.runtime.frame_clock().delay(FETCH_DELAY_MILLIS).await;
        if !self.next_succeeds.get() {
            return Err(FetchError::Simulated { is_refresh });
        }
        if is_refresh {
            let mut data = catalogue();
            if let Some(first) = data.first_mut() {
                first.title = Local::now().timestamp_millis().to_string();
            }
            Ok(data)
        } else {
            let mut data = self.current_data();
            data.extend(catalogue());
            Ok(data)
        }
    }

    /// Fetches and publishes the result. A refresh replaces the list, a load
    /// appends to it; a failure keeps the current list.
    pub async fn fill_data(&self, is_refresh: bool) {
        let result = self.fetch(is_refresh).await;
        self.next_succeeds.set(!self.next_succeeds.get());
        let version = self.version.get() + 1;
        self.version.set(version);
        let next = match result {
            Ok(data) => {
                info!("fill_data succeeded with {} topics", data.len());
                MainUiState {
                    data,
                    is_load_more: !is_refresh,
                    succeeded: true,
                    version,
                }
            }
            Err(err) => {
                warn!("fill_data failed: {err}");
                MainUiState {
                    data: self.current_data(),
                    is_load_more: !is_refresh,
                    succeeded: false,
                    version,
                }
            }
        };
        self.ui_state.set(Some(next));
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
