//! SmartRefresh demo: a topic list that refreshes from the top and loads more
//! from the bottom, driven headlessly.

pub mod pacer;
pub mod screen;
pub mod session;
pub mod topics;
pub mod view_model;

pub use pacer::{FramePacer, WallClock};
pub use screen::{DemoScreen, ScreenSnapshot, TopicList, ROW_HEIGHT};
pub use session::{Session, SessionError, Step, SCRIPT};
pub use topics::{catalogue, random_icon, Topic};
pub use view_model::{FetchError, MainUiState, MainViewModel, FETCH_DELAY_MILLIS};
