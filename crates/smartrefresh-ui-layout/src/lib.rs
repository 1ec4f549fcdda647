//! Layout primitives shared by the widget and its hosts.

mod constraints;
mod geometry;
mod measure;
mod unit;

pub use constraints::Constraints;
pub use geometry::{Offset, Size, Velocity};
pub use measure::{FixedSize, Measurable};
pub use unit::{Density, Dp};
