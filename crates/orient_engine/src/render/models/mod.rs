//! Procedural geometry
//!
//! Line models (arrows, axes, spline) are emitted as line lists, two
//! vertices per segment. The cube is a triangle list.

mod arrow;
mod coord_arrows;
mod cube;
mod spline;

pub use arrow::ArrowModel;
pub use coord_arrows::CoordArrowsModel;
pub use cube::CubeModel;
pub use spline::SplineModel;
