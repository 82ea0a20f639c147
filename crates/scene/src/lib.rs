pub mod geometry;
pub mod location;
pub mod picking;
pub mod selection;

pub use geometry::*;
pub use location::*;
pub use picking::*;
pub use selection::*;
