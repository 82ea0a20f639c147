pub mod manager;
pub mod paint;
pub mod path;
pub mod raster;
pub mod recording;
pub mod svg;
pub mod vector;

pub use manager::*;
pub use paint::*;
pub use path::*;
pub use raster::*;
pub use recording::*;
pub use svg::*;
pub use vector::*;
