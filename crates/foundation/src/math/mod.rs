pub mod precision;
pub mod projection;
pub mod rotation;
pub mod spherical;
pub mod vec;
pub mod versor;

pub use precision::*;
pub use projection::*;
pub use rotation::*;
pub use spherical::*;
pub use vec::*;
pub use versor::*;
