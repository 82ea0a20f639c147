pub mod geo_path;
pub mod globe;
pub mod graticule;
pub mod markers;
pub mod symbology;

pub use geo_path::*;
pub use globe::*;
pub use graticule::*;
pub use markers::*;
pub use symbology::*;
