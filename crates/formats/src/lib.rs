pub mod error;
pub mod land;
pub mod locations;
pub mod topojson;

pub use error::*;
pub use land::*;
pub use locations::*;
pub use topojson::*;
