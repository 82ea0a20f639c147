pub mod cache;
pub mod config;
pub mod controller;
pub mod globe;
pub mod presenter;

pub use cache::*;
pub use config::*;
pub use controller::*;
pub use globe::*;
pub use presenter::*;

use std::cell::RefCell;

use foundation::viewport::Viewport;
use surface::{RasterSurface, VectorSurface};
use tracing::info;

/// First layout, then the one-time wait for the landmass, then the first draw.
///
/// The globe is only borrowed around the synchronous steps, so hosts can keep
/// handling resizes and data updates while the fetch is in flight.
pub async fn initialize<R, V>(globe: &RefCell<Globe<R, V>>, viewport: Viewport, geometry: GeometryFuture)
where
    R: RasterSurface,
    V: VectorSurface,
{
    globe.borrow_mut().handle_resize(viewport);
    let land = geometry.await;
    let mut globe = globe.borrow_mut();
    globe.attach_geometry(land);
    info!(redraws = globe.redraw_count(), "globe initialized");
}
