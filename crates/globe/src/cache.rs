use std::fmt;
use std::future::Future;
use std::sync::Arc;

use formats::GeometryError;
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use scene::LandGeometry;
use tracing::debug;

pub type GeometryResult = Result<Arc<LandGeometry>, GeometryError>;

/// Cloneable handle to the one landmass fetch.
pub type GeometryFuture = Shared<LocalBoxFuture<'static, GeometryResult>>;

/// Process-lifetime cache of the landmass geometry.
///
/// The first [`GeometryCache::load`] starts the fetch; every later call gets a
/// clone of the same shared future, resolved or not. Nothing is ever
/// re-fetched, including after a failure.
#[derive(Default)]
pub struct GeometryCache {
    future: Option<GeometryFuture>,
    fetches: u32,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<F, Fut>(&mut self, fetch: F) -> GeometryFuture
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LandGeometry, GeometryError>> + 'static,
    {
        if let Some(future) = &self.future {
            debug!("geometry fetch already started, sharing it");
            return future.clone();
        }
        self.fetches += 1;
        let future = fetch().map(|result| result.map(Arc::new)).boxed_local().shared();
        self.future = Some(future.clone());
        future
    }

    /// The resolved geometry, once the shared fetch has completed.
    pub fn peek(&self) -> Option<GeometryResult> {
        self.future.as_ref().and_then(|f| f.peek().cloned())
    }

    pub fn is_started(&self) -> bool {
        self.future.is_some()
    }

    /// How many times a fetch closure was run. Never more than one.
    pub fn fetch_count(&self) -> u32 {
        self.fetches
    }
}

impl fmt::Debug for GeometryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryCache")
            .field("started", &self.is_started())
            .field("fetches", &self.fetches)
            .finish()
    }
}
