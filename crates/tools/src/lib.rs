//! Headless globe rendering: the same `Globe` the browser runs, driven by
//! recording surfaces and flattened to SVG.

use std::cell::RefCell;

use formats::{GeometryError, parse_land_json, parse_locations_json, parse_results_json};
use foundation::math::{Rotation, Vec2};
use foundation::viewport::Viewport;
use globe::{GeometryCache, Globe, GlobeConfig, InfoPanelView, TooltipView, initialize};
use scene::LocationId;
use serde::Serialize;
use surface::{RecordingRaster, RecordingScene, export_svg};
use tracing::{debug, info};

/// Everything a render needs, already read from disk.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub config: GlobeConfig,
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
    /// GeoJSON or TopoJSON payload; `None` renders without land.
    pub land: Option<String>,
    /// JSON array of locations.
    pub locations: Option<String>,
    /// Recommendation rows; the first row is the target.
    pub results: Option<String>,
    /// `(lat, lon)` to face the viewer.
    pub center: Option<(f64, f64)>,
    pub rotate: Option<[f64; 3]>,
    /// Location id to hover.
    pub hover: Option<String>,
    /// Screen point to hover, in CSS pixels.
    pub hover_at: Option<Vec2>,
}

/// Presenter state after the render, printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presenters {
    pub hovered: Option<String>,
    pub tooltip: TooltipView,
    pub info_panel: InfoPanelView,
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub svg: String,
    pub markers: usize,
    pub presenters: Presenters,
}

pub fn render(request: &RenderRequest) -> Result<RenderOutput, String> {
    let viewport = Viewport::new(request.width, request.height, request.dpr);
    if !viewport.is_drawable() {
        return Err(format!("viewport {}x{} has nothing to draw", request.width, request.height));
    }
    let globe = RefCell::new(Globe::new(
        request.config.clone(),
        RecordingRaster::new(),
        RecordingScene::new(),
    ));

    let mut cache = GeometryCache::new();
    let land = request.land.clone();
    let object = request.config.geometry.object.clone();
    let geometry = cache.load(move || async move {
        match land {
            Some(payload) => parse_land_json(&payload, &object),
            None => Err(GeometryError::Fetch("no land file given".to_string())),
        }
    });
    pollster::block_on(initialize(&globe, viewport, geometry));
    let mut globe = globe.into_inner();

    if let Some(payload) = &request.locations {
        let locations = parse_locations_json(payload).map_err(|e| format!("locations json: {e}"))?;
        let diff = globe.set_locations(locations);
        debug!(entered = diff.entered, "locations applied");
    }
    if let Some(payload) = &request.results {
        let rows = parse_results_json(payload).map_err(|e| e.to_string())?;
        globe.set_results(&rows);
    }
    if let Some(r) = request.rotate {
        globe.set_rotation(Rotation::from_array(r));
    }
    if let Some((lat, lon)) = request.center {
        if !globe.center_on(lat, lon) {
            return Err(format!("cannot center on {lat},{lon}"));
        }
    }

    if let Some(id) = &request.hover {
        let id = LocationId::new(id.clone());
        let shape = globe
            .markers()
            .shape_for(&id)
            .ok_or_else(|| format!("no marker with id {id}"))?;
        globe.marker_pointer_enter(shape);
    } else if let Some(pos) = request.hover_at {
        let shape = globe.pick(pos).and_then(|l| globe.markers().shape_for(&l.id));
        match shape {
            Some(shape) => {
                globe.marker_pointer_enter(shape);
            }
            None => info!(x = pos.x, y = pos.y, "no marker under the hover point"),
        }
    }

    let presenters = Presenters {
        hovered: globe.hover_selection().hovered.as_ref().map(|l| l.id.to_string()),
        tooltip: globe.tooltip(),
        info_panel: globe.info_panel(),
    };
    let surfaces = globe.surfaces();
    let svg = export_svg(
        surfaces.raster(),
        surfaces.vector(),
        &globe.config().marker.stylesheet(),
    );
    Ok(RenderOutput {
        svg,
        markers: globe.markers().len(),
        presenters,
    })
}

/// Parses `LAT,LON`.
pub fn parse_lat_lon(s: &str) -> Result<(f64, f64), String> {
    match parse_numbers(s)?.as_slice() {
        [lat, lon] => Ok((*lat, *lon)),
        _ => Err(format!("expected LAT,LON, got {s:?}")),
    }
}

/// Parses `LAMBDA,PHI,GAMMA` (gamma optional).
pub fn parse_rotation(s: &str) -> Result<[f64; 3], String> {
    match parse_numbers(s)?.as_slice() {
        [l, p] => Ok([*l, *p, 0.0]),
        [l, p, g] => Ok([*l, *p, *g]),
        _ => Err(format!("expected LAMBDA,PHI[,GAMMA], got {s:?}")),
    }
}

/// Parses `X,Y` screen coordinates.
pub fn parse_point(s: &str) -> Result<Vec2, String> {
    match parse_numbers(s)?.as_slice() {
        [x, y] => Ok(Vec2::new(*x, *y)),
        _ => Err(format!("expected X,Y, got {s:?}")),
    }
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            let v: f64 = part
                .trim()
                .parse()
                .map_err(|e| format!("bad number {part:?}: {e}"))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(format!("non-finite number {part:?}"))
            }
        })
        .collect()
}
