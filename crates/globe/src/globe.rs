use std::sync::Arc;

use formats::locations_from_rows;
use foundation::math::{LonLat, ProjectionEngine, Rotation, Vec2};
use foundation::viewport::Viewport;
use layers::{GlobeRenderer, MarkerDiff, MarkerLayer, RenderStats};
use runtime::{Frame, SubscriptionId};
use scene::{HoverSelection, HoverSelectionState, LandGeometry, Location, LocationId, pick_screen};
use serde_json::Value;
use surface::{RasterSurface, ShapeId, SurfaceManager, VectorSurface};
use tracing::{debug, info, trace, warn};

use crate::cache::GeometryResult;
use crate::config::GlobeConfig;
use crate::controller::{InteractionController, InteractionState, rotation_to_center};
use crate::presenter::{InfoPanelView, TooltipView, info_panel_view, tooltip_view};

/// One-time gate in front of everything that draws.
#[derive(Debug, Clone)]
enum GeometryGate {
    Pending,
    Ready(Arc<LandGeometry>),
}

/// The interactive globe: projection, both surfaces, layers, hover state and
/// the interaction controller, owned by the host and passed by reference.
///
/// Nothing draws until [`Globe::attach_geometry`] has run once. Calls made
/// before that only update state; markers delivered early are held back and
/// reconciled when the geometry arrives.
#[derive(Debug)]
pub struct Globe<R, V> {
    config: GlobeConfig,
    engine: ProjectionEngine,
    surfaces: SurfaceManager<R, V>,
    renderer: GlobeRenderer,
    markers: MarkerLayer,
    selection: HoverSelection,
    controller: InteractionController,
    geometry: GeometryGate,
    pending_locations: Option<Vec<Location>>,
    frame: Frame,
    redraws: u64,
}

impl<R: RasterSurface, V: VectorSurface> Globe<R, V> {
    pub fn new(config: GlobeConfig, raster: R, vector: V) -> Self {
        let mut engine = ProjectionEngine::new(config.fill_ratio);
        engine.set_rotation(Rotation::from_array(config.initial_rotation));
        let renderer = GlobeRenderer::new(config.style.clone(), &config.graticule, config.resample_deg);
        let mut controller = InteractionController::new(
            config.inertia.clone(),
            config.auto_rotate_deg_per_tick,
            config.resume_auto_rotate,
        );
        if config.auto_rotate {
            controller.start_auto_rotate();
        }
        Self {
            markers: MarkerLayer::new(config.marker.radius),
            config,
            engine,
            surfaces: SurfaceManager::new(raster, vector),
            renderer,
            selection: HoverSelection::new(),
            controller,
            geometry: GeometryGate::Pending,
            pending_locations: None,
            frame: Frame::first(),
            redraws: 0,
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    pub fn rotation(&self) -> Rotation {
        self.engine.rotation()
    }

    pub fn surfaces(&self) -> &SurfaceManager<R, V> {
        &self.surfaces
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.geometry, GeometryGate::Ready(_))
    }

    /// Completed full redraws (raster and vector).
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Resizes both surfaces, refits the projection and redraws.
    ///
    /// Safe to call any number of times, before or after the geometry arrives.
    pub fn handle_resize(&mut self, viewport: Viewport) {
        self.surfaces.resize(viewport);
        let st = self.engine.fit(&viewport);
        debug!(
            width = viewport.width,
            height = viewport.height,
            scale = st.scale,
            "projection fitted"
        );
        self.redraw();
    }

    /// Opens the draw gate. Only the first call has an effect.
    ///
    /// A failed fetch leaves the globe usable with no landmass: sphere,
    /// graticule and markers still draw.
    pub fn attach_geometry(&mut self, result: GeometryResult) {
        if self.is_ready() {
            debug!("geometry already attached, ignoring");
            return;
        }
        let land = match result {
            Ok(land) => {
                info!(
                    polygons = land.polygons().len(),
                    rings = land.ring_count(),
                    vertices = land.vertex_count(),
                    "landmass geometry ready"
                );
                land
            }
            Err(e) => {
                warn!(error = %e, "landmass geometry unavailable, drawing without land");
                Arc::new(LandGeometry::empty())
            }
        };
        self.geometry = GeometryGate::Ready(land);
        if let Some(locations) = self.pending_locations.take() {
            self.apply_locations(locations);
        }
        self.redraw();
    }

    /// Replaces the marker dataset. Only the vector surface is touched.
    pub fn set_locations(&mut self, locations: Vec<Location>) -> MarkerDiff {
        if !self.is_ready() {
            debug!(count = locations.len(), "locations held until geometry is ready");
            self.pending_locations = Some(locations);
            return MarkerDiff::default();
        }
        self.apply_locations(locations)
    }

    /// Loads a fresh recommendation result set: the first row is the target.
    /// Clears hover and pin state first, then turns the target to the viewer.
    pub fn set_results(&mut self, rows: &[Value]) -> MarkerDiff {
        self.selection.reset();
        let locations = locations_from_rows(rows, None);
        let target = locations
            .iter()
            .find(|l| l.is_target)
            .and_then(Location::coordinates);
        let diff = self.set_locations(locations);
        if let Some(p) = target {
            self.center_on(p.lat, p.lon);
        }
        diff
    }

    fn apply_locations(&mut self, locations: Vec<Location>) -> MarkerDiff {
        let diff = self
            .markers
            .update_locations(locations, self.engine.front(), self.surfaces.vector_mut());
        // A removed shape never sends its pointer-leave.
        let hovered_gone = self
            .selection
            .state()
            .hovered
            .as_ref()
            .is_some_and(|l| self.markers.shape_for(&l.id).is_none());
        if hovered_gone {
            self.selection.on_marker_unhover();
        }
        diff
    }

    /// Turns the globe so `(lat, lon)` faces the viewer. Stops any animation.
    pub fn center_on(&mut self, lat: f64, lon: f64) -> bool {
        let target = LonLat::new(lon, lat);
        if !target.is_valid() {
            warn!(lat, lon, "center_on ignored for invalid coordinates");
            return false;
        }
        self.set_rotation(rotation_to_center(self.engine.rotation(), target));
        true
    }

    /// Sets the rotation directly. Stops any animation.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if !rotation.is_finite() {
            warn!(?rotation, "non-finite rotation ignored");
            return;
        }
        self.controller.interrupt();
        self.engine.set_rotation(rotation);
        self.redraw();
    }

    pub fn hover_selection(&self) -> &HoverSelectionState {
        self.selection.state()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HoverSelectionState) + 'static) -> SubscriptionId {
        self.selection.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.selection.unsubscribe(id)
    }

    pub fn reset_selection(&mut self) {
        self.selection.reset();
    }

    /// Pointer entered a marker shape.
    pub fn marker_pointer_enter(&mut self, shape: ShapeId) -> bool {
        let location = self
            .markers
            .set_hovered(Some(shape), self.surfaces.vector_mut())
            .cloned();
        match location {
            Some(location) => {
                self.selection.on_marker_hover(Some(location));
                true
            }
            None => {
                debug!(%shape, "pointer entered an unknown shape");
                false
            }
        }
    }

    /// Pointer left a marker shape.
    pub fn marker_pointer_leave(&mut self, shape: ShapeId) {
        if self.markers.hovered() == Some(shape) {
            self.markers.set_hovered(None, self.surfaces.vector_mut());
        }
        self.selection.on_marker_unhover();
    }

    /// Result-table hover: highlights `id`, shows it and turns the globe to it.
    pub fn focus_location(&mut self, id: &LocationId) -> bool {
        let Some(target) = self.markers.locations().iter().find(|l| &l.id == id).cloned() else {
            debug!(%id, "focus requested for an unknown location");
            return false;
        };
        self.mark_selected(Some(id));
        self.selection.on_marker_hover(Some(target.clone()));
        if let Some(p) = target.coordinates() {
            self.center_on(p.lat, p.lon);
        }
        true
    }

    /// Result-table hover-out: drops the highlight and the tooltip, keeps the pin.
    pub fn clear_focus(&mut self) {
        self.mark_selected(None);
        self.selection.on_marker_hover(None);
    }

    fn mark_selected(&mut self, id: Option<&LocationId>) {
        let locations = self
            .markers
            .locations()
            .iter()
            .cloned()
            .map(|mut l| {
                l.is_selected = Some(&l.id) == id;
                l
            })
            .collect();
        self.apply_locations(locations);
    }

    /// Topmost visible marker within the marker radius of `pos`.
    pub fn pick(&self, pos: Vec2) -> Option<&Location> {
        let front = self.engine.front();
        let hit = pick_screen(self.markers.screen_markers(front), pos, self.markers.radius())?;
        self.markers.locations().get(hit.index)
    }

    pub fn tooltip(&self) -> TooltipView {
        tooltip_view(self.selection.state(), self.engine.front(), &self.config.tooltip)
    }

    pub fn info_panel(&self) -> InfoPanelView {
        info_panel_view(self.selection.state(), self.config.info_panel)
    }

    pub fn pointer_down(&mut self, pos: Vec2, time_s: f64) -> bool {
        self.controller.pointer_down(pos, time_s, self.engine.front())
    }

    /// Drags the globe; every accepted move is a full redraw.
    pub fn pointer_move(&mut self, pos: Vec2, time_s: f64) -> bool {
        let Some(rotation) = self.controller.pointer_move(pos, time_s) else {
            return false;
        };
        self.engine.set_rotation(rotation);
        self.redraw();
        true
    }

    pub fn pointer_up(&mut self, time_s: f64) -> InteractionState {
        self.controller.pointer_up(time_s)
    }

    /// One animation tick. Returns whether the globe turned.
    pub fn tick(&mut self, dt_s: f64) -> bool {
        self.frame = self.frame.advance(dt_s);
        let Some(rotation) = self.controller.tick(&self.frame, self.engine.rotation()) else {
            return false;
        };
        self.engine.set_rotation(rotation);
        self.redraw();
        true
    }

    /// Full redraw of both surfaces, skipped while gated or not drawable.
    pub fn redraw(&mut self) -> Option<RenderStats> {
        let GeometryGate::Ready(land) = &self.geometry else {
            trace!("redraw skipped, geometry pending");
            return None;
        };
        if !self.surfaces.viewport().is_some_and(|v| v.is_drawable()) {
            trace!("redraw skipped, viewport not drawable");
            return None;
        }
        let (raster, vector) = self.surfaces.split_mut();
        let stats = self.renderer.render(&self.engine, land, raster);
        self.markers.redraw(self.engine.front(), vector);
        self.redraws += 1;
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::Globe;
    use crate::config::GlobeConfig;
    use crate::controller::InteractionState;
    use formats::GeometryError;
    use foundation::math::{LonLat, Vec2};
    use foundation::viewport::Viewport;
    use layers::{SELECTION_CLASS, TARGET_CLASS};
    use pretty_assertions::assert_eq;
    use scene::{LandGeometry, Location, LocationId};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use surface::{RasterOp, RecordingRaster, RecordingScene};

    type TestGlobe = Globe<RecordingRaster, RecordingScene>;

    fn globe() -> TestGlobe {
        Globe::new(GlobeConfig::default(), RecordingRaster::new(), RecordingScene::new())
    }

    fn square_land() -> Arc<LandGeometry> {
        let ring = vec![
            LonLat::new(-5.0, 40.0),
            LonLat::new(10.0, 40.0),
            LonLat::new(10.0, 52.0),
            LonLat::new(-5.0, 52.0),
            LonLat::new(-5.0, 40.0),
        ];
        Arc::new(LandGeometry::new(vec![vec![ring]]))
    }

    fn ready_globe(width: f64, height: f64) -> TestGlobe {
        let mut g = globe();
        g.handle_resize(Viewport::new(width, height, 1.0));
        g.attach_geometry(Ok(square_land()));
        g
    }

    fn two_cities() -> Vec<Location> {
        vec![
            Location::new(1, "Paris", 2.35, 48.85).with_target(true),
            Location::new(2, "London", -0.13, 51.51),
        ]
    }

    #[test]
    fn scenario_two_markers_and_hover() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_locations(two_cities());
        let scene = g.surfaces().vector();
        assert_eq!(scene.shape_count(), 2);

        let london = g.markers().shape_for(&LocationId::from(2)).unwrap();
        assert!(g.marker_pointer_enter(london));
        let pinned = g.hover_selection().pinned.as_ref().unwrap();
        assert_eq!(pinned.id, LocationId::from(2));

        let paris = g.markers().shape_for(&LocationId::from(1)).unwrap();
        assert!(g.surfaces().vector().shape(paris).unwrap().has_class(TARGET_CLASS));
    }

    #[test]
    fn resetting_locations_keeps_shapes_and_bindings() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_locations(two_cities());
        let london = g.markers().shape_for(&LocationId::from(2)).unwrap();

        let diff = g.set_locations(vec![
            Location::new(2, "London", -0.13, 51.51),
            Location::new(3, "Berlin", 13.4, 52.52),
        ]);
        assert_eq!((diff.entered, diff.updated, diff.exited), (1, 1, 1));
        assert_eq!(g.markers().shape_for(&LocationId::from(2)), Some(london));
        let scene = g.surfaces().vector();
        assert_eq!(scene.created_count(), 3);
        assert_eq!(scene.shape(london).unwrap().bindings, 1);

        let seen = Rc::new(RefCell::new(0));
        let s = seen.clone();
        g.subscribe(move |_| *s.borrow_mut() += 1);
        assert!(g.marker_pointer_enter(london));
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(g.hover_selection().hovered.as_ref().unwrap().name, "London");
    }

    #[test]
    fn pin_is_sticky_after_leave() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_locations(two_cities());
        let paris = g.markers().shape_for(&LocationId::from(1)).unwrap();
        g.marker_pointer_enter(paris);
        assert!(g.surfaces().vector().shape(paris).unwrap().has_class(SELECTION_CLASS));
        g.marker_pointer_leave(paris);

        let state = g.hover_selection();
        assert_eq!(state.hovered, None);
        assert_eq!(state.pinned.as_ref().map(|l| l.name.as_str()), Some("Paris"));
        assert!(!g.surfaces().vector().shape(paris).unwrap().has_class(SELECTION_CLASS));
        assert!(!g.tooltip().visible);
        assert_eq!(g.info_panel().name, "Name: Paris");
    }

    #[test]
    fn nothing_draws_before_geometry() {
        let mut g = globe();
        g.handle_resize(Viewport::new(500.0, 400.0, 2.0));
        g.handle_resize(Viewport::new(500.0, 400.0, 2.0));
        assert_eq!(g.set_locations(two_cities()).entered, 0);
        assert!(g.surfaces().raster().ops().is_empty());
        assert_eq!(g.surfaces().vector().shape_count(), 0);
        assert_eq!(g.redraw_count(), 0);

        g.attach_geometry(Ok(square_land()));
        assert_eq!(g.redraw_count(), 1);
        assert_eq!(g.surfaces().vector().shape_count(), 2);
        assert_eq!(g.surfaces().raster().clear_count(), 1);
        assert_eq!(g.surfaces().raster().backing_size(), (1000, 800));
    }

    #[test]
    fn second_geometry_is_ignored() {
        let mut g = ready_globe(500.0, 400.0);
        g.attach_geometry(Err(GeometryError::Fetch("late".to_string())));
        let fills = g
            .surfaces()
            .raster()
            .current_frame()
            .iter()
            .filter(|op| matches!(op, RasterOp::Fill { .. }))
            .count();
        // Sphere plus front land; the square is fully on the near side.
        assert_eq!(fills, 2);
    }

    #[test]
    fn failed_geometry_still_draws_sphere_and_markers() {
        let mut g = globe();
        g.handle_resize(Viewport::new(500.0, 400.0, 1.0));
        g.attach_geometry(Err(GeometryError::Fetch("offline".to_string())));
        assert!(g.is_ready());
        let frame = g.surfaces().raster().current_frame();
        assert!(frame.iter().any(|op| matches!(op, RasterOp::Fill { .. })));
        assert!(frame.iter().any(|op| matches!(op, RasterOp::Stroke { .. })));

        g.set_locations(two_cities());
        let london = g.markers().shape_for(&LocationId::from(2)).unwrap();
        assert!(g.marker_pointer_enter(london));
    }

    #[test]
    fn degenerate_viewport_defers_redraw() {
        let mut g = ready_globe(500.0, 400.0);
        let before = g.redraw_count();
        g.handle_resize(Viewport::new(0.0, 400.0, 1.0));
        assert_eq!(g.redraw_count(), before);
        assert!(g.engine().scale_translate().scale.is_finite());
        g.handle_resize(Viewport::new(500.0, 400.0, 1.0));
        assert_eq!(g.redraw_count(), before + 1);
    }

    #[test]
    fn resize_round_trip_restores_fit() {
        let mut g = ready_globe(800.0, 600.0);
        let original = g.engine().scale_translate();
        g.handle_resize(Viewport::new(400.0, 300.0, 1.0));
        g.handle_resize(Viewport::new(800.0, 600.0, 1.0));
        assert_eq!(g.engine().scale_translate(), original);
    }

    #[test]
    fn center_on_brings_the_point_to_the_middle() {
        let mut g = ready_globe(500.0, 400.0);
        assert!(g.center_on(48.85, 2.35));
        let p = g.engine().project(LonLat::new(2.35, 48.85)).unwrap();
        assert!(p.distance(Vec2::new(250.0, 200.0)) < 1e-9);
        assert!(!g.center_on(f64::NAN, 0.0));
    }

    #[test]
    fn pointer_down_during_inertia_leaves_no_drift() {
        let mut g = ready_globe(500.0, 400.0);
        g.pointer_down(Vec2::new(250.0, 200.0), 0.0);
        for i in 1..=5 {
            g.pointer_move(Vec2::new(250.0 + 12.0 * i as f64, 200.0), i as f64 * 0.01);
        }
        assert_eq!(g.pointer_up(0.05), InteractionState::InertiaDecay);
        assert!(g.tick(1.0 / 60.0));

        assert!(g.pointer_down(Vec2::new(300.0, 200.0), 0.1));
        assert_eq!(g.interaction_state(), InteractionState::Dragging);
        let held = g.rotation();
        for _ in 0..10 {
            assert!(!g.tick(1.0 / 60.0));
        }
        assert_eq!(g.rotation(), held);
    }

    #[test]
    fn auto_rotate_turns_on_ticks() {
        let mut g = Globe::new(GlobeConfig::full_bleed(), RecordingRaster::new(), RecordingScene::new());
        g.handle_resize(Viewport::new(500.0, 400.0, 1.0));
        g.attach_geometry(Ok(square_land()));
        let start = g.rotation().lambda();
        assert!(g.tick(0.016));
        assert!(g.tick(0.5));
        assert!((g.rotation().lambda() - (start + 0.4)).abs() < 1e-9);
        assert_eq!(g.redraw_count(), 3);
    }

    #[test]
    fn results_rows_become_markers_and_focus_recenters() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_results(&[
            json!({"race": 10, "racename": "Target", "lon": 2.35, "lat": 48.85, "city": "Paris, France"}),
            json!({"race": 11, "racename": "Other", "lon": 13.4, "lat": 52.52, "city": "Berlin, Germany"}),
        ]);
        assert_eq!(g.markers().len(), 2);

        let other = LocationId::from(11);
        assert!(g.focus_location(&other));
        let shape = g.markers().shape_for(&other).unwrap();
        assert!(g.surfaces().vector().shape(shape).unwrap().has_class(SELECTION_CLASS));
        assert_eq!(g.hover_selection().pinned.as_ref().unwrap().id, other);
        let centre = g.engine().project(LonLat::new(13.4, 52.52)).unwrap();
        assert!(centre.distance(Vec2::new(250.0, 200.0)) < 1e-9);

        g.clear_focus();
        assert!(!g.surfaces().vector().shape(shape).unwrap().has_class(SELECTION_CLASS));
        assert_eq!(g.hover_selection().hovered, None);
        assert_eq!(g.hover_selection().pinned.as_ref().unwrap().id, other);
        assert!(!g.focus_location(&LocationId::from(99)));
    }

    #[test]
    fn results_turn_a_far_side_target_to_the_viewer() {
        let mut g = ready_globe(500.0, 400.0);
        assert_eq!(g.engine().project(LonLat::new(151.2, -33.9)), None);
        g.set_results(&[
            json!({"race": 1, "racename": "Sydney", "lon": 151.2, "lat": -33.9}),
            json!({"race": 2, "racename": "Berlin", "lon": 13.4, "lat": 52.52}),
        ]);
        let p = g.engine().project(LonLat::new(151.2, -33.9)).unwrap();
        assert!(p.distance(Vec2::new(250.0, 200.0)) < 1e-9);
    }

    #[test]
    fn results_before_geometry_still_centre_the_target() {
        let mut g = globe();
        g.handle_resize(Viewport::new(500.0, 400.0, 1.0));
        g.set_results(&[json!({"race": 1, "racename": "Sydney", "lon": 151.2, "lat": -33.9})]);
        g.attach_geometry(Ok(square_land()));
        assert_eq!(g.markers().len(), 1);
        let p = g.engine().project(LonLat::new(151.2, -33.9)).unwrap();
        assert!(p.distance(Vec2::new(250.0, 200.0)) < 1e-9);
    }

    #[test]
    fn removing_the_hovered_marker_clears_hover_but_keeps_pin() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_locations(two_cities());
        let london = g.markers().shape_for(&LocationId::from(2)).unwrap();
        g.marker_pointer_enter(london);
        assert!(g.tooltip().visible);

        g.set_locations(vec![Location::new(1, "Paris", 2.35, 48.85)]);
        let state = g.hover_selection();
        assert_eq!(state.hovered, None);
        assert_eq!(state.pinned.as_ref().map(|l| l.name.as_str()), Some("London"));
        assert!(!g.tooltip().visible);

        // A hovered marker that survives the swap stays hovered.
        let paris = g.markers().shape_for(&LocationId::from(1)).unwrap();
        g.marker_pointer_enter(paris);
        g.set_locations(two_cities());
        assert_eq!(g.hover_selection().hovered.as_ref().map(|l| l.name.as_str()), Some("Paris"));
    }

    #[test]
    fn pick_finds_the_marker_under_the_pointer() {
        let mut g = ready_globe(500.0, 400.0);
        g.set_locations(two_cities());
        g.center_on(51.51, -0.13);
        let hit = g.pick(Vec2::new(251.0, 201.0)).unwrap();
        assert_eq!(hit.name, "London");
        assert!(g.pick(Vec2::new(10.0, 10.0)).is_none());
    }
}
