//! Browser host: a `<canvas>` under an `<svg>` overlay inside one container
//! element, driven by `requestAnimationFrame` and DOM pointer events.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

use console_error_panic_hook::set_once;
use formats::{GeometryError, parse_land_json, parse_locations_json, parse_results_json};
use foundation::math::Vec2;
use foundation::time::Time;
use foundation::viewport::Viewport;
use gloo_net::http::Request;
use globe::{GeometryCache, Globe, GlobeConfig, initialize};
use scene::{HoverSelectionState, LandGeometry, LocationId};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, PointerEvent};

mod canvas;
mod events;
mod svg;

use canvas::CanvasRaster;
use events::{EventQueue, HostEvent};
use svg::{SVG_NS, SvgScene};

type WebGlobe = Globe<CanvasRaster, SvgScene>;
type PointerListener = Closure<dyn FnMut(PointerEvent)>;

#[wasm_bindgen(start)]
pub fn start() {
    set_once();
    init_logging();
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(ConsoleWriter::default)
        .with_ansi(false)
        .without_time()
        .try_init();
}

/// Line-buffered writer onto `console.log`.
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

struct Host {
    globe: RefCell<WebGlobe>,
    container: HtmlElement,
    queue: EventQueue,
    cache: RefCell<GeometryCache>,
    notifications: Rc<RefCell<Vec<HoverSelectionState>>>,
    subscribers: RefCell<Vec<Option<js_sys::Function>>>,
    pointer_listeners: RefCell<Vec<(&'static str, PointerListener)>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    last_frame: Cell<Option<Time>>,
}

impl Host {
    fn viewport(&self) -> Viewport {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        Viewport::new(
            self.container.client_width() as f64,
            self.container.client_height() as f64,
            dpr,
        )
    }

    /// Delivers queued DOM events if the globe is free, then notifies.
    fn pump(&self) {
        loop {
            let events = self.queue.drain();
            if events.is_empty() {
                break;
            }
            let Ok(mut globe) = self.globe.try_borrow_mut() else {
                self.queue.requeue(events);
                return;
            };
            for event in events {
                apply_event(&mut globe, event);
            }
        }
        self.flush();
    }

    /// Hands pending hover/selection states to JS subscribers.
    ///
    /// Runs with the globe released, so callbacks may call back into the handle.
    fn flush(&self) {
        let states: Vec<_> = self.notifications.borrow_mut().drain(..).collect();
        if states.is_empty() {
            return;
        }
        let subscribers: Vec<js_sys::Function> = self.subscribers.borrow().iter().flatten().cloned().collect();
        for state in states {
            let value = match to_js(&state) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = ?e, "hover state not serializable");
                    continue;
                }
            };
            for callback in &subscribers {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    warn!(error = ?e, "hover subscriber threw");
                }
            }
        }
    }

    fn on_frame(&self, now: Time) {
        let dt_s = self
            .last_frame
            .replace(Some(now))
            .map_or(0.0, |last| now.since(last));
        self.pump();
        if let Ok(mut globe) = self.globe.try_borrow_mut() {
            globe.tick(dt_s);
        }
        self.flush();
    }

    fn request_frame(&self) {
        let (Some(window), Some(callback)) = (web_sys::window(), self.frame.borrow().as_ref().map(|c| c.as_ref().clone()))
        else {
            return;
        };
        if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
            warn!(error = ?e, "requestAnimationFrame failed");
        }
    }

    fn with_globe<T>(&self, f: impl FnOnce(&mut WebGlobe) -> T) -> Result<T, JsValue> {
        let out = {
            let mut globe = self
                .globe
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("globe is busy"))?;
            f(&mut globe)
        };
        self.pump();
        Ok(out)
    }
}

fn apply_event(globe: &mut WebGlobe, event: HostEvent) {
    match event {
        HostEvent::MarkerEnter(shape) => {
            globe.marker_pointer_enter(shape);
        }
        HostEvent::MarkerLeave(shape) => globe.marker_pointer_leave(shape),
        HostEvent::PointerDown { pos, time_s } => {
            globe.pointer_down(pos, time_s);
        }
        HostEvent::PointerMove { pos, time_s } => {
            globe.pointer_move(pos, time_s);
        }
        HostEvent::PointerUp { time_s } => {
            let state = globe.pointer_up(time_s);
            debug!(?state, "pointer released");
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

async fn fetch_land(url: String, object: String) -> Result<LandGeometry, GeometryError> {
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| GeometryError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(GeometryError::Fetch(format!("{url}: HTTP {}", resp.status())));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| GeometryError::Fetch(e.to_string()))?;
    parse_land_json(&text, &object)
}

fn create_layers(document: &Document, container: &HtmlElement) -> Result<(HtmlCanvasElement, Element), JsValue> {
    let _ = container.style().set_property("position", "relative");

    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    let overlay = document.create_element_ns(Some(SVG_NS), "svg")?;
    let style = canvas.style();
    style.set_property("position", "absolute")?;
    style.set_property("left", "0")?;
    style.set_property("top", "0")?;
    overlay.set_attribute("style", "position:absolute;left:0;top:0;touch-action:none")?;

    // Raster beneath, vector above, same origin.
    container.append_child(&canvas)?;
    container.append_child(&overlay)?;
    Ok((canvas, overlay))
}

fn bind_pointer(host: &Rc<Host>, overlay: &Element) -> Result<(), JsValue> {
    let kinds: [&'static str; 4] = ["pointerdown", "pointermove", "pointerup", "pointercancel"];
    for kind in kinds {
        let weak: Weak<Host> = Rc::downgrade(host);
        let target = overlay.clone();
        let listener = Closure::<dyn FnMut(PointerEvent)>::new(move |ev: PointerEvent| {
            let Some(host) = weak.upgrade() else {
                return;
            };
            let rect = target.get_bounding_client_rect();
            let pos = Vec2::new(
                ev.client_x() as f64 - rect.left(),
                ev.client_y() as f64 - rect.top(),
            );
            let time_s = Time::from_millis(ev.time_stamp()).seconds();
            let event = match kind {
                "pointerdown" => {
                    let _ = target.set_pointer_capture(ev.pointer_id());
                    HostEvent::PointerDown { pos, time_s }
                }
                "pointermove" => HostEvent::PointerMove { pos, time_s },
                _ => HostEvent::PointerUp { time_s },
            };
            host.queue.push(event);
        });
        overlay.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
        host.pointer_listeners.borrow_mut().push((kind, listener));
    }
    Ok(())
}

/// JS-facing handle to one globe instance.
#[wasm_bindgen]
pub struct RenderHandle {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl RenderHandle {
    /// Builds both surfaces inside `#container_id` and starts the frame loop.
    /// Nothing is drawn until `initialize` has fetched the landmass.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, config_json: Option<String>) -> Result<RenderHandle, JsValue> {
        let config = match config_json {
            Some(json) => GlobeConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => GlobeConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{container_id}")))?
            .dyn_into::<HtmlElement>()?;

        let (canvas, overlay) = create_layers(&document, &container)?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let queue = EventQueue::new();
        let raster = CanvasRaster::new(canvas, ctx);
        let vector = SvgScene::new(document, overlay.clone(), queue.clone());
        let mut globe = Globe::new(config, raster, vector);

        let notifications = Rc::new(RefCell::new(Vec::new()));
        let sink = notifications.clone();
        globe.subscribe(move |state: &HoverSelectionState| sink.borrow_mut().push(state.clone()));

        let host = Rc::new(Host {
            globe: RefCell::new(globe),
            container,
            queue,
            cache: RefCell::new(GeometryCache::new()),
            notifications,
            subscribers: RefCell::new(Vec::new()),
            pointer_listeners: RefCell::new(Vec::new()),
            frame: RefCell::new(None),
            last_frame: Cell::new(None),
        });

        let weak = Rc::downgrade(&host);
        host.queue.set_wake(move || {
            if let Some(host) = weak.upgrade() {
                host.pump();
            }
        });
        bind_pointer(&host, &overlay)?;

        let weak = Rc::downgrade(&host);
        let frame = Closure::<dyn FnMut(f64)>::new(move |now_ms: f64| {
            if let Some(host) = weak.upgrade() {
                host.on_frame(Time::from_millis(now_ms));
                host.request_frame();
            }
        });
        *host.frame.borrow_mut() = Some(frame);
        host.request_frame();

        info!(container = container_id, "globe host created");
        Ok(RenderHandle { host })
    }

    /// First layout, one-time landmass fetch, first draw. Resolves once drawn.
    pub fn initialize(&self) -> js_sys::Promise {
        let host = self.host.clone();
        future_to_promise(async move {
            let viewport = host.viewport();
            let source = host.globe.borrow().config().geometry.clone();
            let geometry = host
                .cache
                .borrow_mut()
                .load(move || fetch_land(source.url, source.object));
            initialize(&host.globe, viewport, geometry).await;
            host.pump();
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Re-measures the container and redraws. Safe before `initialize` resolves.
    pub fn handle_resize(&self) -> Result<(), JsValue> {
        let viewport = self.host.viewport();
        self.host.with_globe(|g| g.handle_resize(viewport))
    }

    /// Replaces the markers with a JSON array of locations. Malformed entries
    /// are logged and skipped; only a payload that is not a list is rejected.
    pub fn set_locations(&self, json: &str) -> Result<(), JsValue> {
        let locations = parse_locations_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.host.with_globe(|g| {
            g.set_locations(locations);
        })
    }

    /// Loads recommendation rows; the first row is the target.
    pub fn set_results(&self, json: &str) -> Result<(), JsValue> {
        let rows = parse_results_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.host.with_globe(|g| {
            g.set_results(&rows);
        })
    }

    pub fn center_on(&self, lat: f64, lon: f64) -> Result<bool, JsValue> {
        self.host.with_globe(|g| g.center_on(lat, lon))
    }

    /// Result-table hover: highlight, show and centre a location.
    pub fn focus_location(&self, id: &str) -> Result<bool, JsValue> {
        let id = LocationId::new(id);
        self.host.with_globe(|g| g.focus_location(&id))
    }

    pub fn clear_focus(&self) -> Result<(), JsValue> {
        self.host.with_globe(|g| g.clear_focus())
    }

    pub fn reset_selection(&self) -> Result<(), JsValue> {
        self.host.with_globe(|g| g.reset_selection())
    }

    /// Current `{hovered, pinned}`.
    pub fn hover_state(&self) -> Result<JsValue, JsValue> {
        let globe = self
            .host
            .globe
            .try_borrow()
            .map_err(|_| JsValue::from_str("globe is busy"))?;
        to_js(globe.hover_selection())
    }

    pub fn tooltip(&self) -> Result<JsValue, JsValue> {
        let globe = self
            .host
            .globe
            .try_borrow()
            .map_err(|_| JsValue::from_str("globe is busy"))?;
        to_js(&globe.tooltip())
    }

    pub fn info_panel(&self) -> Result<JsValue, JsValue> {
        let globe = self
            .host
            .globe
            .try_borrow()
            .map_err(|_| JsValue::from_str("globe is busy"))?;
        to_js(&globe.info_panel())
    }

    /// Calls `callback(state)` after every hover/selection change.
    /// Returns an id for `unsubscribe`.
    pub fn subscribe(&self, callback: js_sys::Function) -> u32 {
        let mut subscribers = self.host.subscribers.borrow_mut();
        subscribers.push(Some(callback));
        (subscribers.len() - 1) as u32
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        self.host
            .subscribers
            .borrow_mut()
            .get_mut(id as usize)
            .and_then(Option::take)
            .is_some()
    }
}
