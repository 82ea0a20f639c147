use std::collections::HashMap;

use surface::{ShapeId, VectorSurface};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event};

use crate::events::{EventQueue, HostEvent};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

type Listener = Closure<dyn FnMut(Event)>;

/// `<svg>` overlay as the globe's vector surface. One `<path>` per shape.
#[derive(Debug)]
pub struct SvgScene {
    document: Document,
    root: Element,
    queue: EventQueue,
    next_id: u64,
    shapes: HashMap<ShapeId, Element>,
    listeners: HashMap<ShapeId, Vec<(&'static str, Listener)>>,
}

impl SvgScene {
    pub fn new(document: Document, root: Element, queue: EventQueue) -> Self {
        Self {
            document,
            root,
            queue,
            next_id: 0,
            shapes: HashMap::new(),
            listeners: HashMap::new(),
        }
    }

    fn listen(&self, element: &Element, kind: &'static str, event: HostEvent) -> Option<Listener> {
        let queue = self.queue.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |_: Event| queue.push(event));
        match element.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref()) {
            Ok(()) => Some(listener),
            Err(e) => {
                warn!(kind, error = ?e, "could not bind marker listener");
                None
            }
        }
    }
}

impl VectorSurface for SvgScene {
    fn resize(&mut self, _backing: (u32, u32), css: (f64, f64)) {
        // The overlay works in CSS pixels; the backing size only matters to the canvas.
        let _ = self.root.set_attribute("width", &css.0.to_string());
        let _ = self.root.set_attribute("height", &css.1.to_string());
        let _ = self
            .root
            .set_attribute("viewBox", &format!("0 0 {} {}", css.0, css.1));
    }

    fn create_shape(&mut self, key: &str) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        let element = match self.document.create_element_ns(Some(SVG_NS), "path") {
            Ok(el) => el,
            Err(e) => {
                warn!(key, error = ?e, "could not create marker element");
                return id;
            }
        };
        let _ = element.set_attribute("data-id", key);
        if let Err(e) = self.root.append_child(&element) {
            warn!(key, error = ?e, "could not attach marker element");
        }
        self.shapes.insert(id, element);
        id
    }

    fn set_shape_path(&mut self, shape: ShapeId, d: &str) {
        if let Some(el) = self.shapes.get(&shape) {
            let _ = el.set_attribute("d", d);
        }
    }

    fn set_shape_class(&mut self, shape: ShapeId, class: &str, on: bool) {
        if let Some(el) = self.shapes.get(&shape) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    fn bind_pointer_events(&mut self, shape: ShapeId) {
        let Some(el) = self.shapes.get(&shape) else {
            return;
        };
        let bound: Vec<_> = [
            ("pointerenter", HostEvent::MarkerEnter(shape)),
            ("pointerleave", HostEvent::MarkerLeave(shape)),
        ]
        .into_iter()
        .filter_map(|(kind, event)| self.listen(el, kind, event).map(|l| (kind, l)))
        .collect();
        self.listeners.entry(shape).or_default().extend(bound);
    }

    fn raise_shape(&mut self, shape: ShapeId) {
        if let Some(el) = self.shapes.get(&shape) {
            // Re-appending moves the node to the end, which paints last.
            let _ = self.root.append_child(el);
        }
    }

    fn remove_shape(&mut self, shape: ShapeId) {
        let Some(el) = self.shapes.remove(&shape) else {
            return;
        };
        for (kind, listener) in self.listeners.remove(&shape).unwrap_or_default() {
            let _ = el.remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
        }
        el.remove();
    }
}
