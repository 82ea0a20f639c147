use std::f64::consts::TAU;

use surface::{Fill, Path, PathCommand, RasterSurface, Stroke, Transform2D};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement};

/// `<canvas>` 2D context as the globe's raster surface.
#[derive(Debug, Clone)]
pub struct CanvasRaster {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    css: (f64, f64),
}

impl CanvasRaster {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self {
            canvas,
            ctx,
            css: (0.0, 0.0),
        }
    }

    fn trace(&self, path: &Path) {
        let ctx = &self.ctx;
        ctx.begin_path();
        for cmd in path.commands() {
            match *cmd {
                PathCommand::MoveTo(p) => ctx.move_to(p.x, p.y),
                PathCommand::LineTo(p) => ctx.line_to(p.x, p.y),
                PathCommand::ClosePath => ctx.close_path(),
                PathCommand::Circle { center, radius } => {
                    ctx.move_to(center.x + radius, center.y);
                    let _ = ctx.arc(center.x, center.y, radius, 0.0, TAU);
                }
            }
        }
    }
}

impl RasterSurface for CanvasRaster {
    fn resize(&mut self, backing: (u32, u32), css: (f64, f64)) {
        // Assigning the backing size also resets the context transform.
        self.canvas.set_width(backing.0);
        self.canvas.set_height(backing.1);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", css.0));
        let _ = style.set_property("height", &format!("{}px", css.1));
        self.css = css;
    }

    fn set_transform(&mut self, t: Transform2D) {
        let [a, b, c, d, e, f] = t.0;
        let _ = self.ctx.set_transform(a, b, c, d, e, f);
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.css.0, self.css.1);
    }

    fn fill_path(&mut self, path: &Path, fill: &Fill) {
        self.trace(path);
        ctx_set_fill_style(&self.ctx, &fill.color);
        self.ctx
            .fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        self.trace(path);
        ctx_set_stroke_style(&self.ctx, &stroke.color);
        self.ctx.set_line_width(stroke.width);
        self.ctx.stroke();
    }
}

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(value),
    );
}
