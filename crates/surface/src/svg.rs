//! Flattens the raster display list and the retained vector scene into one
//! standalone SVG document.

use std::fmt::Write as _;

use foundation::math::precision::format_coord;

use crate::recording::{RasterOp, RecordingRaster, RecordingScene};

pub fn export_svg(raster: &RecordingRaster, scene: &RecordingScene, stylesheet: &str) -> String {
    let (w, h) = raster.css_size();
    let (w, h) = (format_coord(w, 2), format_coord(h, 2));
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    if !stylesheet.is_empty() {
        let _ = writeln!(out, "<style>{}</style>", escape(stylesheet));
    }

    out.push_str("<g class=\"raster\">\n");
    for op in raster.current_frame() {
        match op {
            RasterOp::Clear => {}
            RasterOp::Fill { path, fill } => {
                if path.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    out,
                    r#"<path d="{}" fill="{}" fill-rule="evenodd"/>"#,
                    path.to_svg_d(),
                    escape(&fill.color)
                );
            }
            RasterOp::Stroke { path, stroke } => {
                if path.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    out,
                    r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                    path.to_svg_d(),
                    escape(&stroke.color),
                    format_coord(stroke.width, 3)
                );
            }
        }
    }
    out.push_str("</g>\n");

    out.push_str("<g class=\"markers\">\n");
    for (_, shape) in scene.shapes_in_order() {
        let classes: Vec<&str> = shape.classes.iter().map(String::as_str).collect();
        let _ = writeln!(
            out,
            r#"<path class="{}" data-key="{}" d="{}"/>"#,
            escape(&classes.join(" ")),
            escape(&shape.key),
            shape.d
        );
    }
    out.push_str("</g>\n</svg>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
