use serde::Deserialize;
use surface::{Fill, Stroke};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
}

impl StrokeStyle {
    pub fn new(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
        }
    }

    pub fn to_stroke(&self) -> Stroke {
        Stroke::new(self.color.clone(), self.width)
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new("#1046c6", 1.0)
    }
}

/// Paint for every raster pass. The back hemisphere uses lighter tones so the
/// far side reads as seen through a translucent globe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobeStyle {
    pub sphere_fill: String,
    pub back_land_fill: String,
    pub back_graticule: StrokeStyle,
    pub front_graticule: StrokeStyle,
    pub front_land_fill: String,
    pub front_land_stroke: StrokeStyle,
    pub outline: StrokeStyle,
}

impl Default for GlobeStyle {
    fn default() -> Self {
        Self {
            sphere_fill: "#fcfcfc".to_string(),
            back_land_fill: "#d0ddfa".to_string(),
            back_graticule: StrokeStyle::new("#97b3f6", 0.1),
            front_graticule: StrokeStyle::new("#1046c6", 0.1),
            front_land_fill: "#5c88ee".to_string(),
            front_land_stroke: StrokeStyle::new("#1046c6", 1.0),
            outline: StrokeStyle::new("#1046c6", 0.1),
        }
    }
}

impl GlobeStyle {
    pub fn sphere_fill(&self) -> Fill {
        Fill::new(self.sphere_fill.clone())
    }

    pub fn back_land_fill(&self) -> Fill {
        Fill::new(self.back_land_fill.clone())
    }

    pub fn front_land_fill(&self) -> Fill {
        Fill::new(self.front_land_fill.clone())
    }
}

pub const MARKER_CLASS: &str = "race-location";
pub const TARGET_CLASS: &str = "isTarget";
pub const SELECTION_CLASS: &str = "isSelection";

/// Marker geometry and the stylesheet used when markers are exported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    /// Circle radius in CSS pixels.
    pub radius: f64,
    pub fill: String,
    pub stroke: String,
    pub target_fill: String,
    pub selection_fill: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 4.5,
            fill: "#ffb000".to_string(),
            stroke: "black".to_string(),
            target_fill: "#e0301e".to_string(),
            selection_fill: "#2bd17e".to_string(),
        }
    }
}

impl MarkerStyle {
    pub fn stylesheet(&self) -> String {
        format!(
            ".{MARKER_CLASS}{{fill:{};stroke:{};stroke-width:1}}\
             .{MARKER_CLASS}.{TARGET_CLASS}{{fill:{}}}\
             .{MARKER_CLASS}.{SELECTION_CLASS}{{fill:{}}}",
            self.fill, self.stroke, self.target_fill, self.selection_fill
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{GlobeStyle, MarkerStyle};

    #[test]
    fn partial_style_json_keeps_defaults() {
        let style: GlobeStyle =
            serde_json::from_str(r##"{"sphere_fill": "#000", "outline": {"width": 2}}"##).unwrap();
        assert_eq!(style.sphere_fill, "#000");
        assert_eq!(style.outline.width, 2.0);
        assert_eq!(style.outline.color, "#1046c6");
        assert_eq!(style.back_land_fill, "#d0ddfa");
    }

    #[test]
    fn stylesheet_covers_marker_classes() {
        let css = MarkerStyle::default().stylesheet();
        assert!(css.contains(".race-location{"));
        assert!(css.contains(".race-location.isTarget{"));
        assert!(css.contains(".race-location.isSelection{"));
    }
}
