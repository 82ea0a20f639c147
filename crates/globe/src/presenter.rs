//! View-models for the tooltip and the info panel.
//!
//! Both are plain data derived from [`HoverSelectionState`]; hosts render them
//! however they like (DOM, JSON on stdout).

use foundation::math::{Orthographic, precision::format_coord};
use scene::{HoverSelectionState, Location};
use serde::Serialize;

use crate::config::{InfoPanelMode, TooltipConfig};

const MISSING_DATE: &str = "TBD";
const MISSING_CITY: &str = "---";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TooltipView {
    pub visible: bool,
    /// Top-left corner in CSS pixels, relative to the globe surfaces.
    pub anchor: Option<[f64; 2]>,
    pub lines: Vec<String>,
}

impl TooltipView {
    pub fn hidden() -> Self {
        Self::default()
    }
}

/// Tooltip for the hovered location.
///
/// Hidden when nothing is hovered or when the hovered location sits on the far
/// hemisphere.
pub fn tooltip_view(
    state: &HoverSelectionState,
    front: &Orthographic,
    config: &TooltipConfig,
) -> TooltipView {
    let Some(location) = &state.hovered else {
        return TooltipView::hidden();
    };
    let Some(point) = location.coordinates().and_then(|p| front.project(p)) else {
        return TooltipView::hidden();
    };
    TooltipView {
        visible: true,
        anchor: Some([point.x + config.offset[0], point.y + config.offset[1]]),
        lines: config
            .fields
            .iter()
            .filter_map(|field| field_text(location, field))
            .collect(),
    }
}

/// Text of one templated field, `None` when the location lacks it.
pub fn field_text(location: &Location, field: &str) -> Option<String> {
    let display = &location.display;
    match field {
        "id" => Some(location.id.to_string()),
        "name" => Some(location.name.clone()),
        "city" => display.city.clone(),
        "date" => display.date.clone(),
        "country_code" => display.country_code.clone(),
        "url" => display.url.clone(),
        "image_url" => display.image_url.clone(),
        other => display.extra.get(other).map(|v| format_coord(*v, 2)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPanelView {
    pub id: String,
    pub name: String,
    /// `<br>`-separated description lines.
    pub description: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub more_info_enabled: bool,
}

impl InfoPanelView {
    /// Placeholder shown while nothing is pinned.
    pub fn placeholder(mode: InfoPanelMode) -> Self {
        Self {
            id: String::new(),
            name: "Name:".to_string(),
            description: match mode {
                InfoPanelMode::Single => String::new(),
                InfoPanelMode::MultiField => "Country:<br>City:<br>Date:".to_string(),
            },
            image_url: None,
            link_url: None,
            more_info_enabled: false,
        }
    }
}

/// Info panel for the pinned location.
pub fn info_panel_view(state: &HoverSelectionState, mode: InfoPanelMode) -> InfoPanelView {
    let Some(location) = &state.pinned else {
        return InfoPanelView::placeholder(mode);
    };
    let display = &location.display;
    match mode {
        InfoPanelMode::Single => InfoPanelView {
            id: location.id.to_string(),
            name: format!("Name: {}", location.name),
            description: String::new(),
            image_url: None,
            link_url: None,
            more_info_enabled: false,
        },
        InfoPanelMode::MultiField => InfoPanelView {
            id: location.id.to_string(),
            name: format!("Name: {}", location.name),
            description: describe(location),
            image_url: display.image_url.clone(),
            link_url: display.url.clone(),
            more_info_enabled: true,
        },
    }
}

/// `Country / City / Date` lines from a `"City, Region"` string.
fn describe(location: &Location) -> String {
    let display = &location.display;
    let date = display
        .date
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(MISSING_DATE);
    let raw = display.city.as_deref().unwrap_or_default();
    let mut parts = raw.split(',');
    let first = parts.next().unwrap_or_default().trim();

    match parts.next() {
        Some(region) => {
            let region = region.trim();
            let country = if display.country_code.as_deref() == Some("USA") {
                format!("USA ({region})")
            } else {
                region.to_string()
            };
            format!("Country: {country}<br>City: {first}<br>Date: {date}")
        }
        None => format!("Country: {first}<br>City: {MISSING_CITY}<br>Date: {date}"),
    }
}
