use std::fmt;

use layers::{GlobeStyle, Graticule, MarkerStyle};
use serde::Deserialize;

pub const DEFAULT_LAND_URL: &str = "https://unpkg.com/world-atlas/world/110m.json";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Json(String),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid config field {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Post-drag spin settings. Speeds are in degrees per second of arc.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    /// Velocity multiplier applied once per animation tick, in `(0, 1)`.
    pub damping: f64,
    pub min_release_speed: f64,
    pub stop_speed: f64,
    /// Pointer samples kept for the release velocity.
    pub sample_window: usize,
    /// A pointer held still this long before release carries no velocity.
    pub release_timeout_s: f64,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            damping: 0.92,
            min_release_speed: 5.0,
            stop_speed: 0.5,
            sample_window: 5,
            release_timeout_s: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    /// Location fields shown one per line: `name`, `city`, `date`, `country_code`, `url`, `id`.
    pub fields: Vec<String>,
    /// Offset from the projected marker centre, in CSS pixels.
    pub offset: [f64; 2],
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            fields: vec!["name".to_string(), "city".to_string()],
            offset: [8.0, -20.0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoPanelMode {
    /// Name only.
    Single,
    /// Name, country/city/date description, image and link.
    #[default]
    MultiField,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeometrySource {
    pub url: String,
    /// Object to extract when the payload is a TopoJSON topology.
    pub object: String,
}

impl Default for GeometrySource {
    fn default() -> Self {
        Self {
            url: DEFAULT_LAND_URL.to_string(),
            object: "land".to_string(),
        }
    }
}

/// Every knob that differs between globe presentations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Share of the smaller viewport dimension covered by the globe diameter.
    pub fill_ratio: f64,
    /// `[lambda, phi, gamma]` in degrees.
    pub initial_rotation: [f64; 3],
    pub auto_rotate: bool,
    /// Longitude advance per animation tick, in degrees.
    pub auto_rotate_deg_per_tick: f64,
    /// Restart auto-rotation once a drag or its inertia has settled.
    pub resume_auto_rotate: bool,
    pub inertia: InertiaConfig,
    pub marker: MarkerStyle,
    pub graticule: Graticule,
    /// Maximum great-circle edge length before resampling, in degrees.
    pub resample_deg: f64,
    pub style: GlobeStyle,
    pub tooltip: TooltipConfig,
    pub info_panel: InfoPanelMode,
    pub geometry: GeometrySource,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            fill_ratio: 0.9,
            initial_rotation: [-10.0, -30.0, 0.0],
            auto_rotate: false,
            auto_rotate_deg_per_tick: 0.2,
            resume_auto_rotate: false,
            inertia: InertiaConfig::default(),
            marker: MarkerStyle::default(),
            graticule: Graticule::default(),
            resample_deg: layers::DEFAULT_RESAMPLE_DEG,
            style: GlobeStyle::default(),
            tooltip: TooltipConfig::default(),
            info_panel: InfoPanelMode::default(),
            geometry: GeometrySource::default(),
        }
    }
}

impl GlobeConfig {
    /// Full-bleed presentation with a slow spin.
    pub fn full_bleed() -> Self {
        Self {
            fill_ratio: 1.0,
            auto_rotate: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(payload).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fill_ratio > 0.0 && self.fill_ratio <= 1.0) {
            return Err(invalid("fill_ratio", format!("{} is outside (0, 1]", self.fill_ratio)));
        }
        if !self.initial_rotation.iter().all(|v| v.is_finite()) {
            return Err(invalid("initial_rotation", "must be finite".to_string()));
        }
        if !self.auto_rotate_deg_per_tick.is_finite() {
            return Err(invalid("auto_rotate_deg_per_tick", "must be finite".to_string()));
        }
        let inertia = &self.inertia;
        if !(inertia.damping > 0.0 && inertia.damping < 1.0) {
            return Err(invalid("inertia.damping", format!("{} is outside (0, 1)", inertia.damping)));
        }
        if !(inertia.stop_speed > 0.0 && inertia.stop_speed.is_finite()) {
            return Err(invalid("inertia.stop_speed", "must be positive".to_string()));
        }
        if !(inertia.min_release_speed >= 0.0 && inertia.min_release_speed.is_finite()) {
            return Err(invalid("inertia.min_release_speed", "must be non-negative".to_string()));
        }
        if inertia.sample_window < 2 {
            return Err(invalid("inertia.sample_window", "needs at least 2 samples".to_string()));
        }
        if !(inertia.release_timeout_s >= 0.0) {
            return Err(invalid("inertia.release_timeout_s", "must be non-negative".to_string()));
        }
        if !(self.marker.radius > 0.0 && self.marker.radius.is_finite()) {
            return Err(invalid("marker.radius", "must be positive".to_string()));
        }
        if !(self.resample_deg > 0.0 && self.resample_deg <= 90.0) {
            return Err(invalid("resample_deg", format!("{} is outside (0, 90]", self.resample_deg)));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GlobeConfig, InfoPanelMode};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_validate() {
        assert_eq!(GlobeConfig::default().validate(), Ok(()));
        assert_eq!(GlobeConfig::full_bleed().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GlobeConfig::from_json_str(
            r#"{"fill_ratio": 1.0, "auto_rotate": true, "inertia": {"damping": 0.8},
                "info_panel": "single"}"#,
        )
        .unwrap();
        assert_eq!(cfg.fill_ratio, 1.0);
        assert!(cfg.auto_rotate);
        assert_eq!(cfg.inertia.damping, 0.8);
        assert_eq!(cfg.inertia.sample_window, 5);
        assert_eq!(cfg.info_panel, InfoPanelMode::Single);
        assert_eq!(cfg.initial_rotation, [-10.0, -30.0, 0.0]);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            GlobeConfig::from_json_str(r#"{"fill_ratio": 0}"#),
            Err(ConfigError::Invalid { field: "fill_ratio", .. })
        ));
        assert!(matches!(
            GlobeConfig::from_json_str(r#"{"inertia": {"damping": 1.5}}"#),
            Err(ConfigError::Invalid { field: "inertia.damping", .. })
        ));
        assert!(matches!(GlobeConfig::from_json_str("[1]"), Err(ConfigError::Json(_))));
    }
}
