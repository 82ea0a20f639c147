use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use globe::GlobeConfig;
use tools::{RenderRequest, parse_lat_lon, parse_point, parse_rotation, render};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render the globe and its markers to a standalone SVG")]
struct Args {
    /// Landmass geometry (GeoJSON or world-atlas TopoJSON)
    #[arg(long)]
    land: Option<PathBuf>,

    /// JSON array of locations
    #[arg(long)]
    locations: Option<PathBuf>,

    /// Recommendation rows (array or {"data": [...]}); first row is the target
    #[arg(long)]
    results: Option<PathBuf>,

    /// Globe configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 960.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Point to face the viewer: LAT,LON
    #[arg(long, allow_hyphen_values = true)]
    center: Option<String>,

    /// Rotation in degrees: LAMBDA,PHI[,GAMMA]
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<String>,

    /// Location id to hover
    #[arg(long)]
    hover: Option<String>,

    /// Screen point to hover: X,Y
    #[arg(long, allow_hyphen_values = true)]
    hover_at: Option<String>,

    /// Output SVG file (stdout when omitted)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GlobeConfig::from_json_str(&read(path)?).map_err(|e| e.to_string())?,
        None => GlobeConfig::default(),
    };
    let request = RenderRequest {
        config,
        width: args.width,
        height: args.height,
        dpr: args.dpr,
        land: args.land.as_deref().map(read).transpose()?,
        locations: args.locations.as_deref().map(read).transpose()?,
        results: args.results.as_deref().map(read).transpose()?,
        center: args.center.as_deref().map(parse_lat_lon).transpose()?,
        rotate: args.rotate.as_deref().map(parse_rotation).transpose()?,
        hover: args.hover.clone(),
        hover_at: args.hover_at.as_deref().map(parse_point).transpose()?,
    };

    let output = render(&request)?;
    match &args.out {
        Some(path) => {
            fs::write(path, &output.svg).map_err(|e| format!("write {path:?}: {e}"))?;
            info!(path = %path.display(), markers = output.markers, "svg written");
        }
        None => println!("{}", output.svg),
    }

    if request.hover.is_some() || request.hover_at.is_some() {
        let payload =
            serde_json::to_string_pretty(&output.presenters).map_err(|e| format!("json: {e}"))?;
        // Keep stdout clean for the SVG when it goes there.
        if args.out.is_some() {
            println!("{payload}");
        } else {
            eprintln!("{payload}");
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}
