use crate::geo_core::BoundingBox;
use std::path::PathBuf;

/// Root of the source data tree.
pub const ASSETS_PATH: &str = "./assets";

/// Shared output directory consumed by the dashboard front end.
pub const OUTPUT_PATH: &str = "./assets/geojson";

/// Overpass API query interpreter endpoint.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

pub const USER_AGENT: &str = "CumberlandFloodDashboard/1.0";

/// Client-side ceiling on one Overpass request.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Server-side timeout passed in the query header.
pub const QUERY_TIMEOUT_SECS: u64 = 90;

/// Maximum flood depth in meters.
pub const MAX_LEVEL: f64 = 11.0;

/// Flood depth increment in meters (0.1 = 10 cm).
pub const STEP: f64 = 0.1;

/// Simplification tolerance as a distance in degrees, roughly 5 m of
/// ground distance. Squared into an area epsilon before being handed to
/// Visvalingam-Whyatt, which ranks vertices by triangle area.
pub const SIMPLIFY_TOLERANCE: f64 = 0.00005;

pub fn get_assets_path() -> PathBuf {
    PathBuf::from(ASSETS_PATH)
}

pub fn get_output_path() -> PathBuf {
    PathBuf::from(OUTPUT_PATH)
}

/// Cumberland County, Nova Scotia.
pub fn cumberland_bbox() -> BoundingBox {
    BoundingBox::new(-65.10, 45.30, -63.40, 46.00)
}
