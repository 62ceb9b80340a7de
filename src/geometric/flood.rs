use anyhow::{Context, Result};
use geo::{Geometry, HasDimensions, SimplifyVwPreserve};
use geojson::{Feature, JsonObject};
use serde_json::Value;
use shapefile::dbase::FieldValue;
use shapefile::Shape;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{
    ASSETS_PATH, MAX_LEVEL, OUTPUT_PATH, SIMPLIFY_TOLERANCE, STEP,
};
use crate::commons::levels::{level_labels, parse_label};
use crate::geo_core::{named_collection, read_source_crs, to_wgs84, SourceCrs};

/// One of the two fixed flood study areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Fundy,
    North,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Fundy, Region::North];

    /// Output filename component.
    pub fn name(self) -> &'static str {
        match self {
            Region::Fundy => "fundy",
            Region::North => "north",
        }
    }

    fn side_dir(self) -> &'static str {
        match self {
            Region::Fundy => "FundySide",
            Region::North => "NorthSide",
        }
    }

    /// Directory holding this region's flood extent shapefiles.
    pub fn shapefile_dir(self, base: &Path) -> PathBuf {
        base.join(self.side_dir()).join("Shapefiles")
    }

    /// This region's auxiliary ocean point shapefile.
    pub fn ocean_point_path(self, base: &Path) -> PathBuf {
        let filename = match self {
            Region::Fundy => "oceanpoint.shp",
            Region::North => "northumberland_op.shp",
        };
        base.join(self.side_dir()).join(filename)
    }
}

/// Batch converter turning flood extent shapefiles into simplified WGS84
/// GeoJSON, one output file per region and depth level, plus the two
/// auxiliary ocean point files.
///
/// Individual file failures are recorded and never halt the batch.
pub struct FloodConverter {
    /// Root of the source data tree.
    base_path: PathBuf,
    /// Output directory for GeoJSON files.
    output_path: PathBuf,
    /// Ordered depth labels to process.
    levels: Vec<String>,
    /// Number of files successfully written.
    pub converted: usize,
    /// Skipped or failed inputs, identified by region-relative path.
    pub errors: Vec<String>,
}

impl FloodConverter {
    pub fn new(base_path: Option<String>, output_path: Option<String>) -> Self {
        FloodConverter {
            base_path: PathBuf::from(base_path.as_deref().unwrap_or(ASSETS_PATH)),
            output_path: PathBuf::from(output_path.as_deref().unwrap_or(OUTPUT_PATH)),
            levels: level_labels(MAX_LEVEL, STEP),
            converted: 0,
            errors: Vec::new(),
        }
    }

    /// Replace the default fine-grained depth sequence.
    pub fn with_levels(mut self, levels: Vec<String>) -> Self {
        self.levels = levels;
        self
    }

    /// Run the full batch: every region and depth level, then the ocean
    /// point files.
    pub fn run(&mut self) -> Result<()> {
        fs::create_dir_all(&self.output_path).with_context(|| {
            format!("Failed to create output directory: {:?}", self.output_path)
        })?;

        let levels = self.levels.clone();
        for region in Region::ALL {
            println!("\n--- Processing {} ---", region.name());
            for label in &levels {
                self.convert_level(region, label);
            }
        }

        println!("\n--- Processing ocean points ---");
        for region in Region::ALL {
            self.convert_ocean_point(region);
        }

        Ok(())
    }

    /// Convert one region/level pair. A missing source file is a skip, any
    /// other failure is recorded with its message.
    fn convert_level(&mut self, region: Region, label: &str) {
        let shp_file = region
            .shapefile_dir(&self.base_path)
            .join(format!("Flood_{}.shp", label));
        if !shp_file.exists() {
            println!("  SKIP: Flood_{}.shp not found", label);
            self.errors.push(format!("{}/Flood_{}.shp", region.name(), label));
            return;
        }

        match self.convert_flood_file(region, label, &shp_file) {
            Ok(()) => self.converted += 1,
            Err(e) => {
                println!("  ERROR: {} - {:#}", label, e);
                self.errors
                    .push(format!("{}/Flood_{}.shp: {:#}", region.name(), label, e));
            }
        }
    }

    fn convert_flood_file(&self, region: Region, label: &str, shp_file: &Path) -> Result<()> {
        let features = read_features(shp_file, Some(SIMPLIFY_TOLERANCE))?;

        let out_name = format!("flood_{}_{}", region.name(), label);
        let out_file = self.output_path.join(format!("{}.geojson", out_name));
        // an empty result set after filtering is still written
        let feature_count = write_collection(&out_file, &out_name, features)?;

        let fsize = fs::metadata(&out_file)?.len() as f64 / 1024.0;
        // convert label back to a numeric value for human-readable output
        let depth_m = parse_label(label)?;
        println!(
            "  OK: {}.geojson ({:.0} KB, {} features, {:.1} m)",
            out_name, fsize, feature_count, depth_m
        );
        Ok(())
    }

    /// Convert one auxiliary ocean point file, skipping silently if absent.
    /// No simplification; point layers are already minimal.
    fn convert_ocean_point(&mut self, region: Region) {
        let shp_file = region.ocean_point_path(&self.base_path);
        if !shp_file.exists() {
            return;
        }

        let out_name = format!("oceanpoint_{}", region.name());
        let out_file = self.output_path.join(format!("{}.geojson", out_name));
        match read_features(&shp_file, None)
            .and_then(|features| write_collection(&out_file, &out_name, features))
        {
            Ok(count) => {
                println!("  OK: {}.geojson ({} features)", out_name, count);
                self.converted += 1;
            }
            Err(e) => println!("  ERROR: {} ocean point - {:#}", region.name(), e),
        }
    }
}

/// Serialize features as a named FeatureCollection in one write.
/// Returns the feature count; an empty collection is a valid output.
pub fn write_collection(out_file: &Path, name: &str, features: Vec<Feature>) -> Result<usize> {
    let count = features.len();
    let collection = named_collection(name, features);
    fs::write(out_file, serde_json::to_string(&collection)?)
        .with_context(|| format!("Failed to write GeoJSON file: {:?}", out_file))?;
    Ok(count)
}

/// Read a shapefile into GeoJSON features in WGS84.
///
/// Reprojection happens only when the `.prj` sidecar describes a CRS other
/// than geographic WGS84; already-canonical input is passed through
/// untouched. With a simplification tolerance set, geometries are simplified
/// topology-preservingly and any that collapse to empty are dropped.
pub fn read_features(shp_file: &Path, simplify: Option<f64>) -> Result<Vec<Feature>> {
    let crs = read_source_crs(shp_file)?;
    let mut reader = shapefile::Reader::from_path(shp_file)
        .with_context(|| format!("Failed to open shapefile: {:?}", shp_file))?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Failed to read shape record")?;
        // deleted records come back as null shapes
        if matches!(shape, Shape::NullShape) {
            continue;
        }
        let mut geometry = shape_to_geometry(shape)?;

        if let SourceCrs::Other(wkt) = &crs {
            geometry = to_wgs84(&geometry, wkt)?;
        }

        if let Some(tolerance) = simplify {
            geometry = simplify_geometry(geometry, tolerance);
            if geometry.is_empty() {
                continue;
            }
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            id: None,
            properties: Some(record_to_properties(record)),
            foreign_members: None,
        });
    }
    Ok(features)
}

/// Convert a shapefile shape to a geo geometry.
pub fn shape_to_geometry(shape: Shape) -> Result<Geometry<f64>> {
    let geometry = match shape {
        Shape::Point(point) => Geometry::Point(point.into()),
        Shape::Multipoint(multipoint) => Geometry::MultiPoint(multipoint.into()),
        Shape::Polyline(polyline) => Geometry::MultiLineString(polyline.into()),
        Shape::Polygon(polygon) => Geometry::MultiPolygon(polygon.into()),
        other => anyhow::bail!("Unsupported shape type: {}", other.shapetype()),
    };
    Ok(geometry)
}

/// Simplify polygonal and line geometries while preserving topology.
/// Point geometries pass through unchanged.
///
/// `tolerance` is a distance in coordinate units. Visvalingam-Whyatt ranks
/// vertices by the area of the triangle they form with their neighbors, so
/// the distance is squared into an area epsilon; passing it through
/// unsquared would admit deviations orders of magnitude past the tolerance.
pub fn simplify_geometry(geometry: Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    let epsilon = tolerance * tolerance;
    match geometry {
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify_vw_preserve(&epsilon)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify_vw_preserve(&epsilon)),
        Geometry::LineString(l) => Geometry::LineString(l.simplify_vw_preserve(&epsilon)),
        Geometry::MultiLineString(ml) => {
            Geometry::MultiLineString(ml.simplify_vw_preserve(&epsilon))
        }
        other => other,
    }
}

/// Map a dBase attribute record to a GeoJSON property object.
pub fn record_to_properties(record: shapefile::dbase::Record) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, value) in record {
        let json = match value {
            FieldValue::Character(s) => s.map(Value::String).unwrap_or(Value::Null),
            FieldValue::Numeric(n) => n.map(float_value).unwrap_or(Value::Null),
            FieldValue::Float(f) => f.map(|f| float_value(f as f64)).unwrap_or(Value::Null),
            FieldValue::Double(d) => float_value(d),
            FieldValue::Integer(i) => Value::from(i),
            FieldValue::Logical(b) => b.map(Value::Bool).unwrap_or(Value::Null),
            _ => Value::Null,
        };
        properties.insert(name, json);
    }
    properties
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
