use anyhow::{Context, Result};
use geo::{Coord, Geometry, MapCoords};
use geojson::{Feature, FeatureCollection, JsonObject};
use proj::Proj;
use serde_json::Value;
use std::path::Path;

/// EPSG code of the canonical output CRS (geographic WGS84).
pub const WGS84_EPSG: i32 = 4326;

/// Bounding box in longitude/latitude degrees.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_x: f64, // west
    pub min_y: f64, // south
    pub max_x: f64, // east
    pub max_y: f64, // north
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Render as the `south,west,north,east` string Overpass expects.
    pub fn as_overpass_bbox(&self) -> String {
        format!(
            "{:.2},{:.2},{:.2},{:.2}",
            self.min_y, self.min_x, self.max_y, self.max_x
        )
    }
}

/// Coordinate reference system of a source shapefile, read from its `.prj` sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCrs {
    /// Already geographic WGS84, no reprojection needed.
    Wgs84,
    /// Some other CRS, carried as its WKT definition.
    Other(String),
    /// No `.prj` sidecar present, CRS unknown.
    Unknown,
}

/// Read the CRS of `shp_path` from the `.prj` file next to it.
pub fn read_source_crs(shp_path: &Path) -> Result<SourceCrs> {
    let prj_path = shp_path.with_extension("prj");
    if !prj_path.exists() {
        return Ok(SourceCrs::Unknown);
    }
    let wkt = std::fs::read_to_string(&prj_path)
        .with_context(|| format!("Failed to read projection file: {:?}", prj_path))?;
    if is_wgs84_wkt(&wkt) {
        Ok(SourceCrs::Wgs84)
    } else {
        Ok(SourceCrs::Other(wkt))
    }
}

/// True if `wkt` describes geographic WGS84, in WKT1 (`GEOGCS["GCS_WGS_1984"`)
/// or WKT2 (`GEOGCRS["WGS 84"`) form. A projected definition is never WGS84
/// geographic even when its datum is WGS84.
pub fn is_wgs84_wkt(wkt: &str) -> bool {
    let wkt = wkt.trim_start();
    (wkt.starts_with("GEOGCS") || wkt.starts_with("GEOGCRS"))
        && wkt.contains("WGS")
        && wkt.contains("1984")
}

/// Reproject a geometry from the CRS described by `source_wkt` into WGS84.
pub fn to_wgs84(geometry: &Geometry<f64>, source_wkt: &str) -> Result<Geometry<f64>> {
    let proj = Proj::new_known_crs(source_wkt, &format!("EPSG:{}", WGS84_EPSG), None)
        .context("Failed to create CRS transformation")?;
    let reprojected = geometry
        .try_map_coords(|coord| {
            let (x, y) = proj.convert((coord.x, coord.y))?;
            Ok::<_, proj::ProjError>(Coord { x, y })
        })
        .context("Failed to transform coordinates to WGS84")?;
    Ok(reprojected)
}

/// Assemble a FeatureCollection carrying a top-level `name` member.
pub fn named_collection(name: &str, features: Vec<Feature>) -> FeatureCollection {
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("name".to_string(), Value::String(name.to_string()));
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM_20N_WKT: &str = r#"PROJCS["NAD_1983_CSRS_UTM_Zone_20N",GEOGCS["GCS_North_American_1983_CSRS",DATUM["D_North_American_1983_CSRS",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-63.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    const WGS84_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    #[test]
    fn test_overpass_bbox_order() {
        let bbox = BoundingBox::new(-65.10, 45.30, -63.40, 46.00);
        assert_eq!(bbox.as_overpass_bbox(), "45.30,-65.10,46.00,-63.40");
    }

    const WGS84_WKT2: &str = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north],AXIS["geodetic longitude (Lon)",east],ANGLEUNIT["degree",0.0174532925199433],ID["EPSG",4326]]"#;

    #[test]
    fn test_wgs84_wkt_detection() {
        assert!(is_wgs84_wkt(WGS84_WKT));
        assert!(is_wgs84_wkt(WGS84_WKT2));
        assert!(!is_wgs84_wkt(UTM_20N_WKT));
    }

    #[test]
    fn test_read_source_crs_without_prj() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("Flood_0_1m.shp");
        assert_eq!(read_source_crs(&shp).unwrap(), SourceCrs::Unknown);
    }

    #[test]
    fn test_read_source_crs_wgs84() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("oceanpoint.shp");
        std::fs::write(dir.path().join("oceanpoint.prj"), WGS84_WKT).unwrap();
        assert_eq!(read_source_crs(&shp).unwrap(), SourceCrs::Wgs84);
    }

    #[test]
    fn test_named_collection_carries_name() {
        let fc = named_collection("Cumberland_Roads", vec![]);
        let members = fc.foreign_members.unwrap();
        assert_eq!(members["name"], Value::String("Cumberland_Roads".into()));
        assert!(fc.features.is_empty());
    }
}
