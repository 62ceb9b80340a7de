use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{cumberland_bbox, OUTPUT_PATH};
use crate::collect::osm::osm_collect::{OsmCollect, OverpassResponse};
use crate::geo_core::{named_collection, BoundingBox};

/// Highway classes included in the major roads layer.
pub const HIGHWAY_CLASSES: [&str; 6] = [
    "trunk",
    "primary",
    "secondary",
    "motorway",
    "motorway_link",
    "trunk_link",
];

/// Major road network for the dashboard.
/// Collects highway-tagged ways from the Overpass API and turns the ones
/// carrying inline geometry into LineString features.
pub struct Road {
    osm_collect: OsmCollect,
    output_path: PathBuf,
    collection: Option<FeatureCollection>,
}

impl Road {
    pub fn new(output_path: Option<String>) -> Result<Self> {
        Ok(Road {
            osm_collect: OsmCollect::new(cumberland_bbox())?,
            output_path: PathBuf::from(output_path.as_deref().unwrap_or(OUTPUT_PATH)),
            collection: None,
        })
    }

    /// Build the Overpass QL query selecting major roads inside `bbox`.
    pub fn query(bbox: &BoundingBox) -> String {
        let statements: String = HIGHWAY_CLASSES
            .iter()
            .map(|class| {
                format!(
                    "  way[\"highway\"=\"{}\"]({});\n",
                    class,
                    bbox.as_overpass_bbox()
                )
            })
            .collect();
        OsmCollect::build_query(&statements, "geom")
    }

    /// Run road collection: query the Overpass API and transform the
    /// response into a line FeatureCollection.
    pub fn run(mut self) -> Result<Self> {
        let query = Self::query(&self.osm_collect.bbox);
        self.osm_collect
            .execute(&query)
            .context("Failed to execute Overpass request for roads")?;

        let content = self
            .osm_collect
            .content
            .as_ref()
            .context("No content received from Overpass API")?;
        self.collection = Some(ways_to_lines(content, "Cumberland_Roads"));

        Ok(self)
    }

    pub fn feature_count(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.features.len())
    }

    /// Serialize the whole collection to one output file.
    pub fn to_geojson(&self, name: Option<&str>) -> Result<PathBuf> {
        let collection = self
            .collection
            .as_ref()
            .context("No road data available. Call run() first.")?;

        let name = name.unwrap_or("roads_cumberland");
        let output_file = self.output_path.join(format!("{}.geojson", name));
        std::fs::write(&output_file, serde_json::to_string(collection)?)
            .with_context(|| format!("Failed to write GeoJSON file: {:?}", output_file))?;
        Ok(output_file)
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Convert Overpass way results with inline geometry to LineString features.
///
/// Properties are a fixed subset of tags (name, ref, highway, surface,
/// lanes) plus the source element id; missing tags default to "Unnamed" for
/// the name and "" otherwise. Ways without inline geometry are dropped.
pub fn ways_to_lines(data: &OverpassResponse, name: &str) -> FeatureCollection {
    let mut features = Vec::new();
    for element in &data.elements {
        if element.kind != "way" {
            continue;
        }
        let Some(points) = &element.geometry else {
            continue;
        };
        let coords: Vec<Vec<f64>> = points.iter().map(|p| vec![p.lon, p.lat]).collect();

        let tag = |key: &str, default: &str| {
            let value = element
                .tags
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default);
            Value::String(value.to_string())
        };
        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), tag("name", "Unnamed"));
        properties.insert("ref".to_string(), tag("ref", ""));
        properties.insert("highway".to_string(), tag("highway", ""));
        properties.insert("surface".to_string(), tag("surface", ""));
        properties.insert("lanes".to_string(), tag("lanes", ""));
        properties.insert("osm_id".to_string(), Value::from(element.id));

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(coords))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }
    named_collection(name, features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_covers_every_highway_class() {
        let query = Road::query(&cumberland_bbox());
        for class in HIGHWAY_CLASSES {
            assert!(
                query.contains(&format!("way[\"highway\"=\"{}\"]", class)),
                "missing class {}",
                class
            );
        }
        assert!(query.contains("(45.30,-65.10,46.00,-63.40)"));
        assert!(query.trim_end().ends_with("out geom;"));
    }

    #[test]
    fn test_way_with_geometry_becomes_line() {
        let raw = r#"{
            "elements": [
                {"type": "way", "id": 42,
                 "geometry": [{"lat": 45.5, "lon": -64.2}, {"lat": 45.6, "lon": -64.1}],
                 "tags": {"highway": "primary", "name": "Main St"}},
                {"type": "node", "id": 7, "lat": 45.5, "lon": -64.2}
            ]
        }"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();

        let collection = ways_to_lines(&data, "Cumberland_Roads");

        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        match &feature.geometry.as_ref().unwrap().value {
            geojson::Value::LineString(coords) => {
                assert_eq!(coords, &vec![vec![-64.2, 45.5], vec![-64.1, 45.6]]);
            }
            other => panic!("expected a LineString, got {:?}", other),
        }
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["name"], Value::String("Main St".to_string()));
        assert_eq!(properties["highway"], Value::String("primary".to_string()));
        assert_eq!(properties["surface"], Value::String(String::new()));
        assert_eq!(properties["osm_id"], Value::from(42));
    }

    #[test]
    fn test_unnamed_way_gets_default_name() {
        let raw = r#"{
            "elements": [
                {"type": "way", "id": 1,
                 "geometry": [{"lat": 45.5, "lon": -64.2}, {"lat": 45.6, "lon": -64.1}]}
            ]
        }"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();
        let collection = ways_to_lines(&data, "Cumberland_Roads");
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["name"], Value::String("Unnamed".to_string()));
    }

    #[test]
    fn test_way_without_geometry_is_dropped() {
        let raw = r#"{"elements": [{"type": "way", "id": 1, "tags": {"highway": "trunk"}}]}"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();
        assert!(ways_to_lines(&data, "Cumberland_Roads").features.is_empty());
    }
}
