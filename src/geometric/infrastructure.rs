use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{cumberland_bbox, OUTPUT_PATH};
use crate::collect::osm::osm_collect::{OsmCollect, OverpassResponse};
use crate::geo_core::{named_collection, BoundingBox};

/// Tag filters selecting critical-infrastructure facilities.
pub const FACILITY_FILTERS: [(&str, &str); 8] = [
    ("amenity", "fire_station"),
    ("amenity", "hospital"),
    ("amenity", "police"),
    ("amenity", "townhall"),
    ("amenity", "community_centre"),
    ("amenity", "clinic"),
    ("healthcare", "hospital"),
    ("emergency", "ambulance_station"),
];

/// Critical infrastructure for the dashboard.
/// Collects facility nodes and ways from the Overpass API and turns them
/// into Point features, using the way centroid when no node coordinates
/// exist.
pub struct Infrastructure {
    osm_collect: OsmCollect,
    output_path: PathBuf,
    collection: Option<FeatureCollection>,
}

impl Infrastructure {
    pub fn new(output_path: Option<String>) -> Result<Self> {
        Ok(Infrastructure {
            osm_collect: OsmCollect::new(cumberland_bbox())?,
            output_path: PathBuf::from(output_path.as_deref().unwrap_or(OUTPUT_PATH)),
            collection: None,
        })
    }

    /// Build the Overpass QL query selecting facilities inside `bbox`.
    /// Each filter selects both nodes and ways; ways come back with a
    /// computed center.
    pub fn query(bbox: &BoundingBox) -> String {
        let statements: String = FACILITY_FILTERS
            .iter()
            .flat_map(|(key, value)| {
                ["node", "way"].into_iter().map(move |element| {
                    format!(
                        "  {}[\"{}\"=\"{}\"]({});\n",
                        element,
                        key,
                        value,
                        bbox.as_overpass_bbox()
                    )
                })
            })
            .collect();
        OsmCollect::build_query(&statements, "center")
    }

    /// Run facility collection: query the Overpass API and transform the
    /// response into a point FeatureCollection.
    pub fn run(mut self) -> Result<Self> {
        let query = Self::query(&self.osm_collect.bbox);
        self.osm_collect
            .execute(&query)
            .context("Failed to execute Overpass request for infrastructure")?;

        let content = self
            .osm_collect
            .content
            .as_ref()
            .context("No content received from Overpass API")?;
        self.collection = Some(elements_to_points(content, "Cumberland_Infrastructure"));

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
            .context("No infrastructure data available. Call run() first.")?;

        let name = name.unwrap_or("infrastructure_cumberland");
        let output_file = self.output_path.join(format!("{}.geojson", name));
        std::fs::write(&output_file, serde_json::to_string(collection)?)
            .with_context(|| format!("Failed to write GeoJSON file: {:?}", output_file))?;
        Ok(output_file)
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Convert Overpass results to Point features.
///
/// Nodes are placed at their own coordinates, ways at their computed
/// center. Every element tag is copied verbatim into the properties, with
/// the source element id appended. Elements with neither coordinates nor a
/// center are dropped.
pub fn elements_to_points(data: &OverpassResponse, name: &str) -> FeatureCollection {
    let mut features = Vec::new();
    for element in &data.elements {
        let position = match element.kind.as_str() {
            "node" => match (element.lon, element.lat) {
                (Some(lon), Some(lat)) => Some(vec![lon, lat]),
                _ => None,
            },
            "way" => element.center.map(|c| vec![c.lon, c.lat]),
            _ => None,
        };
        let Some(position) = position else {
            continue;
        };

        let mut properties = element.tags.clone();
        properties.insert("osm_id".to_string(), Value::from(element.id));

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(position))),
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
    fn test_query_covers_every_facility_filter() {
        let query = Infrastructure::query(&cumberland_bbox());
        for (key, value) in FACILITY_FILTERS {
            assert!(
                query.contains(&format!("node[\"{}\"=\"{}\"]", key, value)),
                "missing node filter {}={}",
                key,
                value
            );
            assert!(
                query.contains(&format!("way[\"{}\"=\"{}\"]", key, value)),
                "missing way filter {}={}",
                key,
                value
            );
        }
        assert!(query.trim_end().ends_with("out center;"));
    }

    #[test]
    fn test_nodes_and_centered_ways_become_points() {
        let raw = r#"{
            "elements": [
                {"type": "node", "id": 10, "lat": 45.5, "lon": -64.2,
                 "tags": {"amenity": "hospital"}},
                {"type": "way", "id": 20, "center": {"lat": 45.7, "lon": -64.0}}
            ]
        }"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();

        let collection = elements_to_points(&data, "Cumberland_Infrastructure");

        assert_eq!(collection.features.len(), 2);
        for feature in &collection.features {
            assert!(matches!(
                feature.geometry.as_ref().unwrap().value,
                geojson::Value::Point(_)
            ));
        }

        let node_properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(
            node_properties["amenity"],
            Value::String("hospital".to_string())
        );
        assert_eq!(node_properties["osm_id"], Value::from(10));

        // the tagless way only carries its source element id
        let way_properties = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(way_properties.len(), 1);
        assert_eq!(way_properties["osm_id"], Value::from(20));
    }

    #[test]
    fn test_way_without_center_is_dropped() {
        let raw = r#"{
            "elements": [
                {"type": "way", "id": 1, "tags": {"amenity": "clinic"}},
                {"type": "relation", "id": 2, "tags": {"amenity": "hospital"}}
            ]
        }"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();
        let collection = elements_to_points(&data, "Cumberland_Infrastructure");
        assert!(collection.features.is_empty());
    }

    #[test]
    fn test_way_center_coordinates_are_lon_lat() {
        let raw = r#"{
            "elements": [
                {"type": "way", "id": 3, "center": {"lat": 45.7, "lon": -64.0}}
            ]
        }"#;
        let data: OverpassResponse = serde_json::from_str(raw).unwrap();
        let collection = elements_to_points(&data, "Cumberland_Infrastructure");
        match &collection.features[0].geometry.as_ref().unwrap().value {
            geojson::Value::Point(position) => assert_eq!(position, &vec![-64.0, 45.7]),
            other => panic!("expected a Point, got {:?}", other),
        }
    }
}
