use std::collections::HashMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::{
    algorithms::codec,
    error::Result,
    store::RoiStore,
    types::{ImageId, Polygon, StackPosition, StoredShape},
};

fn json_number(value: u64) -> serde_json::Value {
    serde_json::Value::Number(serde_json::Number::from(value))
}

fn read_u64(properties: Option<&JsonObject>, key: &str) -> Option<u64> {
    properties.and_then(|p| p.get(key)).and_then(|v| v.as_u64())
}

impl RoiStore {
    /// Export every stored shape as a GeoJSON polygon feature.
    ///
    /// Features carry `roi`, `image`, `shape`, `z`, `t`, `c` and, when set,
    /// `name` properties.
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::new();
        let mut shape_count = 0u64;

        for roi in self.rois() {
            for (index, shape) in roi.shapes.iter().enumerate() {
                let polygon = codec::decode(shape)?;
                let mut ring: Vec<Vec<f64>> = polygon.points().iter().map(|p| vec![p.x, p.y]).collect();
                if let Some(first) = ring.first().cloned() {
                    ring.push(first);
                }

                let mut properties = JsonObject::new();
                if let Some(id) = roi.id {
                    properties.insert("roi".to_string(), json_number(id));
                }
                if let Some(name) = &roi.name {
                    properties.insert("name".to_string(), serde_json::Value::String(name.clone()));
                }
                properties.insert("image".to_string(), json_number(roi.image));
                properties.insert("shape".to_string(), json_number(index as u64));
                properties.insert("z".to_string(), json_number(u64::from(shape.position.z)));
                properties.insert("t".to_string(), json_number(u64::from(shape.position.t)));
                properties.insert("c".to_string(), json_number(u64::from(shape.position.c)));

                features.push(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                });
                shape_count += 1;
            }
        }

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("roi_count".to_string(), json_number(self.len() as u64));
        foreign_members.insert("shape_count".to_string(), json_number(shape_count));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson()?)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    /// Load ROIs from a GeoJSON file
    pub fn from_geojson_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::from_geojson_string(&std::fs::read_to_string(path)?)
    }

    /// Rebuild a store from GeoJSON polygon features.
    ///
    /// Features sharing a `roi` property become shapes of one ROI, in the
    /// order they appear; features without it each become their own ROI.
    /// ROIs get fresh ids. Coordinates are truncated to integers, as for any
    /// stored shape. Non-polygon features, and features whose `z`, `t` or `c`
    /// does not fit a plane index, are skipped.
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        let collection: FeatureCollection = geojson_str.parse()?;

        struct Pending {
            image: ImageId,
            name: Option<String>,
            shapes: Vec<StoredShape>,
        }
        let mut pending: Vec<Pending> = Vec::new();
        let mut by_roi: HashMap<u64, usize> = HashMap::new();

        for feature in collection.features {
            let Some(Geometry { value: Value::Polygon(rings), .. }) = feature.geometry else {
                continue;
            };
            let Some(exterior) = rings.first() else {
                continue;
            };

            let geo_polygon = geo_types::Polygon::new(
                exterior
                    .iter()
                    .filter(|c| c.len() >= 2)
                    .map(|c| geo_types::Coord { x: c[0], y: c[1] })
                    .collect(),
                vec![],
            );
            let polygon = Polygon::from(&geo_polygon);

            let properties = feature.properties.as_ref();
            let coordinate = |key: &str| match read_u64(properties, key) {
                Some(value) => u32::try_from(value).ok(),
                None => Some(0),
            };
            let (Some(z), Some(t), Some(c)) = (coordinate("z"), coordinate("t"), coordinate("c")) else {
                tracing::debug!(properties = ?properties, "skipping feature with out-of-range plane index");
                continue;
            };
            let position = StackPosition::new(z, t, c);
            let shape = codec::encode(&polygon, position);

            let slot = read_u64(properties, "roi").and_then(|id| by_roi.get(&id).copied());
            match slot {
                Some(slot) => pending[slot].shapes.push(shape),
                None => {
                    if let Some(id) = read_u64(properties, "roi") {
                        by_roi.insert(id, pending.len());
                    }
                    pending.push(Pending {
                        image: read_u64(properties, "image").unwrap_or(0),
                        name: properties
                            .and_then(|p| p.get("name"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                        shapes: vec![shape],
                    });
                }
            }
        }

        let mut store = RoiStore::new();
        for roi in pending {
            store.insert(roi.image, roi.name, roi.shapes);
        }
        tracing::debug!(rois = store.len(), "loaded ROIs from GeoJSON");
        Ok(store)
    }
}
