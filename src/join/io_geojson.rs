use snafu::prelude::*;

use crate::join::*;

/// Reads the features of a GeoJSON `FeatureCollection`.
///
/// The properties become the attributes of the area, the geometry is kept as is.
pub fn read_geojson(path: &str) -> BJoinResult<Vec<AreaRecord<JSValue>>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    parse_feature_collection(&js).map_err(|detail| {
        Box::new(JoinError::GeoJsonStructure {
            path: path.to_string(),
            detail,
        })
    })
}

fn parse_feature_collection(js: &JSValue) -> Result<Vec<AreaRecord<JSValue>>, String> {
    if js["type"].as_str() != Some("FeatureCollection") {
        return Err(format!("unexpected type {}", js["type"]));
    }
    let features = js["features"]
        .as_array()
        .ok_or_else(|| "missing features".to_string())?;

    let mut res: Vec<AreaRecord<JSValue>> = Vec::new();
    for (idx, feature) in features.iter().enumerate() {
        let properties = match &feature["properties"] {
            JSValue::Object(m) => m
                .iter()
                .map(|(k, v)| (k.clone(), cell_of_json(v)))
                .collect(),
            JSValue::Null => Vec::new(),
            x => return Err(format!("feature {}: properties is not an object: {}", idx, x)),
        };
        debug!("read_geojson: feature {}: {:?}", idx, properties);
        res.push(AreaRecord {
            properties: Record { fields: properties },
            geometry: feature["geometry"].clone(),
        });
    }
    info!("Read {} features", res.len());
    Ok(res)
}

fn cell_of_json(v: &JSValue) -> Cell {
    match v {
        JSValue::String(s) if s.trim().is_empty() => Cell::Empty,
        JSValue::String(s) => Cell::Text(s.clone()),
        JSValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        JSValue::Bool(b) => Cell::Text(b.to_string()),
        JSValue::Null => Cell::Empty,
        // Nested values are not identifiers nor counts.
        x => Cell::Text(x.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features() {
        let js = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"id": 3, "name": "Siloé"}, "geometry": {"type": "Polygon", "coordinates": []}},
                {"type": "Feature", "properties": null, "geometry": null}
            ]
        });
        let areas = parse_feature_collection(&js).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].properties.get("id"), Some(&Cell::Number(3.0)));
        assert_eq!(areas[0].geometry["type"], json!("Polygon"));
        assert!(areas[1].properties.fields.is_empty());
    }

    #[test]
    fn not_a_collection() {
        assert!(parse_feature_collection(&json!({"type": "Feature"})).is_err());
        assert!(parse_feature_collection(&json!({"type": "FeatureCollection"})).is_err());
        assert!(parse_feature_collection(&json!({
            "type": "FeatureCollection",
            "features": [{"properties": 3}]
        }))
        .is_err());
    }
}
