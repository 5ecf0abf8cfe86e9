//! Nearest-Area Lookup Tool
//!
//! Maps a longitude/latitude point to the nearest named area by haversine
//! distance over area centroids. The centroid table is injected at
//! construction; the default set covers major city centers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    error::{AgentError, Result},
    tool::{ParameterSchema, Tool, ToolProvider, ToolSchema},
};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A named area represented by its centroid
#[derive(Clone, Debug)]
pub struct Area {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Area {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// Great-circle distance between two points, in kilometers
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * a.sqrt().asin() * EARTH_RADIUS_KM
}

/// Tool for resolving a coordinate to the nearest known area
pub struct NearestAreaTool {
    areas: Vec<Area>,
}

impl NearestAreaTool {
    pub fn new(areas: Vec<Area>) -> Self {
        Self { areas }
    }

    /// Default centroid table of major city centers
    pub fn with_default_areas() -> Self {
        Self::new(vec![
            Area::new("Beijing", 39.9042, 116.4074),
            Area::new("Shanghai", 31.2304, 121.4737),
            Area::new("Chongqing", 29.5630, 106.5516),
            Area::new("Chengdu", 30.5728, 104.0668),
            Area::new("Shenzhen", 22.5431, 114.0579),
            Area::new("Hangzhou", 30.2741, 120.1551),
        ])
    }
}

fn coord_arg(arguments: &HashMap<String, Value>, name: &str, bound: f64) -> Result<f64> {
    let value = arguments
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| AgentError::ToolValidation(format!("parameter '{name}' must be a number")))?;

    if value.abs() > bound {
        return Err(AgentError::ToolValidation(format!(
            "parameter '{name}' must be within ±{bound}"
        )));
    }

    Ok(value)
}

#[async_trait]
impl Tool for NearestAreaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "nearest_area".into(),
            description:
                "Find the nearest known area to a coordinate. Returns the area name and distance in kilometers."
                    .into(),
            parameters: vec![
                ParameterSchema::required("lat", "number", "Latitude in decimal degrees."),
                ParameterSchema::required("lon", "number", "Longitude in decimal degrees."),
            ],
        }
    }

    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
        let lat = coord_arg(arguments, "lat", 90.0)?;
        let lon = coord_arg(arguments, "lon", 180.0)?;

        let nearest = self
            .areas
            .iter()
            .map(|area| (area, haversine_km(lat, lon, area.lat, area.lon)))
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
            .ok_or_else(|| AgentError::ToolExecution("no areas configured".into()))?;

        let (area, distance_km) = nearest;
        Ok(json!({
            "area": area.name,
            "distance_km": (distance_km * 10.0).round() / 10.0,
        }))
    }
}

/// Geo tool provider
pub fn provider() -> ToolProvider {
    ToolProvider::new("geo", || {
        Ok(vec![
            Arc::new(NearestAreaTool::with_default_areas()) as Arc<dyn Tool>
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> HashMap<String, Value> {
        HashMap::from([("lat".into(), json!(lat)), ("lon".into(), json!(lon))])
    }

    #[tokio::test]
    async fn test_nearest_area_selection() {
        let tool = NearestAreaTool::with_default_areas();

        // A point just north of Beijing's center
        let value = tool.invoke(&coords(40.0, 116.4)).await.unwrap();
        assert_eq!(value["area"], "Beijing");
        assert!(value["distance_km"].as_f64().unwrap() < 20.0);
    }

    #[tokio::test]
    async fn test_distance_is_nonnegative() {
        let tool = NearestAreaTool::with_default_areas();
        let value = tool.invoke(&coords(29.5630, 106.5516)).await.unwrap();
        assert_eq!(value["area"], "Chongqing");
        assert_eq!(value["distance_km"].as_f64().unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_out_of_range_latitude_rejected() {
        let tool = NearestAreaTool::with_default_areas();
        let err = tool.invoke(&coords(95.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_empty_table_is_execution_error() {
        let tool = NearestAreaTool::new(Vec::new());
        let err = tool.invoke(&coords(0.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[test]
    fn test_haversine_known_distance() {
        // Beijing to Shanghai is roughly 1070 km
        let d = haversine_km(39.9042, 116.4074, 31.2304, 121.4737);
        assert!((d - 1070.0).abs() < 20.0);
    }
}
