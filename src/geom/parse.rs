use crate::error::GeoSearchError;
use geo_types::{Geometry, Polygon};
use geojson::GeoJson;
use std::str::FromStr;
use wkt::Wkt;

/// Parses a geometry string, auto-detecting WKT or GeoJSON format.
///
/// GeoJSON is detected by a leading `{`, everything else is tried as WKT.
pub fn parse_geometry(s: &str) -> Result<Geometry<f64>, GeoSearchError> {
    let trimmed = s.trim();
    if trimmed.starts_with('{') {
        parse_geojson(trimmed)
    } else {
        parse_wkt(trimmed)
    }
}

/// Parses a GeoJSON geometry or single feature.
pub fn parse_geojson(s: &str) -> Result<Geometry<f64>, GeoSearchError> {
    let geojson: GeoJson = s
        .parse()
        .map_err(|e: geojson::Error| GeoSearchError::GeometryParse(e.to_string()))?;

    match geojson {
        GeoJson::Geometry(geom) => {
            Geometry::try_from(geom).map_err(|e| GeoSearchError::GeometryParse(e.to_string()))
        }
        GeoJson::Feature(feat) => feat
            .geometry
            .ok_or_else(|| GeoSearchError::GeometryParse("Feature has no geometry".to_string()))
            .and_then(|g| {
                Geometry::try_from(g).map_err(|e| GeoSearchError::GeometryParse(e.to_string()))
            }),
        GeoJson::FeatureCollection(_) => Err(GeoSearchError::GeometryParse(
            "FeatureCollection not supported, pass a single polygon".to_string(),
        )),
    }
}

pub fn parse_wkt(s: &str) -> Result<Geometry<f64>, GeoSearchError> {
    let wkt: Wkt<f64> =
        Wkt::from_str(s).map_err(|e| GeoSearchError::GeometryParse(e.to_string()))?;

    wkt.try_into().map_err(|_| {
        GeoSearchError::GeometryParse("Failed to convert WKT to geometry".to_string())
    })
}

/// Parses a search area given as a WKT or GeoJSON polygon.
///
/// Coordinates are `(longitude, latitude)` in degrees. A polygon needs at least
/// three distinct vertices in its exterior ring.
pub fn parse_polygon(s: &str) -> Result<Polygon<f64>, GeoSearchError> {
    let polygon = match parse_geometry(s)? {
        Geometry::Polygon(polygon) => polygon,
        Geometry::MultiPolygon(mut multi) if multi.0.len() == 1 => multi.0.remove(0),
        other => {
            return Err(GeoSearchError::GeometryParse(format!(
                "expected a polygon, got {}",
                geometry_kind(&other)
            )));
        }
    };

    // closed rings repeat the first vertex
    let exterior = polygon.exterior();
    let distinct = exterior.0.len().saturating_sub(usize::from(exterior.is_closed()));
    if distinct < 3 {
        return Err(GeoSearchError::GeometryParse(format!(
            "polygon needs at least 3 vertices, got {}",
            distinct
        )));
    }

    let out_of_range = exterior
        .coords()
        .any(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y));
    if out_of_range {
        return Err(GeoSearchError::GeometryParse(
            "polygon vertices must be (longitude, latitude) in degrees".to_string(),
        ));
    }

    Ok(polygon)
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geojson_point() -> Result<(), GeoSearchError> {
        let json = r#"{"type":"Point","coordinates":[-74.006,40.7128]}"#;
        match parse_geometry(json)? {
            Geometry::Point(pt) => {
                assert!((pt.x() - (-74.006)).abs() < 1e-9);
                assert!((pt.y() - 40.7128).abs() < 1e-9);
            }
            _ => panic!("Expected Point"),
        }
        Ok(())
    }

    #[test]
    fn test_parse_wkt_polygon() -> Result<(), GeoSearchError> {
        let polygon =
            parse_polygon("POLYGON((-74.1 40.6, -73.9 40.6, -73.9 40.8, -74.1 40.8, -74.1 40.6))")?;
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.interiors().is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_geojson_feature_polygon() -> Result<(), GeoSearchError> {
        let json = r#"{"type":"Feature","properties":{},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        let polygon = parse_polygon(json)?;
        assert_eq!(polygon.exterior().0.len(), 4);
        Ok(())
    }

    #[test]
    fn test_parse_polygon_rejects_other_geometries() {
        let result = parse_polygon("LINESTRING(-0.1 51.5, -0.2 51.6)");
        assert!(
            matches!(result, Err(GeoSearchError::GeometryParse(msg)) if msg.contains("LineString"))
        );
    }

    #[test]
    fn test_parse_polygon_rejects_out_of_range() {
        let result = parse_polygon("POLYGON((0 0, 200 0, 200 10, 0 0))");
        assert!(matches!(result, Err(GeoSearchError::GeometryParse(_))));
    }

    #[test]
    fn test_feature_collection_rejected() {
        let json = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(parse_geometry(json).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            parse_geometry("not a shape"),
            Err(GeoSearchError::GeometryParse(_))
        ));
    }
}
