//! Translation between the database point string and in-memory polygons.
//!
//! Stored shapes hold points as whitespace-separated `x,y` groups, e.g.
//! `"1,2, 3,4"`. Empty groups and empty values inside a group (as left by
//! stray delimiters) are skipped.

use geo_types::Coord;

use crate::{
    error::{Result, RoiError},
    traits::RoiHandle,
    types::{Polygon, StackPosition, StoredShape},
};

/// Decode the points of a stored shape.
pub fn decode(shape: &StoredShape) -> Result<Polygon> {
    decode_points(&shape.points)
}

/// Parse a raw point string into a polygon.
pub fn decode_points(points: &str) -> Result<Polygon> {
    let mut polygon = Vec::new();

    for token in points.split_whitespace() {
        let values: Vec<&str> = token.split(',').filter(|v| !v.is_empty()).collect();
        match values.as_slice() {
            [] => continue,
            [x, y] => {
                let malformed = || RoiError::MalformedShape {
                    token: token.to_string(),
                };
                let x: f64 = x.parse().map_err(|_| malformed())?;
                let y: f64 = y.parse().map_err(|_| malformed())?;
                polygon.push(Coord { x, y });
            }
            _ => {
                return Err(RoiError::MalformedShape {
                    token: token.to_string(),
                })
            }
        }
    }

    tracing::trace!(points = polygon.len(), "decoded shape");
    Ok(Polygon::new(polygon))
}

/// Serialize a polygon for storage.
///
/// Coordinates are cast to integers (truncation toward zero), which is the
/// format already on disk. Polygons of any length are accepted.
pub fn encode(polygon: &Polygon, position: StackPosition) -> StoredShape {
    let points = polygon
        .points()
        .iter()
        .map(|p| format!("{},{}", p.x as i64, p.y as i64))
        .collect::<Vec<_>>()
        .join(", ");

    StoredShape { points, position }
}

/// Decode every shape of an ROI, in shape order.
pub fn decode_roi<R: RoiHandle + ?Sized>(roi: &R) -> Result<Vec<Polygon>> {
    roi.shapes().iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(polygon: &Polygon) -> Vec<(f64, f64)> {
        polygon.points().iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_decode_trailing_delimiters() {
        let polygon = decode_points("1,2, 3,4").expect("Should decode");
        assert_eq!(coords(&polygon), vec![(1.0, 2.0), (3.0, 4.0)]);

        let polygon = decode_points("  10.5,20.25 ,  30,40,  ").expect("Should decode");
        assert_eq!(coords(&polygon), vec![(10.5, 20.25), (30.0, 40.0)]);
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode_points("").expect("Should decode").is_empty());
    }

    #[test]
    fn test_decode_odd_value_count_is_malformed() {
        let err = decode_points("1,2 3,4,5").unwrap_err();
        match err {
            RoiError::MalformedShape { token } => assert_eq!(token, "3,4,5"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(decode_points("1,2 3").is_err());
    }

    #[test]
    fn test_decode_non_numeric_is_malformed() {
        assert!(matches!(
            decode_points("1,2 a,4"),
            Err(RoiError::MalformedShape { .. })
        ));
    }

    #[test]
    fn test_encode_truncates() {
        let polygon = Polygon::from(vec![[1.7, 2.2], [3.9, 4.1]]);
        let shape = encode(&polygon, StackPosition::new(0, 0, 0));
        assert_eq!(shape.points, "1,2, 3,4");
        assert_eq!(shape.position, StackPosition::default());
    }

    #[test]
    fn test_encode_degenerate() {
        assert_eq!(encode(&Polygon::default(), StackPosition::default()).points, "");
        let single = Polygon::from(vec![[-1.5, 2.0]]);
        assert_eq!(encode(&single, StackPosition::default()).points, "-1,2");
    }

    #[test]
    fn test_round_trip_integer_polygon() {
        let polygon = Polygon::from(vec![[0.0, 0.0], [0.0, 12.0], [7.0, 12.0], [9.0, 3.0]]);
        let position = StackPosition::new(4, 2, 1);
        let shape = encode(&polygon, position);
        assert_eq!(shape.position, position);
        assert_eq!(decode(&shape).expect("Should decode"), polygon);
    }
}
