// label.rs
//
// Where to put a gewog's name on the map.

use geo::{BoundingRect, Centroid, Coord, InteriorPoint, LineString, MultiPolygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStrategy {
    /// A point guaranteed to lie inside the polygon.
    PointOnSurface,
    /// Area-weighted centroid.
    CenterOfMass,
    /// Mean of the ring vertices.
    VertexCentroid,
    /// Center of the bounding box; succeeds for any non-empty geometry.
    BoundsCenter,
}

/// Tried in order, first usable point wins. Concave gewogs can have a
/// centroid outside their outline, so the interior point comes first.
pub const LABEL_STRATEGIES: [LabelStrategy; 4] = [
    LabelStrategy::PointOnSurface,
    LabelStrategy::CenterOfMass,
    LabelStrategy::VertexCentroid,
    LabelStrategy::BoundsCenter,
];

impl LabelStrategy {
    pub fn locate(self, geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
        let point = match self {
            LabelStrategy::PointOnSurface => geometry.interior_point().map(Coord::from),
            LabelStrategy::CenterOfMass => geometry.centroid().map(Coord::from),
            LabelStrategy::VertexCentroid => vertex_centroid(geometry),
            LabelStrategy::BoundsCenter => geometry.bounding_rect().map(|r| r.center()),
        }?;
        (point.x.is_finite() && point.y.is_finite()).then_some(point)
    }
}

/// Label anchor for `geometry` and the strategy that produced it.
pub fn label_point(geometry: &MultiPolygon<f64>) -> Option<(Coord<f64>, LabelStrategy)> {
    locate_with(&LABEL_STRATEGIES, geometry)
}

pub fn locate_with(
    strategies: &[LabelStrategy],
    geometry: &MultiPolygon<f64>,
) -> Option<(Coord<f64>, LabelStrategy)> {
    strategies
        .iter()
        .find_map(|s| s.locate(geometry).map(|c| (c, *s)))
}

fn vertex_centroid(geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let mut sum = Coord { x: 0.0, y: 0.0 };
    let mut count = 0usize;
    for polygon in &geometry.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for c in open_ring(ring) {
                sum.x += c.x;
                sum.y += c.y;
                count += 1;
            }
        }
    }
    (count > 0).then(|| Coord {
        x: sum.x / count as f64,
        y: sum.y / count as f64,
    })
}

/// Ring vertices without the repeated closing vertex.
fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    match ring.0.as_slice() {
        [first, rest @ .., last] if first == last && !rest.is_empty() => &ring.0[..ring.0.len() - 1],
        all => all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Contains, Point, polygon};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    /// A "C" shape whose centroid falls in the notch.
    fn c_shape() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 9.0),
            (x: 10.0, y: 9.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn point_on_surface_wins_and_is_inside() {
        let shape = c_shape();
        let (point, strategy) = label_point(&shape).unwrap();
        assert_eq!(strategy, LabelStrategy::PointOnSurface);
        assert!(shape.contains(&Point::from(point)));

        let centroid = LabelStrategy::CenterOfMass.locate(&shape).unwrap();
        assert!(!shape.contains(&Point::from(centroid)));
    }

    #[test]
    fn vertex_centroid_skips_closing_vertex() {
        let c = LabelStrategy::VertexCentroid.locate(&square()).unwrap();
        assert_relative_eq!(c.x, 2.0);
        assert_relative_eq!(c.y, 2.0);
    }

    #[test]
    fn bounds_center_is_last_resort() {
        let (point, strategy) = locate_with(&[LabelStrategy::BoundsCenter], &square()).unwrap();
        assert_eq!(strategy, LabelStrategy::BoundsCenter);
        assert_relative_eq!(point.x, 2.0);
        assert_relative_eq!(point.y, 2.0);
    }

    #[test]
    fn empty_geometry_has_no_label() {
        assert!(label_point(&MultiPolygon(Vec::new())).is_none());
    }
}
