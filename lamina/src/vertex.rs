// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex sources and geometric queries on them.

use peniko::kurbo::{
    Affine, Arc, BezPath, Circle, CircleSegment, CubicBez, Ellipse, Line, ParamCurve,
    ParamCurveNearest, PathEl, PathSeg, Point, QuadBez, Rect, RoundedRect, Shape,
    DEFAULT_ACCURACY,
};

#[cfg(all(not(feature = "std"), not(test)))]
use crate::floatfuncs::FloatFuncs;

/// Something that can supply path vertices.
///
/// Canvases consume vertex sources through
/// [`PaintCanvas::put_vertices`](crate::canvas::PaintCanvas::put_vertices)
/// without knowing anything about the type that produced them.
pub trait VertexSource {
    /// Produce the path for this source.
    fn vertices(&self) -> BezPath;
}

impl VertexSource for BezPath {
    fn vertices(&self) -> BezPath {
        self.clone()
    }
}

impl<T: VertexSource + ?Sized> VertexSource for &T {
    fn vertices(&self) -> BezPath {
        (**self).vertices()
    }
}

/// A [`VertexSource`] seen through an affine transform.
#[derive(Debug, Clone, Copy)]
pub struct VertexTransformer<S> {
    source: S,
    transform: Affine,
}

impl<S: VertexSource> VertexTransformer<S> {
    /// Wrap `source` so its vertices are mapped by `transform`.
    pub fn new(source: S, transform: Affine) -> Self {
        Self { source, transform }
    }
}

impl<S: VertexSource> VertexSource for VertexTransformer<S> {
    fn vertices(&self) -> BezPath {
        let mut path = self.source.vertices();
        path.apply_affine(self.transform);
        path
    }
}

/// Enumeration of Kurbo shapes usable as local geometry.
#[derive(Debug, Clone)]
pub enum AnyShape {
    /// [`Arc`] from Kurbo.
    Arc(Arc),
    /// [`BezPath`] from Kurbo.
    BezPath(BezPath),
    /// [`Circle`] from Kurbo.
    Circle(Circle),
    /// [`CircleSegment`] from Kurbo.
    CircleSegment(CircleSegment),
    /// [`CubicBez`] from Kurbo.
    CubicBez(CubicBez),
    /// [`Ellipse`] from Kurbo.
    Ellipse(Ellipse),
    /// [`Line`] from Kurbo.
    Line(Line),
    /// [`PathSeg`] from Kurbo.
    PathSeg(PathSeg),
    /// [`QuadBez`] from Kurbo.
    QuadBez(QuadBez),
    /// [`Rect`] from Kurbo.
    Rect(Rect),
    /// [`RoundedRect`] from Kurbo.
    RoundedRect(RoundedRect),
}

impl Default for AnyShape {
    fn default() -> Self {
        Self::BezPath(BezPath::new())
    }
}

macro_rules! impl_any_shape_from {
    ( $($T:ident)|* ) => {
        $(impl From<$T> for AnyShape {
            fn from(x: $T) -> Self {
                Self::$T(x)
            }
        })*
    };
}

impl_any_shape_from!(
    Arc | BezPath
        | Circle
        | CircleSegment
        | CubicBez
        | Ellipse
        | Line
        | PathSeg
        | QuadBez
        | Rect
        | RoundedRect
);

macro_rules! impl_any_shape_fun {
    ( $self:ident, $fun:ident, $arg:expr, $($name:ident)|* ) => {
        match $self {
            $(AnyShape::$name(x) => x.$fun($arg),)*
        }
    };
}

impl VertexSource for AnyShape {
    fn vertices(&self) -> BezPath {
        impl_any_shape_fun!(
            self,
            to_path,
            DEFAULT_ACCURACY,
            Arc | BezPath
                | Circle
                | CircleSegment
                | CubicBez
                | Ellipse
                | Line
                | PathSeg
                | QuadBez
                | Rect
                | RoundedRect
        )
    }
}

/// Details about where a vertex hit test matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexHit {
    /// Index of the nearest segment in the tested path.
    pub segment: usize,
    /// Curve parameter of the nearest point on that segment.
    pub t: f64,
    /// Nearest point on the outline.
    pub point: Point,
    /// Distance from the location to the outline.
    pub distance: f64,
    /// `true` when the outline matched, `false` when only the interior did.
    pub outline: bool,
}

/// Calculate the bounds of a vertex source.
///
/// With `include_curves`, bounds follow the curve extrema; otherwise they
/// cover all control points. Returns `None` when the source has no segments.
pub fn calculate_bounds(source: &impl VertexSource, include_curves: bool) -> Option<Rect> {
    let path = source.vertices();
    path.segments().next()?;
    if include_curves {
        return Some(path.bounding_box());
    }
    path.elements()
        .iter()
        .flat_map(|el| match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => [Some(p), None, None],
            PathEl::QuadTo(p1, p2) => [Some(p1), Some(p2), None],
            PathEl::CurveTo(p1, p2, p3) => [Some(p1), Some(p2), Some(p3)],
            PathEl::ClosePath => [None, None, None],
        })
        .flatten()
        .map(|p| Rect::from_points(p, p))
        .reduce(|a, b| a.union(b))
}

/// Hit test `location` against a vertex source.
///
/// The outline matches when `location` is within half of `width` from it.
/// When `filled` is set the interior matches too, using the non-zero rule.
pub fn hit_test(
    location: Point,
    source: &impl VertexSource,
    width: f64,
    filled: bool,
) -> Option<VertexHit> {
    let path = source.vertices();
    let (segment, (seg, nearest)) = path
        .segments()
        .map(|s| (s, s.nearest(location, DEFAULT_ACCURACY)))
        .enumerate()
        .min_by(|(_, (_, a)), (_, (_, b))| a.distance_sq.total_cmp(&b.distance_sq))?;

    let distance = nearest.distance_sq.sqrt();
    let outline = distance <= width * 0.5;
    if !outline && !(filled && path.contains(location)) {
        return None;
    }

    Some(VertexHit {
        segment,
        t: nearest.t,
        point: seg.eval(nearest.t),
        distance,
        outline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_has_no_bounds() {
        assert_eq!(calculate_bounds(&BezPath::new(), true), None);
        let mut only_move = BezPath::new();
        only_move.move_to((3.0, 4.0));
        assert_eq!(calculate_bounds(&only_move, false), None);
    }

    #[test]
    fn curve_bounds_are_tighter_than_control_points() {
        let cubic = AnyShape::from(CubicBez::new(
            (0.0, 0.0),
            (0.0, 100.0),
            (100.0, 100.0),
            (100.0, 0.0),
        ));
        let tight = calculate_bounds(&cubic, true).unwrap();
        let loose = calculate_bounds(&cubic, false).unwrap();
        assert!((loose.y1 - 100.0).abs() < 1e-9);
        assert!((tight.y1 - 75.0).abs() < 1e-6, "{tight:?}");
        assert_eq!(loose.union(tight), loose);
    }

    #[test]
    fn transformer_maps_vertices() {
        let rect = AnyShape::from(Rect::new(0.0, 0.0, 10.0, 10.0));
        let moved =
            VertexTransformer::new(&rect, Affine::translate((5.0, 5.0)) * Affine::scale(2.0));
        let bounds = calculate_bounds(&moved, true).unwrap();
        assert_eq!(bounds, Rect::new(5.0, 5.0, 25.0, 25.0));
    }

    #[test]
    fn outline_and_fill_hits() {
        let rect = AnyShape::from(Rect::new(0.0, 0.0, 100.0, 100.0));

        let near_edge = hit_test(Point::new(50.0, 101.0), &rect, 4.0, false).unwrap();
        assert!(near_edge.outline);
        assert!((near_edge.distance - 1.0).abs() < 1e-9);
        assert!((near_edge.point.y - 100.0).abs() < 1e-9);

        assert!(hit_test(Point::new(50.0, 50.0), &rect, 4.0, false).is_none());

        let inside = hit_test(Point::new(50.0, 50.0), &rect, 0.0, true).unwrap();
        assert!(!inside.outline);

        assert!(hit_test(Point::new(150.0, 50.0), &rect, 4.0, true).is_none());
    }
}
