// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utilities for transformations

use peniko::kurbo::{Affine, Point, Rect};
use serde_json::Value;

#[cfg(all(not(feature = "std"), not(test)))]
use crate::floatfuncs::FloatFuncs;

/// Queries on [`Affine`] used by painting and hit testing.
pub trait AffineExt {
    /// Uniform scale factor of the transform.
    ///
    /// This is the square root of the absolute determinant, so a non-uniform
    /// scale of `(4, 1)` reports `2`.
    fn scale_factor(&self) -> f64;

    /// `true` if this is exactly the identity transform.
    fn is_identity(&self) -> bool;

    /// `true` if the transform has a finite inverse.
    fn is_invertible(&self) -> bool;

    /// Map a rectangle, returning the bounding box of the mapped corners.
    fn map_rect(&self, rect: Rect) -> Rect;
}

impl AffineExt for Affine {
    #[inline]
    fn scale_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    #[inline]
    fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det != 0.0 && det.is_finite() && self.as_coeffs().iter().all(|c| c.is_finite())
    }

    #[inline]
    fn map_rect(&self, rect: Rect) -> Rect {
        self.transform_rect_bbox(rect)
    }
}

/// Map a point through an optional transform.
#[inline]
pub fn map_point(transform: Option<Affine>, point: Point) -> Point {
    transform.map_or(point, |t| t * point)
}

/// Convert a transform into its persisted representation.
///
/// The transform is stored as its six coefficients `[a, b, c, d, e, f]`.
pub fn serialize_transform(transform: Affine) -> Value {
    Value::from(transform.as_coeffs().to_vec())
}

/// Convert a persisted representation back into a transform.
///
/// This only converts; it does not check that the result is invertible.
///
/// # Errors
///
/// Fails when `value` is not an array of six numbers.
pub fn deserialize_transform(value: &Value) -> Result<Affine, serde_json::Error> {
    let coeffs: [f64; 6] = serde::Deserialize::deserialize(value)?;
    Ok(Affine::new(coeffs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::kurbo::Vec2;

    #[test]
    fn scale_factor_is_geometric_mean() {
        assert!((Affine::scale(3.0).scale_factor() - 3.0).abs() < 1e-12);
        assert!((Affine::scale_non_uniform(4.0, 1.0).scale_factor() - 2.0).abs() < 1e-12);
        let rotated = Affine::rotate(0.7) * Affine::scale(2.0);
        assert!((rotated.scale_factor() - 2.0).abs() < 1e-12);
        assert_eq!(Affine::scale_non_uniform(1.0, 0.0).scale_factor(), 0.0);
    }

    #[test]
    fn identity_and_invertibility() {
        assert!(Affine::IDENTITY.is_identity());
        assert!(!Affine::translate(Vec2::new(1.0, 0.0)).is_identity());
        assert!(Affine::scale(0.5).is_invertible());
        assert!(!Affine::scale_non_uniform(2.0, 0.0).is_invertible());
        assert!(!Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]).is_invertible());
    }

    #[test]
    fn transform_survives_store_and_restore() {
        let t = Affine::translate(Vec2::new(12.5, -3.0)) * Affine::rotate(0.3) * Affine::scale(1.7);
        let stored = serialize_transform(t);
        let restored = deserialize_transform(&stored).unwrap();
        for (a, b) in t.as_coeffs().iter().zip(restored.as_coeffs()) {
            assert!((a - b).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn malformed_transform_is_rejected() {
        assert!(deserialize_transform(&Value::from("nope")).is_err());
        assert!(deserialize_transform(&Value::from(vec![1.0, 2.0])).is_err());
    }
}
