// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint canvas abstraction.
//!
//! A [`PaintCanvas`] follows the model of an HTML canvas: the current
//! transform is applied to vertices when they are put, and to paints and
//! stroke widths when they are drawn. This lets a caller put vertices once and
//! then fill them with a paint placed in a different coordinate space.

use core::ops::{Deref, DerefMut};

use peniko::{
    kurbo::{Affine, Cap, Join, Rect, Stroke},
    Brush,
};

use crate::vertex::VertexSource;

/// Failures reported by a [`PaintCanvas`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    /// A fill or stroke was requested before any vertices were put.
    #[error("no vertices have been put on the canvas")]
    NoVertices,
    /// [`PaintCanvas::pop_surface`] was called without a matching push.
    #[error("surface stack underflow")]
    SurfaceUnderflow,
    /// The backend could not carry out an operation.
    #[error("canvas backend failure: {0}")]
    Backend(&'static str),
}

/// How a drawing operation combines with what is already on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeOperator {
    /// Draw over the destination.
    #[default]
    SourceOver,
    /// Keep the destination only where source and destination overlap.
    DestinationIn,
    /// Keep the destination only where source and destination don't overlap.
    DestinationOut,
}

/// Parameters for [`PaintCanvas::stroke_vertices`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeParams {
    /// Stroke width in the canvas' current user space.
    pub width: f64,
    /// Line cap for both ends.
    pub cap: Cap,
    /// Line join.
    pub join: Join,
    /// Miter limit.
    pub miter_limit: f64,
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 10.0,
        }
    }
}

impl From<StrokeParams> for Stroke {
    fn from(params: StrokeParams) -> Self {
        Self::new(params.width)
            .with_caps(params.cap)
            .with_join(params.join)
            .with_miter_limit(params.miter_limit)
    }
}

/// A drawing surface.
pub trait PaintCanvas {
    /// Current transform.
    fn transform(&self) -> Affine;

    /// Replace the current transform, returning the previous one.
    fn set_transform(&mut self, transform: Affine) -> Affine;

    /// Reset the current transform to identity, returning the previous one.
    fn reset_transform(&mut self) -> Affine {
        self.set_transform(Affine::IDENTITY)
    }

    /// Make `source` the current vertices, mapped by the current transform.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn put_vertices(&mut self, source: &dyn VertexSource) -> Result<(), CanvasError>;

    /// Fill the current vertices, with `paint` placed by the current transform.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NoVertices`] without current vertices.
    fn fill_vertices(
        &mut self,
        paint: &Brush,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError>;

    /// Stroke the current vertices; the width is measured in current user space.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NoVertices`] without current vertices.
    fn stroke_vertices(
        &mut self,
        paint: &Brush,
        params: StrokeParams,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError>;

    /// Fill `rect`, given in current user space. Leaves the current vertices alone.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn fill_rect(
        &mut self,
        rect: Rect,
        paint: &Brush,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError>;

    /// Start drawing into a temporary surface covering `extents` in current user space.
    ///
    /// Composite operators only affect the innermost surface.
    ///
    /// # Errors
    ///
    /// Backend specific.
    fn push_surface(&mut self, extents: Rect, opacity: f32) -> Result<(), CanvasError>;

    /// Composite the innermost temporary surface onto its parent and release it.
    ///
    /// # Errors
    ///
    /// [`CanvasError::SurfaceUnderflow`] without a matching push.
    fn pop_surface(&mut self) -> Result<(), CanvasError>;
}

/// Installs a transform on a canvas and restores the previous one when dropped.
#[derive(Debug)]
pub struct TransformScope<'a, C: PaintCanvas + ?Sized> {
    canvas: &'a mut C,
    saved: Affine,
}

impl<'a, C: PaintCanvas + ?Sized> TransformScope<'a, C> {
    /// Set `transform` on `canvas` until the scope ends.
    pub fn new(canvas: &'a mut C, transform: Affine) -> Self {
        let saved = canvas.set_transform(transform);
        Self { canvas, saved }
    }

    /// The transform that will be restored.
    pub fn saved(&self) -> Affine {
        self.saved
    }
}

impl<C: PaintCanvas + ?Sized> Deref for TransformScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: PaintCanvas + ?Sized> DerefMut for TransformScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: PaintCanvas + ?Sized> Drop for TransformScope<'_, C> {
    fn drop(&mut self) {
        self.canvas.set_transform(self.saved);
    }
}

/// A temporary surface that is composited back when finished or dropped.
///
/// The canvas transform in effect when the surface was pushed is restored as
/// well, so work inside the scope can't leak transform changes.
#[derive(Debug)]
pub struct SurfaceScope<'a, C: PaintCanvas + ?Sized> {
    canvas: &'a mut C,
    saved: Affine,
    open: bool,
}

impl<'a, C: PaintCanvas + ?Sized> SurfaceScope<'a, C> {
    /// Push a temporary surface covering `extents`.
    ///
    /// # Errors
    ///
    /// Forwards errors from [`PaintCanvas::push_surface`].
    pub fn push(canvas: &'a mut C, extents: Rect, opacity: f32) -> Result<Self, CanvasError> {
        canvas.push_surface(extents, opacity)?;
        let saved = canvas.transform();
        Ok(Self {
            canvas,
            saved,
            open: true,
        })
    }

    /// Composite the surface onto its parent.
    ///
    /// # Errors
    ///
    /// Forwards errors from [`PaintCanvas::pop_surface`].
    pub fn finish(mut self) -> Result<(), CanvasError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), CanvasError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.canvas.set_transform(self.saved);
        self.canvas.pop_surface()
    }
}

impl<C: PaintCanvas + ?Sized> Deref for SurfaceScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: PaintCanvas + ?Sized> DerefMut for SurfaceScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: PaintCanvas + ?Sized> Drop for SurfaceScope<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to release temporary surface: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_list::DisplayList;
    use peniko::{color::palette::css::BLACK, kurbo::Vec2};

    #[test]
    fn transform_scope_restores_on_early_return() {
        fn fails(canvas: &mut dyn PaintCanvas) -> Result<(), CanvasError> {
            let mut scope = TransformScope::new(canvas, Affine::scale(3.0));
            assert_eq!(scope.transform(), Affine::scale(3.0));
            scope.fill_vertices(&Brush::Solid(BLACK), 1.0, CompositeOperator::SourceOver)?;
            Ok(())
        }

        let start = Affine::translate(Vec2::new(4.0, 2.0));
        let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        list.set_transform(start);
        assert_eq!(fails(&mut list), Err(CanvasError::NoVertices));
        assert_eq!(list.transform(), start);
    }

    #[test]
    fn surface_scope_pops_when_dropped() {
        let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        {
            let mut surface =
                SurfaceScope::push(&mut list, Rect::new(0.0, 0.0, 10.0, 10.0), 1.0).unwrap();
            surface.set_transform(Affine::scale(2.0));
            assert_eq!(surface.surface_depth(), 1);
        }
        assert_eq!(list.surface_depth(), 0);
        assert_eq!(list.transform(), Affine::IDENTITY);
    }

    #[test]
    fn finished_surface_is_not_popped_twice() {
        let mut list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let surface = SurfaceScope::push(&mut list, Rect::new(0.0, 0.0, 10.0, 10.0), 1.0).unwrap();
        surface.finish().unwrap();
        assert_eq!(list.surface_depth(), 0);
        assert_eq!(list.pop_surface(), Err(CanvasError::SurfaceUnderflow));
    }
}
