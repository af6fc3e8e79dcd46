// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`PaintCanvas`] that records what is drawn.

extern crate alloc;
use alloc::vec::Vec;

use peniko::{
    kurbo::{Affine, BezPath, Rect},
    Brush,
};
use smallvec::SmallVec;

use crate::{
    canvas::{CanvasError, CompositeOperator, PaintCanvas, StrokeParams},
    transform::AffineExt,
    vertex::VertexSource,
};

/// Items for [`DisplayList`].
///
/// Geometry is recorded in device space, that is after the canvas transform
/// in effect when the vertices were put.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    /// Fill of the current vertices.
    FillVertices {
        /// Device space path.
        path: BezPath,
        /// Paint.
        paint: Brush,
        /// Canvas transform at the time of the fill, which places the paint.
        paint_transform: Affine,
        /// Opacity.
        opacity: f32,
        /// Composite operator.
        composite: CompositeOperator,
    },
    /// Stroke of the current vertices.
    StrokeVertices {
        /// Device space path.
        path: BezPath,
        /// Paint.
        paint: Brush,
        /// Canvas transform at the time of the stroke; `params.width` is measured in its space.
        transform: Affine,
        /// Stroke parameters.
        params: StrokeParams,
        /// Opacity.
        opacity: f32,
        /// Composite operator.
        composite: CompositeOperator,
    },
    /// Fill of a rectangle.
    FillRect {
        /// Rectangle in the user space of `transform`.
        rect: Rect,
        /// Canvas transform at the time of the fill.
        transform: Affine,
        /// Paint.
        paint: Brush,
        /// Opacity.
        opacity: f32,
        /// Composite operator.
        composite: CompositeOperator,
    },
    /// Start of a temporary surface.
    PushSurface {
        /// Device space extents.
        extents: Rect,
        /// Opacity used when compositing the surface back.
        opacity: f32,
    },
    /// Temporary surface composited onto its parent.
    PopSurface,
}

impl DisplayItem {
    /// Composite operator of a drawing item, `None` for surface items.
    pub fn composite(&self) -> Option<CompositeOperator> {
        match self {
            Self::FillVertices { composite, .. }
            | Self::StrokeVertices { composite, .. }
            | Self::FillRect { composite, .. } => Some(*composite),
            Self::PushSurface { .. } | Self::PopSurface => None,
        }
    }
}

/// Simple display list, recording canvas operations in order.
#[derive(Debug, Default)]
pub struct DisplayList {
    /// Items in `DisplayList`.
    pub items: Vec<DisplayItem>,
    viewport: Rect,
    transform: Affine,
    vertices: Option<BezPath>,
    surfaces: SmallVec<[Rect; 4]>,
}

impl DisplayList {
    /// Make an empty `DisplayList` covering `viewport` in device space.
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    /// Push a [`DisplayItem`], returning its index.
    pub fn push(&mut self, i: impl Into<DisplayItem>) -> usize {
        let n = self.items.len();
        self.items.push(i.into());
        n
    }

    /// Device space extents of the innermost surface.
    pub fn extents(&self) -> Rect {
        self.surfaces.last().copied().unwrap_or(self.viewport)
    }

    /// Number of temporary surfaces currently pushed.
    pub fn surface_depth(&self) -> usize {
        self.surfaces.len()
    }

    /// Current vertices, in device space.
    pub fn vertices(&self) -> Option<&BezPath> {
        self.vertices.as_ref()
    }

    fn current_vertices(&self) -> Result<BezPath, CanvasError> {
        self.vertices.clone().ok_or(CanvasError::NoVertices)
    }
}

impl PaintCanvas for DisplayList {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) -> Affine {
        core::mem::replace(&mut self.transform, transform)
    }

    fn put_vertices(&mut self, source: &dyn VertexSource) -> Result<(), CanvasError> {
        let mut path = source.vertices();
        path.apply_affine(self.transform);
        self.vertices = Some(path);
        Ok(())
    }

    fn fill_vertices(
        &mut self,
        paint: &Brush,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError> {
        let path = self.current_vertices()?;
        self.push(DisplayItem::FillVertices {
            path,
            paint: paint.clone(),
            paint_transform: self.transform,
            opacity,
            composite,
        });
        Ok(())
    }

    fn stroke_vertices(
        &mut self,
        paint: &Brush,
        params: StrokeParams,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError> {
        let path = self.current_vertices()?;
        self.push(DisplayItem::StrokeVertices {
            path,
            paint: paint.clone(),
            transform: self.transform,
            params,
            opacity,
            composite,
        });
        Ok(())
    }

    fn fill_rect(
        &mut self,
        rect: Rect,
        paint: &Brush,
        opacity: f32,
        composite: CompositeOperator,
    ) -> Result<(), CanvasError> {
        self.push(DisplayItem::FillRect {
            rect,
            transform: self.transform,
            paint: paint.clone(),
            opacity,
            composite,
        });
        Ok(())
    }

    fn push_surface(&mut self, extents: Rect, opacity: f32) -> Result<(), CanvasError> {
        let extents = self.transform.map_rect(extents);
        self.surfaces.push(extents);
        self.push(DisplayItem::PushSurface { extents, opacity });
        Ok(())
    }

    fn pop_surface(&mut self) -> Result<(), CanvasError> {
        self.surfaces.pop().ok_or(CanvasError::SurfaceUnderflow)?;
        self.push(DisplayItem::PopSurface);
        Ok(())
    }
}
