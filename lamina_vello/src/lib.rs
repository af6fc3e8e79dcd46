// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vello rendering for Lamina.

use lamina::{
    canvas::{CanvasError, CompositeOperator, PaintCanvas, StrokeParams},
    element::{Element, PaintConfiguration, PaintContext},
    peniko::{
        kurbo::{Affine, BezPath, Rect, Stroke},
        BlendMode, Brush, Compose, Fill, Mix,
    },
    transform::AffineExt,
    vertex::VertexSource,
};
use vello::Scene;

extern crate alloc;
use alloc::vec::Vec;

/// A [`PaintCanvas`] encoding into a Vello [`Scene`].
///
/// Temporary surfaces become Vello layers. Destination composites are
/// encoded as a nested layer with the matching [`Compose`] mode covering the
/// innermost surface.
#[allow(
    missing_debug_implementations,
    reason = "Not useful, and Scene doesn't implement Debug."
)]
pub struct VelloCanvas<'s> {
    scene: &'s mut Scene,
    viewport: Rect,
    transform: Affine,
    vertices: Option<BezPath>,
    surfaces: Vec<Rect>,
}

impl<'s> VelloCanvas<'s> {
    /// Make a canvas drawing into `scene`, covering `viewport` in device space.
    pub fn new(scene: &'s mut Scene, viewport: Rect) -> Self {
        Self {
            scene,
            viewport,
            transform: Affine::IDENTITY,
            vertices: None,
            surfaces: Vec::new(),
        }
    }

    /// Close any surfaces left open.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Backend`] if surfaces had to be closed.
    pub fn finish(mut self) -> Result<(), CanvasError> {
        if self.surfaces.is_empty() {
            return Ok(());
        }
        tracing::warn!(open = self.surfaces.len(), "closing unbalanced surfaces");
        while self.surfaces.pop().is_some() {
            self.scene.pop_layer();
        }
        Err(CanvasError::Backend("unbalanced surfaces"))
    }

    fn extents(&self) -> Rect {
        self.surfaces.last().copied().unwrap_or(self.viewport)
    }

    fn current_vertices(&self) -> Result<&BezPath, CanvasError> {
        self.vertices.as_ref().ok_or(CanvasError::NoVertices)
    }

    /// Run `draw` with `composite` applied to what it encodes.
    fn composited(&mut self, composite: CompositeOperator, draw: impl FnOnce(&mut Scene)) {
        let compose = match composite {
            CompositeOperator::SourceOver => return draw(&mut *self.scene),
            CompositeOperator::DestinationIn => Compose::DestIn,
            CompositeOperator::DestinationOut => Compose::DestOut,
        };
        let extents = self.extents();
        self.scene.push_layer(
            BlendMode::new(Mix::Normal, compose),
            1.0,
            Affine::IDENTITY,
            &extents,
        );
        draw(&mut *self.scene);
        self.scene.pop_layer();
    }
}

impl PaintCanvas for VelloCanvas<'_> {
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
        let path = self.current_vertices()?.clone();
        let brush = paint.clone().multiply_alpha(opacity);
        let brush_transform = Some(self.transform);
        self.composited(composite, |scene| {
            scene.fill(Fill::NonZero, Affine::IDENTITY, &brush, brush_transform, &path);
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
        if !self.transform.is_invertible() {
            return Err(CanvasError::Backend("stroke under a singular transform"));
        }
        // Stroke in user space so the width is scaled by the transform.
        let mut path = self.current_vertices()?.clone();
        path.apply_affine(self.transform.inverse());
        let brush = paint.clone().multiply_alpha(opacity);
        let stroke = Stroke::from(params);
        let transform = self.transform;
        self.composited(composite, |scene| {
            scene.stroke(&stroke, transform, &brush, None, &path);
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
        let brush = paint.clone().multiply_alpha(opacity);
        let transform = self.transform;
        self.composited(composite, |scene| {
            scene.fill(Fill::NonZero, transform, &brush, None, &rect);
        });
        Ok(())
    }

    fn push_surface(&mut self, extents: Rect, opacity: f32) -> Result<(), CanvasError> {
        let extents = self.transform.map_rect(extents);
        self.scene.push_layer(
            BlendMode::new(Mix::Normal, Compose::SrcOver),
            opacity,
            Affine::IDENTITY,
            &extents,
        );
        self.surfaces.push(extents);
        Ok(())
    }

    fn pop_surface(&mut self) -> Result<(), CanvasError> {
        self.surfaces.pop().ok_or(CanvasError::SurfaceUnderflow)?;
        self.scene.pop_layer();
        Ok(())
    }
}

/// Add an [`Element`] to a Vello [`Scene`], viewed through `view`.
///
/// # Errors
///
/// Forwards canvas errors from painting.
#[tracing::instrument(skip_all)]
pub fn add_element_to_scene(
    scene: &mut Scene,
    element: &dyn Element,
    viewport: Rect,
    view: Affine,
    configuration: &PaintConfiguration,
) -> Result<(), CanvasError> {
    let mut canvas = VelloCanvas::new(scene, viewport);
    canvas.set_transform(view);
    element.paint(&mut PaintContext::new(&mut canvas, configuration))?;
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina::{
        peniko::{color::palette::css::RED, kurbo::Shape as _},
        shape::Shape,
        style::{FillStyle, StrokeAlignment, StrokeStyle, Style},
    };

    #[test]
    fn surfaces_must_balance() {
        let mut scene = Scene::new();
        let mut canvas = VelloCanvas::new(&mut scene, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(canvas.pop_surface(), Err(CanvasError::SurfaceUnderflow));
        canvas
            .push_surface(Rect::new(0.0, 0.0, 10.0, 10.0), 0.5)
            .unwrap();
        assert_eq!(
            canvas.finish(),
            Err(CanvasError::Backend("unbalanced surfaces"))
        );
    }

    #[test]
    fn aligned_stroke_encodes_balanced_layers() {
        let shape = Shape::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_style(Style::stroked(
            StrokeStyle::new(RED, 2.0).with_alignment(StrokeAlignment::Inside),
        ));
        let view = Affine::scale(2.0);
        let configuration = PaintConfiguration::default();
        let mut scene = Scene::new();
        assert!(scene.encoding().is_empty());

        let mut canvas = VelloCanvas::new(&mut scene, Rect::new(0.0, 0.0, 100.0, 100.0));
        canvas.set_transform(view);
        shape
            .paint(&mut PaintContext::new(&mut canvas, &configuration))
            .unwrap();
        assert!(canvas.surfaces.is_empty());
        assert_eq!(canvas.transform(), view);
        canvas.finish().unwrap();
        assert!(!scene.encoding().is_empty());
    }

    #[test]
    fn composites_and_elements_reach_the_scene() {
        let mut scene = Scene::new();
        let mut canvas = VelloCanvas::new(&mut scene, Rect::new(0.0, 0.0, 100.0, 100.0));
        canvas
            .put_vertices(&Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1))
            .unwrap();
        canvas
            .fill_vertices(&Brush::Solid(RED), 1.0, CompositeOperator::DestinationOut)
            .unwrap();
        canvas.finish().unwrap();
        assert!(!scene.encoding().is_empty());

        let mut element_scene = Scene::new();
        let shape = Shape::new(Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_style(Style::filled(FillStyle::new(RED)));
        add_element_to_scene(
            &mut element_scene,
            &shape,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Affine::IDENTITY,
            &PaintConfiguration::default(),
        )
        .unwrap();
        assert!(!element_scene.encoding().is_empty());
    }
}
