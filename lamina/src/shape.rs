// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Styled shapes.
//!
//! A [`Shape`] is local geometry placed by an optional transform, painted in
//! three style layers and hit tested against its stroke, fill and outline.

extern crate alloc;
use alloc::{boxed::Box, rc::Rc, string::String, vec::Vec};

use core::cell::Cell;

use peniko::{
    color::palette::css::BLACK,
    kurbo::{Affine, BezPath, Point, Rect},
    Brush,
};
use serde_json::{Map, Value};

use crate::{
    canvas::{
        CanvasError, CompositeOperator, PaintCanvas, StrokeParams, SurfaceScope, TransformScope,
    },
    element::{
        Container, Element, ElementHit, Node, PaintConfiguration, PaintContext, Transformable,
    },
    events::{DocumentEvents, ElementEvent},
    style::{PropertySet, Stylable, StrokeAlignment, Style, StyleLayer},
    transform::{deserialize_transform, map_point, serialize_transform, AffineExt},
    vertex::{calculate_bounds, hit_test, AnyShape, VertexHit, VertexSource, VertexTransformer},
    Error,
};

/// Persisted properties of an element.
pub type PropertyMap = Map<String, Value>;

/// Key of the transform in a [`PropertyMap`].
pub const TRANSFORM_PROPERTY: &str = "trf";

/// What part of a shape was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResultType {
    /// The stroke.
    Stroke,
    /// The fill.
    Fill,
    /// The bare outline.
    Outline,
    /// The interior of an unfilled shape, when forced.
    Other,
}

/// Result of hit testing a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// What was hit.
    pub kind: HitResultType,
    /// Where on the vertices it was hit.
    pub vertex_hit: VertexHit,
}

/// Persistence requests handled by [`Shape::handle_change`].
#[derive(Debug)]
pub enum Change<'a> {
    /// Write persisted properties into the map.
    Store(&'a mut PropertyMap),
    /// Read persisted properties from the map.
    Restore(&'a PropertyMap),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum BBoxCache {
    #[default]
    Invalid,
    Valid(Option<Rect>),
}

impl BBoxCache {
    fn get_or_compute(cell: &Cell<Self>, compute: impl FnOnce() -> Option<Rect>) -> Option<Rect> {
        match cell.get() {
            Self::Valid(bbox) => bbox,
            Self::Invalid => {
                let bbox = compute();
                cell.set(Self::Valid(bbox));
                bbox
            }
        }
    }
}

/// A styled shape with optional child elements.
///
/// Geometry is given in a local space and placed by the shape's transform.
#[derive(Debug, Default)]
pub struct Shape {
    trf: Option<Affine>,
    geometry: AnyShape,
    style: Style,
    children: Vec<Box<dyn Node>>,
    geometry_bbox_cache: Cell<BBoxCache>,
    paint_bbox_cache: Cell<BBoxCache>,
    events: Option<Rc<DocumentEvents>>,
}

impl Shape {
    /// Make an unstyled shape from local geometry.
    pub fn new(geometry: impl Into<AnyShape>) -> Self {
        Self {
            geometry: geometry.into(),
            ..Default::default()
        }
    }

    /// Builder style for [`Shape::set_style`].
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.set_style(style);
        self
    }

    /// Builder style for [`Transformable::set_transform`].
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.set_transform(Some(transform));
        self
    }

    /// Local geometry.
    pub fn geometry(&self) -> &AnyShape {
        &self.geometry
    }

    /// Replace the local geometry.
    pub fn set_geometry(&mut self, geometry: impl Into<AnyShape>) {
        let geometry = geometry.into();
        self.apply_change(true, |shape| shape.geometry = geometry);
    }

    /// Replace the style.
    pub fn set_style(&mut self, style: Style) {
        self.apply_change(false, |shape| shape.style = style);
    }

    /// Modify the style in place.
    pub fn update_style(&mut self, update: impl FnOnce(&mut Style)) {
        self.apply_change(false, |shape| update(&mut shape.style));
    }

    /// Center of the local geometry space, optionally mapped by the transform.
    pub fn center(&self, include_transform: bool) -> Point {
        map_point(self.trf.filter(|_| include_transform), Point::ORIGIN)
    }

    /// Half width of the untransformed geometry space.
    pub fn orig_half_width(&self) -> f64 {
        1.0
    }

    /// Half height of the untransformed geometry space.
    pub fn orig_half_height(&self) -> f64 {
        1.0
    }

    /// Report changes to `events` from now on.
    pub fn attach(&mut self, events: Rc<DocumentEvents>) {
        self.events = Some(events);
    }

    /// Stop reporting changes, returning the registry that was attached.
    pub fn detach(&mut self) -> Option<Rc<DocumentEvents>> {
        self.events.take()
    }

    /// Store or restore persisted properties.
    ///
    /// The transform is kept under [`TRANSFORM_PROPERTY`], as six
    /// coefficients or `null`. Restoring without that key leaves the shape
    /// alone.
    ///
    /// # Errors
    ///
    /// [`Error::Transform`] if a stored transform can't be read back.
    pub fn handle_change(&mut self, change: Change<'_>) -> Result<(), Error> {
        match change {
            Change::Store(properties) => {
                let value = self.trf.map_or(Value::Null, serialize_transform);
                properties.insert(TRANSFORM_PROPERTY.into(), value);
            }
            Change::Restore(properties) => {
                if let Some(value) = properties.get(TRANSFORM_PROPERTY) {
                    let trf = match value {
                        Value::Null => None,
                        value => Some(deserialize_transform(value)?),
                    };
                    self.apply_change(true, |shape| shape.trf = trf);
                }
            }
        }
        Ok(())
    }

    fn apply_change(&mut self, geometry: bool, apply: impl FnOnce(&mut Self)) {
        let previous_paint_bbox = self.events.as_ref().map(|_| self.paint_bbox());
        apply(self);
        if geometry {
            self.geometry_bbox_cache.set(BBoxCache::Invalid);
        }
        self.paint_bbox_cache.set(BBoxCache::Invalid);

        let (Some(events), Some(previous_paint_bbox)) = (&self.events, previous_paint_bbox) else {
            return;
        };
        events.emit(&if geometry {
            ElementEvent::GeometryChanged {
                previous_paint_bbox,
            }
        } else {
            ElementEvent::StyleChanged {
                previous_paint_bbox,
            }
        });
    }

    /// `true` if the stroke can only be painted correctly on its own surface.
    fn stroke_needs_isolation(&self, configuration: &PaintConfiguration) -> bool {
        if configuration.is_outline() || !self.has_style_stroke() {
            return false;
        }
        self.style
            .stroke
            .as_ref()
            .is_some_and(|s| s.alignment != StrokeAlignment::Center || !s.has_unit_scale())
    }

    fn paint_background(&self, canvas: &mut dyn PaintCanvas) -> Result<(), CanvasError> {
        let Some(fill) = self.style.fill.as_ref().map(|f| f.resolve()) else {
            return Ok(());
        };
        canvas.put_vertices(self)?;
        match fill.transform.filter(AffineExt::is_invertible) {
            Some(t) => {
                let current = canvas.transform();
                let mut scope = TransformScope::new(canvas, current * t);
                scope.fill_vertices(&fill.paint, fill.opacity, CompositeOperator::SourceOver)
            }
            None => canvas.fill_vertices(&fill.paint, fill.opacity, CompositeOperator::SourceOver),
        }
    }

    fn paint_content(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError> {
        if self.child_elements().next().is_none() {
            return Ok(());
        }
        let Some(bbox) = self.geometry_bbox() else {
            return Ok(());
        };
        let configuration = context.configuration;
        let mut surface = SurfaceScope::push(&mut *context.canvas, bbox, 1.0)?;
        {
            let mut contents = PaintContext::new(&mut *surface, configuration);
            for child in self.child_elements() {
                child.paint(&mut contents)?;
            }
        }
        // Clip the children to the geometry.
        surface.put_vertices(self)?;
        surface.fill_vertices(&Brush::Solid(BLACK), 1.0, CompositeOperator::DestinationIn)?;
        surface.finish()
    }

    fn paint_foreground(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError> {
        if context.is_outline() {
            return self.paint_outline(context);
        }
        if !self.has_style_stroke() {
            return Ok(());
        }
        let (Some(stroke), Some(geometry_bbox)) = (self.style.stroke.as_ref(), self.geometry_bbox())
        else {
            return Ok(());
        };
        let stroke_bbox = self.style_bbox(geometry_bbox);
        let paint = stroke.resolve(stroke_bbox);
        let width = match stroke.alignment {
            StrokeAlignment::Center => stroke.width,
            // Half of the doubled stroke is clipped away below.
            StrokeAlignment::Inside | StrokeAlignment::Outside => stroke.width * 2.0,
        };

        let canvas = &mut *context.canvas;
        canvas.put_vertices(self)?;
        match paint.transform.filter(AffineExt::is_invertible) {
            Some(t) if !stroke.has_unit_scale() => {
                {
                    let current = canvas.transform();
                    let mut scope = TransformScope::new(&mut *canvas, current * t);
                    let area = t.inverse().map_rect(stroke_bbox);
                    scope.fill_rect(
                        area,
                        &paint.paint,
                        paint.opacity,
                        CompositeOperator::SourceOver,
                    )?;
                }
                canvas.stroke_vertices(
                    &paint.paint,
                    stroke.params(width),
                    1.0,
                    CompositeOperator::DestinationIn,
                )?;
            }
            Some(t) => {
                let current = canvas.transform();
                let mut scope = TransformScope::new(&mut *canvas, current * t);
                scope.stroke_vertices(
                    &paint.paint,
                    stroke.params(width / t.scale_factor()),
                    paint.opacity,
                    CompositeOperator::SourceOver,
                )?;
            }
            None => canvas.stroke_vertices(
                &paint.paint,
                stroke.params(width),
                paint.opacity,
                CompositeOperator::SourceOver,
            )?,
        }

        let clip = match stroke.alignment {
            StrokeAlignment::Center => return Ok(()),
            StrokeAlignment::Inside => CompositeOperator::DestinationIn,
            StrokeAlignment::Outside => CompositeOperator::DestinationOut,
        };
        canvas.fill_vertices(&Brush::Solid(BLACK), 1.0, clip)
    }

    /// Stroke the outline one device pixel wide, whatever the view transform.
    fn paint_outline(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError> {
        let color = context.configuration.outline_color;
        let mut scope = TransformScope::new(&mut *context.canvas, Affine::IDENTITY);
        let view = scope.saved();
        scope.put_vertices(&VertexTransformer::new(self, view))?;
        scope.stroke_vertices(
            &Brush::Solid(color),
            StrokeParams::default(),
            1.0,
            CompositeOperator::SourceOver,
        )
    }

    fn hit(&self, kind: HitResultType, vertex_hit: VertexHit) -> ElementHit<'_> {
        ElementHit {
            element: self,
            result: HitResult { kind, vertex_hit },
        }
    }
}

impl VertexSource for Shape {
    fn vertices(&self) -> BezPath {
        let mut path = self.geometry.vertices();
        if let Some(trf) = self.trf {
            path.apply_affine(trf);
        }
        path
    }
}

impl Node for Shape {
    fn as_element(&self) -> Option<&dyn Element> {
        Some(self)
    }

    fn as_transformable_mut(&mut self) -> Option<&mut dyn Transformable> {
        Some(self)
    }
}

impl Element for Shape {
    #[tracing::instrument(skip_all)]
    fn paint(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError> {
        let Some(extents) = self.paint_bbox() else {
            return Ok(());
        };
        self.paint_style(context, extents)
    }

    fn geometry_bbox(&self) -> Option<Rect> {
        BBoxCache::get_or_compute(&self.geometry_bbox_cache, || calculate_bounds(self, true))
    }

    fn paint_bbox(&self) -> Option<Rect> {
        BBoxCache::get_or_compute(&self.paint_bbox_cache, || {
            self.geometry_bbox().map(|bbox| self.style_bbox(bbox))
        })
    }

    /// The transformed geometry, grown by the widest test band of
    /// [`Element::detail_hit_test`].
    fn hit_bounds(&self, transform: Affine, tolerance: f64) -> Option<Rect> {
        let scale = transform.scale_factor();
        let stroke_width = match &self.style.stroke {
            Some(stroke) if self.has_style_stroke() => stroke.width * scale,
            _ => 0.0,
        };
        let reach = stroke_width.max(scale) * 0.5 + tolerance;
        Some(transform.map_rect(self.geometry_bbox()?).inflate(reach, reach))
    }

    fn detail_hit_test(
        &self,
        location: Point,
        transform: Affine,
        tolerance: f64,
        force: bool,
    ) -> Option<ElementHit<'_>> {
        let source = VertexTransformer::new(self, transform);
        let scale = transform.scale_factor();

        if self.has_style_stroke() {
            if let Some(stroke) = &self.style.stroke {
                let width = stroke.width * scale + 2.0 * tolerance;
                if let Some(hit) = hit_test(location, &source, width, false) {
                    return Some(self.hit(HitResultType::Stroke, hit));
                }
            }
        }

        let has_fill = self.has_style_fill();
        if has_fill || force {
            if let Some(hit) = hit_test(location, &source, tolerance, true) {
                let kind = if has_fill {
                    HitResultType::Fill
                } else {
                    HitResultType::Other
                };
                return Some(self.hit(kind, hit));
            }
        }

        if tolerance > 0.0 {
            let width = scale + 2.0 * tolerance;
            if let Some(hit) = hit_test(location, &source, width, false) {
                return Some(self.hit(HitResultType::Outline, hit));
            }
        }

        None
    }
}

impl Transformable for Shape {
    fn local_transform(&self) -> Option<Affine> {
        self.trf
    }

    fn set_transform(&mut self, transform: Option<Affine>) {
        if let Some(t) = transform.filter(|t| !t.is_invertible()) {
            tracing::warn!(?t, "ignoring non-invertible shape transform");
            return;
        }
        if transform == self.trf {
            return;
        }
        self.apply_change(true, |shape| shape.trf = transform);
    }

    fn transform(&mut self, transform: Affine) {
        if transform.is_identity() {
            return;
        }
        if !transform.is_invertible() {
            tracing::warn!(?transform, "ignoring non-invertible transform");
            return;
        }
        let composed = self.trf.map_or(transform, |trf| transform * trf);
        self.set_transform(Some(composed));
        self.transform_children(transform);
    }
}

impl Container for Shape {
    fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Node>] {
        &mut self.children
    }

    fn append_child(&mut self, child: Box<dyn Node>) {
        self.children.push(child);
    }
}

impl Stylable for Shape {
    fn style(&self) -> &Style {
        &self.style
    }

    fn style_property_sets(&self) -> &'static [PropertySet] {
        &[PropertySet::Style, PropertySet::Fill, PropertySet::Stroke]
    }

    fn is_separate_style_layer(
        &self,
        configuration: &PaintConfiguration,
        layer: StyleLayer,
    ) -> bool {
        self.style.is_layer_isolated(layer)
            || (layer == StyleLayer::Foreground && self.stroke_needs_isolation(configuration))
    }

    fn paint_style_layer(
        &self,
        context: &mut PaintContext<'_>,
        layer: StyleLayer,
    ) -> Result<(), CanvasError> {
        match layer {
            StyleLayer::Background if !context.is_outline() && self.has_style_fill() => {
                self.paint_background(&mut *context.canvas)
            }
            StyleLayer::Background => Ok(()),
            StyleLayer::Content => self.paint_content(context),
            StyleLayer::Foreground => self.paint_foreground(context),
        }
    }
}
