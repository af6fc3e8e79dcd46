// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill and stroke styles, and the layered painting driven by them.

use peniko::{
    kurbo::{Affine, Cap, Join, Rect},
    Brush,
};

use crate::{
    canvas::{CanvasError, StrokeParams, SurfaceScope},
    element::{PaintConfiguration, PaintContext},
};

/// Layers of a styled element, painted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleLayer {
    /// Fills.
    Background,
    /// Child elements.
    Content,
    /// Strokes and outlines.
    Foreground,
}

impl StyleLayer {
    /// All layers in paint order.
    pub const ALL: [Self; 3] = [Self::Background, Self::Content, Self::Foreground];

    const fn index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Content => 1,
            Self::Foreground => 2,
        }
    }
}

/// Where a stroke sits relative to the path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrokeAlignment {
    /// Centered on the path.
    #[default]
    Center,
    /// Entirely inside the path.
    Inside,
    /// Entirely outside the path.
    Outside,
}

/// Groups of style properties an element can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySet {
    /// Layer opacities.
    Style,
    /// [`FillStyle`].
    Fill,
    /// [`StrokeStyle`].
    Stroke,
}

/// A paint ready to be handed to a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaint {
    /// Paint reference.
    pub paint: Brush,
    /// Opacity.
    pub opacity: f32,
    /// Pattern space transform, for paints that have one.
    pub transform: Option<Affine>,
}

/// Fill definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    /// Paint reference.
    pub paint: Brush,
    /// Opacity.
    pub opacity: f32,
    /// Pattern space transform, ignored for solid colors.
    pub transform: Option<Affine>,
}

impl FillStyle {
    /// Fill with `paint` at full opacity.
    pub fn new(paint: impl Into<Brush>) -> Self {
        Self {
            paint: paint.into(),
            opacity: 1.0,
            transform: None,
        }
    }

    /// Resolve the fill for painting.
    pub fn resolve(&self) -> ResolvedPaint {
        ResolvedPaint {
            paint: self.paint.clone(),
            opacity: self.opacity,
            transform: match self.paint {
                Brush::Solid(_) => None,
                _ => self.transform,
            },
        }
    }
}

/// Stroke definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Paint reference.
    pub paint: Brush,
    /// Opacity.
    pub opacity: f32,
    /// Pattern space transform, ignored for solid colors.
    pub transform: Option<Affine>,
    /// Width of the visible stroke.
    pub width: f64,
    /// Line cap.
    pub cap: Cap,
    /// Line join.
    pub join: Join,
    /// Miter limit.
    pub miter_limit: f64,
    /// Alignment relative to the path.
    pub alignment: StrokeAlignment,
    /// Horizontal pattern scale.
    pub scale_x: f64,
    /// Vertical pattern scale.
    pub scale_y: f64,
}

impl StrokeStyle {
    /// Centered stroke of `width` with `paint`.
    pub fn new(paint: impl Into<Brush>, width: f64) -> Self {
        Self {
            paint: paint.into(),
            opacity: 1.0,
            transform: None,
            width,
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 10.0,
            alignment: StrokeAlignment::Center,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Same stroke with a different alignment.
    #[must_use]
    pub fn with_alignment(self, alignment: StrokeAlignment) -> Self {
        Self { alignment, ..self }
    }

    /// `true` when neither pattern scale deviates from `1.0`.
    pub fn has_unit_scale(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    /// How far the stroke reaches beyond the path.
    ///
    /// Measured along the path normal only; miter joins are not accounted for.
    pub fn padding(&self) -> f64 {
        match self.alignment {
            StrokeAlignment::Center => self.width * 0.5,
            StrokeAlignment::Inside => 0.0,
            StrokeAlignment::Outside => self.width,
        }
    }

    /// Cap, join and miter limit at `width`.
    pub fn params(&self, width: f64) -> StrokeParams {
        StrokeParams {
            width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
        }
    }

    /// Resolve the stroke for painting inside `bbox`.
    ///
    /// Pattern paints pick up the x/y scale, anchored at the origin of `bbox`.
    pub fn resolve(&self, bbox: Rect) -> ResolvedPaint {
        let transform = match self.paint {
            Brush::Solid(_) => None,
            _ if self.has_unit_scale() => self.transform,
            _ => {
                let origin = bbox.origin().to_vec2();
                let scale = Affine::translate(origin)
                    * Affine::scale_non_uniform(self.scale_x, self.scale_y)
                    * Affine::translate(-origin);
                Some(self.transform.unwrap_or(Affine::IDENTITY) * scale)
            }
        };
        ResolvedPaint {
            paint: self.paint.clone(),
            opacity: self.opacity,
            transform,
        }
    }
}

/// Style of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Fill, painted on [`StyleLayer::Background`].
    pub fill: Option<FillStyle>,
    /// Stroke, painted on [`StyleLayer::Foreground`].
    pub stroke: Option<StrokeStyle>,
    /// Opacity of each layer, indexed in paint order.
    pub layer_opacities: [f32; 3],
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            layer_opacities: [1.0; 3],
        }
    }
}

impl Style {
    /// Style with only a fill.
    pub fn filled(fill: FillStyle) -> Self {
        Self {
            fill: Some(fill),
            ..Default::default()
        }
    }

    /// Style with only a stroke.
    pub fn stroked(stroke: StrokeStyle) -> Self {
        Self {
            stroke: Some(stroke),
            ..Default::default()
        }
    }

    /// Opacity of `layer`.
    pub fn layer_opacity(&self, layer: StyleLayer) -> f32 {
        self.layer_opacities[layer.index()]
    }

    /// Set the opacity of `layer`.
    pub fn set_layer_opacity(&mut self, layer: StyleLayer, opacity: f32) {
        self.layer_opacities[layer.index()] = opacity;
    }

    /// `true` if `layer` has to be composited as a group.
    pub fn is_layer_isolated(&self, layer: StyleLayer) -> bool {
        self.layer_opacity(layer) < 1.0
    }
}

/// Something painted from a [`Style`].
pub trait Stylable {
    /// The style.
    fn style(&self) -> &Style;

    /// Property sets this element supports.
    fn style_property_sets(&self) -> &'static [PropertySet] {
        &[PropertySet::Style]
    }

    /// `true` if a fill is supported and defined.
    fn has_style_fill(&self) -> bool {
        self.style_property_sets().contains(&PropertySet::Fill) && self.style().fill.is_some()
    }

    /// `true` if a stroke is supported and has a positive width.
    fn has_style_stroke(&self) -> bool {
        self.style_property_sets().contains(&PropertySet::Stroke)
            && self.style().stroke.as_ref().is_some_and(|s| s.width > 0.0)
    }

    /// How far the stroke reaches beyond the geometry, if at all.
    fn style_stroke_padding(&self) -> Option<f64> {
        if !self.has_style_stroke() {
            return None;
        }
        self.style()
            .stroke
            .as_ref()
            .map(StrokeStyle::padding)
            .filter(|&p| p > 0.0)
    }

    /// Grow a geometry box to cover everything the style paints.
    fn style_bbox(&self, source: Rect) -> Rect {
        self.style_stroke_padding()
            .map_or(source, |p| source.inflate(p, p))
    }

    /// `true` if `layer` must be painted on its own surface.
    fn is_separate_style_layer(&self, _config: &PaintConfiguration, layer: StyleLayer) -> bool {
        self.style().is_layer_isolated(layer)
    }

    /// Paint a single layer.
    ///
    /// # Errors
    ///
    /// Forwards canvas errors.
    fn paint_style_layer(
        &self,
        context: &mut PaintContext<'_>,
        layer: StyleLayer,
    ) -> Result<(), CanvasError>;

    /// Paint all layers, isolating those that need it on a surface covering `extents`.
    ///
    /// # Errors
    ///
    /// Forwards canvas errors; the canvas surface stack and transform are
    /// restored either way.
    fn paint_style(
        &self,
        context: &mut PaintContext<'_>,
        extents: Rect,
    ) -> Result<(), CanvasError> {
        let configuration = context.configuration;
        for layer in StyleLayer::ALL {
            if self.is_separate_style_layer(configuration, layer) {
                tracing::trace!(?layer, "isolating style layer");
                let opacity = self.style().layer_opacity(layer);
                let mut surface = SurfaceScope::push(&mut *context.canvas, extents, opacity)?;
                let mut isolated = PaintContext::new(&mut *surface, configuration);
                self.paint_style_layer(&mut isolated, layer)?;
                surface.finish()?;
            } else {
                self.paint_style_layer(context, layer)?;
            }
        }
        Ok(())
    }
}
