// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capabilities of items in a scene.

extern crate alloc;
use alloc::boxed::Box;

use core::fmt::Debug;

use peniko::{
    color::palette::css::BLACK,
    kurbo::{Affine, Point, Rect},
    Color,
};

use crate::{
    canvas::{CanvasError, PaintCanvas},
    shape::HitResult,
    transform::AffineExt,
};

/// How elements are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaintMode {
    /// Fills and strokes as styled.
    #[default]
    Full,
    /// Wireframe: outlines only, at a constant on-screen width.
    Outline,
}

/// Settings for a paint pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintConfiguration {
    /// Render mode.
    pub mode: PaintMode,
    /// Color of outlines in [`PaintMode::Outline`].
    pub outline_color: Color,
}

impl Default for PaintConfiguration {
    fn default() -> Self {
        Self {
            mode: PaintMode::Full,
            outline_color: BLACK,
        }
    }
}

impl PaintConfiguration {
    /// Configuration for wireframe rendering.
    pub fn outline() -> Self {
        Self {
            mode: PaintMode::Outline,
            ..Default::default()
        }
    }

    /// `true` in [`PaintMode::Outline`].
    pub fn is_outline(&self) -> bool {
        self.mode == PaintMode::Outline
    }
}

/// The canvas and settings for a paint pass.
#[allow(
    missing_debug_implementations,
    reason = "Canvases are not required to implement Debug."
)]
pub struct PaintContext<'a> {
    /// Canvas being painted.
    pub canvas: &'a mut dyn PaintCanvas,
    /// Settings.
    pub configuration: &'a PaintConfiguration,
}

impl<'a> PaintContext<'a> {
    /// Make a context painting onto `canvas`.
    pub fn new(canvas: &'a mut dyn PaintCanvas, configuration: &'a PaintConfiguration) -> Self {
        Self {
            canvas,
            configuration,
        }
    }

    /// `true` when painting wireframes.
    pub fn is_outline(&self) -> bool {
        self.configuration.is_outline()
    }
}

/// An element matched by a hit test.
#[derive(Debug, Clone, Copy)]
pub struct ElementHit<'a> {
    /// The element that was hit.
    pub element: &'a dyn Element,
    /// Where it was hit.
    pub result: HitResult,
}

/// Anything that can live in a scene.
pub trait Node: Debug {
    /// This node as an [`Element`], if it is one.
    fn as_element(&self) -> Option<&dyn Element> {
        None
    }

    /// This node as a [`Transformable`], if it is one.
    fn as_transformable_mut(&mut self) -> Option<&mut dyn Transformable> {
        None
    }
}

/// A node that is painted and can be hit.
pub trait Element: Node {
    /// Paint onto `context`.
    ///
    /// # Errors
    ///
    /// Forwards canvas errors.
    fn paint(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError>;

    /// Bounds of the geometry alone.
    fn geometry_bbox(&self) -> Option<Rect>;

    /// Bounds of everything painted.
    fn paint_bbox(&self) -> Option<Rect>;

    /// Precise hit test in the space of `transform`.
    fn detail_hit_test(
        &self,
        location: Point,
        transform: Affine,
        tolerance: f64,
        force: bool,
    ) -> Option<ElementHit<'_>>;

    /// Device space area outside of which [`Element::detail_hit_test`] can't match.
    ///
    /// Must cover every location `detail_hit_test` accepts for the same
    /// `transform` and `tolerance`.
    fn hit_bounds(&self, transform: Affine, tolerance: f64) -> Option<Rect> {
        Some(
            transform
                .map_rect(self.paint_bbox()?)
                .inflate(tolerance, tolerance),
        )
    }

    /// Hit test, rejecting locations outside of [`Element::hit_bounds`] first.
    fn hit_test(
        &self,
        location: Point,
        transform: Affine,
        tolerance: f64,
        force: bool,
    ) -> Option<ElementHit<'_>> {
        let area = self.hit_bounds(transform, tolerance)?;
        // Inclusive on all edges, unlike `Rect::contains`.
        let inside = (area.x0..=area.x1).contains(&location.x)
            && (area.y0..=area.y1).contains(&location.y);
        if !inside {
            return None;
        }
        self.detail_hit_test(location, transform, tolerance, force)
    }
}

/// Something with its own transform.
pub trait Transformable {
    /// The transform, if any.
    fn local_transform(&self) -> Option<Affine>;

    /// Replace the transform outright.
    fn set_transform(&mut self, transform: Option<Affine>);

    /// Apply `transform` after the current one.
    fn transform(&mut self, transform: Affine);
}

/// Something that owns child nodes.
pub trait Container {
    /// Children in paint order.
    fn children(&self) -> &[Box<dyn Node>];

    /// Mutable access to the children.
    fn children_mut(&mut self) -> &mut [Box<dyn Node>];

    /// Append a child.
    fn append_child(&mut self, child: Box<dyn Node>);

    /// Children that are elements, in paint order.
    fn child_elements(&self) -> impl Iterator<Item = &dyn Element> {
        self.children().iter().filter_map(|c| c.as_element())
    }

    /// Apply `transform` to every transformable child.
    fn transform_children(&mut self, transform: Affine) {
        for child in self.children_mut() {
            if let Some(child) = child.as_transformable_mut() {
                child.transform(transform);
            }
        }
    }
}
