// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate alloc;
use alloc::{boxed::Box, vec::Vec};

use peniko::kurbo::{Affine, Point, Rect};

use crate::{
    canvas::CanvasError,
    element::{Container, Element, ElementHit, Node, PaintContext, Transformable},
};

/// Render layer.
///
/// Paints its children in z order and hit tests them top-most first.
#[derive(Debug, Default)]
pub struct Layer {
    /// Child nodes in z order.
    children: Vec<Box<dyn Node>>,
}

impl Layer {
    /// Make an empty `Layer`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a node, returning its index in the layer.
    pub fn push(&mut self, node: impl Node + 'static) -> usize {
        let n = self.children.len();
        self.children.push(Box::new(node));
        n
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// `true` without children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

fn union_bbox(bboxes: impl Iterator<Item = Option<Rect>>) -> Option<Rect> {
    bboxes.flatten().reduce(|a, b| a.union(b))
}

impl Node for Layer {
    fn as_element(&self) -> Option<&dyn Element> {
        Some(self)
    }

    fn as_transformable_mut(&mut self) -> Option<&mut dyn Transformable> {
        Some(self)
    }
}

impl Element for Layer {
    #[tracing::instrument(skip_all, fields(children = self.children.len()))]
    fn paint(&self, context: &mut PaintContext<'_>) -> Result<(), CanvasError> {
        for child in self.child_elements() {
            child.paint(context)?;
        }
        Ok(())
    }

    fn geometry_bbox(&self) -> Option<Rect> {
        union_bbox(self.child_elements().map(|c| c.geometry_bbox()))
    }

    fn paint_bbox(&self) -> Option<Rect> {
        union_bbox(self.child_elements().map(|c| c.paint_bbox()))
    }

    fn hit_bounds(&self, transform: Affine, tolerance: f64) -> Option<Rect> {
        union_bbox(
            self.child_elements()
                .map(|c| c.hit_bounds(transform, tolerance)),
        )
    }

    fn detail_hit_test(
        &self,
        location: Point,
        transform: Affine,
        tolerance: f64,
        force: bool,
    ) -> Option<ElementHit<'_>> {
        self.children
            .iter()
            .rev()
            .filter_map(|c| c.as_element())
            .find_map(|c| c.hit_test(location, transform, tolerance, force))
    }
}

/// A layer has no transform of its own; transforming it transforms its children.
impl Transformable for Layer {
    fn local_transform(&self) -> Option<Affine> {
        None
    }

    fn set_transform(&mut self, transform: Option<Affine>) {
        if transform.is_some() {
            tracing::debug!("layers don't carry a transform, ignoring");
        }
    }

    fn transform(&mut self, transform: Affine) {
        self.transform_children(transform);
    }
}

impl Container for Layer {
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
