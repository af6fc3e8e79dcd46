// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lamina paints styleable vector shapes in layers and hit tests them.
//!
//! A [`Shape`](shape::Shape) is local geometry placed by an optional affine
//! transform. Its [`Style`](style::Style) is painted in three layers: fills on
//! the background, child elements as content, and strokes on the foreground.
//! Layers that can't be composited directly, such as inside or outside
//! aligned strokes, are painted on a temporary surface of the
//! [`PaintCanvas`](canvas::PaintCanvas).
//!
//! Painting goes through the [`PaintCanvas`](canvas::PaintCanvas) trait;
//! [`DisplayList`](display_list::DisplayList) records the operations, and
//! `lamina_vello` renders them into a Vello scene.
//!
//! ## Features
//!
//! - `std` (enabled by default): Use the Rust standard library.
//! - `libm`: Use floating point implementations from [libm][].
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

pub use peniko;

pub mod canvas;
pub mod display_list;
pub mod element;
pub mod events;
mod floatfuncs;
pub mod layer;
pub mod shape;
pub mod style;
pub mod transform;
pub mod vertex;

pub use canvas::{CanvasError, CompositeOperator, PaintCanvas, StrokeParams};
pub use element::{Element, PaintConfiguration, PaintContext, PaintMode};
pub use shape::{HitResult, HitResultType, Shape};
pub use vertex::{AnyShape, VertexSource};

/// Errors from Lamina.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A canvas operation failed.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    /// A persisted transform could not be read.
    #[error("invalid transform: {0}")]
    Transform(#[from] serde_json::Error),
}
