#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points on the complex plane whose
//! orbit, under repeated application of a quadratic map starting from
//! zero, never runs off to infinity.  For every pixel of the canvas we
//! map the pixel to a point on the complex plane, iterate the map, and
//! count how many steps it takes for the orbit to leave the circle of
//! radius two.  That count, the "escape time," becomes the pixel's
//! shade.
//!
//! The renderer splits the canvas into columns and hands them out to
//! a fixed pool of worker threads over a single channel.  The canvas
//! is only given back to the caller after every worker has finished,
//! so no partially rendered image is ever observed.
//!
//! Note that the map used here is not quite the textbook `z² + c`: the
//! real part of `c` is subtracted rather than added, which mirrors the
//! familiar picture left-to-right.  See the `escape` module.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate tempfile;

pub mod errors;
pub mod escape;
pub mod output;
pub mod planes;
pub mod render;

pub use errors::RenderError;
pub use planes::{IntegralPlane, Pixel, PlaneMapper, View};
pub use render::{Renderer, WriteStrategy};
