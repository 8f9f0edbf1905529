// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator.  Given a point `c` on the complex plane,
//! iterate the map starting from zero and report how many steps it
//! took for the orbit to leave the circle of radius two.
//!
//! The map is
//!
//! ```text
//! re(z') = re(z)² - im(z)² - re(c)
//! im(z') = 2·re(z)·im(z)  + im(c)
//! ```
//!
//! which differs from the textbook `z² + c` in the sign of `re(c)`.
//! The images (and the fixtures in the tests) depend on this exact
//! form, so it must not be "corrected."

use image::Rgba;
use num::Complex;

/// The default render quality.  The iteration ceiling is `255 *
/// DETAIL`, so each extra unit buys another full sweep of the grey
/// palette at the cost of more work inside the set.
pub const DETAIL: usize = 30;

/// The iteration ceiling for a given level of detail.
pub fn max_iterations(detail: usize) -> usize {
    255 * detail
}

/// One application of the map.
#[inline]
pub fn step(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    Complex::new(z.re * z.re - z.im * z.im - c.re, z.re * z.im * 2.0 + c.im)
}

/// Squared-magnitude test against a radius of two; no square root.
#[inline]
pub fn escaped(z: Complex<f64>) -> bool {
    z.re * z.re + z.im * z.im > 4.0
}

/// Returns the index of the step at which the orbit of `c` escaped,
/// or `max_iter + 1` if it never did.  The loop bound is inclusive,
/// so the map is applied at most `max_iter + 1` times.
pub fn escape_time(c: Complex<f64>, max_iter: usize) -> usize {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for i in 0..=max_iter {
        z = step(z, c);
        if escaped(z) {
            return i;
        }
    }
    max_iter + 1
}

/// Grey banding: the escape time wraps around every 255 steps.
#[inline]
pub fn intensity(iterations: usize) -> u8 {
    (iterations % 255) as u8
}

/// The pixel colour for an escape time: its intensity in all three
/// channels, fully opaque.
#[inline]
pub fn colour(iterations: usize) -> Rgba<u8> {
    let v = intensity(iterations);
    Rgba([v, v, v, 255])
}
