// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a window onto the complex plane described by a center point
//! and a scale.  The center of the integral plane is pinned to the
//! center of the view, so zooming never drifts the picture sideways.
use num::Complex;

use crate::errors::RenderError;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

impl IntegralPlane {
    /// Checks that the plane can actually be rendered: it must be at
    /// least one pixel in each direction, and each side must fit in
    /// the `u32` the image codec uses.
    pub fn validate(self) -> Result<Self, RenderError> {
        let fits = |d: usize| d > 0 && d <= u32::MAX as usize;
        if !fits(self.0) || !fits(self.1) || self.0.checked_mul(self.1).is_none() {
            return Err(RenderError::InvalidDimensions {
                width: self.0,
                height: self.1,
            });
        }
        Ok(self)
    }
}

/// Describes the x, y of a point in a region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The window onto the complex plane: where its center is, and how
/// many plane units a single pixel covers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    /// Real-axis coordinate of the center of the canvas.
    pub x_offset: f64,
    /// Imaginary-axis coordinate of the center of the canvas.
    pub y_offset: f64,
    /// Plane units per pixel.  Smaller is deeper.
    pub zoom: f64,
}

impl Default for View {
    fn default() -> Self {
        View {
            x_offset: 0.0,
            y_offset: 0.0,
            zoom: 0.002,
        }
    }
}

impl View {
    /// Constructor.  Rejects anything non-finite, and a zoom of zero
    /// (which would collapse the whole canvas onto one point).  A
    /// negative zoom is allowed; it simply flips the picture.
    pub fn new(x_offset: f64, y_offset: f64, zoom: f64) -> Result<View, RenderError> {
        let invalid = |reason: &str| {
            Err(RenderError::InvalidView {
                reason: reason.to_string(),
            })
        };
        if !x_offset.is_finite() {
            return invalid("x offset is not a finite number");
        }
        if !y_offset.is_finite() {
            return invalid("y offset is not a finite number");
        }
        if !zoom.is_finite() {
            return invalid("zoom is not a finite number");
        }
        if zoom == 0.0 {
            return invalid("zoom must not be zero");
        }
        Ok(View {
            x_offset,
            y_offset,
            zoom,
        })
    }
}

/// Maps one axis of one pixel onto the complex plane.  `correction`
/// is the pixel index that lands exactly on `offset`; callers pass
/// half the dimension, truncated, so odd-sized canvases sit half a
/// pixel off center.
#[inline]
pub fn pixel_to_plane(pixel: usize, offset: f64, zoom: f64, correction: usize) -> f64 {
    (pixel as f64 - correction as f64) * zoom + offset
}

/// Contains the definitions of two planes: an integral cartesian
/// plane, and the complex plane as seen through a View.  Maps points
/// from the first onto the second.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// The size of the integral cartesian plane.
    pub integral_plane: IntegralPlane,
    /// What part of the complex plane we're looking at.
    pub view: View,
    // Half the width and height, truncated: the pixel at these
    // indices maps to the view's offsets.
    corrections: (usize, usize),
}

impl PlaneMapper {
    /// Constructor.  Takes a validated view and a validated plane;
    /// does no checking of its own.
    pub fn new(view: View, plane: IntegralPlane) -> PlaneMapper {
        PlaneMapper {
            integral_plane: plane,
            view,
            corrections: (plane.0 / 2, plane.1 / 2),
        }
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Width of the integral plane, in pixels.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Height of the integral plane, in pixels.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// The pixel that maps exactly onto the view's center.
    pub fn center(&self) -> Pixel {
        Pixel(self.corrections.0, self.corrections.1)
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// corresponding point on the complex plane.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            pixel_to_plane(
                pixel.0,
                self.view.x_offset,
                self.view.zoom,
                self.corrections.0,
            ),
            pixel_to_plane(
                pixel.1,
                self.view.y_offset,
                self.view.zoom,
                self.corrections.1,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_pixel_maps_to_offset() {
        assert_eq!(pixel_to_plane(1280, 0.0, 1.0, 1280), 0.0);
        assert_eq!(pixel_to_plane(720, 0.0, 1.0, 720), 0.0);
        assert_eq!(pixel_to_plane(7, -0.75, 1.0, 7), -0.75);
        assert_eq!(pixel_to_plane(7, 0.3, 0.002, 7), 0.3);
    }

    #[test]
    fn pixels_left_of_center_are_negative() {
        assert_eq!(pixel_to_plane(0, 0.0, 0.5, 4), -2.0);
        assert_eq!(pixel_to_plane(8, 0.0, 0.5, 4), 2.0);
        assert_eq!(pixel_to_plane(8, 1.0, 0.5, 4), 3.0);
    }

    #[test]
    fn negative_zoom_mirrors() {
        assert_eq!(pixel_to_plane(0, 0.0, -0.5, 4), 2.0);
    }

    #[test]
    fn odd_dimensions_truncate_the_correction() {
        let pm = PlaneMapper::new(View::new(0.0, 0.0, 1.0).unwrap(), IntegralPlane(5, 3));
        assert_eq!(pm.center(), Pixel(2, 1));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 2)), Complex::new(2.0, 1.0));
    }

    #[test]
    fn even_dimensions_are_one_pixel_heavy_on_the_low_side() {
        let pm = PlaneMapper::new(View::new(0.0, 0.0, 1.0).unwrap(), IntegralPlane(4, 4));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 3)), Complex::new(1.0, 1.0));
    }

    #[test]
    fn reference_view_centers_on_origin() {
        let pm = PlaneMapper::new(View::default(), IntegralPlane(2560, 1440));
        assert_eq!(pm.center(), Pixel(1280, 720));
        assert_eq!(pm.pixel_to_point(&pm.center()), Complex::new(0.0, 0.0));
        assert_eq!(pm.len(), 2560 * 1440);
        assert!(!pm.is_empty());
    }

    #[test]
    fn offsets_move_the_center() {
        let pm = PlaneMapper::new(View::new(-0.5, 0.25, 0.01).unwrap(), IntegralPlane(100, 50));
        assert_eq!(pm.pixel_to_point(&Pixel(50, 25)), Complex::new(-0.5, 0.25));
    }

    #[test]
    fn view_rejects_bad_numbers() {
        assert!(View::new(f64::NAN, 0.0, 0.002).is_err());
        assert!(View::new(0.0, f64::INFINITY, 0.002).is_err());
        assert!(View::new(0.0, 0.0, f64::NEG_INFINITY).is_err());
        assert!(View::new(0.0, 0.0, 0.0).is_err());
        assert!(View::new(0.0, 0.0, -0.002).is_ok());
    }

    #[test]
    fn integral_plane_rejects_empty() {
        assert!(IntegralPlane(0, 10).validate().is_err());
        assert!(IntegralPlane(10, 0).validate().is_err());
        assert!(IntegralPlane(1, 1).validate().is_ok());
    }
}
