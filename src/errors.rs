// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The errors a render, or the writing out of a render, can produce.
//! Rendering itself cannot fail once its inputs have been validated;
//! everything here is either a bad configuration caught up front or a
//! problem getting the finished canvas onto disk.

use std::path::Path;

/// Everything that can go wrong between a set of parameters and a
/// file on disk.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The canvas must be at least one pixel in each direction, and
    /// small enough that the image codec can address it.
    #[fail(display = "invalid canvas dimensions {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width, in pixels.
        width: usize,
        /// Requested height, in pixels.
        height: usize,
    },

    /// The view has a non-finite component or a zoom of zero.
    #[fail(display = "invalid view: {}", reason)]
    InvalidView {
        /// What was wrong with it.
        reason: String,
    },

    /// One of the render workers panicked.  The canvas is discarded.
    #[fail(display = "a render worker panicked; no image was produced")]
    WorkerPanicked,

    /// The output file could not be created or moved into place.
    #[fail(display = "could not write {}: {}", path, cause)]
    Io {
        /// The destination we were trying to write.
        path: String,
        /// The underlying I/O failure.
        #[cause]
        cause: std::io::Error,
    },

    /// The image codec refused the canvas.
    #[fail(display = "could not encode image: {}", cause)]
    Encode {
        /// The codec's complaint.
        cause: String,
    },
}

impl RenderError {
    pub(crate) fn io(path: &Path, cause: std::io::Error) -> Self {
        RenderError::Io {
            path: path.display().to_string(),
            cause,
        }
    }
}
