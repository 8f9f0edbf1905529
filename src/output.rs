// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Getting a finished canvas onto disk.  The image is encoded into a
//! temporary file next to the destination and only renamed over it
//! once the encoder has finished, so a failed write never leaves a
//! truncated PNG behind.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use tempfile::NamedTempFile;

use crate::errors::RenderError;

/// Encodes `canvas` as an 8-bit RGBA PNG at `path`, replacing
/// whatever was there.
pub fn write_png<P: AsRef<Path>>(path: P, canvas: &RgbaImage) -> Result<(), RenderError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut staging = NamedTempFile::new_in(dir).map_err(|e| RenderError::io(path, e))?;
    {
        let mut writer = BufWriter::new(staging.as_file_mut());
        PngEncoder::new(&mut writer)
            .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ColorType::Rgba8)
            .map_err(|e| RenderError::Encode {
                cause: e.to_string(),
            })?;
        writer.flush().map_err(|e| RenderError::io(path, e))?;
    }

    staging
        .persist(path)
        .map_err(|e| RenderError::io(path, e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}
