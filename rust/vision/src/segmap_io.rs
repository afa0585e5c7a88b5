// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segmentation map files
//!
//! The segmentation model writes its per-pixel class ids either as a
//! single-channel PNG (8 or 16 bit, pixel value = class id) or as JSON, in
//! the `{width, height, data}` form or as an array of rows.

use crate::error::{Error, Result};
use ablemap_core::SegmentationMap;
use image::{DynamicImage, ImageBuffer, Luma};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmapJson {
    Flat(SegmentationMap),
    Rows(Vec<Vec<u32>>),
}

/// Load a map, picking the format from the file extension
pub fn load_segmap(path: &Path) -> Result<SegmentationMap> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => segmap_from_json(&fs::read_to_string(path)?),
        "png" => segmap_from_image(image::open(path)?),
        other => Err(Error::UnsupportedSegmap(format!(
            "{} (extension '{}')",
            path.display(),
            other
        ))),
    }
}

pub fn segmap_from_json(json: &str) -> Result<SegmentationMap> {
    match serde_json::from_str(json)? {
        SegmapJson::Flat(map) => Ok(map),
        SegmapJson::Rows(rows) => Ok(SegmentationMap::from_rows(&rows)?),
    }
}

/// Class ids from a single-channel image
pub fn segmap_from_image(image: DynamicImage) -> Result<SegmentationMap> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let data: Vec<u32> = match image {
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(u32::from).collect(),
        DynamicImage::ImageLuma16(buf) => buf.into_raw().into_iter().map(u32::from).collect(),
        other => {
            return Err(Error::UnsupportedSegmap(format!(
                "expected a grayscale image, got {:?}",
                other.color()
            )))
        }
    };
    Ok(SegmentationMap::new(width, height, data)?)
}

/// Write a map as a 16-bit grayscale PNG
pub fn save_segmap_png(seg: &SegmentationMap, path: &Path) -> Result<()> {
    let pixels = seg
        .data()
        .iter()
        .map(|&id| u16::try_from(id).map_err(|_| Error::ClassIdOverflow(id)))
        .collect::<Result<Vec<u16>>>()?;

    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(seg.width() as u32, seg.height() as u32, pixels)
            .ok_or_else(|| Error::UnsupportedSegmap("map too large for an image".into()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    buffer.save(path)?;
    Ok(())
}
