// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image operations over binary masks: morphology and connected components

use crate::error::{Error, Result};
use crate::segmentation::BinaryMask;
use image::{imageops, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{connected_components, Connectivity};

const FOREGROUND: u8 = 255;

/// Convert a mask to a 0/255 grayscale image
pub fn to_gray(mask: &BinaryMask) -> Result<GrayImage> {
    let too_large = || Error::MaskTooLarge {
        width: mask.width(),
        height: mask.height(),
    };
    let width = u32::try_from(mask.width()).map_err(|_| too_large())?;
    let height = u32::try_from(mask.height()).map_err(|_| too_large())?;

    let pixels = mask
        .bits()
        .iter()
        .map(|&b| if b { FOREGROUND } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, pixels).ok_or_else(too_large)
}

/// Threshold a grayscale image back into a mask (non-zero is foreground)
pub fn from_gray(image: &GrayImage) -> Result<BinaryMask> {
    let bits = image.pixels().map(|p| p.0[0] > 0).collect();
    BinaryMask::new(image.width() as usize, image.height() as usize, bits)
}

/// Morphological opening (erode then dilate) with a 3x3 square element.
///
/// Pixels outside the mask count as background, so regions thinner than
/// three pixels along the border are removed like anywhere else.
pub fn open_3x3(mask: &BinaryMask) -> Result<BinaryMask> {
    let gray = to_gray(mask)?;
    let (width, height) = gray.dimensions();
    let too_large = || Error::MaskTooLarge {
        width: mask.width(),
        height: mask.height(),
    };

    // imageproc erodes as if the outside were foreground; a background
    // frame of one pixel pins the border to background instead
    let mut padded = GrayImage::new(
        width.checked_add(2).ok_or_else(too_large)?,
        height.checked_add(2).ok_or_else(too_large)?,
    );
    imageops::replace(&mut padded, &gray, 1, 1);
    let opened = imageproc::morphology::open(&padded, Norm::LInf, 1);
    from_gray(&imageops::crop_imm(&opened, 1, 1, width, height).to_image())
}

/// Area and bounding box of one connected component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Label assigned by the labelling pass, starting at 1
    pub label: u32,
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Component {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn bbox_area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Filled fraction of the bounding box, in (0, 1]
    pub fn rectangularity(&self) -> f64 {
        (self.area as f64 / self.bbox_area() as f64).min(1.0)
    }
}

/// Label 4-connected foreground regions and collect per-component stats,
/// ordered by label
pub fn components(mask: &BinaryMask) -> Result<Vec<Component>> {
    let gray = to_gray(mask)?;
    let labelled = connected_components(&gray, Connectivity::Four, Luma([0u8]));

    let mut stats: Vec<Option<Component>> = Vec::new();
    for (x, y, pixel) in labelled.enumerate_pixels() {
        let label = pixel.0[0];
        if label == 0 {
            continue;
        }
        let index = (label - 1) as usize;
        if index >= stats.len() {
            stats.resize(index + 1, None);
        }
        let c = stats[index].get_or_insert(Component {
            label,
            area: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        });
        c.area += 1;
        c.min_x = c.min_x.min(x);
        c.max_x = c.max_x.max(x);
        c.min_y = c.min_y.min(y);
        c.max_y = c.max_y.max(y);
    }

    Ok(stats.into_iter().flatten().collect())
}

/// Component with the most pixels; the lowest label wins ties
pub fn largest_component(mask: &BinaryMask) -> Result<Option<Component>> {
    let comps = components(mask)?;
    Ok(comps
        .into_iter()
        .fold(None, |best: Option<Component>, c| match best {
            Some(b) if b.area >= c.area => Some(b),
            _ => Some(c),
        }))
}
