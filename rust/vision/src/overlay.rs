// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour overlay of a segmentation map on top of the photo

use ablemap_core::{ClassMap, SegmentationMap};
use image::{Rgb, RgbImage};
use rustc_hash::FxHashMap;

/// Blend weight of the class colour
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Class colours of the default class map
pub const DEFAULT_COLORS: &[(&str, [u8; 3])] = &[
    ("road", [255, 0, 0]),
    ("sidewalk", [0, 255, 0]),
    ("building", [0, 0, 255]),
    ("stairs", [255, 255, 0]),
    ("door", [255, 165, 0]),
    ("runway", [128, 0, 128]),
    ("stairway", [0, 255, 255]),
    ("bench", [255, 105, 180]),
    ("dirt_road", [139, 69, 19]),
    ("railing", [128, 128, 128]),
];

/// Colour per class id; ids without a colour are left untouched
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    colors: FxHashMap<u32, Rgb<u8>>,
}

impl ColorMap {
    /// Colours from [`DEFAULT_COLORS`] for the classes `class_map` knows
    pub fn for_classes(class_map: &ClassMap) -> Self {
        let colors = DEFAULT_COLORS
            .iter()
            .filter_map(|&(name, rgb)| class_map.id(name).map(|id| (id, Rgb(rgb))))
            .collect();
        Self { colors }
    }

    pub fn insert(&mut self, class_id: u32, color: [u8; 3]) {
        self.colors.insert(class_id, Rgb(color));
    }

    pub fn get(&self, class_id: u32) -> Option<Rgb<u8>> {
        self.colors.get(&class_id).copied()
    }
}

/// Alpha-blend class colours over `photo`.
///
/// The output has the photo's size. When the map has another resolution
/// each photo pixel looks up the nearest map cell.
pub fn render_overlay(
    photo: &RgbImage,
    seg: &SegmentationMap,
    colors: &ColorMap,
    alpha: f32,
) -> RgbImage {
    let alpha = alpha.clamp(0.0, 1.0);
    let (width, height) = photo.dimensions();
    let scale_x = seg.width() as f64 / width as f64;
    let scale_y = seg.height() as f64 / height as f64;

    let mut out = photo.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let sx = ((x as f64 * scale_x) as usize).min(seg.width() - 1);
        let sy = ((y as f64 * scale_y) as usize).min(seg.height() - 1);
        let Some(color) = seg.get(sx, sy).and_then(|id| colors.get(id)) else {
            continue;
        };
        for c in 0..3 {
            let blended = pixel.0[c] as f32 * (1.0 - alpha) + color.0[c] as f32 * alpha;
            pixel.0[c] = blended.round() as u8;
        }
    }
    out
}
