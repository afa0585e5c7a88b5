// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segmentation maps and the per-class binary masks derived from them

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Per-pixel class ids produced by the segmentation model, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSegmentationMap")]
pub struct SegmentationMap {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

#[derive(Deserialize)]
struct RawSegmentationMap {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

impl TryFrom<RawSegmentationMap> for SegmentationMap {
    type Error = Error;

    fn try_from(raw: RawSegmentationMap) -> Result<Self> {
        Self::new(raw.width, raw.height, raw.data)
    }
}

/// `width * height`, or an error when the product overflows
fn cell_count(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or(Error::TooManyCells { width, height })
}

impl SegmentationMap {
    pub fn new(width: usize, height: usize, data: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptySegmentationMap { width, height });
        }
        if data.len() != cell_count(width, height)? {
            return Err(Error::DimensionMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from rows of class ids; every row must have the same length
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(cell_count(width, height)?);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(Error::RaggedRows {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
            data.extend_from_slice(cells);
        }
        Self::new(width, height, data)
    }

    /// Map where every cell holds `class_id`
    pub fn filled(width: usize, height: usize, class_id: u32) -> Result<Self> {
        Self::new(width, height, vec![class_id; cell_count(width, height)?])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed map; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, class_id: u32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = class_id;
        }
    }

    /// Paint the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the map
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, class_id: u32) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.data[y * self.width + x] = class_id;
            }
        }
    }

    /// Pixel count per class id in one pass
    pub fn histogram(&self) -> FxHashMap<u32, usize> {
        let mut counts = FxHashMap::default();
        for &id in &self.data {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    /// All-background mask with this map's dimensions
    pub fn empty_mask(&self) -> BinaryMask {
        BinaryMask {
            width: self.width,
            height: self.height,
            bits: vec![false; self.data.len()],
        }
    }

    pub fn mask(&self, class_id: u32) -> BinaryMask {
        BinaryMask {
            width: self.width,
            height: self.height,
            bits: self.data.iter().map(|&id| id == class_id).collect(),
        }
    }
}

/// Boolean grid marking the pixels of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: usize, height: usize, bits: Vec<bool>) -> Result<Self> {
        if bits.len() != cell_count(width, height)? {
            return Err(Error::DimensionMismatch {
                width,
                height,
                actual: bits.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    pub fn empty(width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            width,
            height,
            bits: vec![false; cell_count(width, height)?],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True when no pixel is set
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Fraction of set pixels over all cells; 0 for a zero-sized mask
    pub fn ratio(&self) -> f64 {
        if self.bits.is_empty() {
            0.0
        } else {
            self.count() as f64 / self.bits.len() as f64
        }
    }

    /// `(x, y)` of every set pixel in row-major order
    pub fn coords(&self) -> Vec<(usize, usize)> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }
}
