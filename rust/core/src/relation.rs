// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel-space distance between two masks
//!
//! The distance is estimated from a random subset of each mask's pixels, so
//! it is never below the true minimum and may exceed it for large or sparse
//! masks. Seed the generator to get repeatable values.

use crate::segmentation::BinaryMask;
use rand::seq::index;
use rand::Rng;

/// Approximate minimum Euclidean distance between the set pixels of `a` and `b`.
///
/// Returns `f64::INFINITY` when either mask is empty. Each mask contributes
/// all of its pixels when it has at most `max_samples`, otherwise
/// `max_samples` distinct pixels chosen uniformly.
pub fn min_distance<R: Rng + ?Sized>(
    a: &BinaryMask,
    b: &BinaryMask,
    max_samples: usize,
    rng: &mut R,
) -> f64 {
    let points_a = sample_coords(a, max_samples, rng);
    if points_a.is_empty() {
        return f64::INFINITY;
    }
    let points_b = sample_coords(b, max_samples, rng);
    if points_b.is_empty() {
        return f64::INFINITY;
    }

    let mut best = f64::INFINITY;
    for &(ax, ay) in &points_a {
        for &(bx, by) in &points_b {
            let dx = ax as f64 - bx as f64;
            let dy = ay as f64 - by as f64;
            let d = (dx * dx + dy * dy).sqrt();
            if d < best {
                best = d;
            }
        }
    }
    best
}

fn sample_coords<R: Rng + ?Sized>(
    mask: &BinaryMask,
    max_samples: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let coords = mask.coords();
    if coords.len() <= max_samples {
        return coords;
    }
    index::sample(rng, coords.len(), max_samples)
        .into_iter()
        .map(|i| coords[i])
        .collect()
}
