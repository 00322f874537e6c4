//! 8-connected component labeling.
//!
//! Both labelers number regions in raster order of each region's first pixel,
//! so for a given mask they produce identical label maps.

use crate::{traits::ComponentLabeler, types::{BinaryMask, LabelMap}};

/// All eight neighbors of a pixel
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Neighbors already visited by a row-major scan
const PRIOR_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

/// Two-pass labeling with a union-find forest over provisional labels
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionFindLabeler;

impl ComponentLabeler for UnionFindLabeler {
    fn label(&self, mask: &BinaryMask) -> LabelMap {
        let (width, height) = (mask.width() as usize, mask.height() as usize);
        let foreground = mask.as_slice();
        let mut labels = vec![0u32; width * height];
        let mut forest = DisjointSet::new();

        // Pass 1: provisional labels, recording equivalences
        for y in 0..height {
            for x in 0..width {
                let index = y * width + x;
                if !foreground[index] {
                    continue;
                }

                let mut assigned = 0u32;
                for (dx, dy) in PRIOR_NEIGHBORS {
                    let Some(neighbor) = offset(x, y, dx, dy, width, height) else {
                        continue;
                    };
                    let neighbor_label = labels[neighbor];
                    if neighbor_label == 0 {
                        continue;
                    }
                    if assigned == 0 {
                        assigned = neighbor_label;
                    } else {
                        forest.union(assigned, neighbor_label);
                    }
                }

                if assigned == 0 {
                    assigned = forest.make_set();
                }
                labels[index] = assigned;
            }
        }

        // Pass 2: collapse each equivalence class to a final id, in raster order
        let mut final_ids = vec![0u32; forest.len()];
        let mut next_id = 0u32;
        for label in labels.iter_mut().filter(|l| **l != 0) {
            let root = forest.find(*label) as usize;
            if final_ids[root] == 0 {
                next_id += 1;
                final_ids[root] = next_id;
            }
            *label = final_ids[root];
        }

        tracing::trace!(provisional = forest.len() - 1, regions = next_id, "union-find labeling done");
        LabelMap::from_labels(mask.width(), mask.height(), labels, next_id)
    }
}

/// Iterative flood fill seeded at each unlabeled foreground pixel in raster order
#[derive(Debug, Clone, Copy, Default)]
pub struct FloodFillLabeler;

impl ComponentLabeler for FloodFillLabeler {
    fn label(&self, mask: &BinaryMask) -> LabelMap {
        let (width, height) = (mask.width() as usize, mask.height() as usize);
        let foreground = mask.as_slice();
        let mut labels = vec![0u32; width * height];
        let mut stack = Vec::new();
        let mut next_id = 0u32;

        for seed in 0..width * height {
            if !foreground[seed] || labels[seed] != 0 {
                continue;
            }

            next_id += 1;
            labels[seed] = next_id;
            stack.push(seed);

            while let Some(index) = stack.pop() {
                let (x, y) = (index % width, index / width);
                for (dx, dy) in NEIGHBORS {
                    let Some(neighbor) = offset(x, y, dx, dy, width, height) else {
                        continue;
                    };
                    if foreground[neighbor] && labels[neighbor] == 0 {
                        labels[neighbor] = next_id;
                        stack.push(neighbor);
                    }
                }
            }
        }

        tracing::trace!(regions = next_id, "flood-fill labeling done");
        LabelMap::from_labels(mask.width(), mask.height(), labels, next_id)
    }
}

fn offset(x: usize, y: usize, dx: isize, dy: isize, width: usize, height: usize) -> Option<usize> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    if nx >= width || ny >= height {
        return None;
    }
    Some(ny * width + nx)
}

/// Union-find over provisional labels. Index 0 is a sentinel for background.
struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    fn new() -> Self {
        Self { parent: vec![0] }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: u32) -> u32 {
        // path halving
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[big as usize] = small;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use image::Luma;
    use imageproc::region_labelling::{connected_components, Connectivity};

    fn mask_from_rows(rows: &[&str]) -> BinaryMask {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        BinaryMask::from_fn(width, height, |x, y| rows[y as usize].as_bytes()[x as usize] == b'#')
    }

    /// Deterministic pseudo-random mask (LCG) with the given fill ratio in percent
    fn noise_mask(width: u32, height: u32, fill_percent: u64, seed: u64) -> BinaryMask {
        let mut state = seed;
        BinaryMask::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) % 100 < fill_percent
        })
    }

    fn labelers() -> Vec<Box<dyn ComponentLabeler>> {
        vec![Box::new(UnionFindLabeler), Box::new(FloodFillLabeler)]
    }

    /// True if both label slices describe the same grouping of pixels
    fn same_partition(a: &[u32], b: &[u32]) -> bool {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        a.iter().zip(b).all(|(&la, &lb)| {
            (la == 0) == (lb == 0)
                && *forward.entry(la).or_insert(lb) == lb
                && *backward.entry(lb).or_insert(la) == la
        })
    }

    #[test]
    fn test_empty_mask() {
        for labeler in labelers() {
            let labels = labeler.label(&BinaryMask::new(6, 4));
            assert_eq!(labels.label_count(), 0);
            assert_eq!(labels.pixel_counts(), &[24]);
        }
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let mask = mask_from_rows(&[
            "#...",
            ".#..",
            "..#.",
            "...#",
        ]);
        for labeler in labelers() {
            let labels = labeler.label(&mask);
            assert_eq!(labels.label_count(), 1);
            assert_eq!(labels.pixel_count(1), 4);
        }
    }

    #[test]
    fn test_anti_diagonal_pixels_are_connected() {
        let mask = mask_from_rows(&[
            "...#",
            "..#.",
            ".#..",
            "#...",
        ]);
        for labeler in labelers() {
            assert_eq!(labeler.label(&mask).label_count(), 1);
        }
    }

    #[test]
    fn test_separated_blobs() {
        let mask = mask_from_rows(&[
            "##..#",
            "##..#",
            ".....",
            "#.###",
        ]);
        for labeler in labelers() {
            let labels = labeler.label(&mask);
            assert_eq!(labels.label_count(), 4);
            assert_eq!(labels.pixel_counts(), &[10, 4, 2, 1, 3]);
            assert_eq!(labels.get(0, 0), 1);
            assert_eq!(labels.get(4, 0), 2);
            assert_eq!(labels.get(0, 3), 3);
            assert_eq!(labels.get(3, 3), 4);
        }
    }

    #[test]
    fn test_arms_merge_into_one_region() {
        // Two provisional labels on the first row meet at the bottom
        let mask = mask_from_rows(&[
            "#...#.#",
            "#...#.#",
            "#...#.#",
            "#####.#",
            "#.....#",
            "#######",
        ]);
        for labeler in labelers() {
            let labels = labeler.label(&mask);
            assert_eq!(labels.label_count(), 1);
            assert_eq!(labels.pixel_count(1), mask.foreground_count());
        }
    }

    #[test]
    fn test_labelers_agree_exactly() {
        for (seed, fill) in [(1u64, 30u64), (7, 45), (42, 60), (99, 75)] {
            let mask = noise_mask(64, 48, fill, seed);
            let a = UnionFindLabeler.label(&mask);
            let b = FloodFillLabeler.label(&mask);
            assert_eq!(a, b, "seed {seed} fill {fill}");
        }
    }

    #[test]
    fn test_partition_matches_imageproc() {
        for (seed, fill) in [(3u64, 35u64), (11, 55)] {
            let mask = noise_mask(50, 40, fill, seed);
            let reference = connected_components(&mask.to_gray_image(), Connectivity::Eight, Luma([0u8]));
            let reference: Vec<u32> = reference.pixels().map(|p| p[0]).collect();

            for labeler in labelers() {
                let labels = labeler.label(&mask);
                assert!(same_partition(labels.as_slice(), &reference));
                let distinct: HashSet<u32> = reference.iter().copied().filter(|&l| l != 0).collect();
                assert_eq!(labels.label_count() as usize, distinct.len());
            }
        }
    }

    #[test]
    fn test_every_foreground_pixel_is_labeled() {
        let mask = noise_mask(40, 40, 50, 5);
        for labeler in labelers() {
            let labels = labeler.label(&mask);
            for (&fg, &label) in mask.as_slice().iter().zip(labels.as_slice()) {
                assert_eq!(fg, label != 0);
            }
            let total: usize = labels.pixel_counts()[1..].iter().sum();
            assert_eq!(total, mask.foreground_count());
        }
    }

    #[test]
    fn test_anchor_is_first_raster_pixel() {
        let mask = mask_from_rows(&[
            "..#..",
            ".###.",
            "..#..",
        ]);
        let labels = UnionFindLabeler.label(&mask);
        assert_eq!(labels.anchor(1), Some([2, 0]));
    }
}
