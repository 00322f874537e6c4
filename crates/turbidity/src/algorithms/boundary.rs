//! External contour extraction by Moore-neighbor tracing.
//!
//! Tracing starts at the region's anchor (its first pixel in raster order),
//! whose west neighbor is never part of the region, and walks the boundary
//! clockwise in image coordinates (y pointing down). It stops with Jacob's
//! criterion: when the start pixel is left again through the same first move.
//! Only pixels carrying the traced label are ever emitted, so holes and
//! neighboring regions never appear in the contour.

use crate::{traits::BoundaryTracer, types::LabelMap};

/// Moore neighborhood in clockwise order, starting west
const CLOCKWISE: [(i64, i64); 8] = [
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
];

const WEST: usize = 0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MooreBoundaryTracer;

impl BoundaryTracer for MooreBoundaryTracer {
    fn trace(&self, labels: &LabelMap, id: u32) -> Vec<[u32; 2]> {
        let Some([ax, ay]) = labels.anchor(id) else {
            return Vec::new();
        };
        let start = (ax as i64, ay as i64);
        let mut boundary = vec![[ax, ay]];

        let Some(first_move) = next_move(labels, id, start, WEST) else {
            // isolated pixel
            boundary.push([ax, ay]);
            return boundary;
        };
        let second = step(start, first_move);

        // Each boundary pixel is entered at most four times by an 8-connected trace
        let max_steps = 4 * labels.pixel_count(id) + 4;
        let mut current = start;
        let mut direction = first_move;

        for _ in 0..max_steps {
            current = step(current, direction);
            boundary.push(to_point(current));

            let Some(next) = next_move(labels, id, current, backtrack(direction)) else {
                break;
            };
            if current == start && step(current, next) == second {
                break;
            }
            direction = next;
        }

        if boundary.last() != boundary.first() {
            tracing::warn!(id, "boundary trace hit its step limit before closing");
            boundary.push([ax, ay]);
        }
        boundary
    }
}

/// Direction (relative to the pixel just entered) of the last background
/// cell examined before moving in `direction`.
fn backtrack(direction: usize) -> usize {
    if direction % 2 == 0 {
        (direction + 6) % 8
    } else {
        (direction + 5) % 8
    }
}

/// Scan the Moore neighborhood of `pixel` clockwise, starting just after
/// `backtrack`, for the first pixel of region `id`.
fn next_move(labels: &LabelMap, id: u32, pixel: (i64, i64), backtrack: usize) -> Option<usize> {
    (1..8)
        .map(|i| (backtrack + i) % 8)
        .find(|&d| {
            let (x, y) = step(pixel, d);
            labels.is_label(x, y, id)
        })
}

fn step((x, y): (i64, i64), direction: usize) -> (i64, i64) {
    let (dx, dy) = CLOCKWISE[direction];
    (x + dx, y + dy)
}

fn to_point((x, y): (i64, i64)) -> [u32; 2] {
    [x as u32, y as u32]
}
