use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::models::{Contour, PixelPoint};

/// Trace outermost borders in a binary edge mask (non-zero = edge).
///
/// Holes and borders nested inside another border are ignored. Each border
/// is chain-compressed so only the vertices where the step direction
/// changes remain. Borders that compress to fewer than 2 points are dropped.
pub fn find_external_contours(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<PixelPoint> = c
                .points
                .iter()
                .map(|p| PixelPoint::new(p.x, p.y))
                .collect();
            let compressed = compress_chain(&points);
            if compressed.len() < 2 {
                return None;
            }
            Some(Contour::new(compressed, true))
        })
        .collect()
}

/// Drop repeated points and interior points of straight runs.
///
/// The first point always survives so the result is stable for a given
/// border.
pub fn compress_chain(points: &[PixelPoint]) -> Vec<PixelPoint> {
    let mut deduped: Vec<PixelPoint> = Vec::with_capacity(points.len());
    for &p in points {
        if deduped.last() != Some(&p) {
            deduped.push(p);
        }
    }
    // A border that walks back onto its start repeats it at the end
    while deduped.len() > 1 && deduped.last() == deduped.first() {
        deduped.pop();
    }
    if deduped.len() < 3 {
        return deduped;
    }

    let step = |a: PixelPoint, b: PixelPoint| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let mut result = vec![deduped[0]];
    for i in 1..deduped.len() - 1 {
        let incoming = step(deduped[i - 1], deduped[i]);
        let outgoing = step(deduped[i], deduped[i + 1]);
        if incoming != outgoing {
            result.push(deduped[i]);
        }
    }
    let last = deduped.len() - 1;
    // The last point is kept unless it lies on the run closing back to the start
    let incoming = step(deduped[last - 1], deduped[last]);
    let closing = step(deduped[last], deduped[0]);
    if incoming != closing {
        result.push(deduped[last]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<PixelPoint> {
        coords.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect()
    }

    #[test]
    fn square_run_compresses_to_corners() {
        let ring = pts(&[
            (0, 0), (1, 0), (2, 0),
            (2, 1), (2, 2),
            (1, 2), (0, 2),
            (0, 1),
        ]);
        assert_eq!(compress_chain(&ring), pts(&[(0, 0), (2, 0), (2, 2), (0, 2)]));
    }

    #[test]
    fn duplicates_and_repeated_start_are_removed() {
        let ring = pts(&[(0, 0), (0, 0), (3, 0), (3, 3), (0, 0)]);
        assert_eq!(compress_chain(&ring), pts(&[(0, 0), (3, 0), (3, 3)]));
    }

    #[test]
    fn empty_mask_has_no_contours() {
        let img = GrayImage::new(10, 10);
        assert!(find_external_contours(&img).is_empty());
    }

    #[test]
    fn filled_block_traces_single_outer_border() {
        let mut img = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].points,
            pts(&[(5, 5), (5, 14), (14, 14), (14, 5)])
        );
    }

    #[test]
    fn ring_interior_is_not_traced() {
        let mut img = GrayImage::new(20, 20);
        for y in 4..16 {
            for x in 4..16 {
                let on_border = x == 4 || x == 15 || y == 4 || y == 15;
                if on_border {
                    img.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
    }
}
