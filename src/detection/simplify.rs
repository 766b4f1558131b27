use crate::models::PixelPoint;

/// Simplify a closed ring with Ramer-Douglas-Peucker.
///
/// The ring is opened at its first point and closed again afterwards, then
/// any vertex (including the arbitrary start) lying within `tolerance` of
/// the line through its neighbours is dropped. A ring thin enough to lie
/// within `tolerance` of a single chord collapses to that chord's two ends.
pub fn simplify_ring(points: &[PixelPoint], tolerance: f64) -> Vec<PixelPoint> {
    if tolerance <= 0.0 || points.len() <= 3 {
        return points.to_vec();
    }

    let mut chain = points.to_vec();
    chain.push(points[0]);
    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    let last = chain.len() - 1;
    keep[last] = true;

    // Split at the vertex farthest from the start so both halves have a
    // well-defined baseline.
    let far = (1..last)
        .max_by(|&a, &b| {
            distance_sq(chain[0], chain[a])
                .partial_cmp(&distance_sq(chain[0], chain[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(1);
    keep[far] = true;
    rdp(&chain, 0, far, tolerance, &mut keep);
    rdp(&chain, far, last, tolerance, &mut keep);

    let mut ring: Vec<PixelPoint> = chain[..last]
        .iter()
        .zip(&keep[..last])
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect();

    drop_collinear_vertices(&mut ring, tolerance);
    ring
}

fn rdp(points: &[PixelPoint], first: usize, last: usize, tolerance: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut index = first;
    for i in first + 1..last {
        let d = perpendicular_distance(points[i], points[first], points[last]);
        if d > max_dist {
            max_dist = d;
            index = i;
        }
    }
    if max_dist > tolerance {
        keep[index] = true;
        rdp(points, first, index, tolerance, keep);
        rdp(points, index, last, tolerance, keep);
    }
}

fn drop_collinear_vertices(ring: &mut Vec<PixelPoint>, tolerance: f64) {
    let mut changed = true;
    while changed && ring.len() > 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            if perpendicular_distance(ring[i], prev, next) <= tolerance {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
}

fn distance_sq(a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    dx * dx + dy * dy
}

/// Distance from `p` to the line through `a` and `b` (to `a` if they coincide)
fn perpendicular_distance(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let len_sq = distance_sq(a, b);
    if len_sq == 0.0 {
        return distance_sq(a, p).sqrt();
    }
    let cross = f64::from(b.x - a.x) * f64::from(p.y - a.y)
        - f64::from(b.y - a.y) * f64::from(p.x - a.x);
    cross.abs() / len_sq.sqrt()
}
