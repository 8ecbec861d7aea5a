//! Greedy k-centers pivot selection
//!
//! The first center is drawn at random; every following center is the point
//! farthest from all centers chosen so far. The result is a set of pivots
//! that are well separated under the distance function.

use rand::Rng;

/// Chosen centers plus the distance of every point to every center
#[derive(Debug, Clone)]
pub struct KCenters {
    /// Indices into the input slice
    pub centers: Vec<usize>,
    /// `distances[i][j]` = distance from point `i` to center `j`
    pub distances: Vec<Vec<f64>>,
}

/// Pick `k` well-separated centers among `data`
pub fn greedy_k_centers<T, D, R>(data: &[T], k: usize, distance: &D, rng: &mut R) -> KCenters
where
    D: Fn(&T, &T) -> f64 + ?Sized,
    R: Rng + ?Sized,
{
    let n = data.len();
    let k = k.min(n);
    let mut centers = Vec::with_capacity(k);
    let mut distances = vec![Vec::with_capacity(k); n];
    if k == 0 {
        return KCenters { centers, distances };
    }

    let mut min_dist = vec![f64::INFINITY; n];
    let mut is_center = vec![false; n];
    let mut next = rng.gen_range(0..n);
    for j in 0..k {
        centers.push(next);
        is_center[next] = true;
        let mut farthest = next;
        let mut farthest_dist = f64::NEG_INFINITY;
        for i in 0..n {
            let d = distance(&data[i], &data[next]);
            distances[i].push(d);
            if d < min_dist[i] {
                min_dist[i] = d;
            }
            // a point is never picked twice, even when duplicates sit at distance zero
            if !is_center[i] && min_dist[i] > farthest_dist {
                farthest_dist = min_dist[i];
                farthest = i;
            }
        }
        if j + 1 < k {
            next = farthest;
        }
    }

    KCenters { centers, distances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line_dist(a: &f64, b: &f64) -> f64 {
        (a - b).abs()
    }

    #[test]
    fn test_centers_are_distinct_and_separated() {
        let data: Vec<f64> = vec![0.0, 0.1, 0.2, 5.0, 5.1, 10.0, 10.2];
        let mut rng = StdRng::seed_from_u64(1);
        let kc = greedy_k_centers(&data, 3, &line_dist, &mut rng);
        assert_eq!(kc.centers.len(), 3);

        let mut chosen: Vec<f64> = kc.centers.iter().map(|&c| data[c]).collect();
        chosen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        // one center per cluster
        assert!(chosen[0] < 1.0);
        assert!(chosen[1] > 4.0 && chosen[1] < 6.0);
        assert!(chosen[2] > 9.0);
    }

    #[test]
    fn test_distance_matrix() {
        let data: Vec<f64> = vec![1.0, 4.0, 9.0];
        let mut rng = StdRng::seed_from_u64(2);
        let kc = greedy_k_centers(&data, 2, &line_dist, &mut rng);
        for (i, row) in kc.distances.iter().enumerate() {
            assert_eq!(row.len(), 2);
            for (j, &d) in row.iter().enumerate() {
                assert_eq!(d, line_dist(&data[i], &data[kc.centers[j]]));
            }
        }
    }

    #[test]
    fn test_k_larger_than_data() {
        let data: Vec<f64> = vec![1.0, 2.0];
        let mut rng = StdRng::seed_from_u64(3);
        let kc = greedy_k_centers(&data, 5, &line_dist, &mut rng);
        let mut centers = kc.centers.clone();
        centers.sort();
        assert_eq!(centers, vec![0, 1]);
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<f64> = Vec::new();
        let mut rng = StdRng::seed_from_u64(4);
        let kc = greedy_k_centers(&data, 3, &line_dist, &mut rng);
        assert!(kc.centers.is_empty());
    }
}
