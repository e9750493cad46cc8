use super::similarity::{cosine_distance, is_degenerate};
use super::types::ClusterId;
use crate::embeddings::Embedding;
use crate::error::DedupError;
use std::collections::VecDeque;

/// Density-based clustering over cosine distance with `min_samples = 1`.
///
/// Every point is a core point, so each one either joins the cluster of a
/// neighbour within `eps` or starts its own. Clusters are therefore the
/// connected components of the graph whose edges join points at distance
/// `<= eps`, which gives chained membership: A-B and B-C within `eps` put A
/// and C together no matter how far apart they are. There is no noise label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f32,
}

impl Dbscan {
    /// `eps` must be a finite cosine distance in `[0, 2]`.
    pub fn new(eps: f32) -> Result<Self, DedupError> {
        if !eps.is_finite() || !(0.0..=2.0).contains(&eps) {
            return Err(DedupError::Config(format!(
                "eps must be a cosine distance between 0 and 2, got {eps}"
            )));
        }
        Ok(Self { eps })
    }

    /// Assign a cluster label to every point.
    ///
    /// Labels are handed out in order of first appearance when scanning by
    /// index, starting at 0. Degenerate vectors (zero, NaN, infinite) have no
    /// neighbours and always end up alone.
    pub fn fit_predict(&self, points: &[Embedding]) -> Vec<ClusterId> {
        let neighbours = self.neighbourhoods(points);

        let mut labels: Vec<Option<ClusterId>> = vec![None; points.len()];
        let mut next_label: ClusterId = 0;
        let mut queue = VecDeque::new();

        for start in 0..points.len() {
            if labels[start].is_some() {
                continue;
            }
            let label = next_label;
            next_label += 1;

            labels[start] = Some(label);
            queue.push_back(start);
            while let Some(p) = queue.pop_front() {
                for &q in &neighbours[p] {
                    if labels[q].is_none() {
                        labels[q] = Some(label);
                        queue.push_back(q);
                    }
                }
            }
        }

        labels.into_iter().flatten().collect()
    }

    /// Adjacency lists of the eps-graph. Lives only for one `fit_predict` call.
    fn neighbourhoods(&self, points: &[Embedding]) -> Vec<Vec<usize>> {
        let usable: Vec<bool> = points.iter().map(|p| !is_degenerate(p)).collect();
        let mut adjacency = vec![Vec::new(); points.len()];

        for i in 0..points.len() {
            if !usable[i] {
                continue;
            }
            for j in (i + 1)..points.len() {
                if usable[j] && cosine_distance(&points[i], &points[j]) <= self.eps {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }
        adjacency
    }
}
